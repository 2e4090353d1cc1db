//! RFC 5322 address list parsing: mailboxes, groups, comments, quoted
//! display names.

use crate::error::{Warning, WarningKind};
use std::fmt;

/// A single mailbox: optional display name plus `local@domain`.
///
/// Invariant: local part and domain are never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mailbox {
    /// Display name, if one was given.
    pub display_name: Option<String>,
    /// The part before the `@`.
    pub local_part: String,
    /// The part after the `@`.
    pub domain: String,
}

impl Mailbox {
    /// The `local@domain` form without display name.
    #[must_use]
    pub fn addr_spec(&self) -> String {
        format!("{}@{}", self.local_part, self.domain)
    }
}

impl fmt::Display for Mailbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.display_name {
            Some(name) => write!(f, "{} <{}@{}>", name, self.local_part, self.domain),
            None => write!(f, "{}@{}", self.local_part, self.domain),
        }
    }
}

/// An RFC 5322 group: a name and a (possibly empty) mailbox list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    /// Group display name.
    pub name: String,
    /// Member mailboxes; may be empty (`undisclosed-recipients:;`).
    pub members: Vec<Mailbox>,
}

/// One entry of an address list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Address {
    /// A single mailbox.
    Mailbox(Mailbox),
    /// A named group of mailboxes.
    Group(Group),
}

impl Address {
    /// The first mailbox reachable from this address: the mailbox itself,
    /// or a group's first member.
    #[must_use]
    pub fn first_mailbox(&self) -> Option<&Mailbox> {
        match self {
            Self::Mailbox(mb) => Some(mb),
            Self::Group(group) => group.members.first(),
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mailbox(mb) => mb.fmt(f),
            Self::Group(group) => {
                write!(f, "{}:", group.name)?;
                for (i, mb) in group.members.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, " {mb}")?;
                }
                write!(f, ";")
            }
        }
    }
}

/// Parses an address-list header value (From, To, Cc, ...).
///
/// Permissive: malformed individual addresses are skipped with a recorded
/// warning instead of failing the list, and an empty value yields an empty
/// list. Expects the value to already have RFC 2047 encoded-words decoded.
#[must_use]
pub fn parse_address_list(value: &str) -> (Vec<Address>, Vec<Warning>) {
    let mut cursor = Cursor::new(value);
    let mut addresses = Vec::new();
    let mut warnings = Vec::new();

    loop {
        cursor.skip_ws_and_comments();
        if cursor.eof() {
            break;
        }
        if cursor.peek() == Some(b',') {
            cursor.bump();
            continue;
        }
        let start = cursor.pos;
        match cursor.parse_address() {
            Some(address) => addresses.push(address),
            None => {
                cursor.skip_to_separator(false);
                let snippet = cursor.slice(start, cursor.pos).trim().to_string();
                warnings.push(Warning::new(WarningKind::InvalidAddress, snippet));
            }
        }
        cursor.skip_ws_and_comments();
        if cursor.peek() == Some(b',') {
            cursor.bump();
        }
    }

    (addresses, warnings)
}

struct Cursor<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    const fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    fn bump(&mut self) {
        self.pos += 1;
    }

    fn slice(&self, start: usize, end: usize) -> &'a str {
        self.input.get(start..end).unwrap_or("")
    }

    fn skip_ws_and_comments(&mut self) {
        loop {
            match self.peek() {
                Some(b' ' | b'\t' | b'\r' | b'\n') => self.bump(),
                Some(b'(') => self.skip_comment(),
                _ => break,
            }
        }
    }

    /// Skips a `(...)` comment, honoring nesting and backslash escapes.
    fn skip_comment(&mut self) {
        let mut depth = 0usize;
        while let Some(b) = self.peek() {
            self.bump();
            match b {
                b'\\' => {
                    if !self.eof() {
                        self.bump();
                    }
                }
                b'(' => depth += 1,
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        return;
                    }
                }
                _ => {}
            }
        }
    }

    /// Advances to the next top-level separator: `,`, or also `;` inside a
    /// group. Quoted strings and comments are opaque.
    fn skip_to_separator(&mut self, in_group: bool) {
        while let Some(b) = self.peek() {
            match b {
                b',' => return,
                b';' if in_group => return,
                b'"' => {
                    let _ = self.parse_quoted_string();
                }
                b'(' => self.skip_comment(),
                _ => self.bump(),
            }
        }
    }

    /// Parses one address (mailbox or group). Returns `None` on malformed
    /// input, leaving the cursor wherever it stopped; the caller skips to
    /// the next separator.
    fn parse_address(&mut self) -> Option<Address> {
        let mut phrase: Vec<String> = Vec::new();

        loop {
            self.skip_ws_and_comments();
            match self.peek() {
                None | Some(b',' | b';') => {
                    // Bare addr-spec: exactly one word containing '@'
                    return match phrase.as_slice() {
                        [word] => mailbox_from_spec(word, None).map(Address::Mailbox),
                        _ => None,
                    };
                }
                Some(b'<') => {
                    self.bump();
                    let start = self.pos;
                    while self.peek().is_some_and(|b| b != b'>') {
                        self.bump();
                    }
                    if self.eof() {
                        return None;
                    }
                    let spec = self.slice(start, self.pos).to_string();
                    self.bump();
                    return mailbox_from_spec(&spec, join_phrase(&phrase)).map(Address::Mailbox);
                }
                Some(b':') => {
                    self.bump();
                    let name = join_phrase(&phrase).unwrap_or_default();
                    let members = self.parse_group_members();
                    return Some(Address::Group(Group { name, members }));
                }
                Some(b'"') => phrase.push(self.parse_quoted_string()?),
                _ => {
                    let word = self.parse_word()?;
                    if word.contains('@') {
                        // A bare addr-spec terminates the address here;
                        // a phrase followed by a bare spec is malformed.
                        return if phrase.is_empty() {
                            mailbox_from_spec(&word, None).map(Address::Mailbox)
                        } else {
                            None
                        };
                    }
                    phrase.push(word);
                }
            }
        }
    }

    /// Parses the mailbox list of a group, up to `;` or end of input.
    /// Malformed members are skipped; nested groups are not allowed.
    fn parse_group_members(&mut self) -> Vec<Mailbox> {
        let mut members = Vec::new();
        loop {
            self.skip_ws_and_comments();
            match self.peek() {
                None => break,
                Some(b';') => {
                    self.bump();
                    break;
                }
                Some(b',') => self.bump(),
                _ => match self.parse_address() {
                    Some(Address::Mailbox(mb)) => members.push(mb),
                    _ => self.skip_to_separator(true),
                },
            }
        }
        members
    }

    /// Parses a `"..."` quoted string, resolving backslash escapes.
    fn parse_quoted_string(&mut self) -> Option<String> {
        debug_assert_eq!(self.peek(), Some(b'"'));
        self.bump();
        let mut out = String::new();
        let mut start = self.pos;
        while let Some(b) = self.peek() {
            match b {
                b'\\' => {
                    out.push_str(self.slice(start, self.pos));
                    self.bump();
                    if let Some(escaped) = self.input[self.pos..].chars().next() {
                        out.push(escaped);
                        self.pos += escaped.len_utf8();
                    }
                    start = self.pos;
                }
                b'"' => {
                    out.push_str(self.slice(start, self.pos));
                    self.bump();
                    return Some(out);
                }
                _ => self.bump(),
            }
        }
        // Unterminated quoted string
        None
    }

    /// Parses one display-name or addr-spec word. Returns `None` if the
    /// word is empty or contains characters illegal outside quotes.
    fn parse_word(&mut self) -> Option<String> {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if matches!(b, b' ' | b'\t' | b'\r' | b'\n' | b',' | b';' | b':' | b'<' | b'"' | b'(') {
                break;
            }
            self.bump();
        }
        let word = self.slice(start, self.pos);
        if word.is_empty() || word.bytes().any(|b| matches!(b, b'[' | b']' | b'>' | b'\\')) {
            return None;
        }
        Some(word.to_string())
    }
}

/// Escapes in quoted display names are already resolved; multibyte text in
/// words passed through RFC 2047 decoding is fine because word boundaries
/// are always ASCII.
fn join_phrase(phrase: &[String]) -> Option<String> {
    if phrase.is_empty() {
        None
    } else {
        Some(phrase.join(" "))
    }
}

/// Splits `local@domain`, requiring both sides non-empty.
fn mailbox_from_spec(spec: &str, display_name: Option<String>) -> Option<Mailbox> {
    let spec = spec.trim();
    let at = spec.find('@')?;
    let local_part = spec[..at].trim();
    let domain = spec[at + 1..].trim();
    if local_part.is_empty() || domain.is_empty() {
        return None;
    }
    Some(Mailbox {
        display_name,
        local_part: local_part.to_string(),
        domain: domain.to_string(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn mailboxes(value: &str) -> Vec<Mailbox> {
        let (addrs, _) = parse_address_list(value);
        addrs
            .into_iter()
            .map(|a| match a {
                Address::Mailbox(mb) => mb,
                Address::Group(_) => panic!("expected mailbox"),
            })
            .collect()
    }

    #[test]
    fn test_bare_addr_spec() {
        let mbs = mailboxes("a@a.com");
        assert_eq!(mbs.len(), 1);
        assert_eq!(mbs[0].addr_spec(), "a@a.com");
        assert!(mbs[0].display_name.is_none());
    }

    #[test]
    fn test_comma_separated_list() {
        let mbs = mailboxes("a@a.com,b@b.com");
        assert_eq!(mbs.len(), 2);
        assert_eq!(mbs[1].addr_spec(), "b@b.com");
    }

    #[test]
    fn test_space_separated_bare_specs() {
        // Seen in the wild; each bare spec stands alone
        let mbs = mailboxes("a@a.com b@b.com");
        assert_eq!(mbs.len(), 2);
    }

    #[test]
    fn test_display_name_and_angle_addr() {
        let mbs = mailboxes("Foo Bar <foo@bar.baz>");
        assert_eq!(mbs.len(), 1);
        assert_eq!(mbs[0].display_name.as_deref(), Some("Foo Bar"));
        assert_eq!(mbs[0].local_part, "foo");
        assert_eq!(mbs[0].domain, "bar.baz");
    }

    #[test]
    fn test_quoted_display_name() {
        let mbs = mailboxes("\"Bar, Baz\" <bar@foo.com>");
        assert_eq!(mbs.len(), 1);
        assert_eq!(mbs[0].display_name.as_deref(), Some("Bar, Baz"));
    }

    #[test]
    fn test_quoted_name_allows_specials() {
        let mbs = mailboxes("\"[]\" <goodbrackets@b.com>");
        assert_eq!(mbs.len(), 1);
        assert_eq!(mbs[0].display_name.as_deref(), Some("[]"));
    }

    #[test]
    fn test_unquoted_specials_rejected() {
        let (addrs, warnings) = parse_address_list("[] <badbrackets@b.com>, c <c@c.com>");
        assert_eq!(addrs.len(), 1);
        assert_eq!(
            addrs[0].first_mailbox().unwrap().addr_spec(),
            "c@c.com"
        );
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].kind, WarningKind::InvalidAddress);
    }

    #[test]
    fn test_phrase_followed_by_bare_spec_is_invalid() {
        let (addrs, warnings) = parse_address_list("a a@a.com, b <b@b.com>");
        assert_eq!(addrs.len(), 1);
        assert_eq!(addrs[0].first_mailbox().unwrap().addr_spec(), "b@b.com");
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_trailing_junk_skipped() {
        let (addrs, warnings) =
            parse_address_list("Foo Bar <foo@bar.baz>, Not an email at all");
        assert_eq!(addrs.len(), 1);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].detail.contains("Not an email"));
    }

    #[test]
    fn test_comments_skipped() {
        let mbs = mailboxes("(comment) foo@bar.baz (another (nested) one)");
        assert_eq!(mbs.len(), 1);
        assert_eq!(mbs[0].addr_spec(), "foo@bar.baz");
    }

    #[test]
    fn test_group() {
        let (addrs, warnings) = parse_address_list("Team: a@x.com, B <b@y.com>;");
        assert!(warnings.is_empty());
        assert_eq!(addrs.len(), 1);
        match &addrs[0] {
            Address::Group(group) => {
                assert_eq!(group.name, "Team");
                assert_eq!(group.members.len(), 2);
                assert_eq!(group.members[1].display_name.as_deref(), Some("B"));
            }
            Address::Mailbox(_) => panic!("expected group"),
        }
    }

    #[test]
    fn test_empty_group() {
        let (addrs, _) = parse_address_list("undisclosed-recipients:;");
        assert_eq!(addrs.len(), 1);
        match &addrs[0] {
            Address::Group(group) => {
                assert_eq!(group.name, "undisclosed-recipients");
                assert!(group.members.is_empty());
                assert!(addrs[0].first_mailbox().is_none());
            }
            Address::Mailbox(_) => panic!("expected group"),
        }
    }

    #[test]
    fn test_group_followed_by_mailbox() {
        let (addrs, _) = parse_address_list("Team: a@x.com;, lone@z.com");
        assert_eq!(addrs.len(), 2);
        assert_eq!(addrs[1].first_mailbox().unwrap().addr_spec(), "lone@z.com");
    }

    #[test]
    fn test_empty_value_yields_empty_list() {
        let (addrs, warnings) = parse_address_list("");
        assert!(addrs.is_empty());
        assert!(warnings.is_empty());
        let (addrs, warnings) = parse_address_list("   ");
        assert!(addrs.is_empty());
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_empty_angle_addr_invalid() {
        let (addrs, warnings) = parse_address_list("<>");
        assert!(addrs.is_empty());
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_non_ascii_display_name() {
        let mbs = mailboxes("山田太郎 <taro@example.jp>");
        assert_eq!(mbs[0].display_name.as_deref(), Some("山田太郎"));
    }

    #[test]
    fn test_display_rendering() {
        let mbs = mailboxes("Foo Bar <foo@bar.baz>");
        assert_eq!(mbs[0].to_string(), "Foo Bar <foo@bar.baz>");
        let mbs = mailboxes("foo@bar.baz");
        assert_eq!(mbs[0].to_string(), "foo@bar.baz");
    }
}
