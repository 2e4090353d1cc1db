//! Message headers: an ordered, case-insensitive collection.

use crate::encoding::decode_rfc2047;
use crate::error::{Warning, WarningKind};
use std::fmt;

/// A single message header.
///
/// Keeps both the raw value bytes as received (for round-trip fidelity) and
/// the decoded value with RFC 2047 encoded-words resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    name: String,
    raw: Vec<u8>,
    value: String,
    malformed: bool,
}

impl Header {
    /// Header name as received. Never empty.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw value bytes as received, before unfolding whitespace trimming or
    /// encoded-word decoding.
    #[must_use]
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Decoded value: trimmed, with RFC 2047 encoded-words resolved.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Whether the line failed header syntax and was preserved verbatim.
    #[must_use]
    pub const fn is_malformed(&self) -> bool {
        self.malformed
    }

    /// Parses one unfolded header line.
    ///
    /// Splits on the first colon and validates the name against RFC 5322
    /// token syntax. A line that fails (no colon, or an invalid name) is
    /// preserved verbatim with the malformed marker set and a warning
    /// returned, rather than aborting the message.
    pub(crate) fn parse_line(line: &[u8]) -> (Self, Option<Warning>) {
        if let Some(colon) = line.iter().position(|&b| b == b':') {
            let name = String::from_utf8_lossy(&line[..colon]).trim().to_string();
            if !name.is_empty() && is_valid_name(&name) {
                let raw = line[colon + 1..].to_vec();
                let value = decode_rfc2047(String::from_utf8_lossy(&raw).trim());
                return (
                    Self {
                        name,
                        raw,
                        value,
                        malformed: false,
                    },
                    None,
                );
            }
        }
        let text = String::from_utf8_lossy(line).into_owned();
        let warning = Warning::new(WarningKind::MalformedHeader, text.trim());
        let header = Self {
            name: text.trim().to_string(),
            raw: line.to_vec(),
            value: text.trim().to_string(),
            malformed: true,
        };
        (header, Some(warning))
    }

    #[cfg(test)]
    pub(crate) fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            name: name.into(),
            raw: value.clone().into_bytes(),
            value,
            malformed: false,
        }
    }
}

/// RFC 5322 header names are printable ASCII excluding the colon.
fn is_valid_name(name: &str) -> bool {
    name.bytes().all(|b| (33..=126).contains(&b) && b != b':')
}

/// Ordered collection of message headers.
///
/// Backed by a vector, not a map: header order is significant for
/// duplicate-header semantics and re-serialization, and a name may repeat.
/// Lookups are case-insensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<Header>,
}

impl Headers {
    /// Creates a new empty header collection.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, header: Header) {
        self.entries.push(header);
    }

    /// Decoded value of the first header with the given name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.get_header(name).map(Header::value)
    }

    /// First header with the given name.
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&Header> {
        self.entries
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
    }

    /// Decoded values of all headers with the given name, in order.
    #[must_use]
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|h| h.name.eq_ignore_ascii_case(name))
            .map(Header::value)
            .collect()
    }

    /// Iterates over all headers in original order.
    pub fn iter(&self) -> impl Iterator<Item = &Header> {
        self.entries.iter()
    }

    /// Number of headers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the collection is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a Headers {
    type Item = &'a Header;
    type IntoIter = std::slice::Iter<'a, Header>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl fmt::Display for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for header in &self.entries {
            if header.malformed {
                writeln!(f, "{}", String::from_utf8_lossy(&header.raw))?;
            } else {
                writeln!(
                    f,
                    "{}:{}",
                    header.name,
                    String::from_utf8_lossy(&header.raw)
                )?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line_simple() {
        let (h, w) = Header::parse_line(b"Subject: Hello");
        assert!(w.is_none());
        assert_eq!(h.name(), "Subject");
        assert_eq!(h.value(), "Hello");
        assert_eq!(h.raw(), b" Hello");
        assert!(!h.is_malformed());
    }

    #[test]
    fn test_parse_line_encoded_word() {
        let (h, _) = Header::parse_line(b"Subject: =?utf-8?B?SMOpbGxv?=");
        assert_eq!(h.value(), "H\u{e9}llo");
        assert_eq!(h.raw(), b" =?utf-8?B?SMOpbGxv?=");
    }

    #[test]
    fn test_parse_line_no_colon() {
        let (h, w) = Header::parse_line(b"this is not a header");
        assert!(h.is_malformed());
        assert_eq!(h.name(), "this is not a header");
        assert_eq!(w.unwrap().kind, WarningKind::MalformedHeader);
    }

    #[test]
    fn test_parse_line_invalid_name() {
        let (h, w) = Header::parse_line(b"Bad Name: value");
        assert!(h.is_malformed());
        assert!(w.is_some());
        // Preserved verbatim
        assert_eq!(h.raw(), b"Bad Name: value");
    }

    #[test]
    fn test_parse_line_empty_name() {
        let (h, w) = Header::parse_line(b": value");
        assert!(h.is_malformed());
        assert!(!h.name().is_empty());
        assert!(w.is_some());
    }

    #[test]
    fn test_headers_case_insensitive_get() {
        let mut headers = Headers::new();
        headers.push(Header::new("Content-Type", "text/plain"));
        assert_eq!(headers.get("content-type"), Some("text/plain"));
        assert_eq!(headers.get("CONTENT-TYPE"), Some("text/plain"));
        assert_eq!(headers.get("subject"), None);
    }

    #[test]
    fn test_headers_duplicates_preserve_order() {
        let mut headers = Headers::new();
        headers.push(Header::new("Received", "first"));
        headers.push(Header::new("To", "a@x.com"));
        headers.push(Header::new("Received", "second"));
        assert_eq!(headers.get("received"), Some("first"));
        assert_eq!(headers.get_all("Received"), ["first", "second"]);
        assert_eq!(headers.len(), 3);
    }

    #[test]
    fn test_headers_iter_order() {
        let mut headers = Headers::new();
        headers.push(Header::new("B", "2"));
        headers.push(Header::new("A", "1"));
        let names: Vec<&str> = headers.iter().map(Header::name).collect();
        assert_eq!(names, ["B", "A"]);
    }
}
