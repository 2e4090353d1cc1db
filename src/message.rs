//! The parsed message model: an immutable header sequence, address lists,
//! and an arena-backed part tree.

use crate::address::{Address, Mailbox};
use crate::content_type::{ContentDisposition, ContentType};
use crate::encoding::TransferEncoding;
use crate::error::Warning;
use crate::header::Headers;

/// Index of a [`Part`] within its owning [`Message`] arena.
///
/// Identifiers are only meaningful for the message that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PartId(pub(crate) usize);

/// Address list roles a message exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// The From header.
    From,
    /// The To header.
    To,
    /// The Cc header.
    Cc,
    /// The Bcc header.
    Bcc,
    /// The Reply-To header.
    ReplyTo,
}

impl Role {
    pub(crate) const ALL: [Self; 5] = [Self::From, Self::To, Self::Cc, Self::Bcc, Self::ReplyTo];

    pub(crate) const fn header_name(self) -> &'static str {
        match self {
            Self::From => "From",
            Self::To => "To",
            Self::Cc => "Cc",
            Self::Bcc => "Bcc",
            Self::ReplyTo => "Reply-To",
        }
    }
}

/// Payload of a part. Exactly one case applies, determined by the part's
/// content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartBody {
    /// Leaf part with decoded bytes (transfer encoding resolved, charset
    /// not applicable or unrecognized).
    Bytes(Vec<u8>),
    /// Leaf text part: charset-decoded text plus the decoded bytes it came
    /// from.
    Text {
        /// Charset-decoded text.
        text: String,
        /// The bytes after transfer-encoding decode, before charset
        /// conversion.
        raw: Vec<u8>,
    },
    /// Multipart container with child parts in original order.
    Multipart(Vec<PartId>),
    /// Embedded `message/rfc822`, wrapping the embedded message's root
    /// part as a single child.
    Message(PartId),
}

/// A node in the MIME part tree.
#[derive(Debug, Clone)]
pub struct Part {
    pub(crate) headers: Headers,
    pub(crate) content_type: ContentType,
    pub(crate) transfer_encoding: TransferEncoding,
    pub(crate) disposition: Option<ContentDisposition>,
    pub(crate) body: PartBody,
    pub(crate) parent: Option<PartId>,
}

impl Part {
    /// Headers scoped to this part.
    #[must_use]
    pub const fn headers(&self) -> &Headers {
        &self.headers
    }

    /// The part's content type (defaulted to `text/plain; charset=us-ascii`
    /// when the header was absent).
    #[must_use]
    pub const fn content_type(&self) -> &ContentType {
        &self.content_type
    }

    /// The canonical `type/subtype` string.
    #[must_use]
    pub fn content_type_string(&self) -> String {
        self.content_type.mime_type()
    }

    /// The part's transfer encoding.
    #[must_use]
    pub const fn transfer_encoding(&self) -> TransferEncoding {
        self.transfer_encoding
    }

    /// The parsed Content-Disposition header, if present.
    #[must_use]
    pub const fn disposition(&self) -> Option<&ContentDisposition> {
        self.disposition.as_ref()
    }

    /// The part's payload.
    #[must_use]
    pub const fn body(&self) -> &PartBody {
        &self.body
    }

    /// The parent part, if this is not the root.
    #[must_use]
    pub const fn parent(&self) -> Option<PartId> {
        self.parent
    }

    /// Whether this is a decoded leaf text part.
    #[must_use]
    pub const fn is_text(&self) -> bool {
        matches!(self.body, PartBody::Text { .. })
    }

    /// Whether this is a multipart container.
    #[must_use]
    pub const fn is_multipart(&self) -> bool {
        matches!(self.body, PartBody::Multipart(_))
    }

    /// Decoded text, present only for leaf text parts.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match &self.body {
            PartBody::Text { text, .. } => Some(text),
            _ => None,
        }
    }

    /// Decoded payload bytes (transfer encoding resolved, charset
    /// conversion not applied) for any leaf part.
    #[must_use]
    pub fn raw_bytes(&self) -> Option<&[u8]> {
        match &self.body {
            PartBody::Bytes(bytes) => Some(bytes),
            PartBody::Text { raw, .. } => Some(raw),
            PartBody::Multipart(_) | PartBody::Message(_) => None,
        }
    }

    /// Child part ids, in original order. Empty for leaf parts.
    #[must_use]
    pub fn children(&self) -> &[PartId] {
        match &self.body {
            PartBody::Multipart(children) => children,
            PartBody::Message(child) => std::slice::from_ref(child),
            _ => &[],
        }
    }

    /// Whether the part is an attachment: disposition "attachment", or
    /// "inline" with a filename (an inline image saved under a name).
    #[must_use]
    pub fn is_attachment(&self) -> bool {
        match &self.disposition {
            Some(d) if d.is_attachment() => true,
            Some(d) if d.is_inline() => self.filename().is_some(),
            _ => false,
        }
    }

    /// Filename from Content-Disposition, falling back to the Content-Type
    /// name parameter.
    #[must_use]
    pub fn filename(&self) -> Option<&str> {
        self.disposition
            .as_ref()
            .and_then(ContentDisposition::filename)
            .or_else(|| self.content_type.name())
    }
}

/// A parsed MIME message.
///
/// Created by [`parse`](crate::parse) and read-only thereafter: the header
/// sequence, address lists, and part tree are fixed at parse time. The part
/// tree is stored as an arena indexed by [`PartId`], so dropping the
/// message frees the whole graph.
#[derive(Debug, Clone)]
pub struct Message {
    pub(crate) headers: Headers,
    pub(crate) addresses: Vec<(Role, Vec<Address>)>,
    pub(crate) parts: Vec<Part>,
    pub(crate) root: PartId,
    pub(crate) warnings: Vec<Warning>,
}

impl Message {
    /// The message's headers, in original order.
    #[must_use]
    pub const fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Decoded value of the first header with the given name,
    /// case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// Decoded values of all headers with the given name, in order.
    #[must_use]
    pub fn header_all(&self, name: &str) -> Vec<&str> {
        self.headers.get_all(name)
    }

    /// The Subject header, decoded.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.header("Subject")
    }

    /// The Date header, raw.
    #[must_use]
    pub fn date(&self) -> Option<&str> {
        self.header("Date")
    }

    /// The Message-ID header.
    #[must_use]
    pub fn message_id(&self) -> Option<&str> {
        self.header("Message-ID")
    }

    /// The parsed address list for a role. Empty when the header is absent
    /// or held no parseable address.
    #[must_use]
    pub fn addresses(&self, role: Role) -> &[Address] {
        self.addresses
            .iter()
            .find(|(r, _)| *r == role)
            .map_or(&[], |(_, addrs)| addrs.as_slice())
    }

    /// The first From mailbox.
    ///
    /// When the first From entry is a group, this is the group's first
    /// member. Returns `None` for a missing From header, an empty list,
    /// or an empty group — never an out-of-bounds access.
    #[must_use]
    pub fn from_address(&self) -> Option<&Mailbox> {
        self.addresses(Role::From)
            .first()
            .and_then(Address::first_mailbox)
    }

    /// Id of the root part.
    #[must_use]
    pub const fn root_id(&self) -> PartId {
        self.root
    }

    /// The root part.
    #[must_use]
    pub fn root(&self) -> &Part {
        self.part(self.root)
    }

    /// Looks up a part by id.
    ///
    /// # Panics
    ///
    /// Panics if `id` came from a different message.
    #[must_use]
    pub fn part(&self, id: PartId) -> &Part {
        &self.parts[id.0]
    }

    /// Depth-first, parent-first traversal over the part tree, starting at
    /// the root.
    #[must_use]
    pub fn walk(&self) -> Walk<'_> {
        Walk {
            message: self,
            stack: vec![self.root],
        }
    }

    /// Parts matching a predicate, in traversal order.
    pub fn find_parts<'a, P>(&'a self, predicate: P) -> impl Iterator<Item = (PartId, &'a Part)>
    where
        P: Fn(&Part) -> bool + 'a,
    {
        self.walk().filter(move |(_, part)| predicate(part))
    }

    /// All leaf text parts, in traversal order.
    pub fn text_parts(&self) -> impl Iterator<Item = (PartId, &Part)> {
        self.find_parts(Part::is_text)
    }

    /// Warnings recorded while parsing this message.
    #[must_use]
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }
}

/// Iterator over a message's parts, depth-first and parent-first.
pub struct Walk<'a> {
    message: &'a Message,
    stack: Vec<PartId>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = (PartId, &'a Part);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        let part = self.message.part(id);
        for &child in part.children().iter().rev() {
            self.stack.push(child);
        }
        Some((id, part))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::parse;

    #[test]
    fn test_walk_order_parent_first() {
        let raw = b"Content-Type: multipart/mixed; boundary=X\r\n\r\n\
            --X\r\nContent-Type: text/plain\r\n\r\none\r\n\
            --X\r\nContent-Type: text/html\r\n\r\n<p>two</p>\r\n\
            --X--\r\n";
        let message = parse(raw).unwrap();
        let types: Vec<String> = message
            .walk()
            .map(|(_, p)| p.content_type_string())
            .collect();
        assert_eq!(types, ["multipart/mixed", "text/plain", "text/html"]);
    }

    #[test]
    fn test_part_parent_links() {
        let raw = b"Content-Type: multipart/mixed; boundary=X\r\n\r\n\
            --X\r\n\r\none\r\n--X--\r\n";
        let message = parse(raw).unwrap();
        let root_id = message.root_id();
        assert!(message.root().parent().is_none());
        let child_id = message.root().children()[0];
        assert_eq!(message.part(child_id).parent(), Some(root_id));
    }

    #[test]
    fn test_find_parts_predicate() {
        let raw = b"Content-Type: multipart/mixed; boundary=X\r\n\r\n\
            --X\r\nContent-Type: text/plain\r\n\r\nhi\r\n\
            --X\r\nContent-Type: application/pdf\r\nContent-Transfer-Encoding: base64\r\n\r\nAAEC\r\n\
            --X--\r\n";
        let message = parse(raw).unwrap();
        let texts: Vec<&str> = message.text_parts().filter_map(|(_, p)| p.text()).collect();
        assert_eq!(texts, ["hi"]);
        let pdfs: Vec<_> = message
            .find_parts(|p| p.content_type_string() == "application/pdf")
            .collect();
        assert_eq!(pdfs.len(), 1);
        assert_eq!(pdfs[0].1.raw_bytes(), Some(&[0u8, 1, 2][..]));
    }

    #[test]
    fn test_header_accessors() {
        let raw = b"Subject: Hi\r\nReceived: one\r\nReceived: two\r\n\r\nbody";
        let message = parse(raw).unwrap();
        assert_eq!(message.subject(), Some("Hi"));
        assert_eq!(message.header_all("received"), ["one", "two"]);
        assert_eq!(message.header("absent"), None);
    }
}
