//! Error and diagnostic types for MIME parsing.

/// Result type alias for MIME parsing operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Structural parse errors.
///
/// These are the failures that make it impossible to build a usable
/// [`Message`](crate::Message): the top-level parse aborts and no partial
/// message is returned. Minor non-conformance (a bad header line, an
/// unparseable address) never surfaces here; it is recorded as a [`Warning`]
/// on the message instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The header block is structurally broken (e.g. a folded continuation
    /// line with no header line before it).
    #[error("malformed header block: {0}")]
    MalformedHeaderBlock(String),

    /// A multipart content type without a boundary parameter.
    #[error("missing boundary parameter in multipart content type")]
    MissingBoundary,

    /// Multipart/embedded-message nesting exceeded the configured limit.
    #[error("nesting exceeds the limit of {limit}")]
    NestingTooDeep {
        /// The configured nesting limit that was exceeded.
        limit: usize,
    },

    /// Base64 input contains non-alphabet characters after whitespace
    /// stripping.
    #[error("invalid base64: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    /// A content type string that cannot be parsed at all.
    #[error("invalid content type: {0}")]
    InvalidContentType(String),
}

/// A recoverable anomaly recorded while parsing a message.
///
/// Real-world mail routinely contains minor non-conformance; the parser
/// continues past these and attaches them to the resulting message, where
/// [`Message::warnings`](crate::Message::warnings) exposes them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    /// What kind of anomaly was encountered.
    pub kind: WarningKind,
    /// The offending input, or a short description of it.
    pub detail: String,
}

impl Warning {
    pub(crate) fn new(kind: WarningKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }
}

/// Enumerated warning kinds, so callers can branch without string matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum WarningKind {
    /// A header line that is not `name: value` with a valid RFC 5322 name.
    /// The line is kept verbatim in the header sequence.
    MalformedHeader,
    /// An individual address in an address list that could not be parsed.
    /// The address is skipped.
    InvalidAddress,
    /// A `Content-Transfer-Encoding` value outside the RFC 2045 set.
    /// The body is treated as binary.
    UnknownTransferEncoding,
    /// A charset label `encoding_rs` has no encoding for. The part is kept
    /// as raw bytes.
    UnknownCharset,
    /// Charset conversion hit malformed sequences and substituted
    /// replacement characters.
    CharsetSubstitution,
    /// A multipart body without a closing `--boundary--` delimiter. The
    /// final part runs to the end of the body.
    MissingClosingBoundary,
    /// A base64 body that failed to decode. The part keeps its undecoded
    /// bytes.
    InvalidBase64Body,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::MissingBoundary;
        assert_eq!(
            err.to_string(),
            "missing boundary parameter in multipart content type"
        );

        let err = Error::NestingTooDeep { limit: 100 };
        assert!(err.to_string().contains("100"));
    }

    #[test]
    fn test_warning_new() {
        let w = Warning::new(WarningKind::InvalidAddress, "not an address");
        assert_eq!(w.kind, WarningKind::InvalidAddress);
        assert_eq!(w.detail, "not an address");
    }
}
