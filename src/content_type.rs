//! Content-Type and Content-Disposition parsing, including RFC 2231
//! parameter continuations.

use crate::charset;
use crate::error::{Error, Result};
use std::fmt;

/// MIME content type with an ordered parameter list.
///
/// Parameter order is preserved as parsed; duplicate keys keep their first
/// occurrence when queried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentType {
    /// Main type (e.g. "text", "image", "multipart"), lowercased.
    pub main_type: String,
    /// Subtype (e.g. "plain", "html", "jpeg"), lowercased.
    pub sub_type: String,
    /// Parameters in the order they appeared (e.g. charset, boundary).
    pub parameters: Vec<(String, String)>,
}

impl ContentType {
    /// Creates a new content type without parameters.
    #[must_use]
    pub fn new(main_type: impl Into<String>, sub_type: impl Into<String>) -> Self {
        Self {
            main_type: main_type.into(),
            sub_type: sub_type.into(),
            parameters: Vec::new(),
        }
    }

    /// The RFC 2045 default for an entity with no Content-Type header:
    /// `text/plain; charset=us-ascii`.
    #[must_use]
    pub fn default_text_plain() -> Self {
        let mut ct = Self::new("text", "plain");
        ct.parameters
            .push(("charset".to_string(), "us-ascii".to_string()));
        ct
    }

    /// Returns the first parameter with the given name, case-insensitively.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns the charset parameter if present.
    #[must_use]
    pub fn charset(&self) -> Option<&str> {
        self.parameter("charset")
    }

    /// Returns the boundary parameter if present.
    #[must_use]
    pub fn boundary(&self) -> Option<&str> {
        self.parameter("boundary")
    }

    /// Returns the name parameter if present.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.parameter("name")
    }

    /// Checks if this is a multipart content type.
    #[must_use]
    pub fn is_multipart(&self) -> bool {
        self.main_type == "multipart"
    }

    /// Checks if this is a text content type.
    #[must_use]
    pub fn is_text(&self) -> bool {
        self.main_type == "text"
    }

    /// Checks if this is an embedded message content type
    /// (`message/rfc822`).
    #[must_use]
    pub fn is_message(&self) -> bool {
        self.main_type == "message" && self.sub_type == "rfc822"
    }

    /// The canonical `type/subtype` string without parameters.
    #[must_use]
    pub fn mime_type(&self) -> String {
        format!("{}/{}", self.main_type, self.sub_type)
    }

    /// Parses a content type string.
    ///
    /// Format: `type/subtype; param1=value1; param2="quoted value"`.
    /// Quoted values may contain `;` and backslash escapes; RFC 2231
    /// continuations (`name*0*=`, `name*1*=`, ...) are reassembled.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidContentType`] if the leading `type/subtype`
    /// is missing or empty.
    pub fn parse(s: &str) -> Result<Self> {
        let segments = split_segments(s);
        let type_str = segments
            .first()
            .map(|s| s.trim())
            .ok_or_else(|| Error::InvalidContentType("empty content type".to_string()))?;

        let (main_type, sub_type) = type_str
            .split_once('/')
            .ok_or_else(|| Error::InvalidContentType(format!("missing subtype in {type_str:?}")))?;
        let main_type = main_type.trim().to_ascii_lowercase();
        let sub_type = sub_type.trim().to_ascii_lowercase();
        if main_type.is_empty() || sub_type.is_empty() {
            return Err(Error::InvalidContentType(format!(
                "empty type or subtype in {type_str:?}"
            )));
        }

        Ok(Self {
            main_type,
            sub_type,
            parameters: parse_parameters(&segments[1..]),
        })
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.main_type, self.sub_type)?;
        for (key, value) in &self.parameters {
            if value.contains(|c: char| c.is_whitespace() || "()<>@,;:\\\"/[]?=".contains(c)) {
                write!(f, "; {key}=\"{value}\"")?;
            } else {
                write!(f, "; {key}={value}")?;
            }
        }
        Ok(())
    }
}

/// Content-Disposition header value (RFC 2183).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDisposition {
    /// The disposition token ("inline", "attachment", ...), lowercased.
    pub disposition: String,
    /// Parameters in the order they appeared.
    pub parameters: Vec<(String, String)>,
}

impl ContentDisposition {
    /// Parses a content disposition string, with the same parameter
    /// handling as [`ContentType::parse`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidContentType`] if the disposition token is
    /// empty.
    pub fn parse(s: &str) -> Result<Self> {
        let segments = split_segments(s);
        let disposition = segments
            .first()
            .map(|s| s.trim().to_ascii_lowercase())
            .unwrap_or_default();
        if disposition.is_empty() {
            return Err(Error::InvalidContentType(
                "empty content disposition".to_string(),
            ));
        }
        Ok(Self {
            disposition,
            parameters: parse_parameters(&segments[1..]),
        })
    }

    /// Returns the first parameter with the given name, case-insensitively.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns the filename parameter if present.
    #[must_use]
    pub fn filename(&self) -> Option<&str> {
        self.parameter("filename")
    }

    /// Whether the disposition token is "attachment".
    #[must_use]
    pub fn is_attachment(&self) -> bool {
        self.disposition == "attachment"
    }

    /// Whether the disposition token is "inline".
    #[must_use]
    pub fn is_inline(&self) -> bool {
        self.disposition == "inline"
    }
}

/// Splits a header value on `;`, respecting quoted strings and backslash
/// escapes.
fn split_segments(s: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let bytes = s.as_bytes();
    let mut start = 0;
    let mut in_quotes = false;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\\' if in_quotes => i += 1,
            b'"' => in_quotes = !in_quotes,
            b';' if !in_quotes => {
                segments.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    segments.push(&s[start..]);
    segments
}

/// A parameter key split into its RFC 2231 pieces: `name*0*` has base
/// "name", section 0, and the extended (percent-encoded) marker.
struct ParamKey {
    base: String,
    section: Option<u32>,
    extended: bool,
}

impl ParamKey {
    fn classify(key: &str) -> Self {
        let (key, extended) = match key.strip_suffix('*') {
            Some(k) => (k, true),
            None => (key, false),
        };
        match key.rsplit_once('*') {
            Some((base, idx)) if !idx.is_empty() && idx.bytes().all(|b| b.is_ascii_digit()) => {
                Self {
                    base: base.to_ascii_lowercase(),
                    section: idx.parse().ok(),
                    extended,
                }
            }
            _ => Self {
                base: key.to_ascii_lowercase(),
                section: None,
                extended,
            },
        }
    }
}

struct RawParam {
    key: ParamKey,
    value: String,
}

/// Parses `key=value` segments into a final ordered parameter list,
/// reassembling RFC 2231 continuations and decoding extended values.
fn parse_parameters(segments: &[&str]) -> Vec<(String, String)> {
    let mut raw: Vec<RawParam> = Vec::new();
    for segment in segments {
        let Some((key, value)) = segment.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        raw.push(RawParam {
            key: ParamKey::classify(key),
            value: unquote(value.trim()),
        });
    }

    // Assemble in order of each base key's first appearance.
    let mut out: Vec<(String, String)> = Vec::new();
    let mut done: Vec<String> = Vec::new();
    for param in &raw {
        let base = &param.key.base;
        if done.iter().any(|d| d == base) {
            continue;
        }
        done.push(base.clone());

        let sections: Vec<&RawParam> = raw.iter().filter(|p| &p.key.base == base).collect();
        let value = if sections.len() == 1 && sections[0].key.section.is_none() {
            let p = sections[0];
            if p.extended() {
                decode_extended_value(&p.value, true)
            } else {
                p.value.clone()
            }
        } else {
            assemble_continuation(&sections)
        };
        out.push((base.clone(), value));
    }
    out
}

impl RawParam {
    const fn extended(&self) -> bool {
        self.key.extended
    }
}

/// Joins RFC 2231 continuation sections in index order.
fn assemble_continuation(sections: &[&RawParam]) -> String {
    let mut ordered: Vec<&&RawParam> = sections.iter().collect();
    ordered.sort_by_key(|p| p.key.section.unwrap_or(0));

    let mut value = String::new();
    for (i, p) in ordered.iter().enumerate() {
        if p.extended() {
            value.push_str(&decode_extended_value(&p.value, i == 0));
        } else {
            value.push_str(&p.value);
        }
    }
    value
}

/// Decodes an RFC 2231 extended value: an optional `charset'lang'` prefix
/// on the first section, then percent-encoded bytes.
fn decode_extended_value(value: &str, first_section: bool) -> String {
    let (label, data) = if first_section {
        let mut it = value.splitn(3, '\'');
        match (it.next(), it.next(), it.next()) {
            (Some(charset), Some(_lang), Some(rest)) => (Some(charset), rest),
            _ => (None, value),
        }
    } else {
        (None, value)
    };

    let bytes = percent_decode(data);
    match label.filter(|l| !l.is_empty()) {
        Some(l) => charset::decode_lossy(l, &bytes),
        None => String::from_utf8_lossy(&bytes).into_owned(),
    }
}

fn percent_decode(s: &str) -> Vec<u8> {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            if let (Some(h), Some(l)) = (
                bytes.get(i + 1).copied().and_then(hex_val),
                bytes.get(i + 2).copied().and_then(hex_val),
            ) {
                out.push((h << 4) | l);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    out
}

const fn hex_val(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'A'..=b'F' => Some(b - b'A' + 10),
        b'a'..=b'f' => Some(b - b'a' + 10),
        _ => None,
    }
}

/// Strips surrounding quotes and resolves backslash escapes.
fn unquote(value: &str) -> String {
    let Some(inner) = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
    else {
        return value.to_string();
    };
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple() {
        let ct = ContentType::parse("text/plain; charset=utf-8").unwrap();
        assert_eq!(ct.main_type, "text");
        assert_eq!(ct.sub_type, "plain");
        assert_eq!(ct.charset(), Some("utf-8"));
        assert_eq!(ct.mime_type(), "text/plain");
    }

    #[test]
    fn test_parse_case_folding() {
        let ct = ContentType::parse("Text/HTML; Charset=UTF-8").unwrap();
        assert_eq!(ct.mime_type(), "text/html");
        assert_eq!(ct.charset(), Some("UTF-8"));
    }

    #[test]
    fn test_parse_quoted_boundary() {
        let ct = ContentType::parse("multipart/mixed; boundary=\"----=_Part_123\"").unwrap();
        assert!(ct.is_multipart());
        assert_eq!(ct.boundary(), Some("----=_Part_123"));
    }

    #[test]
    fn test_quoted_value_with_semicolon() {
        let ct = ContentType::parse("application/pdf; name=\"a;b.pdf\"; x=1").unwrap();
        assert_eq!(ct.name(), Some("a;b.pdf"));
        assert_eq!(ct.parameter("x"), Some("1"));
    }

    #[test]
    fn test_quoted_value_with_escapes() {
        let ct = ContentType::parse(r#"application/pdf; name="a \"b\" c""#).unwrap();
        assert_eq!(ct.name(), Some("a \"b\" c"));
    }

    #[test]
    fn test_parameter_order_preserved() {
        let ct = ContentType::parse("text/plain; b=2; a=1; c=3").unwrap();
        let keys: Vec<&str> = ct.parameters.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["b", "a", "c"]);
    }

    #[test]
    fn test_parse_missing_subtype() {
        assert!(ContentType::parse("text").is_err());
        assert!(ContentType::parse("").is_err());
        assert!(ContentType::parse("/plain").is_err());
    }

    #[test]
    fn test_is_message() {
        let ct = ContentType::parse("message/rfc822").unwrap();
        assert!(ct.is_message());
        assert!(!ct.is_multipart());
    }

    #[test]
    fn test_default_text_plain() {
        let ct = ContentType::default_text_plain();
        assert_eq!(ct.mime_type(), "text/plain");
        assert_eq!(ct.charset(), Some("us-ascii"));
    }

    #[test]
    fn test_rfc2231_continuation() {
        let ct = ContentType::parse(
            "message/external-body; access-type=URL; \
             URL*0=\"ftp://\"; URL*1=\"cs.utk.edu/pub/moore/bulk-mailer/bulk-mailer.tar\"",
        )
        .unwrap();
        assert_eq!(
            ct.parameter("url"),
            Some("ftp://cs.utk.edu/pub/moore/bulk-mailer/bulk-mailer.tar")
        );
    }

    #[test]
    fn test_rfc2231_extended_continuation() {
        let ct = ContentType::parse(
            "application/x-stuff; \
             title*0*=us-ascii'en'This%20is%20even%20more%20; \
             title*1*=%2A%2A%2Afun%2A%2A%2A%20; \
             title*2=\"isn't it!\"",
        )
        .unwrap();
        assert_eq!(
            ct.parameter("title"),
            Some("This is even more ***fun*** isn't it!")
        );
    }

    #[test]
    fn test_rfc2231_extended_charset() {
        let ct =
            ContentType::parse("application/octet-stream; name*=utf-8''%E2%82%AC%20rates.txt")
                .unwrap();
        assert_eq!(ct.name(), Some("€ rates.txt"));
    }

    #[test]
    fn test_display_quotes_when_needed() {
        let mut ct = ContentType::new("text", "plain");
        ct.parameters
            .push(("charset".to_string(), "utf-8".to_string()));
        ct.parameters
            .push(("name".to_string(), "two words".to_string()));
        assert_eq!(ct.to_string(), "text/plain; charset=utf-8; name=\"two words\"");
    }

    #[test]
    fn test_disposition_attachment() {
        let cd = ContentDisposition::parse("attachment; filename=\"kien.jpg\"").unwrap();
        assert!(cd.is_attachment());
        assert_eq!(cd.filename(), Some("kien.jpg"));
    }

    #[test]
    fn test_disposition_inline() {
        let cd = ContentDisposition::parse("inline").unwrap();
        assert!(cd.is_inline());
        assert!(cd.filename().is_none());
    }

    #[test]
    fn test_disposition_empty_fails() {
        assert!(ContentDisposition::parse("").is_err());
    }
}
