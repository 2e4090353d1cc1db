//! Transfer-encoding codecs: Base64, Quoted-Printable, RFC 2047
//! encoded-words.

use crate::charset;
use crate::error::Result;
use base64::Engine;
use base64::engine::DecodePaddingMode;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD};
use std::fmt;
use std::fmt::Write as _;

/// Base64 engine for mail bodies: standard alphabet, but tolerant of
/// missing padding and stray trailing bits, which real-world messages
/// produce routinely.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &base64::alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Content-Transfer-Encoding values (RFC 2045 §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEncoding {
    /// 7-bit ASCII.
    SevenBit,
    /// 8-bit text.
    EightBit,
    /// Base64 encoding.
    Base64,
    /// Quoted-Printable encoding.
    QuotedPrintable,
    /// Binary (no encoding).
    Binary,
}

impl TransferEncoding {
    /// Parses a transfer encoding token, case-insensitively.
    ///
    /// Returns `None` for values outside the RFC 2045 set; the caller
    /// decides how to degrade (the parser treats unknown values as
    /// [`Binary`](Self::Binary) and records a warning).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "7bit" => Some(Self::SevenBit),
            "8bit" => Some(Self::EightBit),
            "base64" => Some(Self::Base64),
            "quoted-printable" => Some(Self::QuotedPrintable),
            "binary" => Some(Self::Binary),
            _ => None,
        }
    }

    /// Whether the encoding is an identity transform on the body bytes.
    #[must_use]
    pub const fn is_identity(self) -> bool {
        !matches!(self, Self::Base64 | Self::QuotedPrintable)
    }
}

impl fmt::Display for TransferEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SevenBit => write!(f, "7bit"),
            Self::EightBit => write!(f, "8bit"),
            Self::Base64 => write!(f, "base64"),
            Self::QuotedPrintable => write!(f, "quoted-printable"),
            Self::Binary => write!(f, "binary"),
        }
    }
}

/// Encodes data as Base64.
#[must_use]
pub fn encode_base64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Decodes Base64 data, ignoring embedded whitespace.
///
/// # Errors
///
/// Returns [`Error::InvalidBase64`] if non-alphabet characters remain after
/// whitespace stripping.
pub fn decode_base64(data: &[u8]) -> Result<Vec<u8>> {
    let cleaned: Vec<u8> = data
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    LENIENT.decode(&cleaned).map_err(Into::into)
}

/// Maximum line length for Quoted-Printable encoding.
const MAX_LINE_LENGTH: usize = 76;

/// Encodes text using Quoted-Printable encoding (RFC 2045 §6.7).
#[must_use]
pub fn encode_quoted_printable(text: &str) -> String {
    let mut result = String::new();
    let mut line_length = 0;

    for byte in text.as_bytes() {
        // Soft line break before the line overflows
        if line_length >= MAX_LINE_LENGTH - 3 {
            result.push_str("=\r\n");
            line_length = 0;
        }

        match byte {
            // Printable ASCII except '='
            b'!'..=b'<' | b'>'..=b'~' => {
                result.push(*byte as char);
                line_length += 1;
            }
            // Space must not end a line
            b' ' => {
                if line_length >= MAX_LINE_LENGTH - 1 {
                    result.push_str("=20");
                    line_length += 3;
                } else {
                    result.push(' ');
                    line_length += 1;
                }
            }
            _ => {
                result.push('=');
                let _ = write!(result, "{byte:02X}");
                line_length += 3;
            }
        }
    }

    result
}

/// Decodes Quoted-Printable data (RFC 2045 §6.7).
///
/// Soft line breaks (`=` at end of line) are removed and `=XX` hex escapes
/// are resolved. Invalid escapes pass through literally, so decoding never
/// fails.
#[must_use]
pub fn decode_quoted_printable(data: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(data.len());
    let mut i = 0;

    while i < data.len() {
        let b = data[i];
        if b != b'=' {
            result.push(b);
            i += 1;
            continue;
        }
        // Soft line break: "=\r\n" or "=\n"
        match data.get(i + 1) {
            Some(b'\r') if data.get(i + 2) == Some(&b'\n') => {
                i += 3;
            }
            Some(b'\n') => {
                i += 2;
            }
            Some(&hi) => {
                let lo = data.get(i + 2).copied();
                match (hex_val(hi), lo.and_then(hex_val)) {
                    (Some(h), Some(l)) => {
                        result.push((h << 4) | l);
                        i += 3;
                    }
                    _ => {
                        result.push(b'=');
                        i += 1;
                    }
                }
            }
            None => {
                result.push(b'=');
                i += 1;
            }
        }
    }

    result
}

const fn hex_val(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'A'..=b'F' => Some(b - b'A' + 10),
        b'a'..=b'f' => Some(b - b'a' + 10),
        _ => None,
    }
}

/// Encodes a header value using RFC 2047 Base64 encoding if it contains
/// characters that need it.
#[must_use]
pub fn encode_rfc2047(text: &str, charset: &str) -> String {
    if text.chars().all(|c| c.is_ascii() && c != '=' && c != '?') {
        return text.to_string();
    }
    let encoded = encode_base64(text.as_bytes());
    format!("=?{charset}?B?{encoded}?=")
}

/// Decodes RFC 2047 encoded-words anywhere in a header value.
///
/// Handles multiple words, joins adjacent encoded-words across intervening
/// whitespace (RFC 2047 §6.2), and leaves anything it cannot decode in
/// place, so decoding is idempotent on already-decoded text.
#[must_use]
pub fn decode_rfc2047(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut remaining = input;
    let mut last_was_encoded = false;

    while let Some(start) = remaining.find("=?") {
        let before = &remaining[..start];
        // Whitespace between two encoded-words is transparent
        if !last_was_encoded || !before.trim().is_empty() {
            result.push_str(before);
        }

        let after_marker = &remaining[start + 2..];
        if let Some(word) = decode_one_word(after_marker) {
            result.push_str(&word.text);
            remaining = &after_marker[word.consumed..];
            last_was_encoded = true;
        } else {
            result.push_str("=?");
            remaining = after_marker;
            last_was_encoded = false;
        }
    }

    result.push_str(remaining);
    result
}

struct DecodedWord {
    text: String,
    /// Bytes consumed after the leading `=?`.
    consumed: usize,
}

/// Decodes a single `charset?encoding?data?=` tail (the `=?` marker is
/// already consumed).
fn decode_one_word(s: &str) -> Option<DecodedWord> {
    let first_q = s.find('?')?;
    let charset = &s[..first_q];

    let rest = &s[first_q + 1..];
    let second_q = rest.find('?')?;
    let encoding = &rest[..second_q];

    let data = &rest[second_q + 1..];
    let end = data.find("?=")?;
    let encoded_text = &data[..end];

    let bytes = match encoding {
        "B" | "b" => decode_base64(encoded_text.as_bytes()).ok()?,
        "Q" | "q" => decode_quoted_printable(encoded_text.replace('_', " ").as_bytes()),
        _ => return None,
    };

    // An RFC 2231 language suffix may trail the charset (RFC 2047 §5)
    let charset = charset.split('*').next().unwrap_or(charset);
    let text = charset::decode_lossy(charset, &bytes);

    Some(DecodedWord {
        text,
        consumed: first_q + 1 + second_q + 1 + end + 2,
    })
}
