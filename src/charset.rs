//! Charset conversion for text parts and encoded-words.

use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};

/// Looks up an encoding by its MIME charset label.
pub(crate) fn lookup(label: &str) -> Option<&'static Encoding> {
    Encoding::for_label(label.trim().as_bytes())
}

/// Decodes bytes into text, substituting replacement characters for
/// malformed sequences.
///
/// With no declared encoding the charset is sniffed: valid UTF-8 is taken
/// as-is, anything else falls back to WINDOWS-1252, which accepts every
/// byte. Returns the text and whether any substitution happened.
pub(crate) fn decode(encoding: Option<&'static Encoding>, bytes: &[u8]) -> (String, bool) {
    match encoding {
        Some(enc) => {
            let (text, _, had_errors) = enc.decode(bytes);
            (text.into_owned(), had_errors)
        }
        None => match std::str::from_utf8(bytes) {
            Ok(s) => (s.to_string(), false),
            Err(_) => {
                let (text, _, _) = WINDOWS_1252.decode(bytes);
                (text.into_owned(), false)
            }
        },
    }
}

/// Decodes with a charset label, falling back to UTF-8 sniffing for labels
/// `encoding_rs` does not know. Used for encoded-words, where an unknown
/// charset must not lose the header.
pub(crate) fn decode_lossy(label: &str, bytes: &[u8]) -> String {
    match lookup(label) {
        Some(enc) if enc != UTF_8 => {
            let (text, _, _) = enc.decode(bytes);
            text.into_owned()
        }
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_common_labels() {
        assert!(lookup("utf-8").is_some());
        assert!(lookup("UTF-8").is_some());
        assert!(lookup("iso-8859-1").is_some());
        assert!(lookup("us-ascii").is_some());
        assert!(lookup("windows-1252").is_some());
        assert!(lookup("no-such-charset").is_none());
    }

    #[test]
    fn test_decode_utf8() {
        let enc = lookup("utf-8");
        let (text, lossy) = decode(enc, "héllo".as_bytes());
        assert_eq!(text, "héllo");
        assert!(!lossy);
    }

    #[test]
    fn test_decode_latin1() {
        let (text, lossy) = decode(lookup("iso-8859-1"), &[b'c', b'a', b'f', 0xE9]);
        assert_eq!(text, "café");
        assert!(!lossy);
    }

    #[test]
    fn test_decode_malformed_utf8_substitutes() {
        let (text, lossy) = decode(lookup("utf-8"), &[b'a', 0xFF, b'b']);
        assert!(lossy);
        assert!(text.contains('\u{FFFD}'));
    }

    #[test]
    fn test_sniff_falls_back_to_windows_1252() {
        let (text, lossy) = decode(None, &[b'c', b'a', b'f', 0xE9]);
        assert_eq!(text, "café");
        assert!(!lossy);
    }

    #[test]
    fn test_decode_lossy_unknown_label() {
        assert_eq!(decode_lossy("x-unknown", b"plain"), "plain");
    }
}
