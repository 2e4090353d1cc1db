//! Header/body tokenizer: line splitting and RFC 5322 unfolding.

use crate::error::{Error, Result};

/// Splits raw message bytes into unfolded logical header lines and the body.
///
/// The header block ends at the first blank line; everything after it is the
/// body, returned as a borrowed slice. Folded continuation lines (leading
/// space or tab, RFC 5322 §2.2.3) are appended to the previous logical line
/// with the fold collapsed to a single space. CRLF and bare LF line endings
/// are both accepted, including mixed within one message.
///
/// Input without a blank-line separator is treated as a header-only message
/// with an empty body, and empty input is a degenerate valid message with
/// zero headers. A continuation line before any header line fails with
/// [`Error::MalformedHeaderBlock`].
pub(crate) fn split_message(bytes: &[u8]) -> Result<(Vec<Vec<u8>>, &[u8])> {
    let mut lines: Vec<Vec<u8>> = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let (line, next) = next_line(bytes, pos);
        if line.is_empty() {
            return Ok((lines, &bytes[next..]));
        }
        if line[0] == b' ' || line[0] == b'\t' {
            let Some(prev) = lines.last_mut() else {
                return Err(Error::MalformedHeaderBlock(
                    "continuation line before any header line".to_string(),
                ));
            };
            prev.push(b' ');
            prev.extend_from_slice(trim_leading_ws(line));
        } else {
            lines.push(line.to_vec());
        }
        pos = next;
    }

    // No separator: the whole input was headers.
    Ok((lines, &[]))
}

/// Returns the line starting at `pos` (without its line ending) and the
/// offset of the next line.
fn next_line(bytes: &[u8], pos: usize) -> (&[u8], usize) {
    let rest = &bytes[pos..];
    match rest.iter().position(|&b| b == b'\n') {
        Some(nl) => {
            let mut end = nl;
            if end > 0 && rest[end - 1] == b'\r' {
                end -= 1;
            }
            (&rest[..end], pos + nl + 1)
        }
        None => {
            let mut end = rest.len();
            if end > 0 && rest[end - 1] == b'\r' {
                end -= 1;
            }
            (&rest[..end], bytes.len())
        }
    }
}

fn trim_leading_ws(line: &[u8]) -> &[u8] {
    let start = line
        .iter()
        .position(|&b| b != b' ' && b != b'\t')
        .unwrap_or(line.len());
    &line[start..]
}
