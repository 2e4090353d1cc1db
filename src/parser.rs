//! The parse pipeline: tokenize, parse headers, assemble the part tree,
//! decode part bodies.

use crate::address::{Address, parse_address_list};
use crate::charset;
use crate::content_type::{ContentDisposition, ContentType};
use crate::encoding::{self, TransferEncoding};
use crate::error::{Error, Result, Warning, WarningKind};
use crate::header::{Header, Headers};
use crate::lines;
use crate::message::{Message, Part, PartBody, PartId, Role};
use tracing::{debug, warn};

/// Default bound on multipart/embedded-message nesting.
pub const DEFAULT_MAX_DEPTH: usize = 100;

/// Parses a MIME message with the default configuration.
///
/// # Errors
///
/// Returns a structural [`Error`] when no usable message can be built:
/// a broken header block, a multipart content type without a boundary, or
/// nesting past the default depth limit. Local anomalies do not fail the
/// parse; they are recorded on the message (see
/// [`Message::warnings`]).
pub fn parse(bytes: &[u8]) -> Result<Message> {
    Parser::new().parse(bytes)
}

/// Configurable message parser.
///
/// Parsing is a pure, synchronous computation: the parser holds no state
/// across calls and the returned [`Message`] borrows nothing from the
/// input buffer, so independent messages may be parsed concurrently.
#[derive(Debug, Clone, Copy)]
pub struct Parser {
    max_depth: usize,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    /// Creates a parser with the default nesting limit.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Sets the bound on nested multipart/embedded-message containers.
    /// Nesting exactly at the limit parses; one level past it fails with
    /// [`Error::NestingTooDeep`].
    #[must_use]
    pub const fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Parses a MIME message.
    ///
    /// # Errors
    ///
    /// See [`parse`].
    pub fn parse(&self, bytes: &[u8]) -> Result<Message> {
        let mut assembler = Assembler {
            max_depth: self.max_depth,
            parts: Vec::new(),
            warnings: Vec::new(),
        };
        let root = assembler.entity(bytes, None, 0)?;

        let headers = assembler.parts[root.0].headers.clone();
        let addresses = collect_addresses(&headers, &mut assembler.warnings);

        debug!(
            parts = assembler.parts.len(),
            warnings = assembler.warnings.len(),
            "message parsed"
        );

        Ok(Message {
            headers,
            addresses,
            parts: assembler.parts,
            root,
            warnings: assembler.warnings,
        })
    }
}

/// Parses each role's address headers into structured lists.
fn collect_addresses(headers: &Headers, warnings: &mut Vec<Warning>) -> Vec<(Role, Vec<Address>)> {
    Role::ALL
        .into_iter()
        .map(|role| {
            let mut list = Vec::new();
            for value in headers.get_all(role.header_name()) {
                let (addresses, warns) = parse_address_list(value);
                list.extend(addresses);
                warnings.extend(warns);
            }
            (role, list)
        })
        .collect()
}

/// Builds the part arena for one message.
struct Assembler {
    max_depth: usize,
    parts: Vec<Part>,
    warnings: Vec<Warning>,
}

impl Assembler {
    /// Parses one entity (a whole message or one multipart chunk): header
    /// block, then body assembly.
    fn entity(&mut self, bytes: &[u8], parent: Option<PartId>, depth: usize) -> Result<PartId> {
        let (raw_lines, body) = lines::split_message(bytes)?;
        let mut headers = Headers::new();
        for line in &raw_lines {
            let (header, warning) = Header::parse_line(line);
            if let Some(warning) = warning {
                self.warnings.push(warning);
            }
            headers.push(header);
        }
        self.assemble(headers, body, parent, depth)
    }

    fn assemble(
        &mut self,
        headers: Headers,
        body: &[u8],
        parent: Option<PartId>,
        depth: usize,
    ) -> Result<PartId> {
        let content_type = self.content_type(&headers);
        let transfer_encoding = self.transfer_encoding(&headers);
        let disposition = self.disposition(&headers);

        if content_type.is_multipart() {
            if depth + 1 > self.max_depth {
                return Err(Error::NestingTooDeep {
                    limit: self.max_depth,
                });
            }
            let boundary = content_type
                .boundary()
                .ok_or(Error::MissingBoundary)?
                .to_string();
            let id = self.push_part(
                headers,
                content_type,
                transfer_encoding,
                disposition,
                PartBody::Multipart(Vec::new()),
                parent,
            );
            let (chunks, closed) = split_multipart(body, &boundary);
            if !closed {
                self.warnings
                    .push(Warning::new(WarningKind::MissingClosingBoundary, boundary));
            }
            let mut children = Vec::with_capacity(chunks.len());
            for chunk in chunks {
                children.push(self.entity(chunk, Some(id), depth + 1)?);
            }
            self.parts[id.0].body = PartBody::Multipart(children);
            return Ok(id);
        }

        if content_type.is_message() {
            if depth + 1 > self.max_depth {
                return Err(Error::NestingTooDeep {
                    limit: self.max_depth,
                });
            }
            let decoded = self.decode_transfer(transfer_encoding, body);
            let id = self.push_part(
                headers,
                content_type,
                transfer_encoding,
                disposition,
                PartBody::Bytes(Vec::new()),
                parent,
            );
            let child = self.entity(&decoded, Some(id), depth + 1)?;
            self.parts[id.0].body = PartBody::Message(child);
            return Ok(id);
        }

        let decoded = self.decode_transfer(transfer_encoding, body);
        let body = self.decode_leaf(&content_type, decoded);
        Ok(self.push_part(
            headers,
            content_type,
            transfer_encoding,
            disposition,
            body,
            parent,
        ))
    }

    /// Content-Type with the RFC 2045 default and permissive fallback for
    /// unparseable values. Read from the raw header value: encoded-words
    /// have no business inside structural headers.
    fn content_type(&mut self, headers: &Headers) -> ContentType {
        let Some(value) = structural_value(headers, "Content-Type") else {
            return ContentType::default_text_plain();
        };
        match ContentType::parse(&value) {
            Ok(ct) => ct,
            Err(err) => {
                warn!(value = %value, error = %err, "unparseable content type");
                self.warnings
                    .push(Warning::new(WarningKind::MalformedHeader, value));
                ContentType::default_text_plain()
            }
        }
    }

    fn transfer_encoding(&mut self, headers: &Headers) -> TransferEncoding {
        let Some(value) = structural_value(headers, "Content-Transfer-Encoding") else {
            return TransferEncoding::SevenBit;
        };
        TransferEncoding::parse(&value).unwrap_or_else(|| {
            warn!(value = %value, "unknown transfer encoding, treating as binary");
            self.warnings
                .push(Warning::new(WarningKind::UnknownTransferEncoding, value));
            TransferEncoding::Binary
        })
    }

    fn disposition(&mut self, headers: &Headers) -> Option<ContentDisposition> {
        let value = structural_value(headers, "Content-Disposition")?;
        match ContentDisposition::parse(&value) {
            Ok(cd) => Some(cd),
            Err(_) => {
                self.warnings
                    .push(Warning::new(WarningKind::MalformedHeader, value));
                None
            }
        }
    }

    /// Resolves the transfer encoding. A base64 body that will not decode
    /// keeps its raw bytes with a warning; a single bad attachment must
    /// not fail the message.
    fn decode_transfer(&mut self, transfer_encoding: TransferEncoding, body: &[u8]) -> Vec<u8> {
        match transfer_encoding {
            TransferEncoding::Base64 => match encoding::decode_base64(body) {
                Ok(decoded) => decoded,
                Err(err) => {
                    warn!(error = %err, "base64 body failed to decode, keeping raw bytes");
                    self.warnings
                        .push(Warning::new(WarningKind::InvalidBase64Body, err.to_string()));
                    body.to_vec()
                }
            },
            TransferEncoding::QuotedPrintable => encoding::decode_quoted_printable(body),
            _ => body.to_vec(),
        }
    }

    /// Charset-decodes `text/*` leaves; everything else stays bytes. An
    /// unknown charset label leaves the part as bytes rather than guessing.
    fn decode_leaf(&mut self, content_type: &ContentType, decoded: Vec<u8>) -> PartBody {
        if !content_type.is_text() {
            return PartBody::Bytes(decoded);
        }
        match content_type.charset() {
            Some(label) => match charset::lookup(label) {
                Some(enc) => {
                    let (text, lossy) = charset::decode(Some(enc), &decoded);
                    if lossy {
                        self.warnings.push(Warning::new(
                            WarningKind::CharsetSubstitution,
                            label.to_string(),
                        ));
                    }
                    PartBody::Text { text, raw: decoded }
                }
                None => {
                    warn!(charset = label, "unknown charset, keeping part as bytes");
                    self.warnings
                        .push(Warning::new(WarningKind::UnknownCharset, label.to_string()));
                    PartBody::Bytes(decoded)
                }
            },
            None => {
                let (text, _) = charset::decode(None, &decoded);
                PartBody::Text { text, raw: decoded }
            }
        }
    }

    fn push_part(
        &mut self,
        headers: Headers,
        content_type: ContentType,
        transfer_encoding: TransferEncoding,
        disposition: Option<ContentDisposition>,
        body: PartBody,
        parent: Option<PartId>,
    ) -> PartId {
        let id = PartId(self.parts.len());
        self.parts.push(Part {
            headers,
            content_type,
            transfer_encoding,
            disposition,
            body,
            parent,
        });
        id
    }
}

/// MIME structural headers are read from the raw value: RFC 2047 decoding
/// applies to human-readable text, not to boundaries or filenames' outer
/// syntax.
fn structural_value(headers: &Headers, name: &str) -> Option<String> {
    headers
        .get_header(name)
        .map(|h| String::from_utf8_lossy(h.raw()).trim().to_string())
}

enum Delimiter {
    Open,
    Close,
}

/// Splits a multipart body on its boundary delimiter lines.
///
/// Returns the raw chunks between delimiters (preamble and epilogue
/// discarded, the line break owned by each delimiter stripped) and whether
/// the closing `--boundary--` was seen.
fn split_multipart<'a>(body: &'a [u8], boundary: &str) -> (Vec<&'a [u8]>, bool) {
    let delim = format!("--{boundary}").into_bytes();
    let mut chunks = Vec::new();
    let mut chunk_start: Option<usize> = None;
    let mut pos = 0;

    while pos < body.len() {
        let line_end = body[pos..]
            .iter()
            .position(|&b| b == b'\n')
            .map_or(body.len(), |i| pos + i + 1);
        if let Some(kind) = classify_delimiter(&body[pos..line_end], &delim) {
            if let Some(start) = chunk_start.take() {
                chunks.push(strip_trailing_newline(&body[start..pos]));
            }
            match kind {
                Delimiter::Open => chunk_start = Some(line_end),
                Delimiter::Close => return (chunks, true),
            }
        }
        pos = line_end;
    }

    // No closing delimiter: the final part runs to the end of the body
    if let Some(start) = chunk_start {
        chunks.push(&body[start..]);
    }
    (chunks, false)
}

/// A delimiter line is `--boundary` or `--boundary--`, optionally followed
/// by linear whitespace.
fn classify_delimiter(line: &[u8], delim: &[u8]) -> Option<Delimiter> {
    let mut rest = line.strip_prefix(delim)?;
    while let Some((&last, head)) = rest.split_last() {
        if matches!(last, b'\r' | b'\n' | b' ' | b'\t') {
            rest = head;
        } else {
            break;
        }
    }
    match rest {
        b"" => Some(Delimiter::Open),
        b"--" => Some(Delimiter::Close),
        _ => None,
    }
}

/// The line break before a delimiter belongs to the delimiter, not to the
/// preceding part.
fn strip_trailing_newline(chunk: &[u8]) -> &[u8] {
    if let Some(head) = chunk.strip_suffix(b"\r\n") {
        head
    } else if let Some(head) = chunk.strip_suffix(b"\n") {
        head
    } else {
        chunk
    }
}
