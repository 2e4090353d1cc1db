//! # mimetree
//!
//! MIME message parser producing an immutable part tree.
//!
//! ## Features
//!
//! - **Message parsing**: RFC 5322 header blocks with unfolding, nested
//!   multipart bodies, embedded `message/rfc822` parts
//! - **Addresses**: structured mailbox and group parsing for From, To,
//!   Cc, Bcc and Reply-To
//! - **Decoding**: Base64 and Quoted-Printable transfer encodings,
//!   RFC 2047 encoded-words, RFC 2231 parameter continuations, charset
//!   conversion to UTF-8
//! - **Lenient by default**: local anomalies are recorded as warnings on
//!   the parsed message instead of failing the parse
//!
//! ## Quick Start
//!
//! ```
//! let raw = b"From: sender@example.com\r\n\
//!             To: recipient@example.com\r\n\
//!             Subject: Test\r\n\
//!             Content-Type: text/plain\r\n\
//!             \r\n\
//!             Hello, World!";
//!
//! let message = mimetree::parse(raw)?;
//! assert_eq!(message.subject(), Some("Test"));
//! assert_eq!(message.root().text(), Some("Hello, World!"));
//! # Ok::<(), mimetree::Error>(())
//! ```
//!
//! ## Walking a multipart message
//!
//! ```
//! let raw = b"Content-Type: multipart/mixed; boundary=b\r\n\
//!             \r\n\
//!             --b\r\n\
//!             Content-Type: text/plain\r\n\
//!             \r\n\
//!             See attachment.\r\n\
//!             --b\r\n\
//!             Content-Type: application/pdf; name=report.pdf\r\n\
//!             Content-Disposition: attachment; filename=report.pdf\r\n\
//!             Content-Transfer-Encoding: base64\r\n\
//!             \r\n\
//!             JVBERi0=\r\n\
//!             --b--\r\n";
//!
//! let message = mimetree::parse(raw)?;
//! for (_, part) in message.walk() {
//!     if part.is_attachment() {
//!         println!("attachment: {:?}", part.filename());
//!     }
//! }
//! # Ok::<(), mimetree::Error>(())
//! ```
//!
//! ## Addresses
//!
//! ```
//! use mimetree::Role;
//!
//! let raw = b"From: Ann Example <ann@example.com>\r\n\r\nhi";
//! let message = mimetree::parse(raw)?;
//! let sender = message.from_address().unwrap();
//! assert_eq!(sender.addr_spec(), "ann@example.com");
//! assert_eq!(sender.display_name.as_deref(), Some("Ann Example"));
//! assert!(message.addresses(Role::Cc).is_empty());
//! # Ok::<(), mimetree::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod address;
mod charset;
mod content_type;
mod error;
mod header;
mod lines;
mod message;
mod parser;

pub mod encoding;

pub use address::{Address, Group, Mailbox, parse_address_list};
pub use content_type::{ContentDisposition, ContentType};
pub use encoding::TransferEncoding;
pub use error::{Error, Result, Warning, WarningKind};
pub use header::{Header, Headers};
pub use message::{Message, Part, PartBody, PartId, Role, Walk};
pub use parser::{DEFAULT_MAX_DEPTH, Parser, parse};
