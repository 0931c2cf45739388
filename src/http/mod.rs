//! HTTP/1.x parsing
//!
//! The core is [`Parser`], an incremental state machine that accepts input in
//! arbitrary pieces and reports message structure through a [`Handler`]. It
//! owns no I/O and no threads. Around it sit:
//!
//! - [`parse_url`]: one-shot splitting of a request target into schema,
//!   host, port, path, query, fragment and userinfo
//! - [`MessageAssembler`]: a handler that builds whole [`HttpRequest`] and
//!   [`HttpResponse`] records
//! - [`MessageReader`]: a blocking driver over any `std::io::Read`
//!
//! # Examples
//!
//! ```
//! use h1feed::http::{Message, MessageAssembler, MessageKind, Parser};
//!
//! let mut parser = Parser::new(MessageKind::Request);
//! let mut assembler = MessageAssembler::new();
//!
//! // Input may be split anywhere
//! parser.feed(&mut assembler, b"GET /index.html HTTP/1.1\r\nHo").unwrap();
//! parser.feed(&mut assembler, b"st: example.com\r\n\r\n").unwrap();
//!
//! let request = assembler.pop().and_then(Message::into_request).unwrap();
//! assert_eq!(request.path(), Some("/index.html"));
//! assert_eq!(request.headers().get("host"), Some("example.com"));
//! ```

pub mod assembler;
pub mod chars;
pub mod config;
pub mod error;
pub mod header;
pub mod headers;
pub mod host;
pub mod message;
pub mod method;
pub mod parser;
pub mod reader;
pub mod url;

pub use assembler::MessageAssembler;
pub use config::{ParserConfig, ParserConfigBuilder, DEFAULT_MAX_HEADER_SIZE};
pub use error::{Callback, Error, ParseError};
pub use headers::Headers;
pub use message::{HttpRequest, HttpResponse, Message, Status, Version};
pub use method::Method;
pub use parser::{
    Action, FieldValue, Flags, Handler, HeadersAction, MessageKind, Parser, Phase,
};
pub use reader::MessageReader;
pub use url::{parse_url, parse_url_with, Url, UrlField, UrlFieldSet, UrlParts};

/// Result type for reader operations
pub type Result<T> = std::result::Result<T, Error>;

/// CRLF line ending
pub const CRLF: &[u8] = b"\r\n";
