//! Blocking message reader
//!
//! [`MessageReader`] drives a [`Parser`] from any [`Read`] source and hands
//! out assembled messages one at a time. End of stream is passed on to the
//! parser, so responses delimited by connection close complete normally.

use super::assembler::MessageAssembler;
use super::config::ParserConfig;
use super::error::ParseError;
use super::message::Message;
use super::parser::{MessageKind, Parser};
use super::{Error, Result};
use bytes::{Bytes, BytesMut};
use std::io::{self, Read};
use tracing::debug;

/// Read buffer size
const READ_BUFFER_SIZE: usize = 8 * 1024;

/// Reads HTTP/1.x messages from a byte stream
pub struct MessageReader<R> {
    inner: R,
    parser: Parser,
    assembler: MessageAssembler,
    buf: Box<[u8]>,
    /// Bytes read past an upgrade
    leftover: BytesMut,
    eof: bool,
    upgraded: bool,
    /// Parse failure held back until earlier messages are handed out
    failed: Option<ParseError>,
}

impl<R: Read> MessageReader<R> {
    /// Create a reader with the default parser settings
    pub fn new(inner: R, kind: MessageKind) -> Self {
        Self::with_config(inner, kind, ParserConfig::default())
    }

    /// Create a reader with explicit parser settings
    pub fn with_config(inner: R, kind: MessageKind, config: ParserConfig) -> Self {
        MessageReader {
            inner,
            parser: Parser::with_config(kind, config),
            assembler: MessageAssembler::new(),
            buf: vec![0u8; READ_BUFFER_SIZE].into_boxed_slice(),
            leftover: BytesMut::new(),
            eof: false,
            upgraded: false,
            failed: None,
        }
    }

    /// Read the next complete message
    ///
    /// Returns `Ok(None)` when the stream ends cleanly between messages and
    /// [`Error::ConnectionClosed`] when it ends inside one. After a message
    /// that switched protocols, further calls return [`Error::Upgraded`];
    /// use [`MessageReader::into_parts`] to continue with the raw stream.
    /// A parse error is returned only after every message completed before
    /// the bad byte has been handed out, and then on every later call.
    pub fn read_message(&mut self) -> Result<Option<Message>> {
        loop {
            if let Some(message) = self.assembler.pop() {
                if message.is_upgrade() {
                    self.upgraded = true;
                }
                return Ok(Some(message));
            }
            if self.upgraded {
                return Err(Error::Upgraded);
            }
            if let Some(err) = self.failed {
                return Err(err.into());
            }
            if self.eof {
                return Ok(None);
            }

            let n = match self.inner.read(&mut self.buf) {
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };

            if n == 0 {
                self.eof = true;
                match self.parser.finish(&mut self.assembler) {
                    Ok(_) => continue,
                    Err(ParseError::UnexpectedEndOfStream) => {
                        debug!("stream closed inside a message");
                        return Err(Error::ConnectionClosed);
                    }
                    Err(e) => return Err(e.into()),
                }
            }

            let consumed = match self.parser.feed(&mut self.assembler, &self.buf[..n]) {
                Ok(consumed) => consumed,
                Err(err) => {
                    // Messages completed before the bad byte still go out first
                    self.failed = Some(err);
                    continue;
                }
            };
            if consumed < n {
                debug!(
                    leftover = n - consumed,
                    "keeping bytes read past protocol switch"
                );
                self.leftover.extend_from_slice(&self.buf[consumed..n]);
            }
        }
    }

    /// Treat the next final response as bodiless (after sending HEAD)
    pub fn expect_no_body(&mut self) {
        self.assembler.expect_no_body();
    }

    /// Get the underlying parser
    pub fn parser(&self) -> &Parser {
        &self.parser
    }

    /// Bytes that followed an upgrade and belong to the new protocol
    pub fn leftover(&self) -> &[u8] {
        &self.leftover
    }

    /// Check whether an upgrade message has been handed out
    pub fn is_upgraded(&self) -> bool {
        self.upgraded
    }

    /// Get a reference to the underlying stream
    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Get a mutable reference to the underlying stream
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    /// Give back the stream and any bytes read past the last message
    pub fn into_parts(self) -> (R, Bytes) {
        (self.inner, self.leftover.freeze())
    }
}
