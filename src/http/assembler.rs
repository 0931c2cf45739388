//! Joining parser fragments into complete messages
//!
//! [`MessageAssembler`] is a ready-made [`Handler`]. It concatenates the
//! fragments the parser reports, pairs header names with their values and
//! queues one [`Message`] per completed message, so code above it never sees
//! chunk boundaries.

use super::headers::Headers;
use super::message::{HttpRequest, HttpResponse, Message, Status, Version};
use super::parser::{Action, FieldValue, Handler, HeadersAction, Parser};
use bytes::BytesMut;
use std::collections::VecDeque;
use tracing::trace;

/// Which half of a header line the last fragment belonged to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Building {
    Idle,
    Name,
    Value,
}

/// A [`Handler`] that collects whole messages
#[derive(Debug)]
pub struct MessageAssembler {
    url: BytesMut,
    reason: BytesMut,
    name: BytesMut,
    value: BytesMut,
    building: Building,
    headers: Headers,
    body: BytesMut,
    version: Version,
    expect_no_body: bool,
    ready: VecDeque<Message>,
}

impl MessageAssembler {
    pub fn new() -> Self {
        MessageAssembler {
            url: BytesMut::new(),
            reason: BytesMut::new(),
            name: BytesMut::new(),
            value: BytesMut::new(),
            building: Building::Idle,
            headers: Headers::new(),
            body: BytesMut::new(),
            version: Version::default(),
            expect_no_body: false,
            ready: VecDeque::new(),
        }
    }

    /// Treat the next final response as having no body
    ///
    /// Call this after sending a HEAD request. Interim 1xx responses do not
    /// use it up.
    pub fn expect_no_body(&mut self) {
        self.expect_no_body = true;
    }

    /// Whether the most recent message's headers carried this version
    pub fn check_version(&self, major: u16, minor: u16) -> bool {
        self.version == Version::new(major, minor)
    }

    /// Take the oldest completed message
    pub fn pop(&mut self) -> Option<Message> {
        self.ready.pop_front()
    }

    /// Take every completed message, oldest first
    pub fn drain(&mut self) -> impl Iterator<Item = Message> + '_ {
        self.ready.drain(..)
    }

    /// Number of completed messages waiting
    pub fn len(&self) -> usize {
        self.ready.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ready.is_empty()
    }

    fn clear(&mut self) {
        self.url.clear();
        self.reason.clear();
        self.name.clear();
        self.value.clear();
        self.building = Building::Idle;
        self.headers = Headers::new();
        self.body.clear();
    }

    /// Store the header line collected so far
    fn flush_header(&mut self) {
        if self.building != Building::Idle {
            self.headers.insert_bytes(&self.name, &self.value);
            self.name.clear();
            self.value.clear();
            self.building = Building::Idle;
        }
    }
}

impl Default for MessageAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl Handler for MessageAssembler {
    fn on_message_begin(&mut self, _parser: &Parser) -> Action {
        self.clear();
        Action::Continue
    }

    fn on_url(&mut self, _parser: &Parser, url: FieldValue<'_>) -> Action {
        self.url.extend_from_slice(&url);
        Action::Continue
    }

    fn on_status(&mut self, _parser: &Parser, reason: FieldValue<'_>) -> Action {
        self.reason.extend_from_slice(&reason);
        Action::Continue
    }

    fn on_header_field(&mut self, _parser: &Parser, name: FieldValue<'_>) -> Action {
        // A name always arrives whole; a pending line may lack a value
        self.flush_header();
        self.name.extend_from_slice(&name);
        self.building = Building::Name;
        Action::Continue
    }

    fn on_header_value(&mut self, _parser: &Parser, value: FieldValue<'_>) -> Action {
        // Folded lines arrive as further value fragments
        self.value.extend_from_slice(&value);
        self.building = Building::Value;
        Action::Continue
    }

    fn on_headers_complete(&mut self, parser: &Parser) -> HeadersAction {
        self.flush_header();
        self.version = Version::from(parser.version());

        let interim = parser.method().is_none() && parser.status_code() / 100 == 1;
        if self.expect_no_body && !interim {
            self.expect_no_body = false;
            return HeadersAction::SkipBody;
        }
        HeadersAction::Continue
    }

    fn on_body(&mut self, _parser: &Parser, chunk: &[u8]) -> Action {
        self.body.extend_from_slice(chunk);
        Action::Continue
    }

    fn on_message_complete(&mut self, parser: &Parser) -> Action {
        // Trailers after a chunked body
        self.flush_header();

        let headers = std::mem::take(&mut self.headers);
        let body = self.body.split().freeze();
        let keep_alive = parser.should_keep_alive();
        let upgrade = parser.is_upgrade();
        let version = Version::from(parser.version());

        let message = match parser.method() {
            Some(method) => Message::Request(HttpRequest {
                method,
                url: String::from_utf8_lossy(&self.url).into_owned(),
                version,
                headers,
                body,
                keep_alive,
                upgrade,
                strict: parser.config().strict,
            }),
            None => Message::Response(HttpResponse {
                version,
                status: Status::from_parsed(parser.status_code()),
                reason: String::from_utf8_lossy(&self.reason).into_owned(),
                headers,
                body,
                keep_alive,
                upgrade,
            }),
        };

        trace!(queued = self.ready.len() + 1, "message assembled");
        self.ready.push_back(message);
        Action::Continue
    }
}
