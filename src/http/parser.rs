//! Incremental HTTP/1.x message parser
//!
//! [`Parser`] is a push parser: the caller hands it whatever bytes arrived
//! and it reports message structure through a [`Handler`] as it goes. Input
//! may be split anywhere, down to one byte per call. The parser keeps no copy
//! of the input except for a start-line or header field that is cut by the
//! end of a chunk; that piece is kept in an internal buffer until the field
//! ends, and then delivered as one [`FieldValue`].
//!
//! One parser serves one connection and is reused for every message on it.

use super::chars::{is_alpha, token, unhex, CR, LF};
use super::config::ParserConfig;
use super::error::{Callback, ParseError};
use super::header::{HeaderMatcher, HeaderState, ValueStart};
use super::method::Method;
use super::url::{next_state, UrlState};
use bitflags::bitflags;
use bytes::BytesMut;
use std::fmt;
use std::ops::Deref;
use tracing::{debug, trace};

/// Content length value meaning "not given"
const UNKNOWN_LENGTH: u64 = u64::MAX;

/// Literal expected after the first 'H' of a version
const HTTP_SLASH: &[u8] = b"HTTP/";

/// Which side of the connection the parser reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Request,
    Response,
    /// Decide from the first message; settles on the first bytes
    Either,
}

bitflags! {
    /// Per-message framing facts gathered from the headers
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Flags: u8 {
        const CHUNKED = 1 << 0;
        const CONNECTION_KEEP_ALIVE = 1 << 1;
        const CONNECTION_CLOSE = 1 << 2;
        /// Reading headers after the last chunk
        const TRAILING = 1 << 3;
        const UPGRADE = 1 << 4;
        /// Headers describe a body that will not be sent
        const SKIP_BODY = 1 << 5;
    }
}

/// Coarse position within a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    StartLine,
    Headers,
    Body,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Connection can not carry another message
    Dead,

    StartReqOrRes,
    ResOrRespH,
    StartRes,
    /// Matching `HTTP/`; the value is the index of the next expected byte
    ResProtocol(u8),
    ResFirstHttpMajor,
    ResHttpMajor,
    ResFirstHttpMinor,
    ResHttpMinor,
    ResFirstStatusCode,
    ResStatusCode,
    ResStatusStart,
    ResStatus,
    ResLineAlmostDone,

    StartReq,
    ReqMethod,
    ReqSpacesBeforeUrl,
    ReqUrl(UrlState),
    ReqHttpStart,
    ReqProtocol(u8),
    ReqFirstHttpMajor,
    ReqHttpMajor,
    ReqFirstHttpMinor,
    ReqHttpMinor,
    ReqLineAlmostDone,

    HeaderFieldStart,
    HeaderField,
    HeaderValueDiscardWs,
    HeaderValueDiscardWsAlmostDone,
    HeaderValueDiscardLws,
    HeaderValueStart,
    HeaderValue,
    HeaderValueLws,
    HeaderAlmostDone,

    ChunkSizeStart,
    ChunkSize,
    ChunkParameters,
    ChunkSizeAlmostDone,

    HeadersAlmostDone,
    HeadersDone,

    ChunkData,
    ChunkDataAlmostDone,
    ChunkDataDone,

    BodyIdentity,
    BodyIdentityEof,

    MessageDone,
}

impl State {
    fn phase(&self) -> Phase {
        match self {
            State::HeaderFieldStart
            | State::HeaderField
            | State::HeaderValueDiscardWs
            | State::HeaderValueDiscardWsAlmostDone
            | State::HeaderValueDiscardLws
            | State::HeaderValueStart
            | State::HeaderValue
            | State::HeaderValueLws
            | State::HeaderAlmostDone
            | State::HeadersAlmostDone
            | State::HeadersDone => Phase::Headers,

            State::ChunkSizeStart
            | State::ChunkSize
            | State::ChunkParameters
            | State::ChunkSizeAlmostDone
            | State::ChunkData
            | State::ChunkDataAlmostDone
            | State::ChunkDataDone
            | State::BodyIdentity
            | State::BodyIdentityEof
            | State::MessageDone => Phase::Body,

            _ => Phase::StartLine,
        }
    }

    /// States whose bytes count against the header budget
    ///
    /// Chunk-size lines count too, so an endless chunk extension is caught.
    fn is_header_bounded(&self) -> bool {
        !matches!(
            self,
            State::ChunkData
                | State::ChunkDataAlmostDone
                | State::ChunkDataDone
                | State::BodyIdentity
                | State::BodyIdentityEof
                | State::MessageDone
        )
    }
}

/// What a handler wants the parser to do next
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Action {
    #[default]
    Continue,
    /// Return from `feed` now; call [`Parser::resume`] to go on
    Pause,
    /// Abort; the parser fails with [`ParseError::CallbackFailed`]
    Stop,
}

/// Answer to the headers-complete event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeadersAction {
    #[default]
    Continue,
    /// The message has no body whatever the headers say (response to HEAD)
    SkipBody,
    Pause,
    Stop,
}

/// A start-line or header field, borrowed from the input when possible
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct FieldValue<'a> {
    bytes: &'a [u8],
    buffered: bool,
}

impl<'a> FieldValue<'a> {
    /// The complete field
    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// True when the field crossed a chunk boundary and was copied
    pub fn is_buffered(&self) -> bool {
        self.buffered
    }
}

impl Deref for FieldValue<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.bytes
    }
}

impl AsRef<[u8]> for FieldValue<'_> {
    fn as_ref(&self) -> &[u8] {
        self.bytes
    }
}

impl fmt::Debug for FieldValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", String::from_utf8_lossy(self.bytes))
    }
}

/// Receiver of parse events
///
/// Every method has a default that ignores the event. Field events may fire
/// more than once per logical field: a folded header value arrives as one
/// event per line, and a body as one event per input chunk.
pub trait Handler {
    fn on_message_begin(&mut self, _parser: &Parser) -> Action {
        Action::Continue
    }

    fn on_url(&mut self, _parser: &Parser, _url: FieldValue<'_>) -> Action {
        Action::Continue
    }

    /// Response reason phrase
    fn on_status(&mut self, _parser: &Parser, _reason: FieldValue<'_>) -> Action {
        Action::Continue
    }

    fn on_header_field(&mut self, _parser: &Parser, _name: FieldValue<'_>) -> Action {
        Action::Continue
    }

    fn on_header_value(&mut self, _parser: &Parser, _value: FieldValue<'_>) -> Action {
        Action::Continue
    }

    fn on_headers_complete(&mut self, _parser: &Parser) -> HeadersAction {
        HeadersAction::Continue
    }

    fn on_body(&mut self, _parser: &Parser, _chunk: &[u8]) -> Action {
        Action::Continue
    }

    fn on_message_complete(&mut self, _parser: &Parser) -> Action {
        Action::Continue
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Url,
    Status,
    HeaderField,
    HeaderValue,
    Body,
}

impl Field {
    fn callback(&self) -> Callback {
        match self {
            Field::Url => Callback::Url,
            Field::Status => Callback::Status,
            Field::HeaderField => Callback::HeaderField,
            Field::HeaderValue => Callback::HeaderValue,
            Field::Body => Callback::Body,
        }
    }
}

/// Start of the field currently being scanned
#[derive(Debug, Clone, Copy)]
struct Mark {
    field: Field,
    start: usize,
    /// Earlier bytes of this field sit in the parser's buffer
    continued: bool,
}

struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
    mark: Option<Mark>,
}

impl Cursor<'_> {
    fn mark(&mut self, field: Field) {
        if self.mark.is_none() {
            self.mark = Some(Mark {
                field,
                start: self.pos,
                continued: false,
            });
        }
    }
}

enum Step {
    /// Current byte consumed
    Advance,
    /// Leave `feed`, reporting this many bytes consumed
    Return(usize),
}

/// Resumable HTTP/1.x parser state for one connection
pub struct Parser {
    kind: MessageKind,
    initial_kind: MessageKind,
    config: ParserConfig,
    state: State,
    header: HeaderMatcher,
    flags: Flags,
    nread: u32,
    content_length: u64,
    http_major: u16,
    http_minor: u16,
    method: Method,
    status_code: u16,
    index: usize,
    upgrade: bool,
    paused: bool,
    error: Option<ParseError>,
    pending: BytesMut,
    pending_field: Option<Field>,
}

impl Parser {
    /// Create a parser with the default configuration
    pub fn new(kind: MessageKind) -> Self {
        Self::with_config(kind, ParserConfig::default())
    }

    /// Create a parser with explicit settings
    pub fn with_config(kind: MessageKind, config: ParserConfig) -> Self {
        let mut parser = Parser {
            kind,
            initial_kind: kind,
            config,
            state: State::StartReqOrRes,
            header: HeaderMatcher::new(),
            flags: Flags::empty(),
            nread: 0,
            content_length: UNKNOWN_LENGTH,
            http_major: 0,
            http_minor: 0,
            method: Method::Get,
            status_code: 0,
            index: 0,
            upgrade: false,
            paused: false,
            error: None,
            pending: BytesMut::new(),
            pending_field: None,
        };
        parser.state = parser.start_state();
        parser
    }

    /// Return to the initial state, dropping any error and partial message
    ///
    /// The configured message kind and settings are kept.
    pub fn reset(&mut self) {
        *self = Self::with_config(self.initial_kind, self.config);
    }

    /// Parse the next piece of input
    ///
    /// Returns the number of bytes consumed. Fewer than `data.len()` bytes
    /// are consumed only when a handler paused the parser or the connection
    /// switched protocols ([`Parser::is_upgrade`]); in both cases the caller
    /// keeps the rest. After a pause, resume and feed again starting at the
    /// first unconsumed byte.
    ///
    /// An empty `data` signals end of stream, which completes a response
    /// whose body runs until the connection closes.
    ///
    /// Errors are sticky: once one is returned every later call returns it
    /// again until [`Parser::reset`].
    pub fn feed<H: Handler>(&mut self, handler: &mut H, data: &[u8]) -> Result<usize, ParseError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        if self.paused {
            return Ok(0);
        }
        if data.is_empty() {
            return self.eof(handler);
        }

        let mut cur = Cursor {
            data,
            pos: 0,
            mark: self.pending_field.take().map(|field| Mark {
                field,
                start: 0,
                continued: true,
            }),
        };

        while cur.pos < data.len() {
            if self.state.is_header_bounded() {
                self.nread = self.nread.saturating_add(1);
                if self.nread > self.config.max_header_size {
                    return Err(self.fail(ParseError::HeaderOverflow, cur.pos));
                }
            }

            match self.step(handler, &mut cur) {
                Ok(Step::Advance) => cur.pos += 1,
                Ok(Step::Return(consumed)) => {
                    debug_assert!(cur.mark.is_none());
                    return Ok(consumed);
                }
                Err(err) => return Err(self.fail(err, cur.pos)),
            }
        }

        if let Some(mark) = cur.mark.take() {
            if mark.field == Field::Body {
                let action = handler.on_body(self, &data[mark.start..]);
                if let Err(err) = self.after(action, Callback::Body) {
                    return Err(self.fail(err, data.len()));
                }
            } else {
                self.stash(mark, data);
            }
        }

        Ok(data.len())
    }

    /// Signal end of stream; same as feeding an empty slice
    pub fn finish<H: Handler>(&mut self, handler: &mut H) -> Result<usize, ParseError> {
        self.feed(handler, &[])
    }

    /// Stop consuming input until [`Parser::resume`]
    ///
    /// Has no effect on a failed parser.
    pub fn pause(&mut self) {
        if self.error.is_some() {
            debug!("ignoring pause on failed parser");
            return;
        }
        debug!("parser paused");
        self.paused = true;
    }

    /// Continue after a pause
    pub fn resume(&mut self) {
        if self.paused {
            debug!("parser resumed");
        }
        self.paused = false;
    }

    /// Check whether the parser is paused
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// The error that stopped the parser, if any
    pub fn error(&self) -> Option<ParseError> {
        self.error
    }

    /// Message kind; for `Either` parsers this settles on the first message
    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    /// Get the parser settings
    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Request method, for request messages
    pub fn method(&self) -> Option<Method> {
        (self.kind == MessageKind::Request).then_some(self.method)
    }

    /// Response status code; zero for requests
    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    /// Major version of the current message
    pub fn http_major(&self) -> u16 {
        self.http_major
    }

    /// Minor version of the current message
    pub fn http_minor(&self) -> u16 {
        self.http_minor
    }

    /// `(major, minor)`; a request line without a version reads as 0.9
    pub fn version(&self) -> (u16, u16) {
        (self.http_major, self.http_minor)
    }

    /// Framing flags gathered from the current headers
    pub fn flags(&self) -> Flags {
        self.flags
    }

    /// Declared Content-Length, or remaining bytes of the current body or
    /// chunk while the body is being read
    pub fn content_length(&self) -> Option<u64> {
        (self.content_length != UNKNOWN_LENGTH).then_some(self.content_length)
    }

    /// Whether the message switches protocols (Upgrade header or CONNECT)
    ///
    /// Set just before the headers-complete event. When true, `feed` returns
    /// right after the headers and the rest of the stream is not HTTP.
    pub fn is_upgrade(&self) -> bool {
        self.upgrade
    }

    /// Which part of the message is being read
    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    /// Bytes counted against the header budget so far
    pub fn header_bytes(&self) -> u32 {
        self.nread
    }

    /// True while the last identity-body fragment is being delivered
    pub fn body_is_final(&self) -> bool {
        self.state == State::MessageDone
    }

    /// Whether the body of the current response ends only at end of stream
    pub fn needs_eof(&self) -> bool {
        if self.kind != MessageKind::Response {
            return false;
        }

        // RFC 2616 section 4.4
        if self.status_code / 100 == 1
            || self.status_code == 204
            || self.status_code == 304
            || self.flags.contains(Flags::SKIP_BODY)
        {
            return false;
        }

        if self.flags.contains(Flags::CHUNKED) || self.content_length != UNKNOWN_LENGTH {
            return false;
        }

        true
    }

    /// Whether the connection can carry another message after this one
    pub fn should_keep_alive(&self) -> bool {
        if (self.http_major, self.http_minor) >= (1, 1) {
            if self.flags.contains(Flags::CONNECTION_CLOSE) {
                return false;
            }
        } else if !self.flags.contains(Flags::CONNECTION_KEEP_ALIVE) {
            return false;
        }

        !self.needs_eof()
    }

    fn start_state(&self) -> State {
        match self.kind {
            MessageKind::Request => State::StartReq,
            MessageKind::Response => State::StartRes,
            MessageKind::Either => State::StartReqOrRes,
        }
    }

    /// State after a complete message
    fn new_message(&self) -> State {
        if self.config.strict && !self.should_keep_alive() {
            State::Dead
        } else {
            self.start_state()
        }
    }

    fn begin_message(&mut self) {
        self.flags = Flags::empty();
        self.content_length = UNKNOWN_LENGTH;
        self.upgrade = false;
    }

    fn strict_check(&self, violated: bool) -> Result<(), ParseError> {
        if self.config.strict && violated {
            Err(ParseError::StrictModeViolation)
        } else {
            Ok(())
        }
    }

    fn fail(&mut self, err: ParseError, offset: usize) -> ParseError {
        debug!(
            error = err.name(),
            state = ?self.state,
            offset,
            "HTTP parse failed: {}",
            err
        );
        self.error = Some(err);
        err
    }

    /// Apply a handler's answer; true means the parser is now paused
    fn after(&mut self, action: Action, callback: Callback) -> Result<bool, ParseError> {
        match action {
            Action::Continue => Ok(false),
            Action::Pause => {
                debug!(callback = callback.name(), "parser paused by handler");
                self.paused = true;
                Ok(true)
            }
            Action::Stop => Err(ParseError::CallbackFailed(callback)),
        }
    }

    fn message_begin<H: Handler>(&mut self, handler: &mut H) -> Result<bool, ParseError> {
        trace!(kind = ?self.kind, "message begin");
        let action = handler.on_message_begin(self);
        self.after(action, Callback::MessageBegin)
    }

    fn message_complete<H: Handler>(&mut self, handler: &mut H) -> Result<bool, ParseError> {
        trace!(keep_alive = self.should_keep_alive(), "message complete");
        let action = handler.on_message_complete(self);
        self.after(action, Callback::MessageComplete)
    }

    /// Deliver the marked field if `field` is the one open, ending at `end`
    fn emit<H: Handler>(
        &mut self,
        handler: &mut H,
        field: Field,
        end: usize,
        cur: &mut Cursor<'_>,
    ) -> Result<bool, ParseError> {
        let mark = match cur.mark {
            Some(mark) if mark.field == field => mark,
            _ => return Ok(false),
        };
        cur.mark = None;

        let piece = &cur.data[mark.start..end];
        let action = if mark.continued {
            self.pending.extend_from_slice(piece);
            let value = FieldValue {
                bytes: &self.pending,
                buffered: true,
            };
            self.deliver(handler, field, value)
        } else {
            let value = FieldValue {
                bytes: piece,
                buffered: false,
            };
            self.deliver(handler, field, value)
        };
        self.pending.clear();

        self.after(action, field.callback())
    }

    fn deliver<H: Handler>(&self, handler: &mut H, field: Field, value: FieldValue<'_>) -> Action {
        match field {
            Field::Url => handler.on_url(self, value),
            Field::Status => handler.on_status(self, value),
            Field::HeaderField => handler.on_header_field(self, value),
            Field::HeaderValue => handler.on_header_value(self, value),
            Field::Body => handler.on_body(self, value.as_bytes()),
        }
    }

    /// Keep the unfinished field for the next `feed`
    fn stash(&mut self, mark: Mark, data: &[u8]) {
        if !mark.continued {
            self.pending.clear();
        }
        self.pending.extend_from_slice(&data[mark.start..]);
        self.pending_field = Some(mark.field);
        trace!(field = ?mark.field, buffered = self.pending.len(), "field continues in next chunk");
    }

    fn eof<H: Handler>(&mut self, handler: &mut H) -> Result<usize, ParseError> {
        match self.state {
            State::BodyIdentityEof => {
                self.state = self.new_message();
                match self.message_complete(handler) {
                    Ok(_) => Ok(0),
                    Err(err) => Err(self.fail(err, 0)),
                }
            }
            State::Dead | State::StartReqOrRes | State::StartRes | State::StartReq => Ok(0),
            _ => Err(self.fail(ParseError::UnexpectedEndOfStream, 0)),
        }
    }

    /// Process the byte at `cur.pos`
    fn step<H: Handler>(&mut self, handler: &mut H, cur: &mut Cursor<'_>) -> Result<Step, ParseError> {
        let ch = cur.data[cur.pos];
        let strict = self.config.strict;

        // Each arm either finishes with the byte or changes state and
        // `continue`s to look at the same byte again.
        loop {
            match self.state {
                State::Dead => {
                    if ch == CR || ch == LF {
                        return Ok(Step::Advance);
                    }
                    return Err(ParseError::ClosedConnection);
                }

                State::StartReqOrRes => {
                    if ch == CR || ch == LF {
                        return Ok(Step::Advance);
                    }
                    self.begin_message();
                    if ch == b'H' {
                        self.state = State::ResOrRespH;
                        if self.message_begin(handler)? {
                            return Ok(Step::Return(cur.pos + 1));
                        }
                        return Ok(Step::Advance);
                    }
                    self.kind = MessageKind::Request;
                    self.state = State::StartReq;
                    continue;
                }

                State::ResOrRespH => {
                    if ch == b'T' {
                        self.kind = MessageKind::Response;
                        self.state = State::ResProtocol(2);
                    } else if ch == b'E' {
                        self.kind = MessageKind::Request;
                        self.method = Method::Head;
                        self.index = 2;
                        self.state = State::ReqMethod;
                    } else {
                        return Err(ParseError::InvalidConstant);
                    }
                    return Ok(Step::Advance);
                }

                State::StartRes => {
                    if ch == CR || ch == LF {
                        return Ok(Step::Advance);
                    }
                    if ch != b'H' {
                        return Err(ParseError::InvalidConstant);
                    }
                    self.begin_message();
                    self.state = State::ResProtocol(1);
                    if self.message_begin(handler)? {
                        return Ok(Step::Return(cur.pos + 1));
                    }
                    return Ok(Step::Advance);
                }

                State::ResProtocol(i) | State::ReqProtocol(i) => {
                    let i = usize::from(i);
                    self.strict_check(HTTP_SLASH.get(i) != Some(&ch))?;
                    let is_res = matches!(self.state, State::ResProtocol(_));
                    self.state = match (i + 1 < HTTP_SLASH.len(), is_res) {
                        (true, true) => State::ResProtocol(i as u8 + 1),
                        (true, false) => State::ReqProtocol(i as u8 + 1),
                        (false, true) => State::ResFirstHttpMajor,
                        (false, false) => State::ReqFirstHttpMajor,
                    };
                    return Ok(Step::Advance);
                }

                State::ResFirstHttpMajor => {
                    if !ch.is_ascii_digit() {
                        return Err(ParseError::InvalidVersion);
                    }
                    self.http_major = u16::from(ch - b'0');
                    self.state = State::ResHttpMajor;
                    return Ok(Step::Advance);
                }

                State::ResHttpMajor | State::ReqHttpMajor => {
                    if ch == b'.' {
                        self.state = if self.state == State::ResHttpMajor {
                            State::ResFirstHttpMinor
                        } else {
                            State::ReqFirstHttpMinor
                        };
                        return Ok(Step::Advance);
                    }
                    self.http_major = accumulate_version(self.http_major, ch)?;
                    return Ok(Step::Advance);
                }

                State::ResFirstHttpMinor | State::ReqFirstHttpMinor => {
                    if !ch.is_ascii_digit() {
                        return Err(ParseError::InvalidVersion);
                    }
                    self.http_minor = u16::from(ch - b'0');
                    self.state = if self.state == State::ResFirstHttpMinor {
                        State::ResHttpMinor
                    } else {
                        State::ReqHttpMinor
                    };
                    return Ok(Step::Advance);
                }

                State::ResHttpMinor => {
                    if ch == b' ' {
                        self.state = State::ResFirstStatusCode;
                        return Ok(Step::Advance);
                    }
                    self.http_minor = accumulate_version(self.http_minor, ch)?;
                    return Ok(Step::Advance);
                }

                State::ResFirstStatusCode => {
                    if !ch.is_ascii_digit() {
                        if ch == b' ' {
                            return Ok(Step::Advance);
                        }
                        return Err(ParseError::InvalidStatus);
                    }
                    self.status_code = u16::from(ch - b'0');
                    self.state = State::ResStatusCode;
                    return Ok(Step::Advance);
                }

                State::ResStatusCode => {
                    if !ch.is_ascii_digit() {
                        self.state = match ch {
                            b' ' => State::ResStatusStart,
                            CR => State::ResLineAlmostDone,
                            LF => State::HeaderFieldStart,
                            _ => return Err(ParseError::InvalidStatus),
                        };
                        return Ok(Step::Advance);
                    }
                    self.status_code = self.status_code * 10 + u16::from(ch - b'0');
                    if self.status_code > 999 {
                        return Err(ParseError::InvalidStatus);
                    }
                    return Ok(Step::Advance);
                }

                State::ResStatusStart => {
                    match ch {
                        CR => self.state = State::ResLineAlmostDone,
                        LF => self.state = State::HeaderFieldStart,
                        _ => {
                            cur.mark(Field::Status);
                            self.state = State::ResStatus;
                            self.index = 0;
                        }
                    }
                    return Ok(Step::Advance);
                }

                State::ResStatus => {
                    if ch == CR || ch == LF {
                        self.state = if ch == CR {
                            State::ResLineAlmostDone
                        } else {
                            State::HeaderFieldStart
                        };
                        if self.emit(handler, Field::Status, cur.pos, cur)? {
                            return Ok(Step::Return(cur.pos + 1));
                        }
                    }
                    return Ok(Step::Advance);
                }

                State::ResLineAlmostDone => {
                    self.strict_check(ch != LF)?;
                    self.state = State::HeaderFieldStart;
                    return Ok(Step::Advance);
                }

                State::StartReq => {
                    if ch == CR || ch == LF {
                        return Ok(Step::Advance);
                    }
                    self.begin_message();
                    if !is_alpha(ch) {
                        return Err(ParseError::InvalidMethod);
                    }
                    self.method = Method::from_first_byte(ch).ok_or(ParseError::InvalidMethod)?;
                    self.index = 1;
                    self.state = State::ReqMethod;
                    if self.message_begin(handler)? {
                        return Ok(Step::Return(cur.pos + 1));
                    }
                    return Ok(Step::Advance);
                }

                State::ReqMethod => {
                    let name = self.method.as_str().as_bytes();
                    if ch == b' ' && self.index == name.len() {
                        self.state = State::ReqSpacesBeforeUrl;
                    } else if name.get(self.index) != Some(&ch) {
                        self.method = self
                            .method
                            .refine(self.index, ch)
                            .ok_or(ParseError::InvalidMethod)?;
                    }
                    self.index += 1;
                    return Ok(Step::Advance);
                }

                State::ReqSpacesBeforeUrl => {
                    if ch == b' ' {
                        return Ok(Step::Advance);
                    }
                    cur.mark(Field::Url);
                    let start = if self.method == Method::Connect {
                        UrlState::ServerStart
                    } else {
                        UrlState::Start
                    };
                    let next = next_state(start, ch, strict).ok_or(ParseError::InvalidUrl)?;
                    self.state = State::ReqUrl(next);
                    return Ok(Step::Advance);
                }

                State::ReqUrl(url_state) => {
                    let ends = ch == b' ' || ch == CR || ch == LF;
                    if ends && url_state.can_end() {
                        if ch == b' ' {
                            self.state = State::ReqHttpStart;
                        } else {
                            self.http_major = 0;
                            self.http_minor = 9;
                            self.state = if ch == CR {
                                State::ReqLineAlmostDone
                            } else {
                                State::HeaderFieldStart
                            };
                        }
                        if self.emit(handler, Field::Url, cur.pos, cur)? {
                            return Ok(Step::Return(cur.pos + 1));
                        }
                        return Ok(Step::Advance);
                    }
                    let next = next_state(url_state, ch, strict).ok_or(ParseError::InvalidUrl)?;
                    self.state = State::ReqUrl(next);
                    return Ok(Step::Advance);
                }

                State::ReqHttpStart => {
                    match ch {
                        b'H' => self.state = State::ReqProtocol(1),
                        b' ' => {}
                        _ => return Err(ParseError::InvalidConstant),
                    }
                    return Ok(Step::Advance);
                }

                State::ReqFirstHttpMajor => {
                    if !(b'1'..=b'9').contains(&ch) {
                        return Err(ParseError::InvalidVersion);
                    }
                    self.http_major = u16::from(ch - b'0');
                    self.state = State::ReqHttpMajor;
                    return Ok(Step::Advance);
                }

                State::ReqHttpMinor => {
                    match ch {
                        CR => self.state = State::ReqLineAlmostDone,
                        LF => self.state = State::HeaderFieldStart,
                        _ => self.http_minor = accumulate_version(self.http_minor, ch)?,
                    }
                    return Ok(Step::Advance);
                }

                State::ReqLineAlmostDone => {
                    if ch != LF {
                        return Err(ParseError::LineFeedExpected);
                    }
                    self.state = State::HeaderFieldStart;
                    return Ok(Step::Advance);
                }

                State::HeaderFieldStart => {
                    if ch == CR {
                        self.state = State::HeadersAlmostDone;
                        return Ok(Step::Advance);
                    }
                    if ch == LF {
                        // Bare LF ends the headers too
                        self.state = State::HeadersAlmostDone;
                        continue;
                    }
                    let c = token(ch, strict).ok_or(ParseError::InvalidHeaderToken)?;
                    cur.mark(Field::HeaderField);
                    self.state = State::HeaderField;
                    self.header.begin_name(c);
                    return Ok(Step::Advance);
                }

                State::HeaderField => {
                    if let Some(c) = token(ch, strict) {
                        self.header.name_byte(c, ch);
                        return Ok(Step::Advance);
                    }
                    self.state = match ch {
                        b':' => State::HeaderValueDiscardWs,
                        CR => State::HeaderAlmostDone,
                        LF => State::HeaderFieldStart,
                        _ => return Err(ParseError::InvalidHeaderToken),
                    };
                    if self.emit(handler, Field::HeaderField, cur.pos, cur)? {
                        return Ok(Step::Return(cur.pos + 1));
                    }
                    return Ok(Step::Advance);
                }

                State::HeaderValueDiscardWs => {
                    match ch {
                        b' ' | b'\t' => return Ok(Step::Advance),
                        CR => {
                            self.state = State::HeaderValueDiscardWsAlmostDone;
                            return Ok(Step::Advance);
                        }
                        LF => {
                            self.state = State::HeaderValueDiscardLws;
                            return Ok(Step::Advance);
                        }
                        _ => {
                            self.state = State::HeaderValueStart;
                            continue;
                        }
                    }
                }

                State::HeaderValueStart => {
                    cur.mark(Field::HeaderValue);
                    self.state = State::HeaderValue;
                    match self.header.begin_value(ch) {
                        ValueStart::Plain => {}
                        ValueStart::Upgrade => self.flags |= Flags::UPGRADE,
                        ValueStart::ContentLength => {
                            if !ch.is_ascii_digit() {
                                return Err(ParseError::InvalidContentLength);
                            }
                            self.content_length = u64::from(ch - b'0');
                        }
                    }
                    return Ok(Step::Advance);
                }

                State::HeaderValue => {
                    if ch == CR {
                        self.state = State::HeaderAlmostDone;
                        if self.emit(handler, Field::HeaderValue, cur.pos, cur)? {
                            return Ok(Step::Return(cur.pos + 1));
                        }
                        return Ok(Step::Advance);
                    }
                    if ch == LF {
                        self.state = State::HeaderAlmostDone;
                        if self.emit(handler, Field::HeaderValue, cur.pos, cur)? {
                            return Ok(Step::Return(cur.pos));
                        }
                        continue;
                    }

                    if self.header.state() == HeaderState::ContentLength {
                        if ch == b' ' {
                            return Ok(Step::Advance);
                        }
                        if !ch.is_ascii_digit() {
                            return Err(ParseError::InvalidContentLength);
                        }
                        // Conservative bound, checked before multiplying
                        if (u64::MAX - 10) / 10 < self.content_length {
                            return Err(ParseError::InvalidContentLength);
                        }
                        self.content_length = self.content_length * 10 + u64::from(ch - b'0');
                    } else {
                        self.header.value_byte(ch);
                    }
                    return Ok(Step::Advance);
                }

                State::HeaderAlmostDone => {
                    self.strict_check(ch != LF)?;
                    self.state = State::HeaderValueLws;
                    return Ok(Step::Advance);
                }

                State::HeaderValueLws => {
                    if ch == b' ' || ch == b'\t' {
                        // Folded continuation of the previous value
                        self.state = State::HeaderValueStart;
                        continue;
                    }
                    if let Some(flag) = self.header.finish() {
                        self.flags |= flag;
                    }
                    self.state = State::HeaderFieldStart;
                    continue;
                }

                State::HeaderValueDiscardWsAlmostDone => {
                    self.strict_check(ch != LF)?;
                    self.state = State::HeaderValueDiscardLws;
                    return Ok(Step::Advance);
                }

                State::HeaderValueDiscardLws => {
                    if ch == b' ' || ch == b'\t' {
                        self.state = State::HeaderValueDiscardWs;
                        return Ok(Step::Advance);
                    }
                    // Empty value
                    cur.mark(Field::HeaderValue);
                    self.state = State::HeaderFieldStart;
                    if self.emit(handler, Field::HeaderValue, cur.pos, cur)? {
                        return Ok(Step::Return(cur.pos));
                    }
                    continue;
                }

                State::HeadersAlmostDone => {
                    self.strict_check(ch != LF)?;

                    if self.flags.contains(Flags::TRAILING) {
                        // End of a chunked message
                        self.state = self.new_message();
                        if self.message_complete(handler)? {
                            return Ok(Step::Return(cur.pos + 1));
                        }
                        return Ok(Step::Advance);
                    }

                    self.state = State::HeadersDone;
                    self.upgrade = self.flags.contains(Flags::UPGRADE)
                        || (self.kind == MessageKind::Request && self.method == Method::Connect);

                    match handler.on_headers_complete(self) {
                        HeadersAction::Continue => {}
                        HeadersAction::SkipBody => self.flags |= Flags::SKIP_BODY,
                        HeadersAction::Pause => {
                            self.after(Action::Pause, Callback::HeadersComplete)?;
                            return Ok(Step::Return(cur.pos));
                        }
                        HeadersAction::Stop => {
                            return Err(ParseError::CallbackFailed(Callback::HeadersComplete));
                        }
                    }
                    continue;
                }

                State::HeadersDone => {
                    self.strict_check(ch != LF)?;
                    self.nread = 0;

                    if self.upgrade {
                        debug!(
                            consumed = cur.pos + 1,
                            "switching protocols, leaving remaining input to the caller"
                        );
                        self.state = self.new_message();
                        self.message_complete(handler)?;
                        return Ok(Step::Return(cur.pos + 1));
                    }

                    let complete_now = if self.flags.contains(Flags::SKIP_BODY) {
                        true
                    } else if self.flags.contains(Flags::CHUNKED) {
                        // Transfer-Encoding wins over Content-Length
                        self.state = State::ChunkSizeStart;
                        false
                    } else if self.content_length == 0 {
                        true
                    } else if self.content_length != UNKNOWN_LENGTH {
                        self.state = State::BodyIdentity;
                        false
                    } else if self.kind == MessageKind::Request || !self.needs_eof() {
                        true
                    } else {
                        self.state = State::BodyIdentityEof;
                        false
                    };

                    if complete_now {
                        self.state = self.new_message();
                        if self.message_complete(handler)? {
                            return Ok(Step::Return(cur.pos + 1));
                        }
                    }
                    return Ok(Step::Advance);
                }

                State::BodyIdentity => {
                    let available = (cur.data.len() - cur.pos) as u64;
                    let to_read = self.content_length.min(available);
                    cur.mark(Field::Body);
                    self.content_length -= to_read;
                    cur.pos += to_read as usize - 1;

                    if self.content_length == 0 {
                        // The last body byte also triggers message complete
                        self.state = State::MessageDone;
                        if self.emit(handler, Field::Body, cur.pos + 1, cur)? {
                            return Ok(Step::Return(cur.pos));
                        }
                        continue;
                    }
                    return Ok(Step::Advance);
                }

                State::BodyIdentityEof => {
                    cur.mark(Field::Body);
                    cur.pos = cur.data.len() - 1;
                    return Ok(Step::Advance);
                }

                State::MessageDone => {
                    self.state = self.new_message();
                    if self.message_complete(handler)? {
                        return Ok(Step::Return(cur.pos + 1));
                    }
                    return Ok(Step::Advance);
                }

                State::ChunkSizeStart => {
                    let value = unhex(ch).ok_or(ParseError::InvalidChunkSize)?;
                    self.content_length = u64::from(value);
                    self.state = State::ChunkSize;
                    return Ok(Step::Advance);
                }

                State::ChunkSize => {
                    if ch == CR {
                        self.state = State::ChunkSizeAlmostDone;
                        return Ok(Step::Advance);
                    }
                    let value = match unhex(ch) {
                        Some(value) => value,
                        None if ch == b';' || ch == b' ' => {
                            self.state = State::ChunkParameters;
                            return Ok(Step::Advance);
                        }
                        None => return Err(ParseError::InvalidChunkSize),
                    };
                    // Conservative bound, checked before multiplying
                    if (u64::MAX - 16) / 16 < self.content_length {
                        return Err(ParseError::InvalidContentLength);
                    }
                    self.content_length = self.content_length * 16 + u64::from(value);
                    return Ok(Step::Advance);
                }

                State::ChunkParameters => {
                    // Chunk extensions are ignored
                    if ch == CR {
                        self.state = State::ChunkSizeAlmostDone;
                    }
                    return Ok(Step::Advance);
                }

                State::ChunkSizeAlmostDone => {
                    self.strict_check(ch != LF)?;
                    self.nread = 0;
                    if self.content_length == 0 {
                        self.flags |= Flags::TRAILING;
                        self.state = State::HeaderFieldStart;
                    } else {
                        self.state = State::ChunkData;
                    }
                    return Ok(Step::Advance);
                }

                State::ChunkData => {
                    let available = (cur.data.len() - cur.pos) as u64;
                    let to_read = self.content_length.min(available);
                    cur.mark(Field::Body);
                    self.content_length -= to_read;
                    cur.pos += to_read as usize - 1;

                    if self.content_length == 0 {
                        self.state = State::ChunkDataAlmostDone;
                    }
                    return Ok(Step::Advance);
                }

                State::ChunkDataAlmostDone => {
                    self.strict_check(ch != CR)?;
                    self.state = State::ChunkDataDone;
                    if self.emit(handler, Field::Body, cur.pos, cur)? {
                        return Ok(Step::Return(cur.pos + 1));
                    }
                    return Ok(Step::Advance);
                }

                State::ChunkDataDone => {
                    self.strict_check(ch != LF)?;
                    self.nread = 0;
                    self.state = State::ChunkSizeStart;
                    return Ok(Step::Advance);
                }
            }
        }
    }
}

/// Add one decimal digit to a version number, capped at 999
fn accumulate_version(current: u16, ch: u8) -> Result<u16, ParseError> {
    if !ch.is_ascii_digit() {
        return Err(ParseError::InvalidVersion);
    }
    let value = current * 10 + u16::from(ch - b'0');
    if value > 999 {
        return Err(ParseError::InvalidVersion);
    }
    Ok(value)
}

impl fmt::Debug for Parser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parser")
            .field("kind", &self.kind)
            .field("state", &self.state)
            .field("flags", &self.flags)
            .field("version", &(self.http_major, self.http_minor))
            .field("error", &self.error)
            .field("paused", &self.paused)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Event {
        Begin,
        Url(Vec<u8>),
        Status(Vec<u8>),
        Field(Vec<u8>),
        Value(Vec<u8>),
        HeadersComplete,
        Body(Vec<u8>),
        Complete,
    }

    #[derive(Default)]
    struct Recorder {
        events: Vec<Event>,
        skip_body: bool,
        pause_on_headers: bool,
        stop_on_url: bool,
        buffered_fields: usize,
    }

    impl Recorder {
        fn note(&mut self, value: &FieldValue<'_>) {
            if value.is_buffered() {
                self.buffered_fields += 1;
            }
        }
    }

    impl Handler for Recorder {
        fn on_message_begin(&mut self, _: &Parser) -> Action {
            self.events.push(Event::Begin);
            Action::Continue
        }

        fn on_url(&mut self, _: &Parser, url: FieldValue<'_>) -> Action {
            self.note(&url);
            self.events.push(Event::Url(url.to_vec()));
            if self.stop_on_url {
                Action::Stop
            } else {
                Action::Continue
            }
        }

        fn on_status(&mut self, _: &Parser, reason: FieldValue<'_>) -> Action {
            self.note(&reason);
            self.events.push(Event::Status(reason.to_vec()));
            Action::Continue
        }

        fn on_header_field(&mut self, _: &Parser, name: FieldValue<'_>) -> Action {
            self.note(&name);
            self.events.push(Event::Field(name.to_vec()));
            Action::Continue
        }

        fn on_header_value(&mut self, _: &Parser, value: FieldValue<'_>) -> Action {
            self.note(&value);
            self.events.push(Event::Value(value.to_vec()));
            Action::Continue
        }

        fn on_headers_complete(&mut self, _: &Parser) -> HeadersAction {
            self.events.push(Event::HeadersComplete);
            if self.pause_on_headers {
                HeadersAction::Pause
            } else if self.skip_body {
                HeadersAction::SkipBody
            } else {
                HeadersAction::Continue
            }
        }

        fn on_body(&mut self, _: &Parser, chunk: &[u8]) -> Action {
            self.events.push(Event::Body(chunk.to_vec()));
            Action::Continue
        }

        fn on_message_complete(&mut self, _: &Parser) -> Action {
            self.events.push(Event::Complete);
            Action::Continue
        }
    }

    fn v(s: &str) -> Vec<u8> {
        s.as_bytes().to_vec()
    }

    #[test]
    fn test_simple_request() {
        let mut parser = Parser::new(MessageKind::Request);
        let mut rec = Recorder::default();
        let data = b"GET /index.html HTTP/1.1\r\nHost: example.com\r\n\r\n";

        assert_eq!(parser.feed(&mut rec, data), Ok(data.len()));
        assert_eq!(
            rec.events,
            vec![
                Event::Begin,
                Event::Url(v("/index.html")),
                Event::Field(v("Host")),
                Event::Value(v("example.com")),
                Event::HeadersComplete,
                Event::Complete,
            ]
        );
        assert_eq!(parser.method(), Some(Method::Get));
        assert_eq!(parser.version(), (1, 1));
        assert!(parser.should_keep_alive());
        assert_eq!(rec.buffered_fields, 0);
    }

    #[test]
    fn test_simple_response() {
        let mut parser = Parser::new(MessageKind::Response);
        let mut rec = Recorder::default();
        let data = b"HTTP/1.1 404 Not Found\r\nContent-Length: 5\r\n\r\nhello";

        assert_eq!(parser.feed(&mut rec, data), Ok(data.len()));
        assert_eq!(parser.status_code(), 404);
        assert_eq!(parser.method(), None);
        assert_eq!(
            rec.events,
            vec![
                Event::Begin,
                Event::Status(v("Not Found")),
                Event::Field(v("Content-Length")),
                Event::Value(v("5")),
                Event::HeadersComplete,
                Event::Body(v("hello")),
                Event::Complete,
            ]
        );
    }

    #[test]
    fn test_field_split_across_chunks_is_buffered() {
        let mut parser = Parser::new(MessageKind::Request);
        let mut rec = Recorder::default();

        parser.feed(&mut rec, b"GET /lo").unwrap();
        parser.feed(&mut rec, b"ng/path HTTP/1.1\r\nX-Na").unwrap();
        parser.feed(&mut rec, b"me: va").unwrap();
        parser.feed(&mut rec, b"lue\r\n\r\n").unwrap();

        assert_eq!(
            rec.events,
            vec![
                Event::Begin,
                Event::Url(v("/long/path")),
                Event::Field(v("X-Name")),
                Event::Value(v("value")),
                Event::HeadersComplete,
                Event::Complete,
            ]
        );
        assert_eq!(rec.buffered_fields, 3);
    }

    #[test]
    fn test_body_split_across_chunks() {
        let mut parser = Parser::new(MessageKind::Request);
        let mut rec = Recorder::default();

        parser
            .feed(&mut rec, b"POST /p HTTP/1.1\r\nContent-Length: 6\r\n\r\nab")
            .unwrap();
        assert!(!rec.events.contains(&Event::Complete));
        parser.feed(&mut rec, b"cdef").unwrap();

        let bodies: Vec<_> = rec
            .events
            .iter()
            .filter_map(|e| match e {
                Event::Body(b) => Some(b.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(bodies, vec![v("ab"), v("cdef")]);
        assert_eq!(rec.events.last(), Some(&Event::Complete));
    }

    #[test]
    fn test_chunked_body_and_trailers() {
        let mut parser = Parser::new(MessageKind::Response);
        let mut rec = Recorder::default();
        let data = b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n\
                     4\r\nWiki\r\n5;ext=1\r\npedia\r\n0\r\nX-Trailer: t\r\n\r\n";

        assert_eq!(parser.feed(&mut rec, data), Ok(data.len()));
        assert_eq!(
            &rec.events[4..],
            &[
                Event::HeadersComplete,
                Event::Body(v("Wiki")),
                Event::Body(v("pedia")),
                Event::Field(v("X-Trailer")),
                Event::Value(v("t")),
                Event::Complete,
            ]
        );
        assert!(parser.flags().contains(Flags::CHUNKED));
    }

    #[test]
    fn test_chunk_size_rejects_garbage() {
        let mut parser = Parser::new(MessageKind::Response);
        let mut rec = Recorder::default();
        let data = b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n4x\r\n";

        assert_eq!(parser.feed(&mut rec, data), Err(ParseError::InvalidChunkSize));
        assert_eq!(parser.error(), Some(ParseError::InvalidChunkSize));
        // Sticky
        assert_eq!(parser.feed(&mut rec, b"0\r\n\r\n"), Err(ParseError::InvalidChunkSize));
    }

    #[test]
    fn test_chunk_size_overflow() {
        let mut parser = Parser::new(MessageKind::Response);
        let mut rec = Recorder::default();
        let data = b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\nffffffffffffffffff\r\n";

        assert_eq!(parser.feed(&mut rec, data), Err(ParseError::InvalidContentLength));
    }

    #[test]
    fn test_content_length_overflow() {
        let mut parser = Parser::new(MessageKind::Request);
        let mut rec = Recorder::default();
        let data = b"POST / HTTP/1.1\r\nContent-Length: 99999999999999999999\r\n\r\n";

        assert_eq!(parser.feed(&mut rec, data), Err(ParseError::InvalidContentLength));
    }

    #[test]
    fn test_invalid_content_length_digit() {
        let mut parser = Parser::new(MessageKind::Request);
        let mut rec = Recorder::default();
        let data = b"POST / HTTP/1.1\r\nContent-Length: 1a\r\n\r\n";

        assert_eq!(parser.feed(&mut rec, data), Err(ParseError::InvalidContentLength));
    }

    #[test]
    fn test_response_body_until_eof() {
        let mut parser = Parser::new(MessageKind::Response);
        let mut rec = Recorder::default();

        parser.feed(&mut rec, b"HTTP/1.0 200 OK\r\n\r\nsome ").unwrap();
        assert!(parser.needs_eof());
        assert!(!parser.should_keep_alive());
        parser.feed(&mut rec, b"data").unwrap();
        assert_eq!(parser.feed(&mut rec, b""), Ok(0));

        assert_eq!(
            &rec.events[3..],
            &[
                Event::Body(v("some ")),
                Event::Body(v("data")),
                Event::Complete,
            ]
        );
    }

    #[test]
    fn test_no_body_statuses() {
        for status in ["100 Continue", "204 No Content", "304 Not Modified"] {
            let mut parser = Parser::new(MessageKind::Response);
            let mut rec = Recorder::default();
            let data = format!("HTTP/1.1 {}\r\n\r\n", status);
            parser.feed(&mut rec, data.as_bytes()).unwrap();
            assert_eq!(rec.events.last(), Some(&Event::Complete), "{}", status);
        }
    }

    #[test]
    fn test_head_response_skips_body() {
        let mut parser = Parser::new(MessageKind::Response);
        let mut rec = Recorder {
            skip_body: true,
            ..Default::default()
        };
        let data = b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\n";

        assert_eq!(parser.feed(&mut rec, data), Ok(data.len()));
        assert_eq!(rec.events.last(), Some(&Event::Complete));
        assert!(parser.should_keep_alive());
    }

    #[test]
    fn test_unexpected_eof() {
        let mut parser = Parser::new(MessageKind::Request);
        let mut rec = Recorder::default();

        assert_eq!(parser.feed(&mut rec, b""), Ok(0));
        parser.feed(&mut rec, b"GET / HT").unwrap();
        assert_eq!(parser.finish(&mut rec), Err(ParseError::UnexpectedEndOfStream));
    }

    #[test]
    fn test_invalid_method() {
        let mut parser = Parser::new(MessageKind::Request);
        let mut rec = Recorder::default();

        assert_eq!(parser.feed(&mut rec, b"GXT / HTTP/1.1\r\n"), Err(ParseError::InvalidMethod));
        parser.reset();
        assert_eq!(parser.error(), None);
        assert_eq!(parser.feed(&mut rec, b"1GET /"), Err(ParseError::InvalidMethod));
    }

    #[test]
    fn test_invalid_version() {
        let mut parser = Parser::new(MessageKind::Request);
        let mut rec = Recorder::default();
        assert_eq!(parser.feed(&mut rec, b"GET / HTTP/0.9\r\n"), Err(ParseError::InvalidVersion));

        let mut parser = Parser::new(MessageKind::Response);
        assert_eq!(parser.feed(&mut rec, b"HTTP/1.1000 "), Err(ParseError::InvalidVersion));
    }

    #[test]
    fn test_invalid_status() {
        let mut parser = Parser::new(MessageKind::Response);
        let mut rec = Recorder::default();
        assert_eq!(parser.feed(&mut rec, b"HTTP/1.1 2x0 OK\r\n"), Err(ParseError::InvalidStatus));

        let mut parser = Parser::new(MessageKind::Response);
        assert_eq!(parser.feed(&mut rec, b"HTTP/1.1 1000 "), Err(ParseError::InvalidStatus));
    }

    #[test]
    fn test_strict_protocol_literal() {
        let mut rec = Recorder::default();

        let mut parser = Parser::new(MessageKind::Response);
        assert_eq!(parser.feed(&mut rec, b"HTXP/1.1 200 OK\r\n"), Err(ParseError::StrictModeViolation));

        let mut parser = Parser::with_config(MessageKind::Response, ParserConfig::lenient());
        assert!(parser.feed(&mut rec, b"HTXP/1.1 200 OK\r\n").is_ok());

        let mut parser = Parser::new(MessageKind::Request);
        assert_eq!(parser.feed(&mut rec, b"GET / XTTP/1.1\r\n"), Err(ParseError::InvalidConstant));
    }

    #[test]
    fn test_lenient_bare_lf() {
        let mut parser = Parser::with_config(MessageKind::Request, ParserConfig::lenient());
        let mut rec = Recorder::default();
        let data = b"GET / HTTP/1.1\nHost: a\n\n";

        assert_eq!(parser.feed(&mut rec, data), Ok(data.len()));
        assert_eq!(rec.events.last(), Some(&Event::Complete));
    }

    #[test]
    fn test_request_line_requires_lf() {
        let mut parser = Parser::with_config(MessageKind::Request, ParserConfig::lenient());
        let mut rec = Recorder::default();
        assert_eq!(parser.feed(&mut rec, b"GET / HTTP/1.1\rX"), Err(ParseError::LineFeedExpected));
    }

    #[test]
    fn test_http09_request_line() {
        let mut parser = Parser::new(MessageKind::Request);
        let mut rec = Recorder::default();

        parser.feed(&mut rec, b"GET /old\r\n\r\n").unwrap();
        assert_eq!(parser.version(), (0, 9));
        assert_eq!(rec.events[1], Event::Url(v("/old")));
    }

    #[test]
    fn test_folded_and_empty_values() {
        let mut parser = Parser::new(MessageKind::Request);
        let mut rec = Recorder::default();
        let data = b"GET / HTTP/1.1\r\nX-Long: a\r\n  b\r\nX-Empty:\r\nX-Blank:   \r\n\r\n";

        assert_eq!(parser.feed(&mut rec, data), Ok(data.len()));
        assert_eq!(
            &rec.events[2..9],
            &[
                Event::Field(v("X-Long")),
                Event::Value(v("a")),
                Event::Value(v("  b")),
                Event::Field(v("X-Empty")),
                Event::Value(v("")),
                Event::Field(v("X-Blank")),
                Event::Value(v("")),
            ]
        );
    }

    #[test]
    fn test_invalid_header_token() {
        let mut parser = Parser::new(MessageKind::Request);
        let mut rec = Recorder::default();
        assert_eq!(
            parser.feed(&mut rec, b"GET / HTTP/1.1\r\nBad Header: x\r\n"),
            Err(ParseError::InvalidHeaderToken)
        );

        let mut parser = Parser::with_config(MessageKind::Request, ParserConfig::lenient());
        assert!(parser.feed(&mut rec, b"GET / HTTP/1.1\r\nBad Header: x\r\n").is_ok());
    }

    #[test]
    fn test_header_overflow() {
        let config = ParserConfig::builder().max_header_size(32).build();
        let mut parser = Parser::with_config(MessageKind::Request, config);
        let mut rec = Recorder::default();
        let data = b"GET / HTTP/1.1\r\nX-Padding: aaaaaaaaaaaaaaaaaaaa\r\n\r\n";

        assert_eq!(parser.feed(&mut rec, data), Err(ParseError::HeaderOverflow));
    }

    #[test]
    fn test_upgrade_returns_early() {
        let mut parser = Parser::new(MessageKind::Request);
        let mut rec = Recorder::default();
        let head = b"GET /chat HTTP/1.1\r\nConnection: Upgrade\r\nUpgrade: websocket\r\n\r\n";
        let mut data = head.to_vec();
        data.extend_from_slice(b"\x81\x05hello");

        assert_eq!(parser.feed(&mut rec, &data), Ok(head.len()));
        assert!(parser.is_upgrade());
        assert_eq!(rec.events.last(), Some(&Event::Complete));
    }

    #[test]
    fn test_connect_is_upgrade() {
        let mut parser = Parser::new(MessageKind::Request);
        let mut rec = Recorder::default();
        let head = b"CONNECT example.com:443 HTTP/1.1\r\n\r\n";
        let mut data = head.to_vec();
        data.extend_from_slice(b"\x16\x03\x01");

        assert_eq!(parser.feed(&mut rec, &data), Ok(head.len()));
        assert!(parser.is_upgrade());
        assert_eq!(rec.events[1], Event::Url(v("example.com:443")));
    }

    #[test]
    fn test_pause_on_headers_complete() {
        let mut parser = Parser::new(MessageKind::Request);
        let mut rec = Recorder {
            pause_on_headers: true,
            ..Default::default()
        };
        let data = b"GET / HTTP/1.1\r\n\r\nGET /next HTTP/1.1\r\n\r\n";

        let consumed = parser.feed(&mut rec, data).unwrap();
        assert!(parser.is_paused());
        assert!(consumed < data.len());
        assert_eq!(parser.feed(&mut rec, &data[consumed..]), Ok(0));

        rec.pause_on_headers = false;
        parser.resume();
        assert_eq!(parser.feed(&mut rec, &data[consumed..]), Ok(data.len() - consumed));
        let completes = rec.events.iter().filter(|e| **e == Event::Complete).count();
        assert_eq!(completes, 2);
    }

    #[test]
    fn test_stop_is_callback_error() {
        let mut parser = Parser::new(MessageKind::Request);
        let mut rec = Recorder {
            stop_on_url: true,
            ..Default::default()
        };
        let err = parser.feed(&mut rec, b"GET / HTTP/1.1\r\n").unwrap_err();
        assert_eq!(err, ParseError::CallbackFailed(Callback::Url));
    }

    #[test]
    fn test_either_mode() {
        let mut rec = Recorder::default();

        let mut parser = Parser::new(MessageKind::Either);
        parser.feed(&mut rec, b"HTTP/1.1 200 OK\r\n").unwrap();
        assert_eq!(parser.kind(), MessageKind::Response);

        let mut parser = Parser::new(MessageKind::Either);
        parser.feed(&mut rec, b"HEAD / HTTP/1.1\r\n").unwrap();
        assert_eq!(parser.kind(), MessageKind::Request);
        assert_eq!(parser.method(), Some(Method::Head));

        let mut parser = Parser::new(MessageKind::Either);
        parser.feed(&mut rec, b"POST / HTTP/1.1\r\n").unwrap();
        assert_eq!(parser.method(), Some(Method::Post));

        parser.reset();
        assert_eq!(parser.kind(), MessageKind::Either);
    }

    #[test]
    fn test_strict_dead_after_close() {
        let mut parser = Parser::new(MessageKind::Request);
        let mut rec = Recorder::default();

        parser
            .feed(&mut rec, b"GET / HTTP/1.1\r\nConnection: close\r\n\r\n")
            .unwrap();
        assert_eq!(parser.feed(&mut rec, b"\r\n"), Ok(2));
        assert_eq!(parser.feed(&mut rec, b"GET"), Err(ParseError::ClosedConnection));

        let mut parser = Parser::with_config(MessageKind::Request, ParserConfig::lenient());
        parser
            .feed(&mut rec, b"GET / HTTP/1.1\r\nConnection: close\r\n\r\n")
            .unwrap();
        assert!(parser.feed(&mut rec, b"GET / HTTP/1.1\r\n\r\n").is_ok());
    }

    #[test]
    fn test_phase_tracking() {
        let mut parser = Parser::new(MessageKind::Request);
        let mut rec = Recorder::default();
        assert_eq!(parser.phase(), Phase::StartLine);
        parser.feed(&mut rec, b"POST / HTTP/1.1\r\n").unwrap();
        assert_eq!(parser.phase(), Phase::Headers);
        parser.feed(&mut rec, b"Content-Length: 3\r\n\r\na").unwrap();
        assert_eq!(parser.phase(), Phase::Body);
        assert_eq!(parser.content_length(), Some(2));
    }
}
