//! Request-target scanning
//!
//! [`next_state`] is the byte-at-a-time transition function shared by the
//! request-line scanner and by [`parse_url`], which splits a complete URL
//! into its components without copying.

use super::chars::{is_alpha, is_url_char, is_userinfo_char};
use super::error::ParseError;
use super::host::parse_host;
use bitflags::bitflags;
use std::fmt;

/// Position inside a request target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UrlState {
    /// Nothing consumed yet
    Start,
    Schema,
    /// Seen `scheme:`
    SchemaSlash,
    /// Seen `scheme:/`
    SchemaSlashSlash,
    /// Seen `scheme://`, or the start of a CONNECT target
    ServerStart,
    Server,
    /// Inside the authority after a `@`
    ServerWithAt,
    Path,
    QueryStringStart,
    QueryString,
    FragmentStart,
    Fragment,
}

impl UrlState {
    /// The component this state accumulates, if any
    ///
    /// Delimiter states (`:`, `//`, `?`, `#`) belong to no component.
    pub fn field(&self) -> Option<UrlField> {
        match self {
            UrlState::Schema => Some(UrlField::Schema),
            UrlState::Server | UrlState::ServerWithAt => Some(UrlField::Host),
            UrlState::Path => Some(UrlField::Path),
            UrlState::QueryString => Some(UrlField::Query),
            UrlState::Fragment => Some(UrlField::Fragment),
            _ => None,
        }
    }

    /// Whether a space, CR or LF may end the target in this state
    pub fn can_end(&self) -> bool {
        !matches!(
            self,
            UrlState::Start
                | UrlState::Schema
                | UrlState::SchemaSlash
                | UrlState::SchemaSlashSlash
                | UrlState::ServerStart
        )
    }

    fn error(&self) -> ParseError {
        match self {
            UrlState::Path => ParseError::InvalidPath,
            UrlState::QueryStringStart | UrlState::QueryString => ParseError::InvalidQueryString,
            UrlState::FragmentStart | UrlState::Fragment => ParseError::InvalidFragment,
            UrlState::ServerStart | UrlState::Server | UrlState::ServerWithAt => {
                ParseError::InvalidHost
            }
            _ => ParseError::InvalidUrl,
        }
    }
}

/// Advance the target scanner by one byte
///
/// Returns `None` when `ch` cannot continue the target. Space, CR and LF are
/// never part of a target; the caller treats them as terminators.
pub fn next_state(state: UrlState, ch: u8, strict: bool) -> Option<UrlState> {
    if matches!(ch, b' ' | b'\r' | b'\n') {
        return None;
    }
    if strict && matches!(ch, b'\t' | 0x0c) {
        return None;
    }

    match state {
        UrlState::Start => {
            // Origin form starts with '/' or '*', absolute form with a scheme
            if ch == b'/' || ch == b'*' {
                return Some(UrlState::Path);
            }
            if is_alpha(ch) {
                return Some(UrlState::Schema);
            }
        }

        UrlState::Schema => {
            if is_alpha(ch) {
                return Some(UrlState::Schema);
            }
            if ch == b':' {
                return Some(UrlState::SchemaSlash);
            }
        }

        UrlState::SchemaSlash => {
            if ch == b'/' {
                return Some(UrlState::SchemaSlashSlash);
            }
        }

        UrlState::SchemaSlashSlash => {
            if ch == b'/' {
                return Some(UrlState::ServerStart);
            }
        }

        UrlState::ServerStart | UrlState::Server | UrlState::ServerWithAt => {
            if state == UrlState::ServerWithAt && ch == b'@' {
                return None;
            }
            match ch {
                b'/' => return Some(UrlState::Path),
                b'?' => return Some(UrlState::QueryStringStart),
                b'@' => return Some(UrlState::ServerWithAt),
                b'[' | b']' => return Some(UrlState::Server),
                _ if is_userinfo_char(ch) => return Some(UrlState::Server),
                _ => {}
            }
        }

        UrlState::Path => {
            if is_url_char(ch, strict) {
                return Some(UrlState::Path);
            }
            match ch {
                b'?' => return Some(UrlState::QueryStringStart),
                b'#' => return Some(UrlState::FragmentStart),
                _ => {}
            }
        }

        UrlState::QueryStringStart | UrlState::QueryString => {
            if is_url_char(ch, strict) || ch == b'?' {
                return Some(UrlState::QueryString);
            }
            if ch == b'#' {
                return Some(UrlState::FragmentStart);
            }
        }

        UrlState::FragmentStart => {
            if is_url_char(ch, strict) || ch == b'?' {
                return Some(UrlState::Fragment);
            }
            if ch == b'#' {
                return Some(UrlState::FragmentStart);
            }
        }

        UrlState::Fragment => {
            if is_url_char(ch, strict) || ch == b'?' || ch == b'#' {
                return Some(UrlState::Fragment);
            }
        }
    }

    None
}

/// URL components, in field-set bit order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UrlField {
    Schema,
    Host,
    Port,
    Path,
    Query,
    Fragment,
    UserInfo,
}

impl UrlField {
    pub const ALL: [UrlField; 7] = [
        UrlField::Schema,
        UrlField::Host,
        UrlField::Port,
        UrlField::Path,
        UrlField::Query,
        UrlField::Fragment,
        UrlField::UserInfo,
    ];

    pub fn bit(&self) -> UrlFieldSet {
        match self {
            UrlField::Schema => UrlFieldSet::SCHEMA,
            UrlField::Host => UrlFieldSet::HOST,
            UrlField::Port => UrlFieldSet::PORT,
            UrlField::Path => UrlFieldSet::PATH,
            UrlField::Query => UrlFieldSet::QUERY,
            UrlField::Fragment => UrlFieldSet::FRAGMENT,
            UrlField::UserInfo => UrlFieldSet::USERINFO,
        }
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

bitflags! {
    /// Which components a URL contained
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct UrlFieldSet: u8 {
        const SCHEMA = 1 << 0;
        const HOST = 1 << 1;
        const PORT = 1 << 2;
        const PATH = 1 << 3;
        const QUERY = 1 << 4;
        const FRAGMENT = 1 << 5;
        const USERINFO = 1 << 6;
    }
}

/// Offset and length of one component within the parsed buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FieldSpan {
    pub off: usize,
    pub len: usize,
}

impl FieldSpan {
    pub fn end(&self) -> usize {
        self.off + self.len
    }
}

/// Component offsets produced by [`parse_url`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UrlParts {
    pub(crate) field_set: UrlFieldSet,
    pub(crate) spans: [FieldSpan; 7],
    pub(crate) port: u16,
    pub(crate) host_is_ipv6: bool,
}

impl UrlParts {
    pub fn field_set(&self) -> UrlFieldSet {
        self.field_set
    }

    pub fn has(&self, field: UrlField) -> bool {
        self.field_set.contains(field.bit())
    }

    pub fn span(&self, field: UrlField) -> Option<FieldSpan> {
        self.has(field).then(|| self.spans[field.index()])
    }

    /// Numeric port, when one was given
    pub fn port(&self) -> Option<u16> {
        self.has(UrlField::Port).then_some(self.port)
    }

    /// Whether the host was a bracketed IPv6 literal
    pub fn host_is_ipv6(&self) -> bool {
        self.host_is_ipv6
    }

    pub(crate) fn set(&mut self, field: UrlField, span: FieldSpan) {
        self.field_set.insert(field.bit());
        self.spans[field.index()] = span;
    }

    pub(crate) fn span_mut(&mut self, field: UrlField) -> &mut FieldSpan {
        &mut self.spans[field.index()]
    }
}

/// A URL split into borrowed components
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Url<'a> {
    buf: &'a [u8],
    parts: UrlParts,
}

impl<'a> Url<'a> {
    /// The whole input
    pub fn as_bytes(&self) -> &'a [u8] {
        self.buf
    }

    pub fn parts(&self) -> &UrlParts {
        &self.parts
    }

    pub fn get(&self, field: UrlField) -> Option<&'a [u8]> {
        self.parts
            .span(field)
            .map(|span| &self.buf[span.off..span.end()])
    }

    pub fn schema(&self) -> Option<&'a [u8]> {
        self.get(UrlField::Schema)
    }

    /// Host name or address; IPv6 literals come without brackets
    pub fn host(&self) -> Option<&'a [u8]> {
        self.get(UrlField::Host)
    }

    pub fn port(&self) -> Option<u16> {
        self.parts.port()
    }

    pub fn path(&self) -> Option<&'a [u8]> {
        self.get(UrlField::Path)
    }

    pub fn query(&self) -> Option<&'a [u8]> {
        self.get(UrlField::Query)
    }

    pub fn fragment(&self) -> Option<&'a [u8]> {
        self.get(UrlField::Fragment)
    }

    pub fn userinfo(&self) -> Option<&'a [u8]> {
        self.get(UrlField::UserInfo)
    }
}

impl fmt::Debug for Url<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut dbg = f.debug_struct("Url");
        for field in UrlField::ALL {
            if let Some(bytes) = self.get(field) {
                dbg.field(&format!("{:?}", field), &String::from_utf8_lossy(bytes));
            }
        }
        dbg.finish()
    }
}

/// Split a complete URL into components using strict character rules
///
/// `is_connect` selects the CONNECT target form, which must be exactly
/// `host:port`.
pub fn parse_url(buf: &[u8], is_connect: bool) -> Result<Url<'_>, ParseError> {
    parse_url_with(buf, is_connect, true)
}

/// Split a complete URL into components
pub fn parse_url_with(buf: &[u8], is_connect: bool, strict: bool) -> Result<Url<'_>, ParseError> {
    let mut parts = UrlParts::default();
    let mut state = if is_connect {
        UrlState::ServerStart
    } else {
        UrlState::Start
    };
    let mut current: Option<UrlField> = None;
    let mut found_at = false;

    for (pos, &ch) in buf.iter().enumerate() {
        state = match next_state(state, ch, strict) {
            Some(next) => next,
            None => return Err(state.error()),
        };

        let field = match state.field() {
            Some(field) => field,
            None => continue,
        };
        if state == UrlState::ServerWithAt {
            found_at = true;
        }

        if current == Some(field) {
            parts.span_mut(field).len += 1;
            continue;
        }
        parts.set(field, FieldSpan { off: pos, len: 1 });
        current = Some(field);
    }

    if parts.field_set.is_empty() {
        return Err(ParseError::InvalidUrl);
    }

    // A scheme implies an authority; "http:///x" has an empty one
    if parts
        .field_set
        .intersects(UrlFieldSet::SCHEMA | UrlFieldSet::HOST)
    {
        parse_host(buf, &mut parts, found_at, strict)?;
    }

    if is_connect && parts.field_set != (UrlFieldSet::HOST | UrlFieldSet::PORT) {
        return Err(ParseError::InvalidUrl);
    }

    if let Some(span) = parts.span(UrlField::Port) {
        let value = buf[span.off..span.end()]
            .iter()
            .fold(0u32, |acc, &d| acc.saturating_mul(10).saturating_add((d - b'0') as u32));
        if value > 0xffff {
            return Err(ParseError::InvalidPort);
        }
        parts.port = value as u16;
    }

    Ok(Url { buf, parts })
}
