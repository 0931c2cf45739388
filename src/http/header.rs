//! Incremental matching of significant header names and values
//!
//! The parser never buffers header text just to look at it. Instead it feeds
//! each lowercased byte to a [`HeaderMatcher`], which tracks a partial match
//! against the handful of names and values that affect message framing. The
//! first mismatching byte demotes the field to [`HeaderState::General`] and
//! the matcher ignores the rest of it.

use super::parser::Flags;

const CONNECTION: &[u8] = b"connection";
const PROXY_CONNECTION: &[u8] = b"proxy-connection";
const CONTENT_LENGTH: &[u8] = b"content-length";
const TRANSFER_ENCODING: &[u8] = b"transfer-encoding";
const UPGRADE: &[u8] = b"upgrade";
const CHUNKED: &[u8] = b"chunked";
const KEEP_ALIVE: &[u8] = b"keep-alive";
const CLOSE: &[u8] = b"close";

/// Match progress for the current header field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HeaderState {
    /// Not a header the parser cares about
    #[default]
    General,
    C,
    CO,
    CON,

    MatchingConnection,
    MatchingProxyConnection,
    MatchingContentLength,
    MatchingTransferEncoding,
    MatchingUpgrade,

    // Complete names
    Connection,
    ContentLength,
    TransferEncoding,
    Upgrade,

    MatchingTransferEncodingChunked,
    MatchingConnectionKeepAlive,
    MatchingConnectionClose,

    // Complete values
    TransferEncodingChunked,
    ConnectionKeepAlive,
    ConnectionClose,
}

impl HeaderState {
    /// The literal being matched, with the state reached once it is complete
    fn target(&self) -> Option<(&'static [u8], HeaderState)> {
        let target = match self {
            HeaderState::MatchingConnection => (CONNECTION, HeaderState::Connection),
            HeaderState::MatchingProxyConnection => (PROXY_CONNECTION, HeaderState::Connection),
            HeaderState::MatchingContentLength => (CONTENT_LENGTH, HeaderState::ContentLength),
            HeaderState::MatchingTransferEncoding => {
                (TRANSFER_ENCODING, HeaderState::TransferEncoding)
            }
            HeaderState::MatchingUpgrade => (UPGRADE, HeaderState::Upgrade),
            HeaderState::MatchingTransferEncodingChunked => {
                (CHUNKED, HeaderState::TransferEncodingChunked)
            }
            HeaderState::MatchingConnectionKeepAlive => {
                (KEEP_ALIVE, HeaderState::ConnectionKeepAlive)
            }
            HeaderState::MatchingConnectionClose => (CLOSE, HeaderState::ConnectionClose),
            _ => return None,
        };
        Some(target)
    }
}

/// What the parser has to do at the first byte of a value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueStart {
    Plain,
    /// An `Upgrade` header is present, whatever its value
    Upgrade,
    /// The value is a Content-Length; the parser accumulates its digits
    ContentLength,
}

/// Byte-at-a-time classifier for one header line
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderMatcher {
    state: HeaderState,
    index: usize,
}

impl HeaderMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> HeaderState {
        self.state
    }

    /// Start a new field name with its first (lowercased) byte
    pub fn begin_name(&mut self, c: u8) {
        self.index = 0;
        self.state = match c {
            b'c' => HeaderState::C,
            b'p' => HeaderState::MatchingProxyConnection,
            b't' => HeaderState::MatchingTransferEncoding,
            b'u' => HeaderState::MatchingUpgrade,
            _ => HeaderState::General,
        };
    }

    /// Feed one more name byte
    ///
    /// `c` is the token-lowercased form of the raw byte `ch`.
    pub fn name_byte(&mut self, c: u8, ch: u8) {
        self.state = match self.state {
            HeaderState::General => HeaderState::General,
            HeaderState::C => {
                self.index += 1;
                if c == b'o' {
                    HeaderState::CO
                } else {
                    HeaderState::General
                }
            }
            HeaderState::CO => {
                self.index += 1;
                if c == b'n' {
                    HeaderState::CON
                } else {
                    HeaderState::General
                }
            }
            HeaderState::CON => {
                self.index += 1;
                match c {
                    b'n' => HeaderState::MatchingConnection,
                    b't' => HeaderState::MatchingContentLength,
                    _ => HeaderState::General,
                }
            }
            HeaderState::Connection
            | HeaderState::ContentLength
            | HeaderState::TransferEncoding
            | HeaderState::Upgrade => {
                // Trailing spaces before the colon are tolerated
                if ch == b' ' {
                    self.state
                } else {
                    HeaderState::General
                }
            }
            state => self.advance(state, c),
        };
    }

    /// Start a value; the header name is complete
    pub fn begin_value(&mut self, ch: u8) -> ValueStart {
        self.index = 0;
        let c = ch.to_ascii_lowercase();
        let (next, start) = match self.state {
            HeaderState::Upgrade => (HeaderState::General, ValueStart::Upgrade),
            HeaderState::TransferEncoding if c == b'c' => {
                (HeaderState::MatchingTransferEncodingChunked, ValueStart::Plain)
            }
            HeaderState::ContentLength => (HeaderState::ContentLength, ValueStart::ContentLength),
            HeaderState::Connection if c == b'k' => {
                (HeaderState::MatchingConnectionKeepAlive, ValueStart::Plain)
            }
            HeaderState::Connection if c == b'c' => {
                (HeaderState::MatchingConnectionClose, ValueStart::Plain)
            }
            _ => (HeaderState::General, ValueStart::Plain),
        };
        self.state = next;
        start
    }

    /// Feed one more value byte
    ///
    /// Content-Length digits are handled by the parser, not here.
    pub fn value_byte(&mut self, ch: u8) {
        let c = ch.to_ascii_lowercase();
        self.state = match self.state {
            HeaderState::General | HeaderState::ContentLength => self.state,
            HeaderState::TransferEncodingChunked
            | HeaderState::ConnectionKeepAlive
            | HeaderState::ConnectionClose => {
                if ch == b' ' {
                    self.state
                } else {
                    HeaderState::General
                }
            }
            state @ (HeaderState::MatchingTransferEncodingChunked
            | HeaderState::MatchingConnectionKeepAlive
            | HeaderState::MatchingConnectionClose) => self.advance(state, c),
            _ => HeaderState::General,
        };
    }

    /// The framing flag established by the header just finished, if any
    pub fn finish(&self) -> Option<Flags> {
        match self.state {
            HeaderState::ConnectionKeepAlive => Some(Flags::CONNECTION_KEEP_ALIVE),
            HeaderState::ConnectionClose => Some(Flags::CONNECTION_CLOSE),
            HeaderState::TransferEncodingChunked => Some(Flags::CHUNKED),
            _ => None,
        }
    }

    fn advance(&mut self, state: HeaderState, c: u8) -> HeaderState {
        let (literal, complete) = match state.target() {
            Some(target) => target,
            None => return HeaderState::General,
        };
        self.index += 1;
        match literal.get(self.index) {
            Some(&expected) if expected == c => {
                if self.index == literal.len() - 1 {
                    complete
                } else {
                    state
                }
            }
            _ => HeaderState::General,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(text: &[u8]) -> HeaderState {
        let mut m = HeaderMatcher::new();
        let lower: Vec<u8> = text.iter().map(|b| b.to_ascii_lowercase()).collect();
        m.begin_name(lower[0]);
        for (i, &c) in lower.iter().enumerate().skip(1) {
            m.name_byte(c, text[i]);
        }
        m.state()
    }

    fn header(field: &[u8], value: &[u8]) -> (HeaderMatcher, ValueStart) {
        let mut m = HeaderMatcher::new();
        let lower: Vec<u8> = field.iter().map(|b| b.to_ascii_lowercase()).collect();
        m.begin_name(lower[0]);
        for (i, &c) in lower.iter().enumerate().skip(1) {
            m.name_byte(c, field[i]);
        }
        let start = m.begin_value(value[0]);
        for &ch in &value[1..] {
            m.value_byte(ch);
        }
        (m, start)
    }

    #[test]
    fn test_names() {
        assert_eq!(name(b"Connection"), HeaderState::Connection);
        assert_eq!(name(b"PROXY-CONNECTION"), HeaderState::Connection);
        assert_eq!(name(b"Content-Length"), HeaderState::ContentLength);
        assert_eq!(name(b"transfer-encoding"), HeaderState::TransferEncoding);
        assert_eq!(name(b"Upgrade"), HeaderState::Upgrade);
        assert_eq!(name(b"Content-Type"), HeaderState::General);
        assert_eq!(name(b"Host"), HeaderState::General);
    }

    #[test]
    fn test_name_mismatch_is_permanent() {
        assert_eq!(name(b"Connections"), HeaderState::General);
        assert_eq!(name(b"Cookie"), HeaderState::General);
        assert_eq!(name(b"Upgrad"), HeaderState::MatchingUpgrade);
        assert_eq!(name(b"Content-Lengthy"), HeaderState::General);
    }

    #[test]
    fn test_values() {
        let (m, _) = header(b"Connection", b"keep-alive");
        assert_eq!(m.finish(), Some(Flags::CONNECTION_KEEP_ALIVE));

        let (m, _) = header(b"Connection", b"CLOSE");
        assert_eq!(m.finish(), Some(Flags::CONNECTION_CLOSE));

        let (m, _) = header(b"Transfer-Encoding", b"chunked  ");
        assert_eq!(m.finish(), Some(Flags::CHUNKED));

        let (m, _) = header(b"Transfer-Encoding", b"gzip, chunked");
        assert_eq!(m.finish(), None);

        let (m, _) = header(b"Connection", b"Upgrade");
        assert_eq!(m.finish(), None);

        let (m, _) = header(b"X-Connection", b"close");
        assert_eq!(m.finish(), None);
    }

    #[test]
    fn test_value_start_signals() {
        let (_, start) = header(b"Upgrade", b"websocket");
        assert_eq!(start, ValueStart::Upgrade);

        let (m, start) = header(b"Content-Length", b"42");
        assert_eq!(start, ValueStart::ContentLength);
        assert_eq!(m.state(), HeaderState::ContentLength);

        let (_, start) = header(b"Host", b"example.com");
        assert_eq!(start, ValueStart::Plain);
    }
}
