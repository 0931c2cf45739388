//! Parse error types
//!
//! `ParseError` covers everything the message parser and the standalone URL
//! parser can report. Each kind has a stable symbolic name and a human
//! description for diagnostics. `Error` is the wider error returned by the
//! I/O driver in [`super::reader`].

use std::fmt;

/// Parser callbacks, used to tag callback-originated failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Callback {
    MessageBegin,
    Url,
    Status,
    HeaderField,
    HeaderValue,
    HeadersComplete,
    Body,
    MessageComplete,
}

impl Callback {
    /// Name of the handler method behind this callback
    pub fn name(&self) -> &'static str {
        match self {
            Callback::MessageBegin => "on_message_begin",
            Callback::Url => "on_url",
            Callback::Status => "on_status",
            Callback::HeaderField => "on_header_field",
            Callback::HeaderValue => "on_header_value",
            Callback::HeadersComplete => "on_headers_complete",
            Callback::Body => "on_body",
            Callback::MessageComplete => "on_message_complete",
        }
    }
}

impl fmt::Display for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Terminal parse failures
///
/// Once the parser reports one of these it stays failed until reset.
/// `Display` prints [`ParseError::description`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum ParseError {
    /// A handler asked the parser to stop
    CallbackFailed(Callback),
    UnexpectedEndOfStream,
    /// Start line plus headers exceeded the configured byte budget
    HeaderOverflow,
    /// Data arrived after a message that forbade connection reuse
    ClosedConnection,
    InvalidVersion,
    InvalidStatus,
    InvalidMethod,
    InvalidUrl,
    InvalidHost,
    InvalidPort,
    InvalidPath,
    InvalidQueryString,
    InvalidFragment,
    LineFeedExpected,
    InvalidHeaderToken,
    /// Bad Content-Length digit, or a length/chunk size that would overflow
    InvalidContentLength,
    InvalidChunkSize,
    /// Malformed literal such as the `HTTP/` prefix
    InvalidConstant,
    InternalStateCorruption,
    StrictModeViolation,
    Unknown,
}

impl ParseError {
    /// Stable symbolic name
    pub fn name(&self) -> &'static str {
        match self {
            ParseError::CallbackFailed(cb) => match cb {
                Callback::MessageBegin => "CB_MESSAGE_BEGIN",
                Callback::Url => "CB_URL",
                Callback::Status => "CB_STATUS",
                Callback::HeaderField => "CB_HEADER_FIELD",
                Callback::HeaderValue => "CB_HEADER_VALUE",
                Callback::HeadersComplete => "CB_HEADERS_COMPLETE",
                Callback::Body => "CB_BODY",
                Callback::MessageComplete => "CB_MESSAGE_COMPLETE",
            },
            ParseError::UnexpectedEndOfStream => "UNEXPECTED_EOF",
            ParseError::HeaderOverflow => "HEADER_OVERFLOW",
            ParseError::ClosedConnection => "CLOSED_CONNECTION",
            ParseError::InvalidVersion => "INVALID_VERSION",
            ParseError::InvalidStatus => "INVALID_STATUS",
            ParseError::InvalidMethod => "INVALID_METHOD",
            ParseError::InvalidUrl => "INVALID_URL",
            ParseError::InvalidHost => "INVALID_HOST",
            ParseError::InvalidPort => "INVALID_PORT",
            ParseError::InvalidPath => "INVALID_PATH",
            ParseError::InvalidQueryString => "INVALID_QUERY_STRING",
            ParseError::InvalidFragment => "INVALID_FRAGMENT",
            ParseError::LineFeedExpected => "LF_EXPECTED",
            ParseError::InvalidHeaderToken => "INVALID_HEADER_TOKEN",
            ParseError::InvalidContentLength => "INVALID_CONTENT_LENGTH",
            ParseError::InvalidChunkSize => "INVALID_CHUNK_SIZE",
            ParseError::InvalidConstant => "INVALID_CONSTANT",
            ParseError::InternalStateCorruption => "INVALID_INTERNAL_STATE",
            ParseError::StrictModeViolation => "STRICT",
            ParseError::Unknown => "UNKNOWN",
        }
    }

    /// Human readable description
    pub fn description(&self) -> &'static str {
        match self {
            ParseError::CallbackFailed(cb) => match cb {
                Callback::MessageBegin => "the on_message_begin callback failed",
                Callback::Url => "the on_url callback failed",
                Callback::Status => "the on_status callback failed",
                Callback::HeaderField => "the on_header_field callback failed",
                Callback::HeaderValue => "the on_header_value callback failed",
                Callback::HeadersComplete => "the on_headers_complete callback failed",
                Callback::Body => "the on_body callback failed",
                Callback::MessageComplete => "the on_message_complete callback failed",
            },
            ParseError::UnexpectedEndOfStream => "stream ended at an unexpected time",
            ParseError::HeaderOverflow => "too many header bytes seen; overflow detected",
            ParseError::ClosedConnection => {
                "data received after completed connection: close message"
            }
            ParseError::InvalidVersion => "invalid HTTP version",
            ParseError::InvalidStatus => "invalid HTTP status code",
            ParseError::InvalidMethod => "invalid HTTP method",
            ParseError::InvalidUrl => "invalid URL",
            ParseError::InvalidHost => "invalid host",
            ParseError::InvalidPort => "invalid port",
            ParseError::InvalidPath => "invalid path",
            ParseError::InvalidQueryString => "invalid query string",
            ParseError::InvalidFragment => "invalid fragment",
            ParseError::LineFeedExpected => "LF character expected",
            ParseError::InvalidHeaderToken => "invalid character in header",
            ParseError::InvalidContentLength => "invalid character in content-length header",
            ParseError::InvalidChunkSize => "invalid character in chunk size header",
            ParseError::InvalidConstant => "invalid constant string",
            ParseError::InternalStateCorruption => "encountered unexpected internal state",
            ParseError::StrictModeViolation => "strict mode assertion failed",
            ParseError::Unknown => "an unknown error occurred",
        }
    }

    /// True when the failure came from a handler rather than the input
    pub fn is_callback(&self) -> bool {
        matches!(self, ParseError::CallbackFailed(_))
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Errors from driving a parser over an I/O source
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// The peer closed the stream in the middle of a message
    #[error("Connection closed")]
    ConnectionClosed,

    /// The stream switched protocols; no further HTTP messages follow
    #[error("Connection upgraded")]
    Upgraded,
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [ParseError; 28] = [
        ParseError::CallbackFailed(Callback::MessageBegin),
        ParseError::CallbackFailed(Callback::Url),
        ParseError::CallbackFailed(Callback::Status),
        ParseError::CallbackFailed(Callback::HeaderField),
        ParseError::CallbackFailed(Callback::HeaderValue),
        ParseError::CallbackFailed(Callback::HeadersComplete),
        ParseError::CallbackFailed(Callback::Body),
        ParseError::CallbackFailed(Callback::MessageComplete),
        ParseError::UnexpectedEndOfStream,
        ParseError::HeaderOverflow,
        ParseError::ClosedConnection,
        ParseError::InvalidVersion,
        ParseError::InvalidStatus,
        ParseError::InvalidMethod,
        ParseError::InvalidUrl,
        ParseError::InvalidHost,
        ParseError::InvalidPort,
        ParseError::InvalidPath,
        ParseError::InvalidQueryString,
        ParseError::InvalidFragment,
        ParseError::LineFeedExpected,
        ParseError::InvalidHeaderToken,
        ParseError::InvalidContentLength,
        ParseError::InvalidChunkSize,
        ParseError::InvalidConstant,
        ParseError::InternalStateCorruption,
        ParseError::StrictModeViolation,
        ParseError::Unknown,
    ];

    #[test]
    fn test_names_are_unique() {
        let mut names: Vec<_> = ALL.iter().map(|e| e.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), ALL.len());
    }

    #[test]
    fn test_display_matches_description() {
        for err in ALL {
            assert_eq!(err.to_string(), err.description(), "{}", err.name());
        }

        let err = ParseError::CallbackFailed(Callback::HeadersComplete);
        assert_eq!(err.to_string(), "the on_headers_complete callback failed");
        assert_eq!(err.name(), "CB_HEADERS_COMPLETE");
        assert!(err.is_callback());
        assert!(!ParseError::HeaderOverflow.is_callback());
    }

    #[test]
    fn test_error_wraps_parse_error() {
        let err: Error = ParseError::InvalidMethod.into();
        assert!(matches!(err, Error::Parse(ParseError::InvalidMethod)));
        assert_eq!(err.to_string(), "Parse error: invalid HTTP method");
    }
}
