//! Assembled HTTP messages
//!
//! The parser itself only reports fragments. These are the complete records
//! built from them by [`MessageAssembler`](super::MessageAssembler), and can
//! also be built by hand and written back out with `to_wire`.

use super::error::ParseError;
use super::headers::Headers;
use super::method::Method;
use super::url::{parse_url_with, Url};
use super::CRLF;
use bytes::{BufMut, Bytes, BytesMut};
use std::fmt;

/// HTTP version as parsed from the start line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Version {
    pub major: u16,
    pub minor: u16,
}

impl Version {
    /// Request line without a version
    pub const HTTP_09: Version = Version { major: 0, minor: 9 };
    pub const HTTP_10: Version = Version { major: 1, minor: 0 };
    pub const HTTP_11: Version = Version { major: 1, minor: 1 };

    pub const fn new(major: u16, minor: u16) -> Self {
        Version { major, minor }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP/{}.{}", self.major, self.minor)
    }
}

impl Default for Version {
    fn default() -> Self {
        Version::HTTP_11
    }
}

impl From<(u16, u16)> for Version {
    fn from((major, minor): (u16, u16)) -> Self {
        Version { major, minor }
    }
}

/// HTTP status code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Status {
    code: u16,
}

impl Status {
    pub const CONTINUE: Status = Status { code: 100 };
    pub const SWITCHING_PROTOCOLS: Status = Status { code: 101 };
    pub const OK: Status = Status { code: 200 };
    pub const NO_CONTENT: Status = Status { code: 204 };
    pub const NOT_MODIFIED: Status = Status { code: 304 };
    pub const BAD_REQUEST: Status = Status { code: 400 };
    pub const NOT_FOUND: Status = Status { code: 404 };
    pub const INTERNAL_SERVER_ERROR: Status = Status { code: 500 };

    /// Create a status code; anything that does not fit three digits fails
    pub fn new(code: u16) -> Result<Self, ParseError> {
        if code <= 999 {
            Ok(Status { code })
        } else {
            Err(ParseError::InvalidStatus)
        }
    }

    /// Code already range-checked by the parser
    pub(crate) fn from_parsed(code: u16) -> Self {
        Status { code }
    }

    /// Get the numeric code
    pub fn code(&self) -> u16 {
        self.code
    }

    /// Get the canonical reason phrase for this status code
    pub fn reason_phrase(&self) -> &'static str {
        match self.code {
            100 => "Continue",
            101 => "Switching Protocols",
            200 => "OK",
            201 => "Created",
            202 => "Accepted",
            204 => "No Content",
            206 => "Partial Content",
            301 => "Moved Permanently",
            302 => "Found",
            303 => "See Other",
            304 => "Not Modified",
            307 => "Temporary Redirect",
            308 => "Permanent Redirect",
            400 => "Bad Request",
            401 => "Unauthorized",
            403 => "Forbidden",
            404 => "Not Found",
            405 => "Method Not Allowed",
            408 => "Request Timeout",
            411 => "Length Required",
            413 => "Payload Too Large",
            414 => "URI Too Long",
            426 => "Upgrade Required",
            431 => "Request Header Fields Too Large",
            500 => "Internal Server Error",
            501 => "Not Implemented",
            502 => "Bad Gateway",
            503 => "Service Unavailable",
            505 => "HTTP Version Not Supported",
            _ => "Unknown",
        }
    }

    pub fn is_informational(&self) -> bool {
        (100..200).contains(&self.code)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.code)
    }

    pub fn is_redirection(&self) -> bool {
        (300..400).contains(&self.code)
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.code)
    }

    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.code)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code, self.reason_phrase())
    }
}

fn put_headers(buf: &mut BytesMut, headers: &Headers) {
    for (name, value) in headers.iter() {
        buf.put_slice(name.as_bytes());
        buf.put_slice(b": ");
        buf.put_slice(value.as_bytes());
        buf.put_slice(CRLF);
    }
    buf.put_slice(CRLF);
}

/// A complete HTTP request
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub(crate) method: Method,
    pub(crate) url: String,
    pub(crate) version: Version,
    pub(crate) headers: Headers,
    pub(crate) body: Bytes,
    pub(crate) keep_alive: bool,
    pub(crate) upgrade: bool,
    /// Character rules the target was accepted under
    pub(crate) strict: bool,
}

impl HttpRequest {
    /// Create a request with no headers and an empty body
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        HttpRequest {
            method,
            url: url.into(),
            version: Version::default(),
            headers: Headers::new(),
            body: Bytes::new(),
            keep_alive: true,
            upgrade: false,
            strict: true,
        }
    }

    /// Create a builder for HTTP requests
    pub fn builder() -> HttpRequestBuilder {
        HttpRequestBuilder::default()
    }

    pub fn method(&self) -> Method {
        self.method
    }

    /// Request target exactly as received
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Request target split into its components
    pub fn parsed_url(&self) -> Result<Url<'_>, ParseError> {
        parse_url_with(self.url.as_bytes(), self.method.is_connect(), self.strict)
    }

    /// Path component of the target, if it has one
    pub fn path(&self) -> Option<&str> {
        let url = self.parsed_url().ok()?;
        std::str::from_utf8(url.path()?).ok()
    }

    /// Query component of the target, without the `?`
    pub fn query(&self) -> Option<&str> {
        let url = self.parsed_url().ok()?;
        std::str::from_utf8(url.query()?).ok()
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn set_body(&mut self, body: impl Into<Bytes>) {
        self.body = body.into();
    }

    /// Whether the connection may carry another message afterwards
    pub fn should_keep_alive(&self) -> bool {
        self.keep_alive
    }

    /// Whether the connection switched protocols after this request
    pub fn is_upgrade(&self) -> bool {
        self.upgrade
    }

    /// Serialize the request; headers are written as stored
    pub fn to_wire(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(64 + self.url.len() + self.body.len());

        buf.put_slice(self.method.as_str().as_bytes());
        buf.put_u8(b' ');
        buf.put_slice(self.url.as_bytes());
        if self.version != Version::HTTP_09 {
            buf.put_u8(b' ');
            buf.put_slice(self.version.to_string().as_bytes());
        }
        buf.put_slice(CRLF);
        put_headers(&mut buf, &self.headers);
        buf.put_slice(&self.body);

        buf.freeze()
    }
}

/// Builder for HTTP requests
#[derive(Debug, Default)]
pub struct HttpRequestBuilder {
    method: Option<Method>,
    url: Option<String>,
    version: Option<Version>,
    headers: Headers,
    body: Bytes,
}

impl HttpRequestBuilder {
    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn version(mut self, version: Version) -> Self {
        self.version = Some(version);
        self
    }

    /// Add a header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn build(self) -> HttpRequest {
        HttpRequest {
            method: self.method.unwrap_or(Method::Get),
            url: self.url.unwrap_or_else(|| "/".to_string()),
            version: self.version.unwrap_or_default(),
            headers: self.headers,
            body: self.body,
            keep_alive: true,
            upgrade: false,
            strict: true,
        }
    }
}

/// A complete HTTP response
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub(crate) version: Version,
    pub(crate) status: Status,
    pub(crate) reason: String,
    pub(crate) headers: Headers,
    pub(crate) body: Bytes,
    pub(crate) keep_alive: bool,
    pub(crate) upgrade: bool,
}

impl HttpResponse {
    /// Create a response with no headers and an empty body
    pub fn new(status: Status) -> Self {
        HttpResponse {
            version: Version::default(),
            status,
            reason: status.reason_phrase().to_string(),
            headers: Headers::new(),
            body: Bytes::new(),
            keep_alive: true,
            upgrade: false,
        }
    }

    /// Create a builder for HTTP responses
    pub fn builder() -> HttpResponseBuilder {
        HttpResponseBuilder::default()
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// Reason phrase as received; empty when the status line had none
    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn set_body(&mut self, body: impl Into<Bytes>) {
        self.body = body.into();
    }

    pub fn should_keep_alive(&self) -> bool {
        self.keep_alive
    }

    pub fn is_upgrade(&self) -> bool {
        self.upgrade
    }

    /// Serialize the response; headers are written as stored
    pub fn to_wire(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(64 + self.reason.len() + self.body.len());

        buf.put_slice(self.version.to_string().as_bytes());
        buf.put_u8(b' ');
        buf.put_slice(format!("{:03}", self.status.code()).as_bytes());
        buf.put_u8(b' ');
        buf.put_slice(self.reason.as_bytes());
        buf.put_slice(CRLF);
        put_headers(&mut buf, &self.headers);
        buf.put_slice(&self.body);

        buf.freeze()
    }
}

/// Builder for HTTP responses
#[derive(Debug, Default)]
pub struct HttpResponseBuilder {
    version: Option<Version>,
    status: Option<Status>,
    reason: Option<String>,
    headers: Headers,
    body: Bytes,
}

impl HttpResponseBuilder {
    pub fn version(mut self, version: Version) -> Self {
        self.version = Some(version);
        self
    }

    pub fn status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Add a header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn build(self) -> HttpResponse {
        let status = self.status.unwrap_or(Status::OK);
        let reason = self
            .reason
            .unwrap_or_else(|| status.reason_phrase().to_string());
        HttpResponse {
            version: self.version.unwrap_or_default(),
            status,
            reason,
            headers: self.headers,
            body: self.body,
            keep_alive: true,
            upgrade: false,
        }
    }
}

/// Either kind of assembled message
#[derive(Debug, Clone)]
pub enum Message {
    Request(HttpRequest),
    Response(HttpResponse),
}

impl Message {
    pub fn version(&self) -> Version {
        match self {
            Message::Request(req) => req.version(),
            Message::Response(resp) => resp.version(),
        }
    }

    pub fn headers(&self) -> &Headers {
        match self {
            Message::Request(req) => req.headers(),
            Message::Response(resp) => resp.headers(),
        }
    }

    pub fn body(&self) -> &Bytes {
        match self {
            Message::Request(req) => req.body(),
            Message::Response(resp) => resp.body(),
        }
    }

    pub fn should_keep_alive(&self) -> bool {
        match self {
            Message::Request(req) => req.should_keep_alive(),
            Message::Response(resp) => resp.should_keep_alive(),
        }
    }

    pub fn is_upgrade(&self) -> bool {
        match self {
            Message::Request(req) => req.is_upgrade(),
            Message::Response(resp) => resp.is_upgrade(),
        }
    }

    /// The request, if this is one
    pub fn as_request(&self) -> Option<&HttpRequest> {
        match self {
            Message::Request(req) => Some(req),
            Message::Response(_) => None,
        }
    }

    /// The response, if this is one
    pub fn as_response(&self) -> Option<&HttpResponse> {
        match self {
            Message::Response(resp) => Some(resp),
            Message::Request(_) => None,
        }
    }

    pub fn into_request(self) -> Option<HttpRequest> {
        match self {
            Message::Request(req) => Some(req),
            Message::Response(_) => None,
        }
    }

    pub fn into_response(self) -> Option<HttpResponse> {
        match self {
            Message::Response(resp) => Some(resp),
            Message::Request(_) => None,
        }
    }
}

impl From<HttpRequest> for Message {
    fn from(req: HttpRequest) -> Self {
        Message::Request(req)
    }
}

impl From<HttpResponse> for Message {
    fn from(resp: HttpResponse) -> Self {
        Message::Response(resp)
    }
}
