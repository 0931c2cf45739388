//! HTTP request methods
//!
//! The request-line scanner never buffers the method name. It guesses a
//! method from the first byte and then either confirms each following byte
//! against that guess or switches to a sibling method that shares the
//! prefix seen so far (see [`Method::refine`]).

use std::fmt;

/// HTTP methods, including the WebDAV, UPnP and CalDAV verbs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Delete,
    Get,
    Head,
    Post,
    Put,
    Connect,
    Options,
    Trace,
    // WebDAV
    Copy,
    Lock,
    MkCol,
    Move,
    PropFind,
    PropPatch,
    Search,
    Unlock,
    // Subversion
    Report,
    MkActivity,
    Checkout,
    Merge,
    // UPnP
    MSearch,
    Notify,
    Subscribe,
    Unsubscribe,
    // RFC 5789
    Patch,
    Purge,
    // CalDAV
    MkCalendar,
}

impl Method {
    /// Every method, in canonical order
    pub const ALL: [Method; 27] = [
        Method::Delete,
        Method::Get,
        Method::Head,
        Method::Post,
        Method::Put,
        Method::Connect,
        Method::Options,
        Method::Trace,
        Method::Copy,
        Method::Lock,
        Method::MkCol,
        Method::Move,
        Method::PropFind,
        Method::PropPatch,
        Method::Search,
        Method::Unlock,
        Method::Report,
        Method::MkActivity,
        Method::Checkout,
        Method::Merge,
        Method::MSearch,
        Method::Notify,
        Method::Subscribe,
        Method::Unsubscribe,
        Method::Patch,
        Method::Purge,
        Method::MkCalendar,
    ];

    /// Canonical method name
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Delete => "DELETE",
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Connect => "CONNECT",
            Method::Options => "OPTIONS",
            Method::Trace => "TRACE",
            Method::Copy => "COPY",
            Method::Lock => "LOCK",
            Method::MkCol => "MKCOL",
            Method::Move => "MOVE",
            Method::PropFind => "PROPFIND",
            Method::PropPatch => "PROPPATCH",
            Method::Search => "SEARCH",
            Method::Unlock => "UNLOCK",
            Method::Report => "REPORT",
            Method::MkActivity => "MKACTIVITY",
            Method::Checkout => "CHECKOUT",
            Method::Merge => "MERGE",
            Method::MSearch => "M-SEARCH",
            Method::Notify => "NOTIFY",
            Method::Subscribe => "SUBSCRIBE",
            Method::Unsubscribe => "UNSUBSCRIBE",
            Method::Patch => "PATCH",
            Method::Purge => "PURGE",
            Method::MkCalendar => "MKCALENDAR",
        }
    }

    /// Look up a method by its exact (case-sensitive) name
    pub fn from_bytes(name: &[u8]) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|m| m.as_str().as_bytes() == name)
    }

    /// First guess for a method starting with `ch`
    ///
    /// Letters shared by several methods map to one representative; the
    /// scanner corrects the guess later with [`Method::refine`].
    pub fn from_first_byte(ch: u8) -> Option<Self> {
        let method = match ch {
            b'C' => Method::Connect,
            b'D' => Method::Delete,
            b'G' => Method::Get,
            b'H' => Method::Head,
            b'L' => Method::Lock,
            b'M' => Method::MkCol,
            b'N' => Method::Notify,
            b'O' => Method::Options,
            b'P' => Method::Post,
            b'R' => Method::Report,
            b'S' => Method::Subscribe,
            b'T' => Method::Trace,
            b'U' => Method::Unlock,
            _ => return None,
        };
        Some(method)
    }

    /// Switch to a sibling method after `ch` failed to match at `index`
    ///
    /// Returns `None` when no known method continues the prefix.
    pub fn refine(self, index: usize, ch: u8) -> Option<Self> {
        match (self, index, ch) {
            (Method::Connect, 1, b'H') => Some(Method::Checkout),
            (Method::Connect, 2, b'P') => Some(Method::Copy),
            (Method::Connect, _, _) => None,

            (Method::MkCol, 1, b'O') => Some(Method::Move),
            (Method::MkCol, 1, b'E') => Some(Method::Merge),
            (Method::MkCol, 1, b'-') => Some(Method::MSearch),
            (Method::MkCol, 2, b'A') => Some(Method::MkActivity),
            (Method::MkCol, 3, b'A') => Some(Method::MkCalendar),
            (Method::MkCol, _, _) => None,

            (Method::Subscribe, 1, b'E') => Some(Method::Search),
            (Method::Subscribe, _, _) => None,

            (Method::Post, 1, b'R') => Some(Method::PropFind),
            (Method::Post, 1, b'U') => Some(Method::Put),
            (Method::Post, 1, b'A') => Some(Method::Patch),

            (Method::Put, 2, b'R') => Some(Method::Purge),
            (Method::Unlock, 2, b'S') => Some(Method::Unsubscribe),

            (Method::PropFind, 4, b'P') => Some(Method::PropPatch),
            _ => None,
        }
    }

    /// Whether requests with this method carry a tunnel target
    pub fn is_connect(&self) -> bool {
        matches!(self, Method::Connect)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Drive the guess/refine scheme the way the request-line scanner does
    fn scan(name: &[u8]) -> Option<Method> {
        let mut method = Method::from_first_byte(name[0])?;
        for (index, &ch) in name.iter().enumerate().skip(1) {
            if method.as_str().as_bytes().get(index) == Some(&ch) {
                continue;
            }
            method = method.refine(index, ch)?;
        }
        if method.as_str().len() == name.len() {
            Some(method)
        } else {
            None
        }
    }

    #[test]
    fn test_scan_resolves_every_method() {
        for method in Method::ALL {
            assert_eq!(scan(method.as_str().as_bytes()), Some(method), "{}", method);
        }
    }

    #[test]
    fn test_scan_rejects_unknown() {
        assert_eq!(scan(b"GOT"), None);
        assert_eq!(scan(b"CONNECTX"), None);
        assert_eq!(scan(b"PROPPUT"), None);
        assert_eq!(scan(b"MKCAKE"), None);
        assert_eq!(scan(b"XGET"), None);
    }

    #[test]
    fn test_from_bytes() {
        assert_eq!(Method::from_bytes(b"M-SEARCH"), Some(Method::MSearch));
        assert_eq!(Method::from_bytes(b"PURGE"), Some(Method::Purge));
        assert_eq!(Method::from_bytes(b"get"), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Method::MkCalendar.to_string(), "MKCALENDAR");
        assert_eq!(Method::Get.to_string(), "GET");
        assert!(Method::Connect.is_connect());
        assert!(!Method::Checkout.is_connect());
    }
}
