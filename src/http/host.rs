//! Authority splitting
//!
//! The target scanner only finds where the authority starts and ends. This
//! walks that range again to separate `userinfo@`, the host (plain name or
//! bracketed IPv6 literal) and `:port`.

use super::chars::{is_hex, is_host_char, is_num, is_userinfo_char};
use super::error::ParseError;
use super::url::{FieldSpan, UrlField, UrlParts};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostState {
    UserinfoStart,
    Userinfo,
    HostStart,
    HostV6Start,
    Host,
    HostV6,
    HostV6End,
    PortStart,
    Port,
}

impl HostState {
    /// Whether the authority may end in this state
    fn is_final(&self) -> bool {
        matches!(self, HostState::Host | HostState::HostV6End | HostState::Port)
    }
}

/// One step of the authority scanner; `None` is a dead end
pub fn next_host_state(state: HostState, ch: u8, strict: bool) -> Option<HostState> {
    match state {
        HostState::UserinfoStart | HostState::Userinfo => {
            if ch == b'@' {
                return Some(HostState::HostStart);
            }
            if is_userinfo_char(ch) {
                return Some(HostState::Userinfo);
            }
        }

        HostState::HostStart => {
            if ch == b'[' {
                return Some(HostState::HostV6Start);
            }
            if is_host_char(ch, strict) {
                return Some(HostState::Host);
            }
        }

        HostState::Host | HostState::HostV6End => {
            if state == HostState::Host && is_host_char(ch, strict) {
                return Some(HostState::Host);
            }
            if ch == b':' {
                return Some(HostState::PortStart);
            }
        }

        HostState::HostV6Start | HostState::HostV6 => {
            if state == HostState::HostV6 && ch == b']' {
                return Some(HostState::HostV6End);
            }
            if is_hex(ch) || ch == b':' || ch == b'.' {
                return Some(HostState::HostV6);
            }
        }

        HostState::PortStart | HostState::Port => {
            if is_num(ch) {
                return Some(HostState::Port);
            }
        }
    }

    None
}

/// Re-scan the host span of `parts` and split it into components
///
/// On entry the host span covers the whole authority. On success it covers
/// only the host, and the port and userinfo spans are filled in when present.
/// `found_at` tells whether the target scanner saw a `@`.
pub fn parse_host(
    buf: &[u8],
    parts: &mut UrlParts,
    found_at: bool,
    strict: bool,
) -> Result<(), ParseError> {
    let authority = parts.spans[UrlField::Host as usize];
    parts.span_mut(UrlField::Host).len = 0;

    let mut state = if found_at {
        HostState::UserinfoStart
    } else {
        HostState::HostStart
    };

    for pos in authority.off..authority.end() {
        let next = next_host_state(state, buf[pos], strict).ok_or(ParseError::InvalidHost)?;

        match next {
            HostState::Host | HostState::HostV6 => {
                if next != state {
                    parts.span_mut(UrlField::Host).off = pos;
                }
                parts.span_mut(UrlField::Host).len += 1;
                if next == HostState::HostV6 {
                    parts.host_is_ipv6 = true;
                }
            }
            HostState::Port => {
                if next != state {
                    parts.set(UrlField::Port, FieldSpan { off: pos, len: 0 });
                }
                parts.span_mut(UrlField::Port).len += 1;
            }
            HostState::Userinfo => {
                if next != state {
                    parts.set(UrlField::UserInfo, FieldSpan { off: pos, len: 0 });
                }
                parts.span_mut(UrlField::UserInfo).len += 1;
            }
            _ => {}
        }
        state = next;
    }

    if !state.is_final() {
        return Err(ParseError::InvalidHost);
    }
    Ok(())
}
