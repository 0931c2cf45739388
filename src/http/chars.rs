//! Character classes used by the parsers
//!
//! All tables are built at compile time and never change. Functions that
//! take a `strict` argument relax their rules in lenient mode to accept
//! bytes commonly seen in the wild.

/// Carriage return
pub const CR: u8 = b'\r';

/// Line feed
pub const LF: u8 = b'\n';

/// HTTP token characters (RFC 2616), lowercased. Zero marks a non-token byte.
static TOKENS: [u8; 256] = build_tokens();

/// Bitmap of bytes allowed unescaped in a path, query or fragment.
static URL_CHARS: [u8; 32] = build_url_chars();

/// Hex digit values; -1 marks a non-hex byte.
static UNHEX: [i8; 256] = build_unhex();

const fn build_tokens() -> [u8; 256] {
    let mut table = [0u8; 256];
    let extra = b"!#$%&'*+-.^_`|~";
    let mut i = 0;
    while i < extra.len() {
        table[extra[i] as usize] = extra[i];
        i += 1;
    }
    let mut c = b'0';
    while c <= b'9' {
        table[c as usize] = c;
        c += 1;
    }
    let mut c = b'a';
    while c <= b'z' {
        table[c as usize] = c;
        table[(c - 32) as usize] = c;
        c += 1;
    }
    table
}

const fn build_url_chars() -> [u8; 32] {
    let mut map = [0u8; 32];
    // Printable ASCII minus space, '#', '?' and DEL.
    let mut c: usize = 0x21;
    while c < 0x7f {
        if c != b'#' as usize && c != b'?' as usize {
            map[c >> 3] |= 1 << (c & 7);
        }
        c += 1;
    }
    map
}

const fn build_unhex() -> [i8; 256] {
    let mut table = [-1i8; 256];
    let mut i = 0;
    while i < 10 {
        table[b'0' as usize + i] = i as i8;
        i += 1;
    }
    let mut i = 0;
    while i < 6 {
        table[b'a' as usize + i] = 10 + i as i8;
        table[b'A' as usize + i] = 10 + i as i8;
        i += 1;
    }
    table
}

/// Lowercase an ASCII letter (other bytes come back with bit 0x20 set)
#[inline]
pub fn lower(ch: u8) -> u8 {
    ch | 0x20
}

#[inline]
pub fn is_alpha(ch: u8) -> bool {
    matches!(lower(ch), b'a'..=b'z')
}

#[inline]
pub fn is_num(ch: u8) -> bool {
    ch.is_ascii_digit()
}

#[inline]
pub fn is_alphanum(ch: u8) -> bool {
    is_alpha(ch) || is_num(ch)
}

#[inline]
pub fn is_hex(ch: u8) -> bool {
    UNHEX[ch as usize] >= 0
}

/// Unreserved "mark" characters
#[inline]
pub fn is_mark(ch: u8) -> bool {
    matches!(
        ch,
        b'-' | b'_' | b'.' | b'!' | b'~' | b'*' | b'\'' | b'(' | b')'
    )
}

/// Characters allowed in the userinfo part of an authority
#[inline]
pub fn is_userinfo_char(ch: u8) -> bool {
    is_alphanum(ch)
        || is_mark(ch)
        || matches!(ch, b'%' | b';' | b':' | b'&' | b'=' | b'+' | b'$' | b',')
}

/// Characters allowed in a host name (lenient mode also takes '_')
#[inline]
pub fn is_host_char(ch: u8, strict: bool) -> bool {
    is_alphanum(ch) || ch == b'.' || ch == b'-' || (!strict && ch == b'_')
}

/// Characters allowed in a path, query or fragment
///
/// Lenient mode also accepts tab, form-feed and any byte with the high bit set.
#[inline]
pub fn is_url_char(ch: u8, strict: bool) -> bool {
    if URL_CHARS[(ch >> 3) as usize] & (1 << (ch & 7)) != 0 {
        return true;
    }
    !strict && (ch == b'\t' || ch == 0x0c || ch & 0x80 != 0)
}

/// Map a header-name byte to its lowercased token form
///
/// Returns `None` for bytes that are not token characters. Lenient mode
/// lets a space through unchanged.
#[inline]
pub fn token(ch: u8, strict: bool) -> Option<u8> {
    if !strict && ch == b' ' {
        return Some(b' ');
    }
    match TOKENS[ch as usize] {
        0 => None,
        c => Some(c),
    }
}

/// Value of a hex digit
#[inline]
pub fn unhex(ch: u8) -> Option<u8> {
    match UNHEX[ch as usize] {
        -1 => None,
        v => Some(v as u8),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_lowercases() {
        assert_eq!(token(b'C', true), Some(b'c'));
        assert_eq!(token(b'z', true), Some(b'z'));
        assert_eq!(token(b'-', true), Some(b'-'));
        assert_eq!(token(b'~', true), Some(b'~'));
    }

    #[test]
    fn test_token_rejects_separators() {
        for &ch in b"()<>@,;:\\\"/[]?={} \t" {
            assert_eq!(token(ch, true), None, "byte {:?}", ch as char);
        }
        assert_eq!(token(0x7f, true), None);
        assert_eq!(token(0x80, true), None);
    }

    #[test]
    fn test_token_space_lenient() {
        assert_eq!(token(b' ', true), None);
        assert_eq!(token(b' ', false), Some(b' '));
    }

    #[test]
    fn test_url_chars() {
        assert!(is_url_char(b'/', true));
        assert!(is_url_char(b'%', true));
        assert!(is_url_char(b'~', true));
        assert!(!is_url_char(b'?', true));
        assert!(!is_url_char(b'#', true));
        assert!(!is_url_char(b' ', true));
        assert!(!is_url_char(0x7f, true));
    }

    #[test]
    fn test_url_chars_lenient() {
        assert!(!is_url_char(b'\t', true));
        assert!(is_url_char(b'\t', false));
        assert!(is_url_char(0x0c, false));
        assert!(!is_url_char(0xe9, true));
        assert!(is_url_char(0xe9, false));
        assert!(!is_url_char(b'\r', false));
    }

    #[test]
    fn test_unhex() {
        assert_eq!(unhex(b'0'), Some(0));
        assert_eq!(unhex(b'9'), Some(9));
        assert_eq!(unhex(b'a'), Some(10));
        assert_eq!(unhex(b'F'), Some(15));
        assert_eq!(unhex(b'g'), None);
        assert_eq!(unhex(b';'), None);
        assert!(is_hex(b'c'));
        assert!(!is_hex(b'x'));
    }

    #[test]
    fn test_host_chars() {
        assert!(is_host_char(b'a', true));
        assert!(is_host_char(b'-', true));
        assert!(!is_host_char(b'_', true));
        assert!(is_host_char(b'_', false));
        assert!(!is_host_char(b'@', false));
    }

    #[test]
    fn test_userinfo_chars() {
        assert!(is_userinfo_char(b':'));
        assert!(is_userinfo_char(b'%'));
        assert!(!is_userinfo_char(b'@'));
        assert!(!is_userinfo_char(b'/'));
    }
}
