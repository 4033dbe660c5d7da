//! Port text validation
//!
//! Checks that user-supplied text is a plain decimal port in
//! [`PORT_MIN`]..=[`PORT_MAX`] before it reaches the resolver.

use tracing::error;

use super::{Error, Result, PORT_MAX, PORT_MIN};

/// Outcome of parsing a decimal integer prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedNumber {
    /// Parsed value, clamped to `i64` bounds on overflow
    pub value: i64,
    /// Bytes of input consumed; 0 if no digits were found
    pub consumed: usize,
    pub overflow: bool,
}

/// Parse a base-10 integer from the start of `text`.
///
/// Accepts leading C whitespace (space, `\t` through `\r`) and an optional
/// sign, then as many digits as follow. Parsing stops at the first non-digit.
pub fn parse_decimal(text: &str) -> ParsedNumber {
    let bytes = text.as_bytes();
    let mut pos = bytes.iter().take_while(|&&b| is_c_space(b)).count();

    let negative = match bytes.get(pos) {
        Some(b'-') => {
            pos += 1;
            true
        }
        Some(b'+') => {
            pos += 1;
            false
        }
        _ => false,
    };

    let digits = bytes[pos..].iter().take_while(|b| b.is_ascii_digit()).count();
    if digits == 0 {
        return ParsedNumber {
            value: 0,
            consumed: 0,
            overflow: false,
        };
    }

    let mut value: i64 = 0;
    let mut overflow = false;
    let step: fn(i64, i64) -> Option<i64> = if negative {
        i64::checked_sub
    } else {
        i64::checked_add
    };
    for &b in &bytes[pos..pos + digits] {
        let d = i64::from(b - b'0');
        let next = value.checked_mul(10).and_then(|v| step(v, d));
        match next {
            Some(v) => value = v,
            None => {
                overflow = true;
                value = if negative { i64::MIN } else { i64::MAX };
                break;
            }
        }
    }

    ParsedNumber {
        value,
        consumed: pos + digits,
        overflow,
    }
}

/// Whitespace as C's `isspace` sees it in the "C" locale, vertical tab
/// included.
fn is_c_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t'..=b'\r')
}

/// Parse `text` as a non-privileged port number.
pub fn parse_port(text: &str) -> Result<u16> {
    let invalid = |reason| Error::InvalidPort {
        input: text.to_string(),
        reason,
    };
    let parsed = parse_decimal(text);

    if parsed.consumed == 0 {
        return Err(invalid("no digits"));
    }
    if parsed.overflow {
        return Err(invalid("out of integer range"));
    }
    if parsed.consumed != text.len() {
        return Err(invalid("trailing characters"));
    }
    if !(PORT_MIN..=PORT_MAX).contains(&parsed.value) {
        return Err(invalid("outside 1025-65535"));
    }

    u16::try_from(parsed.value).map_err(|_| invalid("outside 1025-65535"))
}

/// Whether `text` names a usable listening port.
///
/// Logs the failed check on rejection; `None` is always rejected.
pub fn is_valid_port(text: Option<&str>) -> bool {
    let Some(text) = text else {
        error!("is_valid_port: invalid port: no input");
        return false;
    };

    match parse_port(text) {
        Ok(_) => true,
        Err(e) => {
            error!("is_valid_port: {}", e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[test]
    fn test_boundaries() {
        assert!(is_valid_port(Some("1025")));
        assert!(is_valid_port(Some("65535")));
        assert!(!is_valid_port(Some("1024")));
        assert!(!is_valid_port(Some("65536")));
    }

    #[test]
    fn test_malformed() {
        assert!(!is_valid_port(Some("")));
        assert!(!is_valid_port(Some("80x")));
        assert!(!is_valid_port(Some("8080 ")));
        assert!(!is_valid_port(Some("http")));
        assert!(!is_valid_port(Some("-8080")));
        assert!(!is_valid_port(None));
    }

    #[test]
    fn test_leading_whitespace_and_sign() {
        assert_eq!(parse_port(" 8080").unwrap(), 8080);
        assert_eq!(parse_port("+8080").unwrap(), 8080);
    }

    #[test]
    fn test_parse_decimal_prefix() {
        let p = parse_decimal("  42abc");
        assert_eq!(
            p,
            ParsedNumber {
                value: 42,
                consumed: 4,
                overflow: false,
            }
        );

        let p = parse_decimal("-17");
        assert_eq!(p.value, -17);
        assert_eq!(p.consumed, 3);

        assert_eq!(parse_decimal("+").consumed, 0);
        assert_eq!(parse_decimal("abc").consumed, 0);
    }

    #[test]
    fn test_parse_decimal_skips_c_whitespace() {
        for text in ["\x0b8080", "\x0c8080", "\t\n\r 8080"] {
            let p = parse_decimal(text);
            assert_eq!(p.value, 8080, "{:?}", text);
            assert_eq!(p.consumed, text.len(), "{:?}", text);
        }
        assert_eq!(parse_port("\x0b8080").unwrap(), 8080);
    }

    #[test]
    fn test_parse_decimal_overflow() {
        let p = parse_decimal("99999999999999999999");
        assert!(p.overflow);
        assert_eq!(p.value, i64::MAX);

        let p = parse_decimal("-99999999999999999999");
        assert!(p.overflow);
        assert_eq!(p.value, i64::MIN);
    }

    #[test]
    fn test_parse_port_reasons() {
        let reason = |s: &str| match parse_port(s) {
            Err(Error::InvalidPort { reason, .. }) => reason,
            other => panic!("expected InvalidPort for {:?}, got {:?}", s, other),
        };

        assert_eq!(reason(""), "no digits");
        assert_eq!(reason("12ab"), "trailing characters");
        assert_eq!(reason("99999999999999999999"), "out of integer range");
        assert_eq!(reason("80"), "outside 1025-65535");
    }

    #[traced_test]
    #[test]
    fn test_rejection_is_logged() {
        assert!(!is_valid_port(Some("80x")));
        assert!(logs_contain("is_valid_port"));
        assert!(logs_contain("trailing characters"));
    }
}
