//! Small text helpers shared by the section parser and the header grammars.
//!
//! All of these operate on ASCII semantics: JSFX sources are byte-oriented
//! and the directive syntax only ever uses ASCII delimiters.

/// Parse the longest numeric prefix of `text` as a decimal float.
///
/// Mirrors the permissive `atof` behaviour scripts rely on: leading
/// whitespace is skipped, an optional sign, digits, a `.` fraction and an
/// exponent are accepted, and anything unparsable yields `0.0`. The decimal
/// separator is always `.` regardless of locale.
///
/// ```rust
/// use jsfx_core::text::parse_leading_f64;
///
/// assert_eq!(parse_leading_f64("  12.5dB"), 12.5);
/// assert_eq!(parse_leading_f64("-3e2,"), -300.0);
/// assert_eq!(parse_leading_f64("abc"), 0.0);
/// ```
pub fn parse_leading_f64(text: &str) -> f64 {
    let bytes = text.as_bytes();
    let mut start = 0;
    while start < bytes.len() && bytes[start].is_ascii_whitespace() {
        start += 1;
    }

    let mut end = start;
    if end < bytes.len() && matches!(bytes[end], b'+' | b'-') {
        end += 1;
    }

    let mut digits = 0;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
        digits += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
            digits += 1;
        }
    }
    if digits == 0 {
        return 0.0;
    }

    // Exponent only counts when at least one digit follows it.
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && matches!(bytes[exp_end], b'+' | b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    text[start..end].parse().unwrap_or(0.0)
}

/// Trim ASCII whitespace from both ends.
pub fn trim_ascii(text: &str) -> &str {
    text.trim_matches(|c: char| c.is_ascii_whitespace())
}

/// Split on ASCII whitespace, dropping empty pieces.
pub fn split_ascii_whitespace_owned(text: &str) -> Vec<String> {
    text.split(|c: char| c.is_ascii_whitespace())
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Iterate over the lines of `text` with line terminators removed.
///
/// Both `\n` and `\r\n` endings are accepted. A final line without a
/// terminator is still yielded; an empty input yields nothing.
pub fn lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leading_float_accepts_prefixes() {
        assert_eq!(parse_leading_f64("123"), 123.0);
        assert_eq!(parse_leading_f64("123.1<"), 123.1);
        assert_eq!(parse_leading_f64(".5"), 0.5);
        assert_eq!(parse_leading_f64("5."), 5.0);
        assert_eq!(parse_leading_f64("+7"), 7.0);
    }

    #[test]
    fn leading_float_rejects_garbage() {
        assert_eq!(parse_leading_f64(""), 0.0);
        assert_eq!(parse_leading_f64("-"), 0.0);
        assert_eq!(parse_leading_f64("."), 0.0);
        assert_eq!(parse_leading_f64("aa"), 0.0);
    }

    #[test]
    fn leading_float_ignores_dangling_exponent() {
        assert_eq!(parse_leading_f64("2e"), 2.0);
        assert_eq!(parse_leading_f64("2e+"), 2.0);
        assert_eq!(parse_leading_f64("2e-1x"), 0.2);
    }

    #[test]
    fn whitespace_split_drops_empties() {
        assert_eq!(
            split_ascii_whitespace_owned("  a \t b  c "),
            vec!["a".to_string(), "b".to_string(), "c".to_string()]
        );
        assert!(split_ascii_whitespace_owned("   ").is_empty());
    }

    #[test]
    fn lines_strip_crlf() {
        let collected: Vec<&str> = lines("a\r\nb\nc").collect();
        assert_eq!(collected, vec!["a", "b", "c"]);
        assert_eq!(lines("").count(), 0);
    }
}
