//! `filename:<index>,<path>` header lines.

use crate::text::{parse_leading_f64, trim_ascii};

/// A parsed `filename:` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFilename {
    /// Declared slot index.
    pub index: u32,
    /// Path text after the comma, trimmed.
    pub path: String,
}

/// Parse a `filename:` line.
///
/// The index token may contain `[+-.0-9A-Za-z]` and is read as a float,
/// then truncated. Indices outside `0..=u32::MAX` reject the line.
///
/// ```rust
/// use jsfx_core::parse_filename;
///
/// let f = parse_filename("filename:0,amp/model.wav").unwrap();
/// assert_eq!(f.index, 0);
/// assert_eq!(f.path, "amp/model.wav");
/// ```
pub fn parse_filename(line: &str) -> Option<ParsedFilename> {
    let rest = line.strip_prefix("filename:")?;
    let comma = rest.find(',')?;
    let (index, path) = (&rest[..comma], &rest[comma + 1..]);

    if index.is_empty()
        || !index
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'-' | b'.'))
    {
        return None;
    }

    let index = parse_leading_f64(index).trunc();
    if !(0.0..=f64::from(u32::MAX)).contains(&index) {
        return None;
    }

    Some(ParsedFilename {
        index: index as u32,
        path: trim_ascii(path).to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_and_trimmed_path() {
        let f = parse_filename("filename:3, some dir/x.txt  ").unwrap();
        assert_eq!(f.index, 3);
        assert_eq!(f.path, "some dir/x.txt");
    }

    #[test]
    fn fractional_index_truncates() {
        assert_eq!(parse_filename("filename:2.9,a").unwrap().index, 2);
    }

    #[test]
    fn rejects_malformed_lines() {
        assert!(parse_filename("filename:,a").is_none());
        assert!(parse_filename("filename:1 a").is_none());
        assert!(parse_filename("filename:1 ,a").is_none());
        assert!(parse_filename("filename:-1,a").is_none());
        assert!(parse_filename("file:1,a").is_none());
    }

    #[test]
    fn empty_path_is_allowed() {
        let f = parse_filename("filename:0,").unwrap();
        assert_eq!(f.path, "");
    }
}
