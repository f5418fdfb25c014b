//! Slider declaration lines of the header.
//!
//! ## Grammar
//!
//! ```text
//! slider     ::= "slider" N ":" ( ident "=" )? ( path_form | range_form )
//! path_form  ::= "/" path ":" default ":" label
//! range_form ::= default ( "<" min? ( "," max? ( "," inc? ( "{" names "}" )? )? )? ">" )? ","? label
//! ```
//!
//! `N` is 1-based. Numbers are read permissively (see
//! [`parse_leading_f64`]); the parser never fails on a malformed number,
//! only on a line that is not a slider declaration at all.

use crate::MAX_SLIDERS;
use crate::text::{parse_leading_f64, trim_ascii};

/// Default, minimum, maximum and increment of a slider.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SliderRange {
    /// Value the slider is reset to on load.
    pub def: f64,
    /// Lower bound.
    pub min: f64,
    /// Upper bound.
    pub max: f64,
    /// Step size, `0` for continuous.
    pub inc: f64,
}

/// One parsed `sliderN:` declaration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Slider {
    /// 0-based slider index.
    pub id: u32,
    /// Whether the header declared this slider.
    pub exists: bool,
    /// Backing variable name: the alias, or `sliderN`.
    pub var: String,
    /// Default value.
    pub def: f64,
    /// Minimum value.
    pub min: f64,
    /// Maximum value.
    pub max: f64,
    /// Increment.
    pub inc: f64,
    /// Whether the slider selects among named entries.
    pub is_enum: bool,
    /// Entry names of an enumeration.
    pub enum_names: Vec<String>,
    /// Directory, relative to the data root, whose files populate the enumeration.
    pub path: String,
    /// Display label.
    pub desc: String,
}

impl Slider {
    /// The declared range of this slider.
    pub fn range(&self) -> SliderRange {
        SliderRange {
            def: self.def,
            min: self.min,
            max: self.max,
            inc: self.inc,
        }
    }

    /// Whether the enumeration entries come from a directory listing.
    pub fn is_path(&self) -> bool {
        !self.path.is_empty()
    }
}

struct Cursor<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    fn eat(&mut self, byte: u8) -> bool {
        if self.peek() == Some(byte) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_str(&mut self, s: &str) -> bool {
        if self.input[self.pos..].starts_with(s) {
            self.pos += s.len();
            true
        } else {
            false
        }
    }

    /// Consume up to (not including) the first byte in `stops`.
    fn take_until(&mut self, stops: &[u8]) -> &'a str {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if stops.contains(&b) {
                break;
            }
            self.pos += 1;
        }
        &self.input[start..self.pos]
    }

    fn rest(&mut self) -> &'a str {
        let rest = &self.input[self.pos..];
        self.pos = self.input.len();
        rest
    }

    /// `ident "="`, rewinding when the lookahead does not match.
    fn alias(&mut self) -> Option<&'a str> {
        let start = self.pos;
        let bytes = self.input.as_bytes();
        let mut end = start;
        if end < bytes.len() && (bytes[end].is_ascii_alphabetic() || bytes[end] == b'_') {
            end += 1;
            while end < bytes.len() && (bytes[end].is_ascii_alphanumeric() || matches!(bytes[end], b'_' | b'.')) {
                end += 1;
            }
        }
        if end > start && bytes.get(end) == Some(&b'=') {
            self.pos = end + 1;
            Some(&self.input[start..end])
        } else {
            None
        }
    }
}

/// Parse a `sliderN:` header line.
///
/// Returns `None` when the line is not a slider declaration (wrong prefix,
/// missing or zero index, missing `:`), in which case the caller tries the
/// other header directives. Ids above the slider cap are still parsed; the
/// header extractor drops them.
///
/// # Example
///
/// ```rust
/// use jsfx_core::parse_slider;
///
/// let s = parse_slider("slider2:mode=1<0,2,1{low,mid,high}>Mode").unwrap();
/// assert_eq!(s.id, 1);
/// assert_eq!(s.var, "mode");
/// assert!(s.is_enum);
/// assert_eq!(s.enum_names, ["low", "mid", "high"]);
/// assert_eq!(s.desc, "Mode");
/// ```
pub fn parse_slider(line: &str) -> Option<Slider> {
    let mut cur = Cursor { input: line, pos: 0 };

    if !cur.eat_str("slider") {
        return None;
    }
    let digits = cur.take_until(b":");
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let number: u64 = digits.parse().ok()?;
    if number == 0 || !cur.eat(b':') {
        return None;
    }

    let mut slider = Slider {
        id: u32::try_from(number - 1).unwrap_or(u32::MAX),
        var: cur.alias().map_or_else(|| format!("slider{number}"), str::to_owned),
        ..Slider::default()
    };

    if cur.eat(b'/') {
        let path = cur.take_until(b":");
        if !cur.eat(b':') {
            return None;
        }
        let def = cur.take_until(b":");
        if !cur.eat(b':') {
            return None;
        }
        slider.path = format!("/{path}");
        slider.def = parse_leading_f64(def);
        slider.inc = 1.0;
        slider.is_enum = true;
        slider.desc = trim_ascii(cur.rest()).to_owned();
        return Some(slider);
    }

    slider.def = parse_leading_f64(cur.take_until(b"<,"));

    if cur.eat(b'<') {
        let range = cur.take_until(b"{>");
        let mut fields = range.splitn(3, ',');
        slider.min = fields.next().map_or(0.0, parse_leading_f64);
        slider.max = fields.next().map_or(0.0, parse_leading_f64);
        slider.inc = fields.next().map_or(0.0, parse_leading_f64);

        if cur.eat(b'{') {
            let names = cur.take_until(b"}");
            cur.eat(b'}');
            slider.is_enum = true;
            slider.enum_names = names
                .split(',')
                .map(trim_ascii)
                .filter(|name| !name.is_empty())
                .map(str::to_owned)
                .collect();
        }

        // anything between the enumeration and `>` is ignored
        cur.take_until(b">");
        cur.eat(b'>');
    }

    cur.eat(b',');
    slider.desc = trim_ascii(cur.rest()).to_owned();
    Some(slider)
}

/// Whether `id` fits the fixed slider table.
pub(crate) fn id_in_range(id: u32) -> bool {
    (id as usize) < MAX_SLIDERS
}
