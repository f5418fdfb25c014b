//! Splitting of an effect source file into its named sections.
//!
//! A JSFX file is line oriented. Every line that begins with `@` opens a new
//! section; everything before the first such line is the header, which
//! carries the `desc:`, `slider1:`, `import` and similar directives.
//!
//! ```text
//! desc:Simple gain          <- header
//! slider1:0<-24,24,0.1>Gain
//! @init                     <- section tag, not part of any text
//! gain = 1;
//! @sample
//! spl0 *= gain;
//! ```
//!
//! The parser is lossless: the text of each section is exactly the lines
//! that followed its tag, each terminated by `\n`.

use crate::text::{parse_leading_f64, split_ascii_whitespace_owned};
use thiserror::Error;

/// The code sections a source file may contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    /// `@init`: runs on load, sample-rate change and transport restart.
    Init,
    /// `@slider`: runs after any slider value changed.
    Slider,
    /// `@block`: runs once per processing cycle.
    Block,
    /// `@sample`: runs once per frame.
    Sample,
    /// `@gfx`: runs when the host requests a redraw.
    Gfx,
    /// `@serialize`: runs on state save and restore.
    Serialize,
}

impl SectionKind {
    /// All section kinds, in declaration order.
    pub const ALL: [SectionKind; 6] = [
        SectionKind::Init,
        SectionKind::Slider,
        SectionKind::Block,
        SectionKind::Sample,
        SectionKind::Gfx,
        SectionKind::Serialize,
    ];

    /// The `@tag` spelling of this section.
    pub fn tag(self) -> &'static str {
        match self {
            SectionKind::Init => "@init",
            SectionKind::Slider => "@slider",
            SectionKind::Block => "@block",
            SectionKind::Sample => "@sample",
            SectionKind::Gfx => "@gfx",
            SectionKind::Serialize => "@serialize",
        }
    }

    /// Look up a section kind by its `@tag` spelling.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.tag() == tag)
    }
}

impl std::fmt::Display for SectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// The raw text of one section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Section {
    /// Section body, one `\n`-terminated line per source line.
    pub text: String,
    /// 0-based line number of the first body line in the source file.
    pub line_offset: u32,
}

impl Section {
    /// Whether the section has no code at all.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Error raised when a source file cannot be split into sections.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {}: {}", .line + 1, .message)]
pub struct ParseError {
    /// 0-based line number of the offending line.
    pub line: u32,
    /// Human readable description.
    pub message: String,
}

/// A source file split into its header and code sections.
///
/// The header is always present (possibly empty); each code section is
/// present only when its tag appeared in the file. When a tag appears twice
/// the later occurrence replaces the earlier one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Toplevel {
    /// Text before the first `@` line.
    pub header: Section,
    /// `@init` section.
    pub init: Option<Section>,
    /// `@slider` section.
    pub slider: Option<Section>,
    /// `@block` section.
    pub block: Option<Section>,
    /// `@sample` section.
    pub sample: Option<Section>,
    /// `@gfx` section.
    pub gfx: Option<Section>,
    /// `@serialize` section.
    pub serialize: Option<Section>,
    /// Requested graphics width, `0` when automatic.
    pub gfx_w: u32,
    /// Requested graphics height, `0` when automatic.
    pub gfx_h: u32,
}

impl Toplevel {
    /// The section of the given kind, if the file declared it.
    pub fn section(&self, kind: SectionKind) -> Option<&Section> {
        match kind {
            SectionKind::Init => self.init.as_ref(),
            SectionKind::Slider => self.slider.as_ref(),
            SectionKind::Block => self.block.as_ref(),
            SectionKind::Sample => self.sample.as_ref(),
            SectionKind::Gfx => self.gfx.as_ref(),
            SectionKind::Serialize => self.serialize.as_ref(),
        }
    }

    fn slot_mut(&mut self, kind: SectionKind) -> &mut Option<Section> {
        match kind {
            SectionKind::Init => &mut self.init,
            SectionKind::Slider => &mut self.slider,
            SectionKind::Block => &mut self.block,
            SectionKind::Sample => &mut self.sample,
            SectionKind::Gfx => &mut self.gfx,
            SectionKind::Serialize => &mut self.serialize,
        }
    }
}

/// Split source text into a [`Toplevel`].
///
/// # Errors
///
/// Returns [`ParseError`] on the first `@` line whose tag is not one of the
/// known section names. No partial result is produced.
///
/// # Example
///
/// ```rust
/// use jsfx_core::{parse_toplevel, SectionKind};
///
/// let tl = parse_toplevel("desc:x\n@init\na = 1;\n@gfx 320 200\n").unwrap();
/// assert_eq!(tl.header.text, "desc:x\n");
/// assert_eq!(tl.section(SectionKind::Init).unwrap().line_offset, 2);
/// assert_eq!((tl.gfx_w, tl.gfx_h), (320, 200));
/// ```
pub fn parse_toplevel(source: &str) -> Result<Toplevel, ParseError> {
    let mut toplevel = Toplevel::default();
    // None while still in the header.
    let mut current: Option<SectionKind> = None;

    for (lineno, line) in (0u32..).zip(source.lines()) {
        if line.starts_with('@') {
            let tokens = split_ascii_whitespace_owned(line);
            let tag = tokens.first().map_or("", String::as_str);

            let Some(kind) = SectionKind::from_tag(tag) else {
                return Err(ParseError {
                    line: lineno,
                    message: format!("Invalid section: {line}"),
                });
            };

            if kind == SectionKind::Gfx {
                toplevel.gfx_w = parse_dimension(tokens.get(1));
                toplevel.gfx_h = parse_dimension(tokens.get(2));
            }

            *toplevel.slot_mut(kind) = Some(Section {
                text: String::new(),
                line_offset: lineno + 1,
            });
            current = Some(kind);
        } else {
            let section = match current {
                None => &mut toplevel.header,
                Some(kind) => toplevel.slot_mut(kind).get_or_insert_with(Section::default),
            };
            section.text.push_str(line);
            section.text.push('\n');
        }
    }

    Ok(toplevel)
}

fn parse_dimension(token: Option<&String>) -> u32 {
    let value = token.map_or(0.0, |t| parse_leading_f64(t)).trunc();
    if value > 0.0 { value.min(f64::from(u32::MAX)) as u32 } else { 0 }
}
