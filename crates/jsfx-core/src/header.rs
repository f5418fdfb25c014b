//! Header model extraction.
//!
//! The header is scanned twice. Pass 1 handles the directive lines
//! (`desc:`, `slider3:`, `import` and the rest); pass 2 picks up
//! metadata that some files only carry as comments (`//author:`,
//! `//tags:`), filling only what pass 1 left empty. For every
//! single-valued field the first occurrence wins.

use crate::filename::parse_filename;
use crate::slider::{Slider, id_in_range, parse_slider};
use crate::source::Section;
use crate::text::{lines, parse_leading_f64, split_ascii_whitespace_owned, trim_ascii};
use crate::{MAX_CHANNELS, MAX_SLIDERS};

/// Values of the `options:` directive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderOptions {
    /// Shared-memory namespace (`gmem=`).
    pub gmem: String,
    /// Requested memory size (`maxmem=`), never negative.
    pub maxmem: u32,
    /// `want_all_kb`: receive every keystroke.
    pub want_all_kb: bool,
    /// `no_meter`: hide metering.
    pub no_meter: bool,
}

/// Metadata extracted from a header section.
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    /// Effect description, required for a main file.
    pub desc: String,
    /// Author name.
    pub author: String,
    /// Whitespace-separated tags.
    pub tags: Vec<String>,
    /// Input pin names.
    pub in_pins: Vec<String>,
    /// Output pin names.
    pub out_pins: Vec<String>,
    /// Whether any `in_pin:` or `out_pin:` line was present.
    pub explicit_pins: bool,
    /// `options:` values.
    pub options: HeaderOptions,
    /// One entry per slider slot; undeclared slots have `exists == false`.
    pub sliders: Vec<Slider>,
    /// Import names, in declaration order.
    pub imports: Vec<String>,
    /// Declared auxiliary file paths, indexed from 0.
    pub filenames: Vec<String>,
}

impl Default for Header {
    fn default() -> Self {
        Self {
            desc: String::new(),
            author: String::new(),
            tags: Vec::new(),
            in_pins: Vec::new(),
            out_pins: Vec::new(),
            explicit_pins: false,
            options: HeaderOptions::default(),
            sliders: (0..MAX_SLIDERS as u32).map(undeclared_slider).collect(),
            imports: Vec::new(),
            filenames: Vec::new(),
        }
    }
}

impl Header {
    /// The slider in slot `index`, declared or not.
    pub fn slider(&self, index: u32) -> Option<&Slider> {
        self.sliders.get(index as usize)
    }

    /// Iterate over declared sliders only.
    pub fn declared_sliders(&self) -> impl Iterator<Item = &Slider> {
        self.sliders.iter().filter(|s| s.exists)
    }
}

fn undeclared_slider(id: u32) -> Slider {
    Slider {
        id,
        var: format!("slider{}", id + 1),
        ..Slider::default()
    }
}

/// Extract the [`Header`] from a header section.
///
/// Never fails; unrecognized lines are ignored.
///
/// ```rust
/// use jsfx_core::{parse_header, Section};
///
/// let section = Section {
///     text: "desc:Gain\nin_pin:L\nin_pin:R\nslider1:0<-12,12>dB\n".into(),
///     line_offset: 0,
/// };
/// let header = parse_header(&section);
/// assert_eq!(header.desc, "Gain");
/// assert_eq!(header.in_pins, ["L", "R"]);
/// assert!(header.sliders[0].exists);
/// ```
pub fn parse_header(section: &Section) -> Header {
    let mut header = Header::default();

    for line in lines(&section.text) {
        if let Some(rest) = line.strip_prefix("desc:") {
            set_once(&mut header.desc, rest);
        } else if let Some(rest) = line.strip_prefix("author:") {
            set_once(&mut header.author, rest);
        } else if let Some(rest) = line.strip_prefix("tags:") {
            set_tags_once(&mut header.tags, rest);
        } else if let Some(rest) = line.strip_prefix("in_pin:") {
            header.explicit_pins = true;
            header.in_pins.push(trim_ascii(rest).to_owned());
        } else if let Some(rest) = line.strip_prefix("out_pin:") {
            header.explicit_pins = true;
            header.out_pins.push(trim_ascii(rest).to_owned());
        } else if let Some(rest) = line.strip_prefix("options:") {
            parse_options(&mut header.options, rest);
        } else if let Some(name) = import_name(line) {
            header.imports.push(name.to_owned());
        } else if let Some(mut slider) = parse_slider(line) {
            if !id_in_range(slider.id) {
                continue;
            }
            slider.exists = true;
            let id = slider.id as usize;
            header.sliders[id] = slider;
        } else if let Some(filename) = parse_filename(line) {
            if filename.index as usize != header.filenames.len() {
                continue;
            }
            header.filenames.push(filename.path);
        }
    }

    for line in lines(&section.text) {
        if let Some(rest) = line.strip_prefix("//author:") {
            set_once(&mut header.author, rest);
        } else if let Some(rest) = line.strip_prefix("//tags:") {
            set_tags_once(&mut header.tags, rest);
        }
    }

    finish_pins(&mut header.in_pins);
    finish_pins(&mut header.out_pins);
    header
}

fn set_once(field: &mut String, value: &str) {
    if field.is_empty() {
        *field = trim_ascii(value).to_owned();
    }
}

fn set_tags_once(tags: &mut Vec<String>, value: &str) {
    if tags.is_empty() {
        *tags = split_ascii_whitespace_owned(value);
    }
}

fn parse_options(options: &mut HeaderOptions, text: &str) {
    for token in split_ascii_whitespace_owned(text) {
        let (name, value) = token.split_once('=').unwrap_or((token.as_str(), ""));
        match name {
            "gmem" => options.gmem = value.to_owned(),
            "maxmem" => {
                let maxmem = parse_leading_f64(value).trunc();
                options.maxmem = if maxmem > 0.0 { maxmem.min(f64::from(u32::MAX)) as u32 } else { 0 };
            }
            "want_all_kb" => options.want_all_kb = true,
            "no_meter" => options.no_meter = true,
            _ => {}
        }
    }
}

/// `import` followed by at least one whitespace character.
fn import_name(line: &str) -> Option<&str> {
    let rest = line.strip_prefix("import")?;
    let first = rest.bytes().next()?;
    first.is_ascii_whitespace().then(|| trim_ascii(&rest[1..]))
}

fn finish_pins(pins: &mut Vec<String>) {
    if pins.len() == 1 && pins[0].eq_ignore_ascii_case("none") {
        pins.clear();
    }
    pins.truncate(MAX_CHANNELS);
}
