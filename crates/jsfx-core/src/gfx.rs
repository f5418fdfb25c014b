//! Raster target interface used by the `@gfx` section.
//!
//! The host registers the graphics registers below as engine variables;
//! the engine translates `gfx_*` calls in script code into [`GfxTarget`]
//! operations using the current register values.

/// Engine variable names of the graphics registers, in registration order.
pub const GFX_REGISTERS: [&str; 17] = [
    "gfx_r",
    "gfx_g",
    "gfx_b",
    "gfx_a",
    "gfx_a2",
    "gfx_w",
    "gfx_h",
    "gfx_x",
    "gfx_y",
    "gfx_mode",
    "gfx_clear",
    "gfx_dest",
    "gfx_texth",
    "gfx_ext_retina",
    "mouse_x",
    "mouse_y",
    "mouse_cap",
];

/// RGBA drawing colour, each channel in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Color {
    /// Red.
    pub r: f64,
    /// Green.
    pub g: f64,
    /// Blue.
    pub b: f64,
    /// Alpha.
    pub a: f64,
}

impl Color {
    /// Opaque colour.
    pub const fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Decode the packed `gfx_clear` form `r + g*256 + b*65536`.
    pub fn from_packed(packed: f64) -> Self {
        let v = packed.max(0.0) as u32;
        let channel = |shift: u32| f64::from((v >> shift) & 0xff) / 255.0;
        Self::rgb(channel(0), channel(8), channel(16))
    }
}

/// An addressable framebuffer the graphics section draws into.
pub trait GfxTarget {
    /// Width and height in pixels.
    fn size(&self) -> (u32, u32);

    /// Fill the whole surface.
    fn clear(&mut self, color: Color);

    /// Draw a line segment.
    fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, color: Color);

    /// Draw a rectangle, outlined or filled.
    fn rect(&mut self, x: f64, y: f64, w: f64, h: f64, color: Color, filled: bool);

    /// Draw a circle, outlined or filled.
    fn circle(&mut self, x: f64, y: f64, radius: f64, color: Color, filled: bool);

    /// Copy image `source` scaled and rotated to `(x, y)`.
    fn blit(&mut self, source: u32, x: f64, y: f64, scale: f64, rotation: f64);

    /// Draw text with its top-left corner at `(x, y)`.
    fn text(&mut self, x: f64, y: f64, text: &str, color: Color);

    /// Flag the surface as needing presentation.
    fn set_dirty(&mut self, dirty: bool);
}
