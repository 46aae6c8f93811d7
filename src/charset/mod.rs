//! Multicolor charset rendering.
//!
//! Turns quantized luma vectors into legal C64 multicolor characters:
//!
//! 1. **Palette** - luma reference levels from the C64 gray gradient
//! 2. **Dithering** - ordered 4x4 patterns between neighbouring levels
//! 3. **Rendering** - 2-bit packing with per-character colorram selection

mod dither;
mod palette;
mod render;

pub use dither::{bit_code, DitherTables, DITHER_PATTERNS, DITHER_STEPS};
pub use palette::{luma_of, LumaReference, PaletteError, C64_PALETTE, GRAY_GRADIENT, LEVELS};
pub use render::{
    render_charset, render_charset_into, render_glyph, Charset, GlyphPass, RenderError,
    CHARSET_BYTES, CHARSET_CHARS, CHAR_BYTES, COLORRAM_BRIGHT, COLORRAM_DARK, MAX_RENDER_PASSES,
};
