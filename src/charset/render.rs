//! Codebook to multicolor charset rendering.
//!
//! Every centroid becomes one 8-byte character of 2-bit pixels. A character
//! may use the darkest or the brightest level through colorram, never both.
//! Centroids that need both are clamped towards the side with the larger
//! error and rendered again.

use thiserror::Error;

use super::dither::{bit_code, DitherTables};
use super::palette::LumaReference;
use crate::blocks::{LumaVector, METAPIXELS_PER_ROW};

/// Characters in a charset.
pub const CHARSET_CHARS: usize = 256;
/// Bytes per character.
pub const CHAR_BYTES: usize = 8;
/// Bytes per charset.
pub const CHARSET_BYTES: usize = CHARSET_CHARS * CHAR_BYTES;

/// Colorram value selecting the darkest level (multicolor bit + black).
pub const COLORRAM_DARK: u8 = 8;
/// Colorram value selecting the brightest level (multicolor bit + white).
pub const COLORRAM_BRIGHT: u8 = 9;

/// Render passes allowed per character before giving up.
pub const MAX_RENDER_PASSES: u32 = 4;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RenderError {
    #[error("character {character} still needs both extreme colors after {attempts} passes")]
    NonConvergence { character: usize, attempts: u32 },
}

/// A rendered charset and its colorram selection per character.
#[derive(Debug, Clone)]
pub struct Charset {
    pub bitmap: [u8; CHARSET_BYTES],
    pub colorram: [u8; CHARSET_CHARS],
}

impl Default for Charset {
    fn default() -> Self {
        Self {
            bitmap: [0; CHARSET_BYTES],
            colorram: [COLORRAM_DARK; CHARSET_CHARS],
        }
    }
}

impl Charset {
    /// The 8 bitmap rows of one character.
    pub fn glyph(&self, index: usize) -> &[u8] {
        &self.bitmap[index * CHAR_BYTES..(index + 1) * CHAR_BYTES]
    }
}

/// One rendering pass over a single character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlyphPass {
    pub rows: [u8; CHAR_BYTES],
    /// Accumulated brightness above the light grey level
    pub highdiff: u32,
    /// Accumulated darkness below the dark grey level
    pub lowdiff: u32,
}

impl GlyphPass {
    /// True if the character wants both extreme colors at once.
    pub fn is_contradictory(&self) -> bool {
        self.highdiff > 0 && self.lowdiff > 0
    }

    pub fn colorram(&self) -> u8 {
        if self.highdiff > 0 {
            COLORRAM_BRIGHT
        } else {
            COLORRAM_DARK
        }
    }
}

/// Dither and pack one luma vector, accumulating the extreme-color errors.
pub fn render_glyph(
    vector: &LumaVector,
    tables: &DitherTables,
    reference: &LumaReference,
) -> GlyphPass {
    let high = reference.level(3) as u32;
    let low = reference.level(1) as u32;
    let mut pass = GlyphPass {
        rows: [0; CHAR_BYTES],
        highdiff: 0,
        lowdiff: 0,
    };

    for (y, samples) in vector.chunks_exact(METAPIXELS_PER_ROW).enumerate() {
        let mut row = 0u8;
        for (x, &v) in samples.iter().enumerate() {
            let lower = tables.lower_index(v);
            if lower >= 3 {
                pass.highdiff += (v as u32).saturating_sub(high);
            }
            if lower < 1 {
                pass.lowdiff += low.saturating_sub(v as u32);
            }
            row = (row << 2) | bit_code(tables.pick(v, y, x));
        }
        pass.rows[y] = row;
    }

    pass
}

/// Clamp a contradictory vector away from the extreme with the smaller error.
fn clamp_towards(vector: &mut LumaVector, pass: &GlyphPass, reference: &LumaReference) {
    if pass.lowdiff > pass.highdiff {
        let ceiling = reference.level(3);
        vector.iter_mut().for_each(|v| *v = (*v).min(ceiling));
    } else {
        let floor = reference.level(1);
        vector.iter_mut().for_each(|v| *v = (*v).max(floor));
    }
}

/// Render every codebook entry into `charset`.
///
/// Contradictory centroids are clamped in place, so `codebook` afterwards
/// holds the values that were actually rendered.
pub fn render_charset_into(
    codebook: &mut [LumaVector],
    reference: &LumaReference,
    charset: &mut Charset,
) -> Result<(), RenderError> {
    let tables = DitherTables::new(reference);
    let mut corrected = 0usize;

    for (index, vector) in codebook.iter_mut().take(CHARSET_CHARS).enumerate() {
        let mut attempts = 0;
        let pass = loop {
            attempts += 1;
            let pass = render_glyph(vector, &tables, reference);
            if !pass.is_contradictory() {
                break pass;
            }
            if attempts >= MAX_RENDER_PASSES {
                log::error!(
                    "Character {} did not converge (highdiff {}, lowdiff {})",
                    index,
                    pass.highdiff,
                    pass.lowdiff
                );
                return Err(RenderError::NonConvergence {
                    character: index,
                    attempts,
                });
            }
            clamp_towards(vector, &pass, reference);
        };

        if attempts > 1 {
            corrected += 1;
        }
        charset.bitmap[index * CHAR_BYTES..(index + 1) * CHAR_BYTES].copy_from_slice(&pass.rows);
        charset.colorram[index] = pass.colorram();
    }

    log::debug!("Rendered charset, {} character(s) clamped", corrected);
    Ok(())
}

/// Allocating version of [`render_charset_into`].
pub fn render_charset(
    codebook: &mut [LumaVector],
    reference: &LumaReference,
) -> Result<Charset, RenderError> {
    let mut charset = Charset::default();
    render_charset_into(codebook, reference, &mut charset)?;
    Ok(charset)
}
