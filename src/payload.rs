//! Batch payload layout.
//!
//! ```text
//! 0x000  charset, 256 characters x 8 bytes
//! 0x800  frame 0: screen map (1000 bytes, padded to 0x400)
//!        [5-color] color map (1000 bytes, padded to 0x400)
//! ....   frame 1 ...
//! ```

use clap::ValueEnum;
use serde::Deserialize;

use crate::blocks::CELL_COUNT;
use crate::charset::{Charset, CHARSET_BYTES};

/// Bytes of the charset header.
pub const HEADER_SIZE: usize = CHARSET_BYTES;
/// Bytes reserved for one screen or color map.
pub const MAP_SIZE: usize = 0x400;

/// Fixed stream identifier.
pub const FORMAT_TAG: [u8; 4] = *b"a64m";

/// [`FORMAT_TAG`] as a little-endian codec tag.
pub fn codec_tag() -> u32 {
    u32::from_le_bytes(FORMAT_TAG)
}

/// Color-depth variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    /// Four colors, screen map only
    #[default]
    Multi,
    /// Five colors, with a colorram map per frame
    Multi5,
}

impl ColorMode {
    pub fn is_five_color(&self) -> bool {
        matches!(self, ColorMode::Multi5)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ColorMode::Multi => "multi",
            ColorMode::Multi5 => "multi5",
        }
    }

    /// Bytes per frame block.
    pub fn frame_size(&self) -> usize {
        MAP_SIZE + MAP_SIZE * self.is_five_color() as usize
    }
}

/// Total payload bytes for a batch of `lifetime` frames.
pub fn required_size(lifetime: usize, mode: ColorMode) -> usize {
    HEADER_SIZE + lifetime * mode.frame_size()
}

/// Write a batch payload into `out`.
///
/// `assignment` holds one character index per cell for `lifetime` frames.
/// Returns the number of bytes written.
///
/// # Panics
/// If `out` is shorter than [`required_size`] or `assignment` is shorter
/// than `lifetime * CELL_COUNT`.
pub fn pack(
    out: &mut [u8],
    charset: &Charset,
    assignment: &[u8],
    lifetime: usize,
    mode: ColorMode,
) -> usize {
    let size = required_size(lifetime, mode);
    let out = &mut out[..size];
    out.fill(0);

    let (header, frames) = out.split_at_mut(HEADER_SIZE);
    header.copy_from_slice(&charset.bitmap);

    for (block, screen) in frames
        .chunks_exact_mut(mode.frame_size())
        .zip(assignment.chunks_exact(CELL_COUNT))
    {
        block[..CELL_COUNT].copy_from_slice(screen);
        if mode.is_five_color() {
            let colors = &mut block[MAP_SIZE..MAP_SIZE + CELL_COUNT];
            for (color, &character) in colors.iter_mut().zip(screen.iter()) {
                *color = charset.colorram[character as usize];
            }
        }
    }

    size
}
