//! C64 palette and the luma reference levels derived from it.

use thiserror::Error;

/// The 16-color C64 palette as RGB triplets.
#[rustfmt::skip]
pub const C64_PALETTE: [[u8; 3]; 16] = [
    [0x00, 0x00, 0x00], [0xff, 0xff, 0xff], [0x68, 0x37, 0x2b], [0x70, 0xa4, 0xb2],
    [0x6f, 0x3d, 0x86], [0x58, 0x8d, 0x43], [0x35, 0x28, 0x79], [0xb8, 0xc7, 0x6f],
    [0x6f, 0x4f, 0x25], [0x43, 0x39, 0x00], [0x9a, 0x67, 0x59], [0x44, 0x44, 0x44],
    [0x6c, 0x6c, 0x6c], [0x9a, 0xd2, 0x84], [0x6c, 0x5e, 0xb5], [0x95, 0x95, 0x95],
];

/// Gray gradient used for multicolor rendering, darkest first:
/// black, dark grey, grey, light grey, white.
pub const GRAY_GRADIENT: [u8; LEVELS] = [0x0, 0xb, 0xc, 0xf, 0x1];

/// Number of reference levels.
pub const LEVELS: usize = 5;

/// Errors raised while deriving luma reference levels.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PaletteError {
    #[error("palette index {0} out of range (0-15)")]
    IndexOutOfRange(u8),
    #[error("gradient luma levels must be strictly ascending, got {0:?}")]
    NotAscending([u8; LEVELS]),
}

/// Luma of an RGB color with 0.30/0.59/0.11 weights, truncated.
///
/// Integer math: the weights are scaled by 100.
pub fn luma_of(rgb: [u8; 3]) -> u8 {
    let [r, g, b] = rgb.map(u32::from);
    ((30 * r + 59 * g + 11 * b) / 100) as u8
}

/// Five ascending brightness levels the renderer quantizes towards.
///
/// Index 0 is the darkest color, index 4 the brightest. In 5-color mode
/// levels 0 and 4 share one bit pattern and colorram picks between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LumaReference {
    levels: [u8; LEVELS],
}

impl LumaReference {
    /// Validate raw levels. They must be strictly ascending.
    pub fn new(levels: [u8; LEVELS]) -> Result<Self, PaletteError> {
        if levels.windows(2).any(|w| w[0] >= w[1]) {
            return Err(PaletteError::NotAscending(levels));
        }
        Ok(Self { levels })
    }

    /// Derive levels from five C64 palette indices.
    pub fn from_gradient(gradient: [u8; LEVELS]) -> Result<Self, PaletteError> {
        let mut levels = [0u8; LEVELS];
        for (level, &index) in levels.iter_mut().zip(gradient.iter()) {
            let rgb = C64_PALETTE
                .get(index as usize)
                .ok_or(PaletteError::IndexOutOfRange(index))?;
            *level = luma_of(*rgb);
        }
        Self::new(levels)
    }

    pub fn levels(&self) -> &[u8; LEVELS] {
        &self.levels
    }

    #[inline]
    pub fn level(&self, index: usize) -> u8 {
        self.levels[index]
    }
}

impl Default for LumaReference {
    fn default() -> Self {
        // The gray gradient is the same luma in every channel.
        Self {
            levels: [0x00, 0x44, 0x6c, 0x95, 0xff],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gray_is_exact() {
        assert_eq!(luma_of([0x44, 0x44, 0x44]), 0x44);
        assert_eq!(luma_of([0xff, 0xff, 0xff]), 0xff);
        assert_eq!(luma_of([0, 0, 0]), 0);
    }

    #[test]
    fn test_default_matches_gray_gradient() {
        let derived = LumaReference::from_gradient(GRAY_GRADIENT).unwrap();
        assert_eq!(derived, LumaReference::default());
        assert_eq!(derived.levels(), &[0, 68, 108, 149, 255]);
    }

    #[test]
    fn test_not_ascending() {
        let err = LumaReference::new([0, 100, 100, 150, 255]).unwrap_err();
        assert!(matches!(err, PaletteError::NotAscending(_)));
    }

    #[test]
    fn test_gradient_out_of_range() {
        let err = LumaReference::from_gradient([0, 11, 12, 16, 1]).unwrap_err();
        assert_eq!(err, PaletteError::IndexOutOfRange(16));
    }

    #[test]
    fn test_reversed_gradient_rejected() {
        let err = LumaReference::from_gradient([1, 15, 12, 11, 0]).unwrap_err();
        assert!(matches!(err, PaletteError::NotAscending(_)));
    }
}
