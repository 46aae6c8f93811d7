//! Ordered dithering between neighbouring luma reference levels.

use super::palette::{LumaReference, LEVELS};

/// Number of dither steps between two reference levels.
pub const DITHER_STEPS: usize = 8;

/// Highest reference index.
const TOP: u8 = (LEVELS - 1) as u8;

/// Ordered 4x4 dither patterns, from "never round up" to "always round up".
///
/// `DITHER_PATTERNS[level][row & 3][col & 3]` tells whether a pixel at that
/// position rounds to the upper reference level.
#[rustfmt::skip]
pub const DITHER_PATTERNS: [[[bool; 4]; 4]; DITHER_STEPS + 1] = {
    const O: bool = false;
    const X: bool = true;
    [
        [[O, O, O, O], [O, O, O, O], [O, O, O, O], [O, O, O, O]],
        [[X, O, O, O], [O, O, O, O], [O, O, X, O], [O, O, O, O]],
        [[X, O, O, O], [O, O, X, O], [O, X, O, O], [O, O, O, X]],
        [[X, O, O, O], [O, X, O, X], [O, O, X, O], [O, X, O, X]],
        [[X, O, X, O], [O, X, O, X], [X, O, X, O], [O, X, O, X]],
        [[X, X, X, O], [O, X, O, X], [X, O, X, X], [O, X, O, X]],
        [[O, X, X, X], [X, X, O, X], [X, O, X, X], [X, X, X, O]],
        [[O, X, X, X], [X, X, X, X], [X, X, O, X], [X, X, X, X]],
        [[X, X, X, X], [X, X, X, X], [X, X, X, X], [X, X, X, X]],
    ]
};

/// Per-sample lookup tables for one set of reference levels.
///
/// Built once per render call and indexed by luma sample value.
#[derive(Debug, Clone)]
pub struct DitherTables {
    lower: [u8; 256],
    upper: [u8; 256],
    step: [u8; 256],
}

impl DitherTables {
    pub fn new(reference: &LumaReference) -> Self {
        let levels = reference.levels();
        let mut lower = [0u8; 256];
        let mut upper = [0u8; 256];
        let mut step = [0u8; 256];

        for v in 0..256usize {
            // Greatest reference index at or below v; 0 below the darkest level
            let index = levels[1..].iter().filter(|&&l| l as usize <= v).count() as u8;
            lower[v] = index;
            upper[v] = (index + 1).min(TOP);

            let base = levels[index as usize] as usize;
            step[v] = if index >= TOP || v < base {
                0
            } else {
                let distance = levels[index as usize + 1] as usize - base;
                ((v - base) * (DITHER_STEPS - 1) / distance) as u8
            };
        }

        Self { lower, upper, step }
    }

    /// Reference index at or below `v`.
    #[inline]
    pub fn lower_index(&self, v: u8) -> u8 {
        self.lower[v as usize]
    }

    /// Reference index just above `v`, saturating at the brightest level.
    #[inline]
    pub fn upper_index(&self, v: u8) -> u8 {
        self.upper[v as usize]
    }

    /// Position of `v` within its reference interval, `0..DITHER_STEPS`.
    #[inline]
    pub fn dither_level(&self, v: u8) -> u8 {
        self.step[v as usize]
    }

    /// Whether the pixel at `(row, col)` with sample `v` rounds up.
    #[inline]
    pub fn rounds_up(&self, v: u8, row: usize, col: usize) -> bool {
        DITHER_PATTERNS[self.dither_level(v) as usize][row & 3][col & 3]
    }

    /// Reference index chosen for the pixel at `(row, col)`.
    #[inline]
    pub fn pick(&self, v: u8, row: usize, col: usize) -> u8 {
        if self.rounds_up(v, row, col) {
            self.upper_index(v)
        } else {
            self.lower_index(v)
        }
    }
}

/// 2-bit character code for a reference index.
///
/// Index 3 maps to the background, 2 and 1 to the shared multicolor
/// registers, 0 and 4 to the per-cell colorram color.
#[inline]
pub fn bit_code(index: u8) -> u8 {
    3 - (index & 3)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tables() -> DitherTables {
        DitherTables::new(&LumaReference::default())
    }

    #[test]
    fn test_indices_at_levels() {
        let t = tables();
        assert_eq!(t.lower_index(0), 0);
        assert_eq!(t.lower_index(67), 0);
        assert_eq!(t.lower_index(68), 1);
        assert_eq!(t.lower_index(108), 2);
        assert_eq!(t.lower_index(149), 3);
        assert_eq!(t.lower_index(254), 3);
        assert_eq!(t.lower_index(255), 4);
    }

    #[test]
    fn test_upper_saturates() {
        let t = tables();
        assert_eq!(t.upper_index(0), 1);
        assert_eq!(t.upper_index(200), 4);
        assert_eq!(t.upper_index(255), 4);
    }

    #[test]
    fn test_dither_levels() {
        let t = tables();
        // Exactly on a level: no dithering
        for v in [0u8, 68, 108, 149, 255] {
            assert_eq!(t.dither_level(v), 0, "level at {}", v);
        }
        // Halfway between 0 and 68: 34 * 7 / 68 = 3
        assert_eq!(t.dither_level(34), 3);
        // Just below a level gets the highest step
        assert_eq!(t.dither_level(67), 6);
        assert_eq!(t.dither_level(254), 6);
        assert!((0..=255u8).all(|v| (t.dither_level(v) as usize) < DITHER_STEPS));
    }

    #[test]
    fn test_patterns_are_monotonic() {
        let counts: Vec<usize> = DITHER_PATTERNS
            .iter()
            .map(|p| p.iter().flatten().filter(|&&b| b).count())
            .collect();
        assert_eq!(counts[0], 0);
        assert_eq!(counts[DITHER_STEPS], 16);
        assert!(counts.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_pick_without_dither() {
        let t = tables();
        assert_eq!(t.pick(108, 1, 1), 2);
        assert_eq!(t.pick(255, 0, 0), 4);
    }

    #[test]
    fn test_bit_codes() {
        assert_eq!(bit_code(0), 3);
        assert_eq!(bit_code(1), 2);
        assert_eq!(bit_code(2), 1);
        assert_eq!(bit_code(3), 0);
        assert_eq!(bit_code(4), 3);
    }
}
