//! Unit tests for charset rendering over whole codebooks.
//!
//! These tests cover:
//! - Convergence of the correction loop for arbitrary codebooks
//! - Bitmap validity against the colorram selection
//! - Block extraction geometry for arbitrary frame sizes

use a64_multicolor::blocks::{extract, LumaVector, CELL_COUNT, METAPIXELS_PER_ROW, VECTOR_DIM};
use a64_multicolor::charset::*;
use a64_multicolor::Frame;

/// Deterministic pseudo-random codebook.
fn noisy_codebook(seed: u32) -> Vec<LumaVector> {
    let mut state = seed.max(1);
    let mut next = move || {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        (state >> 24) as u8
    };
    (0..CHARSET_CHARS)
        .map(|_| {
            let mut v = [0u8; VECTOR_DIM];
            v.iter_mut().for_each(|s| *s = next());
            v
        })
        .collect()
}

/// Reference index chosen for every pixel of a character.
fn picked_indices(vector: &LumaVector, tables: &DitherTables) -> Vec<u8> {
    vector
        .iter()
        .enumerate()
        .map(|(i, &v)| tables.pick(v, i / METAPIXELS_PER_ROW, i % METAPIXELS_PER_ROW))
        .collect()
}

fn decode_row(row: u8) -> [u8; 4] {
    [(row >> 6) & 3, (row >> 4) & 3, (row >> 2) & 3, row & 3]
}

// ==================== Convergence ====================

#[test]
fn test_noisy_codebooks_converge() {
    let reference = LumaReference::default();
    let tables = DitherTables::new(&reference);

    for seed in 1..20 {
        let mut codebook = noisy_codebook(seed);
        render_charset(&mut codebook, &reference).unwrap();

        for vector in &codebook {
            let pass = render_glyph(vector, &tables, &reference);
            assert!(!pass.is_contradictory(), "seed {}", seed);
        }
    }
}

#[test]
fn test_extreme_codebook_converges() {
    let reference = LumaReference::default();
    // Half black, half white in every character
    let mut codebook: Vec<LumaVector> = (0..CHARSET_CHARS)
        .map(|i| {
            let mut v = [0u8; VECTOR_DIM];
            for (j, s) in v.iter_mut().enumerate() {
                *s = if (i + j) % 2 == 0 { 0 } else { 255 };
            }
            v
        })
        .collect();
    let charset = render_charset(&mut codebook, &reference).unwrap();
    assert!(charset
        .colorram
        .iter()
        .all(|&c| c == COLORRAM_DARK || c == COLORRAM_BRIGHT));
}

#[test]
fn test_custom_reference_levels() {
    let reference = LumaReference::new([10, 60, 120, 180, 240]).unwrap();
    let mut codebook = noisy_codebook(77);
    let charset = render_charset(&mut codebook, &reference).unwrap();
    assert_eq!(charset.bitmap.len(), CHARSET_BYTES);
}

// ==================== Bitmap Validity ====================

#[test]
fn test_bitmap_matches_colorram_choice() {
    let reference = LumaReference::default();
    let tables = DitherTables::new(&reference);
    let mut codebook = noisy_codebook(5);
    let charset = render_charset(&mut codebook, &reference).unwrap();

    for (index, vector) in codebook.iter().enumerate() {
        let picked = picked_indices(vector, &tables);
        let colorram = charset.colorram[index];

        // A character uses the darkest or the brightest level, never both
        if colorram == COLORRAM_DARK {
            assert!(!picked.contains(&4), "character {} uses white", index);
        } else {
            assert_eq!(colorram, COLORRAM_BRIGHT);
            assert!(!picked.contains(&0), "character {} uses black", index);
        }

        // Every 2-bit code is the code of the picked level
        let codes: Vec<u8> = charset
            .glyph(index)
            .iter()
            .flat_map(|&row| decode_row(row))
            .collect();
        let expected: Vec<u8> = picked.iter().map(|&i| bit_code(i)).collect();
        assert_eq!(codes, expected, "character {}", index);
    }
}

#[test]
fn test_picked_level_brackets_sample() {
    let reference = LumaReference::default();
    let tables = DitherTables::new(&reference);
    for v in 0..=255u8 {
        let lower = tables.lower_index(v);
        let upper = tables.upper_index(v);
        assert!(lower <= upper && upper <= 4);
        if lower < 4 {
            assert!(reference.level(lower as usize) <= v);
            assert!(v < reference.level(lower as usize + 1));
        }
    }
}

// ==================== Extraction Geometry ====================

#[test]
fn test_extract_always_produces_full_screen() {
    for (w, h) in [(1, 1), (8, 8), (160, 100), (320, 200), (321, 199), (1920, 1080)] {
        let frame = Frame::filled(w, h, 42);
        let vectors = extract(&frame);
        assert_eq!(vectors.len(), CELL_COUNT, "{}x{}", w, h);
        assert!(vectors.iter().all(|v| v.len() == VECTOR_DIM));
    }
}
