//! Block extraction: reduce a luma frame to one training vector per cell.
//!
//! The canvas is 320x200 source pixels, i.e. 40x25 cells of 8x8 pixels.
//! Multicolor characters have 4 double-wide pixels per row, so every pair of
//! horizontal source pixels is averaged into one metapixel, giving
//! 8 rows x 4 metapixels = 32 samples per cell.

use crate::frame::Frame;

/// Source canvas width in pixels.
pub const CANVAS_WIDTH: u32 = 320;
/// Source canvas height in pixels.
pub const CANVAS_HEIGHT: u32 = 200;
/// Cell edge length in source pixels.
pub const CELL_SIZE: u32 = 8;
/// Cells per screen row.
pub const CELLS_X: usize = 40;
/// Cell rows per screen.
pub const CELLS_Y: usize = 25;
/// Cells per frame.
pub const CELL_COUNT: usize = CELLS_X * CELLS_Y;
/// Metapixels per cell row.
pub const METAPIXELS_PER_ROW: usize = 4;
/// Samples per luma vector.
pub const VECTOR_DIM: usize = CELL_SIZE as usize * METAPIXELS_PER_ROW;

/// One cell's reduced luminance: 8 rows of 4 metapixels, row-major.
pub type LumaVector = [u8; VECTOR_DIM];

/// Reduce `frame` into `dest`, one vector per cell in row-major cell order.
///
/// Samples that fall outside the source frame are not written, so whatever
/// the slot held before survives. Frames larger than the canvas are cropped.
///
/// # Panics
/// If `dest` holds fewer than [`CELL_COUNT`] vectors.
pub fn extract_into(frame: &Frame, dest: &mut [LumaVector]) {
    let dest = &mut dest[..CELL_COUNT];
    let width = frame.width().min(CANVAS_WIDTH);
    let height = frame.height().min(CANVAS_HEIGHT);

    for (cell, vector) in dest.iter_mut().enumerate() {
        let cell_x = (cell % CELLS_X) as u32 * CELL_SIZE;
        let cell_y = (cell / CELLS_X) as u32 * CELL_SIZE;

        for row in 0..CELL_SIZE {
            let y = cell_y + row;
            if y >= height {
                break;
            }
            for pair in 0..METAPIXELS_PER_ROW as u32 {
                let x = cell_x + pair * 2;
                if x >= width {
                    break;
                }
                // Odd widths: the right neighbour of the last column is itself
                let right = (x + 1).min(frame.width() - 1);
                let sum = frame.pixel(x, y) as u16 + frame.pixel(right, y) as u16;
                vector[(row as usize) * METAPIXELS_PER_ROW + pair as usize] = (sum / 2) as u8;
            }
        }
    }
}

/// Allocating version of [`extract_into`], starting from zeroed vectors.
pub fn extract(frame: &Frame) -> Vec<LumaVector> {
    let mut vectors = vec![[0u8; VECTOR_DIM]; CELL_COUNT];
    extract_into(frame, &mut vectors);
    vectors
}

/// True if the frame does not cover the whole canvas.
pub fn is_undersized(frame: &Frame) -> bool {
    frame.width() < CANVAS_WIDTH || frame.height() < CANVAS_HEIGHT
}
