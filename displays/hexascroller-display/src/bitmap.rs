//! Bitmap compiler
//!
//! Converts a window of any `PixelGrid` into the column bytes the panel
//! firmware expects. Bit `7 - row` carries row `row`; this layout is fixed
//! by the panel hardware.

use heapless::Vec;
use hexascroller_core::state::Bitmap;
use hexascroller_protocol::{PANEL_BYTES, PANEL_HEIGHT, PANEL_WIDTH};

use crate::image::{PanelImage, PixelGrid};

/// Compile the window of `image` starting at `(x, y)`
///
/// Produces `min(width - x, 120)` bytes, or none when `x` is past the right
/// edge. Rows beyond the image bottom or below row 7 stay dark.
pub fn compile_image<G>(image: &G, x: usize, y: usize) -> Vec<u8, PANEL_BYTES>
where
    G: PixelGrid + ?Sized,
{
    let width = image.width().saturating_sub(x).min(PANEL_WIDTH);
    let height = image.height().saturating_sub(y).min(PANEL_HEIGHT);

    let mut out = Vec::new();
    for i in 0..width {
        let mut byte = 0u8;
        for row in 0..height {
            if image.get(x + i, y + row) {
                byte |= 1 << (7 - row);
            }
        }
        // width <= PANEL_BYTES
        let _ = out.push(byte);
    }
    out
}

/// Compile a window into a full bitmap, dark past the image's right edge
pub fn compile_window<G>(image: &G, x: usize, y: usize) -> Bitmap
where
    G: PixelGrid + ?Sized,
{
    let mut bitmap = [0u8; PANEL_BYTES];
    for (dst, src) in bitmap.iter_mut().zip(compile_image(image, x, y)) {
        *dst = src;
    }
    bitmap
}

/// Compile a full panel image into a fixed-size bitmap
pub fn compile_panel(image: &PanelImage) -> Bitmap {
    compile_window(image, 0, 0)
}

/// Rebuild a panel image from compiled bytes
///
/// Bit 0 has no row and is ignored.
pub fn decode_bitmap(bitmap: &[u8]) -> PanelImage {
    let mut image = PanelImage::default();
    for (x, byte) in bitmap.iter().take(PANEL_WIDTH).enumerate() {
        for row in 0..PANEL_HEIGHT {
            image.set(x, row, byte & (1 << (7 - row)) != 0);
        }
    }
    image
}

/// Complement every byte in place
pub fn invert(bitmap: &mut [u8]) {
    for byte in bitmap.iter_mut() {
        *byte = !*byte;
    }
}
