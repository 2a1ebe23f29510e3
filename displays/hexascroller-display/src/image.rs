//! Monochrome pixel grid
//!
//! Pixels are stored one byte per column with row `r` in bit `r`. Height
//! is limited to 8 rows, which covers every panel variant.

use core::convert::Infallible;

use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::{DrawTarget, OriginDimensions, Pixel, Size};
use hexascroller_protocol::{PANEL_HEIGHT, PANEL_WIDTH};

/// Tallest supported image
pub const MAX_HEIGHT: usize = 8;

/// A `W`-column monochrome image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonoImage<const W: usize> {
    columns: [u8; W],
    height: usize,
}

/// An image the size of one panel
pub type PanelImage = MonoImage<PANEL_WIDTH>;

impl<const W: usize> MonoImage<W> {
    /// Blank image; `height` is clamped to `MAX_HEIGHT`
    pub fn new(height: usize) -> Self {
        Self {
            columns: [0; W],
            height: height.min(MAX_HEIGHT),
        }
    }

    pub const fn width(&self) -> usize {
        W
    }

    pub const fn height(&self) -> usize {
        self.height
    }

    /// Pixel at `(x, y)`; false outside the image
    pub fn get(&self, x: usize, y: usize) -> bool {
        y < self.height && self.columns.get(x).is_some_and(|c| c & (1 << y) != 0)
    }

    /// Set or clear a pixel; out-of-range writes are ignored
    pub fn set(&mut self, x: usize, y: usize, on: bool) {
        if y >= self.height {
            return;
        }
        if let Some(column) = self.columns.get_mut(x) {
            if on {
                *column |= 1 << y;
            } else {
                *column &= !(1 << y);
            }
        }
    }

    /// Count of lit pixels
    pub fn lit(&self) -> u32 {
        self.columns.iter().map(|c| c.count_ones()).sum()
    }
}

/// A pixel source the bitmap compiler can sample
pub trait PixelGrid {
    fn width(&self) -> usize;
    fn height(&self) -> usize;
    /// Pixel at `(x, y)`; false outside the grid
    fn get(&self, x: usize, y: usize) -> bool;
}

impl<const W: usize> PixelGrid for MonoImage<W> {
    fn width(&self) -> usize {
        W
    }

    fn height(&self) -> usize {
        self.height
    }

    fn get(&self, x: usize, y: usize) -> bool {
        MonoImage::get(self, x, y)
    }
}

impl Default for PanelImage {
    fn default() -> Self {
        Self::new(PANEL_HEIGHT)
    }
}

impl<const W: usize> OriginDimensions for MonoImage<W> {
    fn size(&self) -> Size {
        Size::new(W as u32, self.height as u32)
    }
}

impl<const W: usize> DrawTarget for MonoImage<W> {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(coord, color) in pixels {
            if coord.x < 0 || coord.y < 0 {
                continue;
            }
            self.set(coord.x as usize, coord.y as usize, color.is_on());
        }
        Ok(())
    }
}
