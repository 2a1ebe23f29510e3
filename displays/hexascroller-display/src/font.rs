//! Text measurement and drawing
//!
//! Thin wrapper over `embedded-graphics` mono fonts. Text is positioned by
//! its top-left corner.

use embedded_graphics::mono_font::ascii::{FONT_4X6, FONT_5X7};
use embedded_graphics::mono_font::{MonoFont, MonoTextStyle};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::{DrawTarget, Point};
use embedded_graphics::text::renderer::TextRenderer;
use embedded_graphics::text::{Baseline, Text};
use embedded_graphics::Drawable;

/// A monospaced bitmap font
#[derive(Clone, Copy)]
pub struct Font {
    inner: &'static MonoFont<'static>,
}

/// Full panel height font used for messages
pub const MESSAGE_FONT: Font = Font::new(&FONT_5X7);

/// Compact font that fits time, beats and label side by side
pub const CLOCK_FONT: Font = Font::new(&FONT_4X6);

impl Font {
    pub const fn new(inner: &'static MonoFont<'static>) -> Self {
        Self { inner }
    }

    fn style(&self) -> MonoTextStyle<'static, BinaryColor> {
        MonoTextStyle::new(self.inner, BinaryColor::On)
    }

    /// Rendered width of `text` in pixels
    pub fn string_width(&self, text: &str) -> u32 {
        self.style()
            .measure_string(text, Point::zero(), Baseline::Top)
            .bounding_box
            .size
            .width
    }

    /// Glyph height in pixels
    pub fn height(&self) -> u32 {
        self.inner.character_size.height
    }

    /// Draw `text` with its top-left corner at `(x, y)`
    ///
    /// Pixels outside the target are clipped by the target.
    pub fn draw<D>(&self, text: &str, x: i32, y: i32, target: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = BinaryColor>,
    {
        Text::with_baseline(text, Point::new(x, y), self.style(), Baseline::Top)
            .draw(target)
            .map(|_| ())
    }
}

impl core::fmt::Debug for Font {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Font")
            .field("width", &self.inner.character_size.width)
            .field("height", &self.inner.character_size.height)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::{MonoImage, PanelImage};

    #[test]
    fn test_widths_are_monospaced() {
        assert_eq!(MESSAGE_FONT.string_width(""), 0);
        assert_eq!(MESSAGE_FONT.string_width("HELLO"), 25);
        assert_eq!(CLOCK_FONT.string_width("12:34:56"), 32);
        assert_eq!(CLOCK_FONT.string_width(".beats"), 24);
    }

    #[test]
    fn test_message_font_fits_panel() {
        assert_eq!(MESSAGE_FONT.height(), 7);
        assert!(CLOCK_FONT.height() <= 6);
    }

    #[test]
    fn test_draw_lights_pixels() {
        let mut image = PanelImage::default();
        MESSAGE_FONT.draw("X", 0, 0, &mut image).unwrap();
        assert!(image.lit() > 0);
        // Nothing beyond the glyph cell
        assert!((5..120).all(|x| (0..7).all(|y| !image.get(x, y))));
    }

    #[test]
    fn test_draw_clips_left() {
        let mut image = MonoImage::<10>::new(7);
        MESSAGE_FONT.draw("WW", -100, 0, &mut image).unwrap();
        assert_eq!(image.lit(), 0);
    }
}
