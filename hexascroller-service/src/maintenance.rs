//! One-shot panel jobs
//!
//! Run from the command line instead of the service: id provisioning on a
//! single link, and text or image output on the discovered panels. None of
//! these touch the display state or the bus.

use std::path::Path;
use std::thread;
use std::time::Duration;

use hexascroller_core::traits::panel::MAX_TEXT_LEN;
use hexascroller_core::traits::{PanelError, PanelLink};
use hexascroller_display::{compile_window, PixelGrid};
use hexascroller_protocol::PANEL_HEIGHT;
use image::GrayImage;

use crate::args::Provision;

/// Pause between two rows of an image scroll
pub const IMAGE_STEP: Duration = Duration::from_millis(50);

/// Luma at or above this is a lit pixel
const LIT_THRESHOLD: u8 = 128;

/// Apply `provision` to one link and return the id it now reports
pub fn provision<L: PanelLink>(link: &mut L, provision: Provision) -> Result<u8, PanelError> {
    match provision {
        Provision::SetId(id) => {
            link.set_id(id)?;
            Ok(id)
        }
        Provision::GetId => link.identify(),
    }
}

/// Longest prefix of `text` that fits one TEXT frame, cut at a char boundary
fn fit_text(text: &str) -> &str {
    let end = text
        .char_indices()
        .map(|(i, c)| i + c.len_utf8())
        .take_while(|&end| end <= MAX_TEXT_LEN)
        .last()
        .unwrap_or(0);
    &text[..end]
}

/// Draw `text` on every panel with the panel's built-in font
///
/// Text longer than one frame holds is cut. Stops at the first panel that
/// fails.
pub fn show_text<L: PanelLink>(
    panels: &mut [L],
    text: &str,
    x: i32,
    y: i32,
) -> Result<(), PanelError> {
    let fitted = fit_text(text);
    if fitted.len() < text.len() {
        log::warn!("text cut to {} of {} bytes", fitted.len(), text.len());
    }
    for (id, panel) in panels.iter_mut().enumerate() {
        panel.set_message(fitted, x, y)?;
        log::debug!("panel {id}: text sent");
    }
    Ok(())
}

/// A grayscale image read as one bit per pixel
pub struct MonoBitmap {
    image: GrayImage,
}

impl MonoBitmap {
    pub fn new(image: GrayImage) -> Self {
        Self { image }
    }

    /// Load any supported image file
    pub fn open(path: &Path) -> Result<Self, image::ImageError> {
        Ok(Self::new(image::open(path)?.to_luma8()))
    }
}

impl PixelGrid for MonoBitmap {
    fn width(&self) -> usize {
        self.image.width() as usize
    }

    fn height(&self) -> usize {
        self.image.height() as usize
    }

    fn get(&self, x: usize, y: usize) -> bool {
        let (Ok(x), Ok(y)) = (u32::try_from(x), u32::try_from(y)) else {
            return false;
        };
        self.image
            .get_pixel_checked(x, y)
            .is_some_and(|p| p.0[0] >= LIT_THRESHOLD)
    }
}

/// Step `image` down through the panel window, starting at column `x`
///
/// Shows every 7-row window from the top row to the bottom one on every
/// panel with a full BITMAP write, pausing `step` between windows. An image
/// no taller than the panel is shown once. Returns the number of windows
/// shown.
pub fn scroll_image<L, G>(
    panels: &mut [L],
    image: &G,
    x: usize,
    step: Duration,
) -> Result<usize, PanelError>
where
    L: PanelLink,
    G: PixelGrid + ?Sized,
{
    let last = image.height().saturating_sub(PANEL_HEIGHT);
    for y in 0..=last {
        if y > 0 {
            thread::sleep(step);
        }
        let bitmap = compile_window(image, x, y);
        for panel in panels.iter_mut() {
            panel.set_compiled_image(&bitmap)?;
        }
        log::trace!("image row {y}/{last}");
    }
    Ok(last + 1)
}
