//! Render engine
//!
//! Turns a display state snapshot into one compiled panel bitmap. Both modes
//! keep a single-entry cache: the clock face changes once a second and a
//! slow scroll repeats the same pixel offset for several ticks.

use hexascroller_core::clock::ClockFace;
use hexascroller_core::state::display::MessageText;
use hexascroller_core::state::{Bitmap, DisplaySnapshot, MessageView};
use hexascroller_protocol::PANEL_WIDTH;

use crate::bitmap::{compile_panel, invert};
use crate::font::{Font, CLOCK_FONT, MESSAGE_FONT};
use crate::image::PanelImage;

/// Column of the `HH:MM:SS` field
pub const CLOCK_TIME_X: i32 = 15;
/// Column of the beats value
pub const CLOCK_BEATS_X: i32 = 61;
/// Column of the beats label
pub const CLOCK_LABEL_X: i32 = 94;
/// Text after the beats value
pub const BEATS_LABEL: &str = ".beats";
/// Top row of the clock face; centers the 6 px font on the 7 px panel
const CLOCK_Y: i32 = 1;

struct ClockEntry {
    face: ClockFace,
    bitmap: Bitmap,
}

struct MessageEntry {
    text: MessageText,
    offset: u32,
    bitmap: Bitmap,
}

/// Produces panel bitmaps; never touches the display state itself
pub struct RenderEngine {
    clock_font: Font,
    message_font: Font,
    clock: Option<ClockEntry>,
    message: Option<MessageEntry>,
}

impl Default for RenderEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderEngine {
    pub fn new() -> Self {
        Self {
            clock_font: CLOCK_FONT,
            message_font: MESSAGE_FONT,
            clock: None,
            message: None,
        }
    }

    /// Rendered width of a message, for scroll setup
    pub fn message_width(&self, text: &str) -> u32 {
        self.message_font.string_width(text)
    }

    /// Render the snapshot, falling back to `clock` when no message is set
    pub fn render(&mut self, snapshot: &DisplaySnapshot, clock: &ClockFace) -> Bitmap {
        let mut bitmap = match &snapshot.message {
            Some(view) => self.render_message(view),
            None => self.render_clock(clock),
        };
        if snapshot.inverted {
            invert(&mut bitmap);
        }
        bitmap
    }

    /// Clock mode bitmap, not inverted
    pub fn render_clock(&mut self, face: &ClockFace) -> Bitmap {
        if let Some(entry) = self.clock.as_ref().filter(|e| e.face == *face) {
            return entry.bitmap;
        }

        let mut image = PanelImage::default();
        let font = self.clock_font;
        // Drawing into an in-memory image cannot fail
        let _ = font.draw(&face.time, CLOCK_TIME_X, CLOCK_Y, &mut image);
        let _ = font.draw(&face.beats, CLOCK_BEATS_X, CLOCK_Y, &mut image);
        let _ = font.draw(BEATS_LABEL, CLOCK_LABEL_X, CLOCK_Y, &mut image);
        let bitmap = compile_panel(&image);

        self.clock = Some(ClockEntry {
            face: face.clone(),
            bitmap,
        });
        bitmap
    }

    /// Message mode bitmap, not inverted
    ///
    /// Messages wider than the panel are drawn shifted left by the scroll
    /// offset; shorter ones are drawn at column 0. The offset wraps at the
    /// full message width, so once the last column has scrolled out the
    /// text restarts at column 0 rather than re-entering from the right.
    pub fn render_message(&mut self, view: &MessageView) -> Bitmap {
        let offset = if view.width > PANEL_WIDTH as u32 {
            view.offset % view.width
        } else {
            0
        };

        if let Some(entry) = self
            .message
            .as_ref()
            .filter(|e| e.offset == offset && e.text == view.text)
        {
            return entry.bitmap;
        }

        let mut image = PanelImage::default();
        let _ = self
            .message_font
            .draw(&view.text, -(offset as i32), 0, &mut image);
        let bitmap = compile_panel(&image);

        self.message = Some(MessageEntry {
            text: view.text.clone(),
            offset,
            bitmap,
        });
        bitmap
    }
}
