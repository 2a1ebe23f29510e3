//! Panel link trait
//!
//! One `PanelLink` per physical panel. Implementations only provide
//! `send_command`; every higher-level operation is built on it and
//! validates its payload before anything reaches the wire.

use heapless::Vec;
use hexascroller_protocol::{
    FrameError, Opcode, PanelCommand, HALF_WIDTH, MAX_PAYLOAD_SIZE, PANEL_BYTES, PANEL_WIDTH,
    STATUS_OK,
};

/// Longest text accepted by `set_message`, in bytes
pub const MAX_TEXT_LEN: usize = PANEL_WIDTH;

/// Response payload returned by a successful command
pub type ResponsePayload = Vec<u8, MAX_PAYLOAD_SIZE>;

/// A command reached the panel but did not succeed
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    /// Panel answered with a non-zero status
    #[error("command {opcode:#04x}: expected status {expected}, got {got}")]
    Status { opcode: u8, expected: u8, got: u8 },
    /// No complete response within the link timeout
    #[error("command {opcode:#04x}: timed out")]
    Timeout { opcode: u8 },
    /// Link failed while writing or reading
    #[error("command {opcode:#04x}: link i/o failed")]
    Io { opcode: u8 },
    /// Response had an unexpected shape
    #[error("command {opcode:#04x}: unexpected response of {len} bytes")]
    UnexpectedResponse { opcode: u8, len: usize },
}

impl CommandError {
    /// Build the status variant for a failed response
    pub fn status(opcode: Opcode, got: u8) -> Self {
        CommandError::Status {
            opcode: opcode.as_byte(),
            expected: STATUS_OK,
            got,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, CommandError::Timeout { .. })
    }
}

/// An outbound payload was rejected before transmission
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("bitmap must be {expected} bytes, got {got}")]
    BitmapLength { expected: usize, got: usize },
    #[error("text is {len} bytes, limit is {}", MAX_TEXT_LEN)]
    TextTooLong { len: usize },
    #[error("coordinate {0} does not fit a signed byte")]
    CoordinateOutOfRange(i32),
    #[error("payload does not fit a frame")]
    PayloadTooLarge,
}

/// A candidate link could not be brought up
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ConnectionError {
    /// Address does not exist or cannot be opened
    #[error("link unavailable")]
    Unavailable,
    /// Link opened but the identity query failed
    #[error("no identity response: {0}")]
    NoResponse(CommandError),
}

/// Any failure of a panel operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PanelError {
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl From<FrameError> for ValidationError {
    fn from(_: FrameError) -> Self {
        ValidationError::PayloadTooLarge
    }
}

impl From<FrameError> for PanelError {
    fn from(err: FrameError) -> Self {
        PanelError::Validation(err.into())
    }
}

fn coordinate(value: i32) -> Result<i8, ValidationError> {
    i8::try_from(value).map_err(|_| ValidationError::CoordinateOutOfRange(value))
}

fn check_bitmap(bitmap: &[u8]) -> Result<(), ValidationError> {
    if bitmap.len() != PANEL_BYTES {
        return Err(ValidationError::BitmapLength {
            expected: PANEL_BYTES,
            got: bitmap.len(),
        });
    }
    Ok(())
}

/// Request/response link to one panel
pub trait PanelLink {
    /// Send one command frame and wait for its response
    ///
    /// Returns the response payload on status 0. A non-zero status, a
    /// timeout or an I/O failure is reported as `CommandError`; the link
    /// stays usable for the next command.
    fn send_command(
        &mut self,
        opcode: Opcode,
        payload: &[u8],
    ) -> Result<ResponsePayload, PanelError>;

    /// Encode and send a typed command
    fn send(&mut self, command: &PanelCommand<'_>) -> Result<ResponsePayload, PanelError> {
        let frame = command.to_frame()?;
        self.send_command(command.opcode(), &frame.payload)
    }

    /// Query the panel's logical id
    fn identify(&mut self) -> Result<u8, PanelError> {
        let response = self.send(&PanelCommand::GetId)?;
        match response.as_slice() {
            [id] => Ok(*id),
            other => Err(CommandError::UnexpectedResponse {
                opcode: Opcode::GetId.as_byte(),
                len: other.len(),
            }
            .into()),
        }
    }

    /// Store a new logical id on the panel
    fn set_id(&mut self, id: u8) -> Result<(), PanelError> {
        self.send(&PanelCommand::SetId(id)).map(|_| ())
    }

    /// Switch the power relay (wired to panel 0 only)
    fn set_relay(&mut self, on: bool) -> Result<(), PanelError> {
        self.send(&PanelCommand::Relay(on)).map(|_| ())
    }

    /// Draw text with the panel's own font
    fn set_message(&mut self, text: &str, x: i32, y: i32) -> Result<(), PanelError> {
        if text.len() > MAX_TEXT_LEN {
            return Err(ValidationError::TextTooLong { len: text.len() }.into());
        }
        let command = PanelCommand::Text {
            x: coordinate(x)?,
            y: coordinate(y)?,
            text: text.as_bytes(),
        };
        self.send(&command).map(|_| ())
    }

    /// Replace the display with a full compiled bitmap
    fn set_compiled_image(&mut self, bitmap: &[u8]) -> Result<(), PanelError> {
        check_bitmap(bitmap)?;
        self.send(&PanelCommand::Bitmap(bitmap)).map(|_| ())
    }

    /// Write a bitmap as two halves into the back buffer, then flip
    ///
    /// Stops at the first failing step, leaving the front buffer untouched.
    fn set_split_image(&mut self, bitmap: &[u8]) -> Result<(), PanelError> {
        check_bitmap(bitmap)?;
        let (first, second) = bitmap.split_at(HALF_WIDTH);
        self.send(&PanelCommand::BitmapHalf1(first))?;
        self.send(&PanelCommand::BitmapHalf2(second))?;
        self.flip_buffers()
    }

    /// Show the back buffer
    fn flip_buffers(&mut self) -> Result<(), PanelError> {
        self.send(&PanelCommand::FlipBuffers).map(|_| ())
    }

    /// Pass bytes through to the panel's auxiliary UART
    fn write_uart(&mut self, bytes: &[u8]) -> Result<(), PanelError> {
        self.send(&PanelCommand::WriteUart(bytes)).map(|_| ())
    }
}
