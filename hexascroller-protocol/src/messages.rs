//! Panel commands and their opcodes
//!
//! Every command is host → panel. Responses carry no command-specific
//! structure beyond GET_ID returning a single id byte.

use crate::frame::{Frame, FrameError, MAX_PAYLOAD_SIZE};
use heapless::Vec;

/// Panel width in columns
pub const PANEL_WIDTH: usize = 120;
/// Panel height in rows
pub const PANEL_HEIGHT: usize = 7;
/// Size of a full compiled bitmap (one byte per column)
pub const PANEL_BYTES: usize = PANEL_WIDTH;
/// Size of one half of a split bitmap
pub const HALF_WIDTH: usize = PANEL_WIDTH / 2;

/// Response status for a successful command
pub const STATUS_OK: u8 = 0;
/// Generic failure status reported by panel firmware
pub const STATUS_ERROR: u8 = 1;

/// Command opcodes understood by the panel firmware
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    Text = 0xA1,
    Bitmap = 0xA2,
    SetId = 0xA3,
    GetId = 0xA4,
    WriteUart = 0xA5,
    Relay = 0xA6,
    FlipBuffers = 0xB2,
    BitmapHalf1 = 0xB3,
    BitmapHalf2 = 0xB4,
}

impl Opcode {
    pub const fn as_byte(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for Opcode {
    type Error = FrameError;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        Ok(match byte {
            0xA1 => Opcode::Text,
            0xA2 => Opcode::Bitmap,
            0xA3 => Opcode::SetId,
            0xA4 => Opcode::GetId,
            0xA5 => Opcode::WriteUart,
            0xA6 => Opcode::Relay,
            0xB2 => Opcode::FlipBuffers,
            0xB3 => Opcode::BitmapHalf1,
            0xB4 => Opcode::BitmapHalf2,
            other => return Err(FrameError::UnknownOpcode(other)),
        })
    }
}

/// A command sent from the host to one panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelCommand<'a> {
    /// Render text with the panel's built-in font
    Text { x: i8, y: i8, text: &'a [u8] },
    /// Replace the display with a compiled bitmap
    Bitmap(&'a [u8]),
    /// Store a new logical id in panel flash
    SetId(u8),
    /// Query the logical id
    GetId,
    /// Pass raw bytes through to the panel's auxiliary UART
    WriteUart(&'a [u8]),
    /// Switch the shared power relay
    Relay(bool),
    /// Swap back buffer to front
    FlipBuffers,
    /// Write columns 0..60 of the back buffer
    BitmapHalf1(&'a [u8]),
    /// Write columns 60..120 of the back buffer
    BitmapHalf2(&'a [u8]),
}

impl<'a> PanelCommand<'a> {
    /// Opcode for this command
    pub fn opcode(&self) -> Opcode {
        match self {
            PanelCommand::Text { .. } => Opcode::Text,
            PanelCommand::Bitmap(_) => Opcode::Bitmap,
            PanelCommand::SetId(_) => Opcode::SetId,
            PanelCommand::GetId => Opcode::GetId,
            PanelCommand::WriteUart(_) => Opcode::WriteUart,
            PanelCommand::Relay(_) => Opcode::Relay,
            PanelCommand::FlipBuffers => Opcode::FlipBuffers,
            PanelCommand::BitmapHalf1(_) => Opcode::BitmapHalf1,
            PanelCommand::BitmapHalf2(_) => Opcode::BitmapHalf2,
        }
    }

    /// Encode this command into a frame
    pub fn to_frame(&self) -> Result<Frame, FrameError> {
        let opcode = self.opcode().as_byte();
        match self {
            PanelCommand::Text { x, y, text } => {
                // Payload: [x][y][chars...]
                let mut payload = Vec::<u8, MAX_PAYLOAD_SIZE>::new();
                payload
                    .push(*x as u8)
                    .map_err(|_| FrameError::PayloadTooLarge)?;
                payload
                    .push(*y as u8)
                    .map_err(|_| FrameError::PayloadTooLarge)?;
                payload
                    .extend_from_slice(text)
                    .map_err(|_| FrameError::PayloadTooLarge)?;
                Frame::new(opcode, &payload)
            }
            PanelCommand::Bitmap(bytes)
            | PanelCommand::WriteUart(bytes)
            | PanelCommand::BitmapHalf1(bytes)
            | PanelCommand::BitmapHalf2(bytes) => Frame::new(opcode, bytes),
            PanelCommand::SetId(id) => Frame::new(opcode, &[*id]),
            PanelCommand::Relay(on) => Frame::new(opcode, &[u8::from(*on)]),
            PanelCommand::GetId | PanelCommand::FlipBuffers => Ok(Frame::empty(opcode)),
        }
    }

    /// Parse a command from a received frame (panel side)
    pub fn from_frame(frame: &'a Frame) -> Result<Self, FrameError> {
        let payload = frame.payload.as_slice();
        match Opcode::try_from(frame.opcode)? {
            Opcode::Text => match payload {
                [x, y, text @ ..] => Ok(PanelCommand::Text {
                    x: *x as i8,
                    y: *y as i8,
                    text,
                }),
                _ => Err(FrameError::InvalidFrame),
            },
            Opcode::Bitmap => Ok(PanelCommand::Bitmap(payload)),
            Opcode::SetId => match payload {
                [id] => Ok(PanelCommand::SetId(*id)),
                _ => Err(FrameError::InvalidFrame),
            },
            Opcode::GetId => Ok(PanelCommand::GetId),
            Opcode::WriteUart => Ok(PanelCommand::WriteUart(payload)),
            Opcode::Relay => match payload {
                [state] => Ok(PanelCommand::Relay(*state != 0)),
                _ => Err(FrameError::InvalidFrame),
            },
            Opcode::FlipBuffers => Ok(PanelCommand::FlipBuffers),
            Opcode::BitmapHalf1 => Ok(PanelCommand::BitmapHalf1(payload)),
            Opcode::BitmapHalf2 => Ok(PanelCommand::BitmapHalf2(payload)),
        }
    }
}
