//! Frame encoding and decoding for the panel protocol.
//!
//! Request format:
//! - OPCODE (1 byte): command identifier
//! - LENGTH (1 byte): payload length (0-255)
//! - PAYLOAD (0-255 bytes): command-specific data
//!
//! Response format:
//! - STATUS (1 byte): 0 on success, non-zero error code otherwise
//! - LENGTH (1 byte): response payload length
//! - PAYLOAD (0-255 bytes): result data, or error detail when STATUS != 0

use heapless::Vec;

/// Maximum payload size in bytes (the length field is a single byte)
pub const MAX_PAYLOAD_SIZE: usize = 255;

/// Maximum complete frame size (OPCODE + LENGTH + MAX_PAYLOAD)
pub const MAX_FRAME_SIZE: usize = 2 + MAX_PAYLOAD_SIZE;

/// Errors that can occur during frame parsing or encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    /// Payload exceeds maximum allowed size
    #[error("payload exceeds {} bytes", MAX_PAYLOAD_SIZE)]
    PayloadTooLarge,
    /// Frame is incomplete (need more bytes)
    #[error("incomplete frame")]
    Incomplete,
    /// Payload does not match what the opcode requires
    #[error("invalid frame")]
    InvalidFrame,
    /// Opcode byte is not a known command
    #[error("unknown opcode {0:#04x}")]
    UnknownOpcode(u8),
    /// Buffer too small for encoding
    #[error("buffer too small")]
    BufferTooSmall,
}

/// A request frame sent from the host to a panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Command opcode
    pub opcode: u8,
    /// Payload data
    pub payload: Vec<u8, MAX_PAYLOAD_SIZE>,
}

impl Frame {
    /// Create a new frame with the given opcode and payload
    pub fn new(opcode: u8, payload: &[u8]) -> Result<Self, FrameError> {
        let payload = Vec::from_slice(payload).map_err(|_| FrameError::PayloadTooLarge)?;
        Ok(Self { opcode, payload })
    }

    /// Create a frame with no payload
    pub fn empty(opcode: u8) -> Self {
        Self {
            opcode,
            payload: Vec::new(),
        }
    }

    /// Encode this frame into a byte buffer
    ///
    /// Returns the number of bytes written
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, FrameError> {
        let frame_len = 2 + self.payload.len();
        if buffer.len() < frame_len {
            return Err(FrameError::BufferTooSmall);
        }

        buffer[0] = self.opcode;
        buffer[1] = self.payload.len() as u8;
        buffer[2..frame_len].copy_from_slice(&self.payload);

        Ok(frame_len)
    }

    /// Encode this frame into a heapless Vec
    pub fn encode_to_vec(&self) -> Result<Vec<u8, MAX_FRAME_SIZE>, FrameError> {
        let mut buffer = [0u8; MAX_FRAME_SIZE];
        let len = self.encode(&mut buffer)?;
        Vec::from_slice(&buffer[..len]).map_err(|_| FrameError::BufferTooSmall)
    }
}

/// The fixed two-byte header that starts every response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseHeader {
    /// Status code, 0 on success
    pub status: u8,
    /// Number of payload bytes that follow
    pub length: u8,
}

impl ResponseHeader {
    /// Size of the header on the wire
    pub const SIZE: usize = 2;

    /// Decode a header from its two wire bytes
    pub const fn from_bytes(bytes: [u8; 2]) -> Self {
        Self {
            status: bytes[0],
            length: bytes[1],
        }
    }

    /// Check whether the panel reported success
    pub const fn is_ok(&self) -> bool {
        self.status == crate::messages::STATUS_OK
    }
}

/// A response frame sent from a panel back to the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Status code, 0 on success
    pub status: u8,
    /// Result data, or error detail on failure
    pub payload: Vec<u8, MAX_PAYLOAD_SIZE>,
}

impl Response {
    /// Successful response with a payload
    pub fn ok(payload: &[u8]) -> Result<Self, FrameError> {
        Self::with_status(crate::messages::STATUS_OK, payload)
    }

    /// Successful response with no payload
    pub fn ack() -> Self {
        Self {
            status: crate::messages::STATUS_OK,
            payload: Vec::new(),
        }
    }

    /// Response with an explicit status
    pub fn with_status(status: u8, payload: &[u8]) -> Result<Self, FrameError> {
        let payload = Vec::from_slice(payload).map_err(|_| FrameError::PayloadTooLarge)?;
        Ok(Self { status, payload })
    }

    /// Header describing this response
    pub fn header(&self) -> ResponseHeader {
        ResponseHeader {
            status: self.status,
            length: self.payload.len() as u8,
        }
    }

    /// Encode this response into a heapless Vec
    pub fn encode_to_vec(&self) -> Vec<u8, MAX_FRAME_SIZE> {
        let mut out = Vec::new();
        // Capacity is MAX_FRAME_SIZE and payload is bounded by MAX_PAYLOAD_SIZE
        let _ = out.push(self.status);
        let _ = out.push(self.payload.len() as u8);
        let _ = out.extend_from_slice(&self.payload);
        out
    }
}

/// State machine for parsing incoming request frames
///
/// Used on the panel side of a link (the loopback emulator and firmware).
#[derive(Debug, Clone)]
pub struct FrameParser {
    state: ParseState,
    buffer: Vec<u8, MAX_PAYLOAD_SIZE>,
    expected_length: u8,
    opcode: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    /// Waiting for OPCODE
    WaitingForOpcode,
    /// Got OPCODE, waiting for LENGTH
    WaitingForLength,
    /// Reading payload bytes
    ReadingPayload,
}

impl Default for FrameParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameParser {
    /// Create a new frame parser
    pub fn new() -> Self {
        Self {
            state: ParseState::WaitingForOpcode,
            buffer: Vec::new(),
            expected_length: 0,
            opcode: 0,
        }
    }

    /// Reset the parser state
    pub fn reset(&mut self) {
        self.state = ParseState::WaitingForOpcode;
        self.buffer.clear();
        self.expected_length = 0;
        self.opcode = 0;
    }

    /// Check whether the parser is between frames
    pub fn is_idle(&self) -> bool {
        self.state == ParseState::WaitingForOpcode
    }

    /// Feed a single byte to the parser
    ///
    /// Returns `Some(frame)` when a complete frame is parsed, `None` when
    /// more bytes are needed. Without a sync byte every byte is meaningful,
    /// so parsing cannot fail; a corrupted stream is recovered by `reset`.
    pub fn feed(&mut self, byte: u8) -> Option<Frame> {
        match self.state {
            ParseState::WaitingForOpcode => {
                self.opcode = byte;
                self.state = ParseState::WaitingForLength;
                None
            }
            ParseState::WaitingForLength => {
                self.expected_length = byte;
                self.buffer.clear();
                if byte == 0 {
                    return Some(self.finish());
                }
                self.state = ParseState::ReadingPayload;
                None
            }
            ParseState::ReadingPayload => {
                // Cannot overflow: expected_length <= MAX_PAYLOAD_SIZE
                let _ = self.buffer.push(byte);
                if self.buffer.len() == self.expected_length as usize {
                    return Some(self.finish());
                }
                None
            }
        }
    }

    /// Feed multiple bytes to the parser
    ///
    /// Returns the first complete frame found and the number of bytes
    /// consumed. Bytes after a complete frame are not consumed.
    pub fn feed_bytes(&mut self, bytes: &[u8]) -> (Option<Frame>, usize) {
        for (i, &byte) in bytes.iter().enumerate() {
            if let Some(frame) = self.feed(byte) {
                return (Some(frame), i + 1);
            }
        }
        (None, bytes.len())
    }

    fn finish(&mut self) -> Frame {
        let frame = Frame {
            opcode: self.opcode,
            payload: self.buffer.clone(),
        };
        self.reset();
        frame
    }
}
