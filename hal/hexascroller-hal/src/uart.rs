//! UART serial communication abstractions
//!
//! Blocking byte-channel traits with a bounded read timeout. Panel links are
//! half-duplex request/response channels, so reads always know how many
//! bytes they expect.

/// Classification of a transport error
///
/// The panel protocol only needs to tell a timeout apart from a dead link;
/// everything else is reported as `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UartErrorKind {
    /// No data arrived within the configured timeout
    Timeout,
    /// The underlying device went away
    Disconnected,
    /// Any other I/O failure
    Other,
}

/// Errors produced by a UART implementation
pub trait UartError: core::fmt::Debug {
    /// Map this error onto a generic kind
    fn kind(&self) -> UartErrorKind;
}

impl UartError for UartErrorKind {
    fn kind(&self) -> UartErrorKind {
        *self
    }
}

/// UART transmitter
pub trait UartTx {
    /// Error type for transmit operations
    type Error: UartError;

    /// Write data to the UART
    ///
    /// Blocks until all data has been written or an error occurs.
    fn write_blocking(&mut self, data: &[u8]) -> Result<(), Self::Error>;

    /// Flush any buffered data
    fn flush(&mut self) -> Result<(), Self::Error>;
}

/// UART receiver
pub trait UartRx {
    /// Error type for receive operations
    type Error: UartError;

    /// Fill `buf` completely
    ///
    /// Blocks until the buffer is filled, the read timeout expires, or an
    /// error occurs. A partial read followed by a timeout is a timeout.
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), Self::Error>;

    /// Read a single byte from the UART
    fn read_byte(&mut self) -> Result<u8, Self::Error> {
        let mut buf = [0u8; 1];
        self.read_exact(&mut buf)?;
        Ok(buf[0])
    }

    /// Discard any bytes already waiting in the receive buffer
    ///
    /// Used to resynchronise after a timed-out exchange left a late response
    /// behind.
    fn discard_pending(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Combined UART interface
///
/// For links that provide both TX and RX on a single channel.
pub trait Uart: UartTx + UartRx {}

// Blanket implementation
impl<T: UartTx + UartRx> Uart for T {}

/// UART configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UartConfig {
    /// Baud rate in bits per second
    pub baudrate: u32,
    /// Read timeout in milliseconds
    pub timeout_ms: u32,
}

impl Default for UartConfig {
    fn default() -> Self {
        // The panel firmware talks CDC-ACM; the baud rate is nominal
        Self {
            baudrate: 9600,
            timeout_ms: 500,
        }
    }
}
