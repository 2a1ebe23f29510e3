//! Serial port UART

use std::io::{self, Read, Write};
use std::time::Duration;

use hexascroller_hal::{UartConfig, UartError, UartErrorKind, UartRx, UartTx};
use serialport::{ClearBuffer, SerialPort};

/// I/O error from a serial port
#[derive(Debug)]
pub struct SerialError(pub io::Error);

impl UartError for SerialError {
    fn kind(&self) -> UartErrorKind {
        match self.0.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => UartErrorKind::Timeout,
            io::ErrorKind::BrokenPipe
            | io::ErrorKind::NotConnected
            | io::ErrorKind::UnexpectedEof => UartErrorKind::Disconnected,
            _ => UartErrorKind::Other,
        }
    }
}

impl From<io::Error> for SerialError {
    fn from(err: io::Error) -> Self {
        Self(err)
    }
}

impl From<serialport::Error> for SerialError {
    fn from(err: serialport::Error) -> Self {
        Self(err.into())
    }
}

/// A panel link over a serial device
pub struct SerialUart {
    port: Box<dyn SerialPort>,
}

impl SerialUart {
    /// Open `path` with the configured baud rate and read timeout
    pub fn open(path: &str, config: &UartConfig) -> Result<Self, serialport::Error> {
        let port = serialport::new(path, config.baudrate)
            .timeout(Duration::from_millis(u64::from(config.timeout_ms)))
            .open()?;
        Ok(Self { port })
    }
}

impl UartTx for SerialUart {
    type Error = SerialError;

    fn write_blocking(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        self.port.write_all(data)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.port.flush()?;
        Ok(())
    }
}

impl UartRx for SerialUart {
    type Error = SerialError;

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), Self::Error> {
        self.port.read_exact(buf)?;
        Ok(())
    }

    fn discard_pending(&mut self) -> Result<(), Self::Error> {
        self.port.clear(ClearBuffer::Input)?;
        Ok(())
    }
}
