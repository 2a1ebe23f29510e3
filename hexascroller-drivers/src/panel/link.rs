//! Command protocol over a UART
//!
//! Each exchange is strictly request then response. After a timeout the
//! receive buffer is drained so a late reply cannot be mistaken for the
//! answer to the next command.

use heapless::Vec;
use hexascroller_core::traits::panel::ResponsePayload;
use hexascroller_core::traits::{CommandError, PanelError, PanelLink};
use hexascroller_hal::{Uart, UartError, UartErrorKind, UartRx};
use hexascroller_protocol::{Frame, Opcode, ResponseHeader};

/// A panel reached through a byte channel
pub struct SerialPanel<U> {
    uart: U,
}

fn command_error<E: UartError>(opcode: u8, err: &E) -> CommandError {
    match err.kind() {
        UartErrorKind::Timeout => CommandError::Timeout { opcode },
        UartErrorKind::Disconnected | UartErrorKind::Other => CommandError::Io { opcode },
    }
}

impl<U: Uart> SerialPanel<U> {
    pub fn new(uart: U) -> Self {
        Self { uart }
    }

    /// Release the underlying channel
    pub fn into_inner(self) -> U {
        self.uart
    }

    fn read_exact(&mut self, opcode: u8, buf: &mut [u8]) -> Result<(), CommandError> {
        match UartRx::read_exact(&mut self.uart, buf) {
            Ok(()) => Ok(()),
            Err(err) => {
                let error = command_error(opcode, &err);
                if error.is_timeout() {
                    // Best effort; the next command reports a dead link anyway
                    let _ = self.uart.discard_pending();
                }
                Err(error)
            }
        }
    }
}

impl<U: Uart> PanelLink for SerialPanel<U> {
    fn send_command(
        &mut self,
        opcode: Opcode,
        payload: &[u8],
    ) -> Result<ResponsePayload, PanelError> {
        let op = opcode.as_byte();
        let request = Frame::new(op, payload)?.encode_to_vec()?;

        self.uart
            .write_blocking(&request)
            .map_err(|e| command_error(op, &e))?;
        self.uart.flush().map_err(|e| command_error(op, &e))?;

        let mut header = [0u8; ResponseHeader::SIZE];
        self.read_exact(op, &mut header)?;
        let header = ResponseHeader::from_bytes(header);

        // Read the payload even on failure so the channel stays in sync
        let mut response = Vec::new();
        // Capacity is MAX_PAYLOAD_SIZE, which any u8 length fits
        let _ = response.resize(usize::from(header.length), 0);
        self.read_exact(op, &mut response)?;

        if !header.is_ok() {
            return Err(CommandError::status(opcode, header.status).into());
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hexascroller_core::traits::ValidationError;
    use hexascroller_hal::UartTx;
    use hexascroller_protocol::{PANEL_BYTES, STATUS_ERROR};

    extern crate std;
    use std::collections::VecDeque;
    use std::vec::Vec as StdVec;

    /// Scripted channel: replies are queued up front, writes are recorded
    #[derive(Default)]
    struct ScriptedUart {
        rx: VecDeque<u8>,
        tx: StdVec<u8>,
        discarded: usize,
        broken: bool,
    }

    impl ScriptedUart {
        fn replying(bytes: &[u8]) -> Self {
            Self {
                rx: bytes.iter().copied().collect(),
                ..Self::default()
            }
        }
    }

    impl UartTx for ScriptedUart {
        type Error = UartErrorKind;

        fn write_blocking(&mut self, data: &[u8]) -> Result<(), Self::Error> {
            if self.broken {
                return Err(UartErrorKind::Disconnected);
            }
            self.tx.extend_from_slice(data);
            Ok(())
        }

        fn flush(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    impl UartRx for ScriptedUart {
        type Error = UartErrorKind;

        fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), Self::Error> {
            if self.rx.len() < buf.len() {
                self.rx.clear();
                return Err(UartErrorKind::Timeout);
            }
            for b in buf.iter_mut() {
                *b = self.rx.pop_front().unwrap();
            }
            Ok(())
        }

        fn discard_pending(&mut self) -> Result<(), Self::Error> {
            self.discarded += 1;
            self.rx.clear();
            Ok(())
        }
    }

    #[test]
    fn test_identify_over_uart() {
        let mut panel = SerialPanel::new(ScriptedUart::replying(&[0, 1, 2]));
        assert_eq!(panel.identify(), Ok(2));
        assert_eq!(panel.into_inner().tx, [0xA4, 0]);
    }

    #[test]
    fn test_request_bytes() {
        let mut panel = SerialPanel::new(ScriptedUart::replying(&[0, 0]));
        panel.set_relay(true).unwrap();
        assert_eq!(panel.into_inner().tx, [0xA6, 1, 1]);
    }

    #[test]
    fn test_error_status_reads_payload() {
        // Status 1 with a two byte error payload, then a good reply
        let uart = ScriptedUart::replying(&[STATUS_ERROR, 2, 0xDE, 0xAD, 0, 0]);
        let mut panel = SerialPanel::new(uart);
        assert_eq!(
            panel.flip_buffers(),
            Err(PanelError::Command(CommandError::Status {
                opcode: 0xB2,
                expected: 0,
                got: 1
            }))
        );
        // Error payload was consumed, so the next exchange lines up
        assert_eq!(panel.flip_buffers(), Ok(()));
    }

    #[test]
    fn test_timeout_is_command_error() {
        let mut panel = SerialPanel::new(ScriptedUart::replying(&[0]));
        assert_eq!(
            panel.set_relay(false),
            Err(PanelError::Command(CommandError::Timeout { opcode: 0xA6 }))
        );
        assert_eq!(panel.into_inner().discarded, 1);
    }

    #[test]
    fn test_disconnected_is_io_error() {
        let mut uart = ScriptedUart::replying(&[0, 0]);
        uart.broken = true;
        let mut panel = SerialPanel::new(uart);
        assert_eq!(
            panel.set_id(1),
            Err(PanelError::Command(CommandError::Io { opcode: 0xA3 }))
        );
    }

    #[test]
    fn test_split_image_wire_format() {
        let mut panel = SerialPanel::new(ScriptedUart::replying(&[0, 0, 0, 0, 0, 0]));
        let mut bitmap = [0u8; PANEL_BYTES];
        bitmap[60] = 0x40;
        panel.set_split_image(&bitmap).unwrap();

        let tx = panel.into_inner().tx;
        assert_eq!(tx.len(), (2 + 60) * 2 + 2);
        assert_eq!(&tx[..2], &[0xB3, 60]);
        assert_eq!(&tx[62..64], &[0xB4, 60]);
        assert_eq!(tx[64], 0x40);
        assert_eq!(&tx[124..], &[0xB2, 0]);
    }

    #[test]
    fn test_validation_sends_nothing() {
        let mut panel = SerialPanel::new(ScriptedUart::default());
        assert_eq!(
            panel.set_compiled_image(&[0u8; 60]),
            Err(PanelError::Validation(ValidationError::BitmapLength {
                expected: 120,
                got: 60
            }))
        );
        assert!(panel.into_inner().tx.is_empty());
    }
}
