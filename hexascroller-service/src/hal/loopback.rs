//! In-process panel emulation
//!
//! Frames written to a `LoopbackUart` are parsed and executed by an
//! `EmulatedPanel`, whose responses are queued for the next read. This lets
//! the whole service run with `--simulate` and no hardware attached.

use std::collections::VecDeque;

use hexascroller_core::state::Bitmap;
use hexascroller_display::decode_bitmap;
use hexascroller_hal::{UartErrorKind, UartRx, UartTx};
use hexascroller_protocol::{
    Frame, FrameParser, PanelCommand, Response, HALF_WIDTH, PANEL_BYTES, PANEL_HEIGHT, PANEL_WIDTH,
    STATUS_ERROR,
};

/// Firmware behaviour of one panel
#[derive(Debug, Clone)]
pub struct EmulatedPanel {
    pub id: u8,
    pub relay: bool,
    /// Shown bitmap
    pub front: Bitmap,
    /// Bitmap being assembled from halves
    pub back: Bitmap,
    pub text: Option<String>,
    pub uart_out: Vec<u8>,
    /// Number of completed buffer flips
    pub flips: usize,
    /// When false, frames are swallowed and never answered
    pub responsive: bool,
}

impl EmulatedPanel {
    pub fn new(id: u8) -> Self {
        Self {
            id,
            relay: false,
            front: [0; PANEL_BYTES],
            back: [0; PANEL_BYTES],
            text: None,
            uart_out: Vec::new(),
            flips: 0,
            responsive: true,
        }
    }

    /// Execute one request frame and build the response
    pub fn handle(&mut self, frame: &Frame) -> Response {
        let command = match PanelCommand::from_frame(frame) {
            Ok(command) => command,
            Err(err) => {
                log::debug!(
                    "panel {}: rejected frame {:#04x}: {}",
                    self.id,
                    frame.opcode,
                    err
                );
                return nak();
            }
        };

        match command {
            PanelCommand::Text { x, y, text } => {
                self.text = Some(String::from_utf8_lossy(text).into_owned());
                log::trace!("panel {}: text at ({x}, {y})", self.id);
            }
            PanelCommand::Bitmap(bytes) => {
                if bytes.len() != PANEL_BYTES {
                    return nak();
                }
                self.front.copy_from_slice(bytes);
            }
            PanelCommand::SetId(id) => self.id = id,
            PanelCommand::GetId => return Response::ok(&[self.id]).unwrap_or_else(|_| nak()),
            PanelCommand::WriteUart(bytes) => self.uart_out.extend_from_slice(bytes),
            PanelCommand::Relay(on) => self.relay = on,
            PanelCommand::FlipBuffers => {
                core::mem::swap(&mut self.front, &mut self.back);
                self.flips += 1;
                if log::log_enabled!(log::Level::Trace) {
                    log::trace!("panel {}:\n{}", self.id, ascii_art(&self.front));
                }
            }
            PanelCommand::BitmapHalf1(bytes) => {
                if bytes.len() != HALF_WIDTH {
                    return nak();
                }
                self.back[..HALF_WIDTH].copy_from_slice(bytes);
            }
            PanelCommand::BitmapHalf2(bytes) => {
                if bytes.len() != HALF_WIDTH {
                    return nak();
                }
                self.back[HALF_WIDTH..].copy_from_slice(bytes);
            }
        }
        Response::ack()
    }
}

fn nak() -> Response {
    Response {
        status: STATUS_ERROR,
        payload: heapless::Vec::new(),
    }
}

/// Render a bitmap as rows of `#` and `.`
pub fn ascii_art(bitmap: &Bitmap) -> String {
    let image = decode_bitmap(bitmap);
    let mut out = String::with_capacity((PANEL_WIDTH + 1) * PANEL_HEIGHT);
    for y in 0..PANEL_HEIGHT {
        for x in 0..PANEL_WIDTH {
            out.push(if image.get(x, y) { '#' } else { '.' });
        }
        out.push('\n');
    }
    out
}

/// A UART whose far end is an emulated panel
#[derive(Debug)]
pub struct LoopbackUart {
    pub panel: EmulatedPanel,
    parser: FrameParser,
    pending: VecDeque<u8>,
}

impl LoopbackUart {
    pub fn new(id: u8) -> Self {
        Self::with_panel(EmulatedPanel::new(id))
    }

    pub fn with_panel(panel: EmulatedPanel) -> Self {
        Self {
            panel,
            parser: FrameParser::new(),
            pending: VecDeque::new(),
        }
    }
}

impl UartTx for LoopbackUart {
    type Error = UartErrorKind;

    fn write_blocking(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        for &byte in data {
            let Some(frame) = self.parser.feed(byte) else {
                continue;
            };
            let response = self.panel.handle(&frame);
            if self.panel.responsive {
                self.pending.extend(response.encode_to_vec());
            }
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl UartRx for LoopbackUart {
    type Error = UartErrorKind;

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), Self::Error> {
        let n = buf.len();
        if self.pending.len() < n {
            return Err(UartErrorKind::Timeout);
        }
        for (dst, src) in buf.iter_mut().zip(self.pending.drain(..n)) {
            *dst = src;
        }
        Ok(())
    }

    fn discard_pending(&mut self) -> Result<(), Self::Error> {
        self.pending.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hexascroller_core::traits::{CommandError, PanelError, PanelLink};
    use hexascroller_drivers::panel::SerialPanel;
    use hexascroller_protocol::Opcode;

    #[test]
    fn test_identify_and_set_id() {
        let mut link = SerialPanel::new(LoopbackUart::new(2));
        assert_eq!(link.identify().unwrap(), 2);
        link.set_id(1).unwrap();
        assert_eq!(link.identify().unwrap(), 1);
    }

    #[test]
    fn test_read_exact_takes_queued_reply() {
        let mut uart = LoopbackUart::new(5);
        uart.write_blocking(&[0xA4, 0]).unwrap();

        let mut header = [0u8; 2];
        uart.read_exact(&mut header).unwrap();
        assert_eq!(header, [0, 1]);

        // Asking for more than is queued consumes nothing
        let mut long = [0u8; 2];
        assert_eq!(uart.read_exact(&mut long), Err(UartErrorKind::Timeout));
        let mut id = [0u8; 1];
        uart.read_exact(&mut id).unwrap();
        assert_eq!(id, [5]);
    }

    #[test]
    fn test_split_image_lands_on_front() {
        let mut link = SerialPanel::new(LoopbackUart::new(0));
        let mut bitmap = [0u8; PANEL_BYTES];
        bitmap[0] = 0x80;
        bitmap[119] = 0x02;
        link.set_split_image(&bitmap).unwrap();

        let uart = link.into_inner();
        assert_eq!(uart.panel.front, bitmap);
        assert_eq!(uart.panel.flips, 1);
    }

    #[test]
    fn test_relay_and_uart() {
        let mut link = SerialPanel::new(LoopbackUart::new(0));
        link.set_relay(true).unwrap();
        link.write_uart(b"AT\r\n").unwrap();
        let uart = link.into_inner();
        assert!(uart.panel.relay);
        assert_eq!(uart.panel.uart_out, b"AT\r\n");
    }

    #[test]
    fn test_bad_half_is_rejected() {
        let mut link = SerialPanel::new(LoopbackUart::new(0));
        let err = link
            .send_command(Opcode::BitmapHalf1, &[0; 10])
            .unwrap_err();
        assert_eq!(
            err,
            PanelError::Command(CommandError::status(Opcode::BitmapHalf1, STATUS_ERROR))
        );
        // Link stays in sync after an error status
        assert_eq!(link.identify().unwrap(), 0);
    }

    #[test]
    fn test_unresponsive_panel_times_out() {
        let mut panel = EmulatedPanel::new(0);
        panel.responsive = false;
        let mut link = SerialPanel::new(LoopbackUart::with_panel(panel));
        let err = link.flip_buffers().unwrap_err();
        assert!(matches!(err, PanelError::Command(e) if e.is_timeout()));
    }

    #[test]
    fn test_ascii_art() {
        let mut bitmap = [0u8; PANEL_BYTES];
        bitmap[3] = 0x80;
        let art = ascii_art(&bitmap);
        let first = art.lines().next().unwrap();
        assert_eq!(first.len(), PANEL_WIDTH);
        assert_eq!(first.find('#'), Some(3));
        assert_eq!(art.lines().count(), PANEL_HEIGHT);
    }
}
