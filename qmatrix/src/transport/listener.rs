use qmatrix_types::keycode::HidKeyCode;
use qmatrix_types::modifier::HidModifiers;

use super::{Envelope, Message, TransportError};
use crate::config::MATRIX_MAX_ROWS;
use crate::hid::{KeyboardReport, KeysDown};
use crate::layer::LayerState;

/// Receiving side of the transport: mirrors the keyboard state from the messages it's sent and
/// regenerates the HID report when a key changes.
#[derive(Debug, Default, Clone)]
pub struct Listener {
    keys: KeysDown,
    modifiers: HidModifiers,
    /// Pressed matrix positions, one column bitmask per row
    matrix: [u32; MATRIX_MAX_ROWS],
    active_layer: u8,
    layer_state: LayerState,
    usb_passthrough: bool,
}

impl Listener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_layer(&self) -> u8 {
        self.active_layer
    }

    pub fn layer_state(&self) -> LayerState {
        self.layer_state
    }

    pub fn usb_passthrough(&self) -> bool {
        self.usb_passthrough
    }

    pub fn is_pressed(&self, row: u8, col: u8) -> bool {
        (row as usize) < MATRIX_MAX_ROWS && col < 32 && self.matrix[row as usize] & (1 << col) != 0
    }

    /// The report of the keys currently held.
    pub fn report(&self) -> KeyboardReport {
        KeyboardReport::new(self.modifiers, &self.keys)
    }

    /// Apply one message, return the new HID report if the held keys changed.
    pub fn handle_message(&mut self, message: &Message<'_>) -> Option<KeyboardReport> {
        match *message {
            Message::Handshake(text) | Message::Generic(text) => {
                info!("{}", text);
                None
            }
            Message::KeycodeHid { keycode, pressed } => {
                debug!(
                    "HID keycode {}: (0x{:02X}) {}",
                    if pressed { "pressed" } else { "released" },
                    keycode,
                    HidKeyCode::name_of(keycode)
                );
                let key = HidKeyCode::from(keycode);
                if key.is_modifier() {
                    if pressed {
                        self.modifiers |= key.to_hid_modifiers();
                    } else {
                        self.modifiers &= !key.to_hid_modifiers();
                    }
                } else {
                    self.keys.set(keycode, pressed);
                }
                Some(self.report())
            }
            Message::MatrixEvent(event) => {
                if (event.row as usize) < MATRIX_MAX_ROWS && event.col < 32 {
                    let bit = 1 << event.col;
                    if event.pressed {
                        self.matrix[event.row as usize] |= bit;
                    } else {
                        self.matrix[event.row as usize] &= !bit;
                    }
                } else {
                    warn!("Matrix event out of range: {:?}", event);
                }
                None
            }
            Message::ActiveLayer(layer) => {
                debug!("Active layer: {}", layer);
                self.active_layer = layer;
                None
            }
            Message::LayerState(state) => {
                self.layer_state = state;
                None
            }
            Message::UsbPassthrough(enabled) => {
                self.usb_passthrough = enabled;
                None
            }
        }
    }

    /// Apply every message of an envelope, calling `on_report` for each regenerated report.
    ///
    /// Messages decoded before an error are still applied.
    pub fn handle_envelope(
        &mut self,
        buf: &[u8],
        mut on_report: impl FnMut(KeyboardReport),
    ) -> Result<(), TransportError> {
        for message in Envelope::new(buf)? {
            if let Some(report) = self.handle_message(&message?) {
                on_report(report);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::event::KeyboardEvent;
    use crate::transport::encode_envelope;

    #[test]
    fn test_keycode_regenerates_report() {
        let mut listener = Listener::new();
        let report = listener.handle_message(&Message::KeycodeHid {
            keycode: HidKeyCode::LShift as u8,
            pressed: true,
        });
        assert_eq!(report.map(|r| r.modifier), Some(0x02));
        let report = listener
            .handle_message(&Message::KeycodeHid {
                keycode: HidKeyCode::B as u8,
                pressed: true,
            })
            .unwrap();
        assert_eq!(report.to_bytes()[..5], [0x01, 0x02, 0x00, 0x05, 0x00]);
    }

    #[test]
    fn test_state_messages() {
        let mut listener = Listener::new();
        assert_eq!(listener.handle_message(&Message::ActiveLayer(3)), None);
        listener.handle_message(&Message::LayerState(LayerState::from_bits(0b1001)));
        listener.handle_message(&Message::UsbPassthrough(true));
        listener.handle_message(&Message::MatrixEvent(KeyboardEvent::key(1, 4, true)));
        assert_eq!(listener.active_layer(), 3);
        assert_eq!(listener.layer_state().bits(), 0b1001);
        assert!(listener.usb_passthrough());
        assert!(listener.is_pressed(1, 4));
        listener.handle_message(&Message::MatrixEvent(KeyboardEvent::key(1, 4, false)));
        assert!(!listener.is_pressed(1, 4));
    }

    #[test]
    fn test_envelope_reports() {
        let mut buf = [0; 32];
        let len = encode_envelope(
            &[
                Message::KeycodeHid { keycode: 0x04, pressed: true },
                Message::ActiveLayer(1),
                Message::KeycodeHid { keycode: 0x04, pressed: false },
            ],
            &mut buf,
        )
        .unwrap();
        let mut listener = Listener::new();
        let mut reports = heapless::Vec::<KeyboardReport, 4>::new();
        listener
            .handle_envelope(&buf[..len], |r| reports.push(r).unwrap())
            .unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].keycodes[0], 0x04);
        assert_eq!(reports[1].keycodes[0], 0x00);
        assert_eq!(listener.active_layer(), 1);
    }
}
