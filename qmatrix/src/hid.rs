//! Keyboard HID report and the event sink writing it.

use core::fmt;

use qmatrix_types::keycode::HidKeyCode;
use qmatrix_types::modifier::HidModifiers;
use serde::Serialize;
use usbd_hid::descriptor::generator_prelude::*;

use crate::sink::EventSink;

/// Length of a serialized keyboard report, report id included.
pub const KEYBOARD_REPORT_LEN: usize = 16;
/// Number of key slots in a keyboard report.
pub const KEYBOARD_REPORT_KEYS: usize = KEYBOARD_REPORT_LEN - 3;

/// Report ids of the composite HID device.
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReportId {
    Keyboard = 0x01,
    System = 0x03,
    Consumer = 0x04,
}

/// KeyboardReport describes a report and its companion descriptor that can be used to send
/// keyboard button presses to a host.
#[gen_hid_descriptor(
    (collection = APPLICATION, usage_page = GENERIC_DESKTOP, usage = KEYBOARD) = {
        (report_id = 0x01,) = {
            (usage_page = KEYBOARD, usage_min = 0xE0, usage_max = 0xE7) = {
                #[packed_bits = 8] #[item_settings(data,variable,absolute)] modifier=input;
            };
            (logical_min = 0,) = {
                #[item_settings(constant,variable,absolute)] reserved=input;
            };
            (usage_page = KEYBOARD, usage_min = 0x00, usage_max = 0xDD) = {
                #[item_settings(data,array,absolute)] keycodes=input;
            };
        };
    }
)]
#[derive(Default, Serialize)] // Debug, Clone, Copy, PartialEq, Eq come from gen_hid_descriptor
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyboardReport {
    pub modifier: u8, // HidModifiers
    pub reserved: u8,
    pub keycodes: [u8; 13], // KEYBOARD_REPORT_KEYS; the descriptor macro needs a literal length
}

impl KeyboardReport {
    /// Build the report of the given held keys and modifiers. Keys are listed in ascending
    /// order, keys beyond the report capacity are dropped.
    pub fn new(modifiers: HidModifiers, keys: &KeysDown) -> Self {
        let mut report = Self {
            modifier: modifiers.into_bits(),
            ..Default::default()
        };
        for (slot, key) in report.keycodes.iter_mut().zip(keys.iter()) {
            *slot = key;
        }
        report
    }

    /// Wire layout: report id, modifiers, reserved byte, key slots.
    pub fn to_bytes(&self) -> [u8; KEYBOARD_REPORT_LEN] {
        let mut buf = [0; KEYBOARD_REPORT_LEN];
        buf[0] = ReportId::Keyboard as u8;
        buf[1] = self.modifier;
        buf[2] = self.reserved;
        buf[3..].copy_from_slice(&self.keycodes);
        buf
    }
}

/// Set of held non-modifier keys.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct KeysDown([u32; 8]);

impl KeysDown {
    pub fn set(&mut self, keycode: u8, pressed: bool) {
        let bit = 1 << (keycode % 32);
        if pressed {
            self.0[keycode as usize / 32] |= bit;
        } else {
            self.0[keycode as usize / 32] &= !bit;
        }
    }

    pub fn contains(&self, keycode: u8) -> bool {
        self.0[keycode as usize / 32] & (1 << (keycode % 32)) != 0
    }

    pub fn clear(&mut self) {
        self.0 = [0; 8];
    }

    /// Held keys in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        (0..=u8::MAX).filter(|k| self.contains(*k))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HidError {
    /// The report doesn't fit in the output buffer
    BufferOverflow,
    /// Only part of the report was written
    PartialWrite(usize),
    /// No host is listening
    Disconnected,
}

impl fmt::Display for HidError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HidError::BufferOverflow => write!(f, "report buffer overflow"),
            HidError::PartialWrite(n) => write!(f, "partial report write ({} bytes)", n),
            HidError::Disconnected => write!(f, "HID device disconnected"),
        }
    }
}

impl core::error::Error for HidError {}

/// Destination of raw HID reports, such as a USB endpoint or a HID gadget device.
pub trait HidWriter {
    /// Write one report, return the number of bytes written.
    fn write_report(&mut self, report: &[u8]) -> Result<usize, HidError>;
}

/// [`EventSink`] that tracks the held keys and writes a keyboard report on every change.
pub struct HidReportSink<W: HidWriter> {
    writer: W,
    keys: KeysDown,
    modifiers: HidModifiers,
}

impl<W: HidWriter> HidReportSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            keys: KeysDown::default(),
            modifiers: HidModifiers::new(),
        }
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    /// The report describing the current held keys.
    pub fn report(&self) -> KeyboardReport {
        KeyboardReport::new(self.modifiers, &self.keys)
    }

    /// Release everything and tell the host.
    pub fn release_all(&mut self) {
        self.keys.clear();
        self.modifiers = HidModifiers::new();
        self.send_report();
    }

    fn send_report(&mut self) {
        let report = self.report().to_bytes();
        match self.writer.write_report(&report) {
            Ok(n) if n == report.len() => {}
            Ok(n) => error!("Failed to send keyboard report: {:?}", HidError::PartialWrite(n)),
            Err(e) => error!("Failed to send keyboard report: {:?}", e),
        }
    }
}

impl<W: HidWriter> EventSink for HidReportSink<W> {
    fn send_keycode(&mut self, keycode: u8, pressed: bool) {
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
        self.send_report();
    }
}
