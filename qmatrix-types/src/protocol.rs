//! Transport message tags.
//!
//! Every transport message starts with a one byte [`MessageTag`]; the payload layout is fixed
//! per tag except for the two text messages, which carry a NUL-terminated string.

use strum::FromRepr;

/// Message type identifiers.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, FromRepr)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum MessageTag {
    /// Greeting text sent when the scan side comes up
    Handshake = 0x01,
    /// Free-form diagnostic text
    MsgGeneric = 0x02,
    /// A resolved HID keycode went down or up
    KeycodeHid = 0x03,
    /// A raw matrix transition
    MatrixEvent = 0x04,
    /// The status layer changed
    ActiveLayer = 0x05,
    /// The layer bitmask changed
    LayerState = 0x06,
    /// USB passthrough switched on or off
    UsbPassthrough = 0x07,
}

impl MessageTag {
    /// Payload length of the fixed-size messages, `None` for NUL-terminated text.
    pub const fn payload_len(self) -> Option<usize> {
        match self {
            MessageTag::Handshake | MessageTag::MsgGeneric => None,
            MessageTag::KeycodeHid => Some(2),
            MessageTag::MatrixEvent => Some(3),
            MessageTag::ActiveLayer => Some(1),
            MessageTag::LayerState => Some(2),
            MessageTag::UsbPassthrough => Some(1),
        }
    }
}

impl TryFrom<u8> for MessageTag {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_repr(value).ok_or(value)
    }
}
