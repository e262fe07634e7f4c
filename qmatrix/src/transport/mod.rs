//! Binary message framing between the scanning side and the HID writer side.
//!
//! A message is a one byte [`MessageTag`] followed by its payload:
//!
//! | tag | payload |
//! | --- | --- |
//! | `HANDSHAKE`, `MSG_GENERIC` | NUL-terminated text |
//! | `KEYCODE_HID` | keycode, pressed |
//! | `MATRIX_EVENT` | row, col, pressed |
//! | `ACTIVE_LAYER` | layer |
//! | `LAYER_STATE` | bitmask high byte, bitmask low byte |
//! | `USB_PASSTHROUGH` | enabled |
//!
//! Several messages can be framed in an envelope: byte 0 is the total envelope length, itself
//! included, followed by messages back to back.

mod listener;

use core::fmt;

pub use listener::Listener;
use qmatrix_types::protocol::MessageTag;

use crate::event::KeyboardEvent;
use crate::layer::LayerState;
use crate::sink::EventSink;

/// Max size of an envelope, bounded by its one byte length.
pub const MAX_ENVELOPE_LEN: usize = u8::MAX as usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportError {
    /// No byte to decode
    Empty,
    UnknownTag(u8),
    /// The payload is shorter than its tag requires
    Truncated { tag: MessageTag, needed: usize, available: usize },
    /// A text message without its terminator
    MissingNul,
    /// Text to send contains a NUL byte
    InteriorNul,
    InvalidUtf8,
    /// The envelope declares more bytes than were received
    EnvelopeLength { declared: usize, available: usize },
    /// The output buffer can't hold the message
    BufferTooSmall,
    /// The message couldn't be delivered
    WriteFailed,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Empty => write!(f, "empty message"),
            TransportError::UnknownTag(tag) => write!(f, "unknown message tag 0x{:02x}", tag),
            TransportError::Truncated { tag, needed, available } => {
                write!(f, "{:?} needs {} payload bytes, got {}", tag, needed, available)
            }
            TransportError::MissingNul => write!(f, "text message is not NUL-terminated"),
            TransportError::InteriorNul => write!(f, "text message contains a NUL byte"),
            TransportError::InvalidUtf8 => write!(f, "text message is not valid UTF-8"),
            TransportError::EnvelopeLength { declared, available } => {
                write!(f, "envelope declares {} bytes, got {}", declared, available)
            }
            TransportError::BufferTooSmall => write!(f, "output buffer too small"),
            TransportError::WriteFailed => write!(f, "failed to write message"),
        }
    }
}

impl core::error::Error for TransportError {}

/// A decoded transport message. Text messages borrow from the received buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Message<'a> {
    Handshake(&'a str),
    Generic(&'a str),
    KeycodeHid { keycode: u8, pressed: bool },
    MatrixEvent(KeyboardEvent),
    ActiveLayer(u8),
    LayerState(LayerState),
    UsbPassthrough(bool),
}

impl<'a> Message<'a> {
    pub fn tag(&self) -> MessageTag {
        match self {
            Message::Handshake(_) => MessageTag::Handshake,
            Message::Generic(_) => MessageTag::MsgGeneric,
            Message::KeycodeHid { .. } => MessageTag::KeycodeHid,
            Message::MatrixEvent(_) => MessageTag::MatrixEvent,
            Message::ActiveLayer(_) => MessageTag::ActiveLayer,
            Message::LayerState(_) => MessageTag::LayerState,
            Message::UsbPassthrough(_) => MessageTag::UsbPassthrough,
        }
    }

    /// Encoded size of the message, tag included.
    pub fn encoded_len(&self) -> usize {
        match self {
            Message::Handshake(text) | Message::Generic(text) => text.len() + 2,
            _ => self.tag().payload_len().unwrap_or(0) + 1,
        }
    }

    /// Encode the message into `buf`, return the number of bytes written.
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize, TransportError> {
        let len = self.encoded_len();
        if buf.len() < len {
            return Err(TransportError::BufferTooSmall);
        }
        buf[0] = self.tag() as u8;
        let payload = &mut buf[1..len];
        match *self {
            Message::Handshake(text) | Message::Generic(text) => {
                if text.as_bytes().contains(&0) {
                    return Err(TransportError::InteriorNul);
                }
                payload[..text.len()].copy_from_slice(text.as_bytes());
                payload[text.len()] = 0;
            }
            Message::KeycodeHid { keycode, pressed } => payload.copy_from_slice(&[keycode, pressed as u8]),
            Message::MatrixEvent(event) => payload.copy_from_slice(&[event.row, event.col, event.pressed as u8]),
            Message::ActiveLayer(layer) => payload[0] = layer,
            Message::LayerState(state) => payload.copy_from_slice(&state.bits().to_be_bytes()),
            Message::UsbPassthrough(enabled) => payload[0] = enabled as u8,
        }
        Ok(len)
    }

    /// Decode the message at the start of `buf`, return it with the number of bytes consumed.
    pub fn decode(buf: &'a [u8]) -> Result<(Self, usize), TransportError> {
        let (&tag, payload) = buf.split_first().ok_or(TransportError::Empty)?;
        let tag = MessageTag::try_from(tag).map_err(TransportError::UnknownTag)?;

        let Some(needed) = tag.payload_len() else {
            let end = payload.iter().position(|&b| b == 0).ok_or(TransportError::MissingNul)?;
            let text = core::str::from_utf8(&payload[..end]).map_err(|_| TransportError::InvalidUtf8)?;
            let message = match tag {
                MessageTag::Handshake => Message::Handshake(text),
                _ => Message::Generic(text),
            };
            return Ok((message, end + 2));
        };

        if payload.len() < needed {
            return Err(TransportError::Truncated {
                tag,
                needed,
                available: payload.len(),
            });
        }
        let message = match tag {
            MessageTag::KeycodeHid => Message::KeycodeHid {
                keycode: payload[0],
                pressed: payload[1] != 0,
            },
            MessageTag::MatrixEvent => Message::MatrixEvent(KeyboardEvent::key(payload[0], payload[1], payload[2] != 0)),
            MessageTag::ActiveLayer => Message::ActiveLayer(payload[0]),
            MessageTag::LayerState => Message::LayerState(LayerState::from_bits(u16::from_be_bytes([payload[0], payload[1]]))),
            MessageTag::UsbPassthrough => Message::UsbPassthrough(payload[0] != 0),
            MessageTag::Handshake | MessageTag::MsgGeneric => return Err(TransportError::UnknownTag(tag as u8)),
        };
        Ok((message, needed + 1))
    }
}

/// Encode several messages into one envelope, return the envelope length.
pub fn encode_envelope(messages: &[Message<'_>], buf: &mut [u8]) -> Result<usize, TransportError> {
    if buf.is_empty() {
        return Err(TransportError::BufferTooSmall);
    }
    let mut len = 1;
    for message in messages {
        let end = buf.len().min(MAX_ENVELOPE_LEN);
        let out = buf.get_mut(len..end).ok_or(TransportError::BufferTooSmall)?;
        len += message.encode(out)?;
    }
    buf[0] = len as u8;
    Ok(len)
}

/// Iterator over the messages of an envelope.
///
/// Decoding stops at the first error, which is yielded last.
pub struct Envelope<'a> {
    remaining: &'a [u8],
}

impl<'a> Envelope<'a> {
    pub fn new(buf: &'a [u8]) -> Result<Self, TransportError> {
        let (&declared, _) = buf.split_first().ok_or(TransportError::Empty)?;
        let declared = declared as usize;
        if declared == 0 || declared > buf.len() {
            return Err(TransportError::EnvelopeLength {
                declared,
                available: buf.len(),
            });
        }
        Ok(Self {
            remaining: &buf[1..declared],
        })
    }
}

impl<'a> Iterator for Envelope<'a> {
    type Item = Result<Message<'a>, TransportError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining.is_empty() {
            return None;
        }
        match Message::decode(self.remaining) {
            Ok((message, used)) => {
                self.remaining = &self.remaining[used..];
                Some(Ok(message))
            }
            Err(e) => {
                self.remaining = &[];
                Some(Err(e))
            }
        }
    }
}

/// Destination of encoded messages, such as a socket.
pub trait MessageWriter {
    fn write_message(&mut self, message: &[u8]) -> Result<(), TransportError>;
}

/// [`EventSink`] forwarding events across a process boundary.
pub struct TransportSink<W: MessageWriter> {
    writer: W,
}

impl<W: MessageWriter> TransportSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    /// Send a message, logging delivery failures.
    pub fn send(&mut self, message: Message<'_>) {
        let mut buf = [0u8; MAX_ENVELOPE_LEN];
        let result = message.encode(&mut buf).and_then(|len| self.writer.write_message(&buf[..len]));
        if let Err(e) = result {
            warn!("Failed to send {:?}: {:?}", message.tag(), e);
        }
    }
}

impl<W: MessageWriter> EventSink for TransportSink<W> {
    fn send_keycode(&mut self, keycode: u8, pressed: bool) {
        self.send(Message::KeycodeHid { keycode, pressed });
    }

    fn matrix_event(&mut self, event: KeyboardEvent) {
        self.send(Message::MatrixEvent(event));
    }

    fn layer_changed(&mut self, active_layer: u8, layer_state: LayerState) {
        self.send(Message::ActiveLayer(active_layer));
        self.send(Message::LayerState(layer_state));
    }
}
