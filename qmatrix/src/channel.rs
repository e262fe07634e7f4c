//! Exposed channels which can be used to share data between the matrix scanner and the keyboard

use embassy_sync::channel::Channel;
pub use embassy_sync::{blocking_mutex, channel, signal};

use crate::event::KeyboardEvent;
use crate::{EVENT_CHANNEL_SIZE, RawMutex};

/// Channel for raw matrix events, for firmwares driving a single keyboard
pub static KEY_EVENT_CHANNEL: Channel<RawMutex, KeyboardEvent, EVENT_CHANNEL_SIZE> = Channel::new();
