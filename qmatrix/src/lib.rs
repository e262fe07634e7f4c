//! GPIO matrix keyboard core.
//!
//! Raw `(row, col, pressed)` transitions from a [`matrix::Matrix`] are resolved against a layered
//! keymap by [`processor::dispatch`], and the resulting key events go to an [`sink::EventSink`]:
//! a HID report writer, a transport to another process, or anything implementing the trait.
//!
//! ## Feature flags
#![doc = document_features::document_features!()]
#![cfg_attr(not(test), no_std)]

// This mod MUST go first, so that the others see its macros.
#[macro_use]
pub(crate) mod fmt;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
pub use qmatrix_types;

pub mod channel;
pub mod config;
pub mod debounce;
pub mod event;
pub mod hid;
pub mod keyboard;
pub mod keymap;
pub mod layer;
pub mod layout_macro;
pub mod matrix;
pub mod processor;
pub mod sink;
pub mod state;
pub mod transport;

pub use config::{KeyboardConfig, MatrixConfig};
pub use event::KeyboardEvent;
pub use keyboard::Keyboard;

pub type RawMutex = CriticalSectionRawMutex;

/// Capacity of [`channel::KEY_EVENT_CHANNEL`].
pub const EVENT_CHANNEL_SIZE: usize = 16;
