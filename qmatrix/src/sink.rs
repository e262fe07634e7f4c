//! Capabilities the dispatcher is given at construction: an event sink that receives the emitted
//! key events, and a millisecond timer for tap/hold decisions.

use embassy_time::Instant;

use crate::event::KeyboardEvent;
use crate::layer::LayerState;

/// Receiver of the key events produced by the dispatcher.
///
/// Delivery never fails from the dispatcher's point of view: an implementation that can't deliver
/// an event logs the failure and drops it.
pub trait EventSink {
    /// A key with HID usage `keycode` went down or up.
    fn send_keycode(&mut self, keycode: u8, pressed: bool);

    /// A raw matrix transition, before keymap resolution.
    fn matrix_event(&mut self, _event: KeyboardEvent) {}

    /// The layer state changed.
    fn layer_changed(&mut self, _active_layer: u8, _layer_state: LayerState) {}
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn send_keycode(&mut self, keycode: u8, pressed: bool) {
        (**self).send_keycode(keycode, pressed)
    }

    fn matrix_event(&mut self, event: KeyboardEvent) {
        (**self).matrix_event(event)
    }

    fn layer_changed(&mut self, active_layer: u8, layer_state: LayerState) {
        (**self).layer_changed(active_layer, layer_state)
    }
}

/// Start point of a time measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimerHandle(u64);

impl TimerHandle {
    pub const fn from_ticks(ticks: u64) -> Self {
        Self(ticks)
    }

    pub const fn ticks(self) -> u64 {
        self.0
    }
}

/// Monotonic millisecond clock. Reading it never blocks.
pub trait Timer {
    /// Start a measurement.
    fn timer_init(&mut self) -> TimerHandle;

    /// Milliseconds elapsed since `handle` was created.
    fn timer_elapsed(&self, handle: TimerHandle) -> u64;
}

impl<T: Timer + ?Sized> Timer for &mut T {
    fn timer_init(&mut self) -> TimerHandle {
        (**self).timer_init()
    }

    fn timer_elapsed(&self, handle: TimerHandle) -> u64 {
        (**self).timer_elapsed(handle)
    }
}

/// [`Timer`] backed by the `embassy-time` clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmbassyTimer;

impl Timer for EmbassyTimer {
    fn timer_init(&mut self) -> TimerHandle {
        TimerHandle(Instant::now().as_ticks())
    }

    fn timer_elapsed(&self, handle: TimerHandle) -> u64 {
        Instant::now()
            .saturating_duration_since(Instant::from_ticks(handle.0))
            .as_millis()
    }
}
