use embassy_time::Instant;

use super::{DebounceState, DebouncerTrait};

/// Tracks the debounce state of a single key.
#[derive(Copy, Clone, Debug, PartialEq)]
enum DebounceCounter {
    /// The key is in a stable state
    Idle,
    /// The raw level differs from the registered state since the given time
    Debouncing(Instant),
}

/// Deferred per-key debouncer: a change is reported once the new level has been stable for the
/// whole debounce time. A debounce time of 0 reports changes right away.
pub struct DefaultDebouncer<const ROW: usize, const COL: usize> {
    counters: [[DebounceCounter; ROW]; COL],
    debounce_ms: u16,
}

impl<const ROW: usize, const COL: usize> DefaultDebouncer<ROW, COL> {
    pub fn new(debounce_ms: u16) -> Self {
        DefaultDebouncer {
            counters: [[DebounceCounter::Idle; ROW]; COL],
            debounce_ms,
        }
    }
}

impl<const ROW: usize, const COL: usize> DebouncerTrait<ROW, COL> for DefaultDebouncer<ROW, COL> {
    fn detect_change_with_debounce(
        &mut self,
        row_idx: usize,
        col_idx: usize,
        key_active: bool,
        pressed: bool,
    ) -> DebounceState {
        let counter = &mut self.counters[col_idx][row_idx];

        // The raw level matches the registered state, any bounce is over
        if pressed == key_active {
            *counter = DebounceCounter::Idle;
            return DebounceState::Ignored;
        }

        if self.debounce_ms == 0 {
            return DebounceState::Debounced;
        }

        let now = Instant::now();
        match *counter {
            DebounceCounter::Idle => {
                *counter = DebounceCounter::Debouncing(now);
                DebounceState::InProgress
            }
            DebounceCounter::Debouncing(start) => {
                if now.saturating_duration_since(start).as_millis() >= self.debounce_ms as u64 {
                    *counter = DebounceCounter::Idle;
                    DebounceState::Debounced
                } else {
                    DebounceState::InProgress
                }
            }
        }
    }
}
