pub mod default_debouncer;

pub use default_debouncer::DefaultDebouncer;

pub trait DebouncerTrait<const ROW: usize, const COL: usize> {
    /// Check the raw level of a key against its registered state.
    fn detect_change_with_debounce(
        &mut self,
        row_idx: usize,
        col_idx: usize,
        key_active: bool,
        pressed: bool,
    ) -> DebounceState;
}

/// Debounce state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DebounceState {
    /// The new level has been stable long enough, the key state changes
    Debounced,
    InProgress,
    /// The raw level matches the registered state
    Ignored,
}
