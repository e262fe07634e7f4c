use core::fmt;
use core::sync::atomic::{AtomicBool, Ordering};

use embassy_futures::select::{Either, select};
use embassy_sync::channel::Sender;
use embassy_sync::signal::Signal;
use embassy_time::Timer;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::RawMutex;
use crate::config::{ConfigError, MATRIX_MAX_COLS, MATRIX_MAX_ROWS, MatrixConfig};
use crate::debounce::{DebounceState, DebouncerTrait, DefaultDebouncer};
use crate::event::KeyboardEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MatrixError {
    /// Another scan holds the scan lock
    ScanInProgress,
}

impl fmt::Display for MatrixError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatrixError::ScanInProgress => write!(f, "matrix scan already in progress"),
        }
    }
}

impl core::error::Error for MatrixError {}

/// Exclusive access to the matrix hardware, shared between the polling loop and interrupt
/// triggered scans.
pub struct ScanLock {
    scan_pending: AtomicBool,
}

impl Default for ScanLock {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanLock {
    pub const fn new() -> Self {
        Self {
            scan_pending: AtomicBool::new(false),
        }
    }

    /// Claim the lock, `None` if a scan is already running.
    pub fn try_claim(&self) -> Option<ScanGuard<'_>> {
        self.scan_pending
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .ok()
            .map(|_| ScanGuard { lock: self })
    }

    pub fn is_scanning(&self) -> bool {
        self.scan_pending.load(Ordering::Acquire)
    }
}

/// Held while scanning, releases the [`ScanLock`] when dropped.
pub struct ScanGuard<'a> {
    lock: &'a ScanLock,
}

impl Drop for ScanGuard<'_> {
    fn drop(&mut self) {
        self.lock.scan_pending.store(false, Ordering::Release);
    }
}

/// Key changes found by one scan.
#[derive(Debug, Clone, Copy)]
pub struct MatrixChanges<const COL: usize> {
    /// Changed rows of each column
    changed: [u32; COL],
    /// New row state of each column
    state: [u32; COL],
    /// Next position to check: (col, row)
    pos: (usize, usize),
}

impl<const COL: usize> MatrixChanges<COL> {
    pub fn is_empty(&self) -> bool {
        self.changed.iter().all(|c| *c == 0)
    }
}

impl<const COL: usize> Iterator for MatrixChanges<COL> {
    type Item = KeyboardEvent;

    /// Events are yielded column by column, rows inside.
    fn next(&mut self) -> Option<Self::Item> {
        while self.pos.0 < COL {
            let (col, row) = self.pos;
            if row >= MATRIX_MAX_ROWS || self.changed[col] >> row == 0 {
                self.pos = (col + 1, 0);
                continue;
            }
            self.pos.1 += 1;
            let bit = 1 << row;
            if self.changed[col] & bit != 0 {
                return Some(KeyboardEvent::key(row as u8, col as u8, self.state[col] & bit != 0));
            }
        }
        None
    }
}

/// Matrix is the physical pcb layout of the keyboard matrix: columns are strobed one at a time
/// and rows are read while their column is active.
pub struct Matrix<'a, In: InputPin, Out: OutputPin, D: DelayNs, const ROW: usize, const COL: usize> {
    /// Row pins, read
    row_pins: [In; ROW],
    /// Column pins, strobed
    col_pins: [Out; COL],
    delay: D,
    debouncer: DefaultDebouncer<ROW, COL>,
    /// Debounced state: pressed rows of each column
    state: [u32; COL],
    lock: &'a ScanLock,
    active_low: bool,
    col_scan_delay_us: u32,
    poll_interval_ms: u32,
}

impl<'a, In: InputPin, Out: OutputPin, D: DelayNs, const ROW: usize, const COL: usize> Matrix<'a, In, Out, D, ROW, COL> {
    /// Create a matrix from row and column pins.
    pub fn new(
        row_pins: [In; ROW],
        col_pins: [Out; COL],
        delay: D,
        lock: &'a ScanLock,
        config: &MatrixConfig,
    ) -> Result<Self, ConfigError> {
        if ROW > MATRIX_MAX_ROWS {
            return Err(ConfigError::TooManyRows(ROW.min(u8::MAX as usize) as u8));
        }
        if COL > MATRIX_MAX_COLS {
            return Err(ConfigError::TooManyCols(COL.min(u8::MAX as usize) as u8));
        }
        if ROW == 0 || COL == 0 {
            return Err(ConfigError::MissingDimension);
        }

        let mut matrix = Matrix {
            row_pins,
            col_pins,
            delay,
            debouncer: DefaultDebouncer::new(config.debounce_ms),
            state: [0; COL],
            lock,
            active_low: config.active_low,
            col_scan_delay_us: config.col_scan_delay_us,
            poll_interval_ms: config.poll_interval_ms,
        };
        if config.drive_inactive_cols {
            for col in 0..COL {
                matrix.deactivate_col(col);
            }
        }
        Ok(matrix)
    }

    /// Pressed rows of a column, as of the last scan.
    pub fn column_state(&self, col: usize) -> u32 {
        self.state.get(col).copied().unwrap_or(0)
    }

    fn activate_col(&mut self, col: usize) {
        let pin = &mut self.col_pins[col];
        if self.active_low { pin.set_low().ok() } else { pin.set_high().ok() };
    }

    fn deactivate_col(&mut self, col: usize) {
        let pin = &mut self.col_pins[col];
        if self.active_low { pin.set_high().ok() } else { pin.set_low().ok() };
    }

    fn read_row(&mut self, row: usize) -> bool {
        let pin = &mut self.row_pins[row];
        if self.active_low {
            pin.is_low().unwrap_or(false)
        } else {
            pin.is_high().unwrap_or(false)
        }
    }

    /// Scan the whole matrix once, store the new state and return what changed.
    pub fn scan(&mut self) -> Result<MatrixChanges<COL>, MatrixError> {
        let lock = self.lock;
        let _guard = lock.try_claim().ok_or(MatrixError::ScanInProgress)?;

        let mut changed = [0u32; COL];
        for col in 0..COL {
            self.activate_col(col);
            if self.col_scan_delay_us > 0 {
                self.delay.delay_us(self.col_scan_delay_us);
            }
            for row in 0..ROW {
                let key_active = self.read_row(row);
                let bit = 1 << row;
                let pressed = self.state[col] & bit != 0;
                if let DebounceState::Debounced =
                    self.debouncer.detect_change_with_debounce(row, col, key_active, pressed)
                {
                    changed[col] |= bit;
                }
            }
            self.deactivate_col(col);
        }

        for (state, changed) in self.state.iter_mut().zip(changed.iter()) {
            *state ^= *changed;
        }
        Ok(MatrixChanges {
            changed,
            state: self.state,
            pos: (0, 0),
        })
    }

    /// Scan every poll interval, or as soon as `irq` is signaled, and send the key changes.
    ///
    /// A scan requested while another one holds the lock is skipped.
    pub async fn run<const N: usize>(
        &mut self,
        events: Sender<'_, RawMutex, KeyboardEvent, N>,
        irq: &Signal<RawMutex, ()>,
    ) -> ! {
        info!("Start scanning a {}x{} matrix", ROW, COL);
        loop {
            let triggered = match select(Timer::after_millis(self.poll_interval_ms as u64), irq.wait()).await {
                Either::First(_) => false,
                Either::Second(_) => true,
            };
            match self.scan() {
                Ok(changes) => {
                    for event in changes {
                        debug!("Matrix event: {:?}", event);
                        events.send(event).await;
                    }
                }
                Err(e) if triggered => debug!("Interrupt scan skipped: {:?}", e),
                Err(e) => warn!("Scan skipped: {:?}", e),
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_changes_order() {
        let changes = MatrixChanges {
            changed: [0b101, 0, 0b010],
            state: [0b001, 0, 0b010],
            pos: (0, 0),
        };
        let events: heapless::Vec<_, 8> = changes.collect();
        assert_eq!(
            events.as_slice(),
            &[
                KeyboardEvent::key(0, 0, true),
                KeyboardEvent::key(2, 0, false),
                KeyboardEvent::key(1, 2, true),
            ]
        );
    }

    #[test]
    fn test_changes_high_row() {
        let changes = MatrixChanges {
            changed: [1 << 31],
            state: [1 << 31],
            pos: (0, 0),
        };
        let events: heapless::Vec<_, 2> = changes.collect();
        assert_eq!(events.as_slice(), &[KeyboardEvent::key(31, 0, true)]);
    }

    #[test]
    fn test_scan_lock() {
        let lock = ScanLock::new();
        let guard = lock.try_claim();
        assert!(guard.is_some());
        assert!(lock.is_scanning());
        assert!(lock.try_claim().is_none());
        drop(guard);
        assert!(!lock.is_scanning());
        assert!(lock.try_claim().is_some());
    }
}
