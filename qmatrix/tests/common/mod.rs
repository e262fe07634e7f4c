pub mod test_macro;

use std::cell::Cell;
use std::rc::Rc;

use qmatrix::config::KeyboardConfig;
use qmatrix::event::KeyboardEvent;
use qmatrix::keyboard::Keyboard;
use qmatrix::layer::LayerState;
use qmatrix::qmatrix_types::modifier::ModifierCombination;
use qmatrix::qmatrix_types::quantum::Keycode;
use qmatrix::sink::{EventSink, Timer, TimerHandle};
use qmatrix::{a, k, layer, lt, mo, to, wm};

// Init logger for tests
#[ctor::ctor]
pub fn init_log() {
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init();
}

/// Everything a keyboard tells its sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkEvent {
    Key(u8, bool),
    Matrix(KeyboardEvent),
    Layer(u8, u16),
}

#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<SinkEvent>,
}

impl RecordingSink {
    /// Only the key events, in emission order.
    pub fn keys(&self) -> Vec<(u8, bool)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                SinkEvent::Key(k, p) => Some((*k, *p)),
                _ => None,
            })
            .collect()
    }

    pub fn layers(&self) -> Vec<(u8, u16)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                SinkEvent::Layer(l, s) => Some((*l, *s)),
                _ => None,
            })
            .collect()
    }
}

impl EventSink for RecordingSink {
    fn send_keycode(&mut self, keycode: u8, pressed: bool) {
        self.events.push(SinkEvent::Key(keycode, pressed));
    }

    fn matrix_event(&mut self, event: KeyboardEvent) {
        self.events.push(SinkEvent::Matrix(event));
    }

    fn layer_changed(&mut self, active_layer: u8, layer_state: LayerState) {
        self.events.push(SinkEvent::Layer(active_layer, layer_state.bits()));
    }
}

/// Millisecond clock moved by hand. Clones share the same time.
#[derive(Debug, Default, Clone)]
pub struct ManualTimer {
    now: Rc<Cell<u64>>,
}

impl ManualTimer {
    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }
}

impl Timer for ManualTimer {
    fn timer_init(&mut self) -> TimerHandle {
        TimerHandle::from_ticks(self.now.get())
    }

    fn timer_elapsed(&self, handle: TimerHandle) -> u64 {
        self.now.get() - handle.ticks()
    }
}

#[derive(Debug, Clone)]
pub struct TestKeyPress {
    pub row: u8,
    pub col: u8,
    pub pressed: bool,
    pub delay: u64, // Delay before this key event in milliseconds
}

/// Feed a key sequence to the keyboard, advancing `timer` before each event.
pub fn run_key_sequence<S: EventSink>(
    keyboard: &mut Keyboard<'_, S, ManualTimer>,
    timer: &ManualTimer,
    key_sequence: &[TestKeyPress],
) {
    for key in key_sequence {
        timer.advance(key.delay);
        keyboard.process_event(KeyboardEvent::key(key.row, key.col, key.pressed));
    }
}

/// Leak a keymap so that the config can live for the rest of the test.
pub fn leak_config<const R: usize, const C: usize, const L: usize>(
    keymap: [[[Keycode; C]; R]; L],
    mod_tap_timeout_ms: u16,
) -> KeyboardConfig<'static> {
    let keymap: &'static [[[Keycode; C]; R]; L] = Box::leak(Box::new(keymap));
    KeyboardConfig::from_layers(keymap, mod_tap_timeout_ms).unwrap()
}

#[rustfmt::skip]
pub const fn get_keymap() -> [[[Keycode; 4]; 2]; 3] {
    [
        layer!([
            [k!(A), k!(B), mo!(1), lt!(2, Space)],
            [wm!(A, ModifierCombination::LCTRL.with_shift(true)), wm!(Tab, ModifierCombination::RALT), to!(2), k!(LShift)]
        ]),
        layer!([
            [k!(Kc1), a!(Transparent), a!(Transparent), a!(Transparent)],
            [a!(Transparent), k!(Kc2), a!(No), a!(Transparent)]
        ]),
        layer!([
            [k!(F1), a!(Transparent), k!(F3), a!(Transparent)],
            [to!(0), a!(Transparent), a!(Transparent), k!(Escape)]
        ]),
    ]
}

pub fn create_test_keyboard() -> (Keyboard<'static, RecordingSink, ManualTimer>, ManualTimer) {
    let timer = ManualTimer::default();
    let keyboard = Keyboard::new(leak_config(get_keymap(), 200), RecordingSink::default(), timer.clone());
    (keyboard, timer)
}
