pub mod common;

use embassy_time::{Duration, MockDriver};
use qmatrix::keyboard::Keyboard;
use qmatrix::sink::EmbassyTimer;
use qmatrix::KeyboardEvent;
use rusty_fork::rusty_fork_test;

use crate::common::{RecordingSink, create_test_keyboard, get_keymap, leak_config};

#[test]
fn test_layer_tap_tap() {
    let (mut keyboard, timer) = create_test_keyboard();

    key_sequence_test!(
        keyboard: keyboard,
        timer: timer,
        sequence: [
            [0, 3, true, 0],
            [0, 3, false, 50],
        ],
        expected_keys: [
            [kc8!(Space), true],
            [kc8!(Space), false],
        ]
    );
    // Layer 2 was on while the key was held
    assert_eq!(keyboard.sink().layers(), vec![(2, 0b101), (0, 0b1)]);
}

#[test]
fn test_layer_tap_hold() {
    let (mut keyboard, timer) = create_test_keyboard();

    key_sequence_test!(
        keyboard: keyboard,
        timer: timer,
        sequence: [
            [0, 3, true, 0],
            [0, 3, false, 300],
        ],
        expected_keys: []
    );
    assert_eq!(keyboard.state().layer_state().bits(), 1);
}

#[test]
fn test_layer_tap_timeout_boundary() {
    let (mut keyboard, timer) = create_test_keyboard();

    key_sequence_test!(
        keyboard: keyboard,
        timer: timer,
        sequence: [
            [0, 3, true, 0],
            [0, 3, false, 199], // Tap
            [0, 3, true, 10],
            [0, 3, false, 200], // Hold
        ],
        expected_keys: [
            [kc8!(Space), true],
            [kc8!(Space), false],
        ]
    );
}

#[test]
fn test_layer_tap_hold_with_other_key() {
    let (mut keyboard, timer) = create_test_keyboard();

    key_sequence_test!(
        keyboard: keyboard,
        timer: timer,
        sequence: [
            [0, 3, true, 0],
            [0, 0, true, 20],   // F1 on layer 2
            [0, 3, false, 250], // Hold, no space
            [0, 0, false, 10],  // F1 released from layer 2
        ],
        expected_keys: [
            [kc8!(F1), true],
            [kc8!(F1), false],
        ]
    );
}

rusty_fork_test! {
    #[test]
    fn test_layer_tap_embassy_timer() {
        let driver = MockDriver::get();
        let mut keyboard = Keyboard::new(leak_config(get_keymap(), 200), RecordingSink::default(), EmbassyTimer);

        keyboard.process_event(KeyboardEvent::key(0, 3, true));
        driver.advance(Duration::from_millis(100));
        keyboard.process_event(KeyboardEvent::key(0, 3, false));
        assert_eq!(keyboard.sink().keys(), vec![(kc8!(Space), true), (kc8!(Space), false)]);

        keyboard.process_event(KeyboardEvent::key(0, 3, true));
        driver.advance(Duration::from_millis(250));
        keyboard.process_event(KeyboardEvent::key(0, 3, false));
        assert_eq!(keyboard.sink().keys().len(), 2);
    }
}
