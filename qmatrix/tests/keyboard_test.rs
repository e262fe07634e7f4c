pub mod common;

use embassy_futures::block_on;
use embassy_futures::select::{Either, select};
use embassy_futures::yield_now;
use qmatrix::channel::KEY_EVENT_CHANNEL;
use qmatrix::config::{ConfigError, KeymapEntry, build_keymap};
use qmatrix::{KeyboardConfig, KeyboardEvent};
use qmatrix::keyboard::Keyboard;
use qmatrix::qmatrix_types::quantum::Keycode;
use rusty_fork::rusty_fork_test;

use crate::common::{ManualTimer, RecordingSink, SinkEvent, create_test_keyboard};

#[test]
fn test_matrix_events_reported_before_keys() {
    let (mut keyboard, _timer) = create_test_keyboard();
    keyboard.process_event(KeyboardEvent::key(0, 0, true));
    assert_eq!(
        keyboard.sink().events,
        vec![
            SinkEvent::Matrix(KeyboardEvent::key(0, 0, true)),
            SinkEvent::Key(kc8!(A), true)
        ]
    );
}

#[test]
fn test_lookup_is_idempotent() {
    let (keyboard, _timer) = create_test_keyboard();
    let keymap = keyboard.config().keymap();
    for layer in 0..3 {
        for row in 0..2 {
            for col in 0..4 {
                assert_eq!(keymap.lookup(layer, row, col), keymap.lookup(layer, row, col));
            }
        }
    }
}

#[test]
fn test_keyboard_from_packed_entries() {
    static ENTRIES: [KeymapEntry; 3] = [
        KeymapEntry::new(0, 0, 0, 0x04),
        KeymapEntry::new(0, 0, 1, 0x5101),
        KeymapEntry::new(1, 0, 0, 0x05),
    ];
    let keymap: &'static mut [Keycode; 4] = Box::leak(Box::new([0; 4]));
    build_keymap(2, 1, 2, &ENTRIES, keymap).unwrap();
    let config = KeyboardConfig::new(2, 1, 2, keymap, 200).unwrap();
    let mut keyboard = Keyboard::new(config, RecordingSink::default(), ManualTimer::default());

    keyboard.process_event(KeyboardEvent::key(0, 1, true));
    keyboard.process_event(KeyboardEvent::key(0, 0, true));
    keyboard.process_event(KeyboardEvent::key(0, 0, false));
    keyboard.process_event(KeyboardEvent::key(0, 1, false));
    assert_eq!(keyboard.sink().keys(), vec![(kc8!(B), true), (kc8!(B), false)]);
}

#[test]
fn test_invalid_config() {
    let keymap = [0; 3];
    assert_eq!(
        KeyboardConfig::new(1, 2, 2, &keymap, 200).err(),
        Some(ConfigError::KeymapSizeMismatch { expected: 4, actual: 3 })
    );
    assert_eq!(
        KeyboardConfig::new(1, 3, 0, &keymap, 200).err(),
        Some(ConfigError::MissingDimension)
    );
}

rusty_fork_test! {
    #[test]
    fn test_run_from_channel() {
        let (mut keyboard, _timer) = create_test_keyboard();
        for event in [
            KeyboardEvent::key(0, 1, true),
            KeyboardEvent::key(0, 2, true),
            KeyboardEvent::key(0, 1, false),
            KeyboardEvent::key(0, 2, false),
        ] {
            KEY_EVENT_CHANNEL.try_send(event).unwrap();
        }

        block_on(async {
            match select(keyboard.run(KEY_EVENT_CHANNEL.receiver()), async {
                while !KEY_EVENT_CHANNEL.is_empty() {
                    yield_now().await;
                }
            })
            .await
            {
                Either::First(_) => unreachable!(),
                Either::Second(_) => {}
            }
        });

        assert_eq!(keyboard.sink().keys(), vec![(kc8!(B), true), (kc8!(B), false)]);
        assert_eq!(keyboard.sink().layers(), vec![(1, 0b11), (0, 0b1)]);
    }
}
