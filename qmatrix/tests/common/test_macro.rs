extern crate qmatrix;

/// Run a key sequence `[row, col, pressed, delay]` on a keyboard and check the emitted key events.
#[macro_export]
macro_rules! key_sequence_test {
    (keyboard: $keyboard:expr, timer: $timer:expr, sequence: [$([$row:expr, $col:expr, $pressed:expr, $delay:expr]),* $(,)?], expected_keys: [$([$key:expr, $key_pressed:expr]),* $(,)?]) => {
        {
            let keyboard = &mut $keyboard;
            let sequence = $crate::key_sequence!($([$row, $col, $pressed, $delay]),*);
            $crate::common::run_key_sequence(keyboard, &$timer, &sequence);
            let expected: Vec<(u8, bool)> = vec![$(($key, $key_pressed)),*];
            assert_eq!(keyboard.sink().keys(), expected);
        }
    };
}

// a rust macro to map a key name to its HID usage as u8
#[macro_export]
macro_rules! kc8 {
    ($key: ident) => {
        qmatrix::qmatrix_types::keycode::HidKeyCode::$key as u8
    };
}

// a rust macro to create a key sequence to simulate key presses
#[macro_export]
macro_rules! key_sequence {
    ($([$row:expr, $col:expr, $pressed:expr, $delay:expr]),* $(,)?) => {
        vec![
            $(
                $crate::common::TestKeyPress {
                    row: $row,
                    col: $col,
                    pressed: $pressed,
                    delay: $delay,
                },
            )*
        ]
    };
}
