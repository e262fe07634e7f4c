/// Create a layer in keymap
#[macro_export]
macro_rules! layer {
    ([$([$($x: expr), +]), +]) => {
        [$([$($x), +]),+]
    };
}

/// Create a normal key. For example, `k!(A)` is the keycode of `HidKeyCode::A`
#[macro_export]
macro_rules! k {
    ($k: ident) => {
        $crate::qmatrix_types::quantum::basic($crate::qmatrix_types::keycode::HidKeyCode::$k)
    };
}

/// Create a normal key with modifiers, `wm!(A, ModifierCombination::LCTRL)`
#[macro_export]
macro_rules! wm {
    ($x: ident, $m: expr) => {
        $crate::qmatrix_types::quantum::with_modifiers($crate::qmatrix_types::keycode::HidKeyCode::$x, $m)
    };
}

/// Create a special keycode: `a!(No)` or `a!(Transparent)`
#[macro_export]
macro_rules! a {
    (No) => {
        $crate::qmatrix_types::quantum::KC_NO
    };
    (Transparent) => {
        $crate::qmatrix_types::quantum::KC_TRNS
    };
}

/// Create a layer activate key. For example, `mo!(1)` activates layer 1 while held.
#[macro_export]
macro_rules! mo {
    ($x: literal) => {
        $crate::qmatrix_types::quantum::momentary($x)
    };
}

/// Create a layer activate or tap key (tap/hold)
#[macro_export]
macro_rules! lt {
    ($x: literal, $k: ident) => {
        $crate::qmatrix_types::quantum::layer_tap($x, $crate::qmatrix_types::keycode::HidKeyCode::$k)
    };
}

/// Create a layer toggle only key (activate layer `n` and deactivate all other layers but the base layer)
#[macro_export]
macro_rules! to {
    ($x: literal) => {
        $crate::qmatrix_types::quantum::goto($x)
    };
}

#[cfg(test)]
mod test {
    use qmatrix_types::modifier::ModifierCombination;
    use qmatrix_types::quantum::{KC_NO, KC_TRNS, Keycode};

    #[test]
    fn test_layout_macros() {
        let layer: [[Keycode; 3]; 2] = layer!([
            [k!(A), mo!(1), lt!(2, Space)],
            [to!(1), a!(Transparent), wm!(A, ModifierCombination::LSHIFT)]
        ]);
        assert_eq!(layer, [[0x04, 0x5101, 0x422C], [0x5011, KC_TRNS, 0x0204]]);
        assert_eq!(a!(No), KC_NO);
    }
}
