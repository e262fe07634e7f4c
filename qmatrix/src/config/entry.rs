use qmatrix_types::quantum::{KC_NO, Keycode};

use super::{ConfigError, check_dimensions};

/// A packed `KEY(layer, row, col, keycode)` keymap entry, as found in the `linux,keymap`
/// property of a device-tree keypad node.
///
/// | bits 26..=29 | bits 21..=25 | bits 16..=20 | bits 0..=15 |
/// | --- | --- | --- | --- |
/// | layer | row | col | keycode |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeymapEntry(pub u32);

impl KeymapEntry {
    pub const fn new(layer: u8, row: u8, col: u8, keycode: Keycode) -> Self {
        Self(
            ((layer as u32 & 0xF) << 26)
                | ((row as u32 & 0x1F) << 21)
                | ((col as u32 & 0x1F) << 16)
                | keycode as u32,
        )
    }

    pub const fn layer(self) -> u8 {
        ((self.0 >> 26) & 0xF) as u8
    }

    pub const fn row(self) -> u8 {
        ((self.0 >> 21) & 0x1F) as u8
    }

    pub const fn col(self) -> u8 {
        ((self.0 >> 16) & 0x1F) as u8
    }

    pub const fn keycode(self) -> Keycode {
        (self.0 & 0xFFFF) as Keycode
    }
}

/// Fill a flattened keymap from packed entries.
///
/// Cells without an entry are [`KC_NO`]. `keymap` must hold exactly `layers * rows * cols`
/// cells, so it can be handed to [`super::KeyboardConfig::new`] afterwards.
pub fn build_keymap(
    layers: u32,
    rows: u8,
    cols: u8,
    entries: &[KeymapEntry],
    keymap: &mut [Keycode],
) -> Result<(), ConfigError> {
    check_dimensions(layers, rows, cols)?;
    let max = layers as usize * rows as usize * cols as usize;
    if keymap.len() != max {
        return Err(ConfigError::KeymapSizeMismatch {
            expected: max,
            actual: keymap.len(),
        });
    }
    if entries.len() > max {
        return Err(ConfigError::KeymapOverflow {
            size: entries.len(),
            max,
        });
    }

    keymap.fill(KC_NO);
    for entry in entries {
        if entry.layer() as u32 >= layers || entry.row() >= rows || entry.col() >= cols {
            return Err(ConfigError::InvalidKeymapEntry(entry.0));
        }
        let index = (entry.layer() as usize * rows as usize + entry.row() as usize) * cols as usize
            + entry.col() as usize;
        keymap[index] = entry.keycode();
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_entry_packing() {
        let entry = KeymapEntry::new(1, 3, 2, 0x5101);
        assert_eq!(entry.0, (1 << 26) | (3 << 21) | (2 << 16) | 0x5101);
        assert_eq!(entry.layer(), 1);
        assert_eq!(entry.row(), 3);
        assert_eq!(entry.col(), 2);
        assert_eq!(entry.keycode(), 0x5101);
    }

    #[test]
    fn test_build_keymap() {
        let entries = [KeymapEntry::new(0, 0, 1, 0x04), KeymapEntry::new(1, 1, 0, 0x05)];
        let mut keymap = [0xFFFF; 8];
        build_keymap(2, 2, 2, &entries, &mut keymap).unwrap();
        assert_eq!(keymap, [0, 0x04, 0, 0, 0, 0, 0x05, 0]);
    }

    #[test]
    fn test_invalid_entry() {
        let mut keymap = [0; 4];
        let entry = KeymapEntry::new(1, 0, 0, 0x04);
        assert_eq!(
            build_keymap(1, 2, 2, &[entry], &mut keymap),
            Err(ConfigError::InvalidKeymapEntry(entry.0))
        );
        let entry = KeymapEntry::new(0, 0, 2, 0x04);
        assert_eq!(
            build_keymap(1, 2, 2, &[entry], &mut keymap),
            Err(ConfigError::InvalidKeymapEntry(entry.0))
        );
    }

    #[test]
    fn test_overflow() {
        let mut keymap = [0; 1];
        let entries = [KeymapEntry::new(0, 0, 0, 0x04); 2];
        assert_eq!(
            build_keymap(1, 1, 1, &entries, &mut keymap),
            Err(ConfigError::KeymapOverflow { size: 2, max: 1 })
        );
    }
}
