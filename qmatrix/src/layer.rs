use postcard::experimental::max_size::MaxSize;
use serde::{Deserialize, Serialize};

/// Bitmask of active layers, bit `i` set means layer `i` is active.
///
/// Layer 0 is the base layer, it's always active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, MaxSize)]
#[serde(from = "u16")]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LayerState(u16);

impl From<u16> for LayerState {
    fn from(bits: u16) -> Self {
        Self::from_bits(bits)
    }
}

impl Default for LayerState {
    fn default() -> Self {
        Self::new()
    }
}

impl LayerState {
    pub const MAX_LAYERS: u8 = 16;

    pub const fn new() -> Self {
        Self(1)
    }

    /// Restore a layer state from its raw bitmask, the base layer bit is forced on.
    pub const fn from_bits(bits: u16) -> Self {
        Self(bits | 1)
    }

    pub const fn bits(self) -> u16 {
        self.0
    }

    pub const fn is_active(self, layer: u8) -> bool {
        layer < Self::MAX_LAYERS && self.0 & (1 << layer) != 0
    }

    /// Activate given layer
    pub fn activate(&mut self, layer: u8) {
        if layer >= Self::MAX_LAYERS {
            warn!("Not a valid layer {}, at most {} layers are supported", layer, Self::MAX_LAYERS);
            return;
        }
        self.0 |= 1 << layer;
    }

    /// Deactivate given layer. The base layer can't be deactivated.
    pub fn deactivate(&mut self, layer: u8) {
        if layer >= Self::MAX_LAYERS {
            warn!("Not a valid layer {}, at most {} layers are supported", layer, Self::MAX_LAYERS);
            return;
        }
        if layer == 0 {
            return;
        }
        self.0 &= !(1 << layer);
    }

    /// Make `layer` the only active layer on top of the base layer.
    pub fn set_only(&mut self, layer: u8) {
        if layer >= Self::MAX_LAYERS {
            warn!("Not a valid layer {}, at most {} layers are supported", layer, Self::MAX_LAYERS);
            return;
        }
        self.0 = 1 | (1 << layer);
    }

    /// The highest active layer.
    pub const fn active_layer(self) -> u8 {
        15u32.saturating_sub(self.0.leading_zeros()) as u8
    }
}
