use std::str::FromStr;

use pest::Parser;
use pest::iterators::Pair;
use pest_derive::Parser;
use qmatrix::config::MATRIX_MAX_LAYERS;
use qmatrix_types::keycode::HidKeyCode;
use qmatrix_types::modifier::ModifierCombination;
use qmatrix_types::quantum::{self, KC_NO, KC_TRNS, Keycode};

use crate::KeyboardTomlConfig;
use crate::error::{ConfigError, ConfigResult};

#[derive(Parser)]
#[grammar = "keycode.pest"]
struct KeycodeParser;

/// Parse one keymap cell, such as `A`, `__`, `MO(1)`, `LT(2, Space)`, `LCTL(LSFT(A))` or `0x4104`.
pub fn parse_keycode(expr: &str) -> Result<Keycode, String> {
    let mut pairs = KeycodeParser::parse(Rule::keycode_expr, expr).map_err(|e| e.to_string())?;
    let action = pairs
        .next()
        .and_then(|expr| expr.into_inner().next())
        .ok_or_else(|| format!("empty keycode expression '{}'", expr))?;

    match action.as_rule() {
        Rule::hex_keycode => {
            let digits = &action.as_str()[2..];
            u16::from_str_radix(digits, 16).map_err(|e| format!("invalid hex keycode: {}", e))
        }
        Rule::transparent_action => Ok(KC_TRNS),
        Rule::no_action => Ok(KC_NO),
        Rule::key_name => parse_key_name(action.as_str()).map(quantum::basic),
        Rule::mo_action => {
            let layer = parse_layer(action.into_inner())?;
            Ok(quantum::momentary(layer))
        }
        Rule::to_action => {
            let layer = parse_layer(action.into_inner())?;
            Ok(quantum::goto(layer))
        }
        Rule::lt_action => {
            let mut inner = action.into_inner();
            let layer = parse_layer(&mut inner)?;
            let key = inner
                .next()
                .ok_or_else(|| "LT requires a key".to_string())
                .and_then(|key| parse_key_name(key.as_str()))?;
            Ok(quantum::layer_tap(layer, key))
        }
        Rule::modified_key => {
            let (modifiers, key) = parse_modified_key(action)?;
            Ok(quantum::with_modifiers(key, modifiers))
        }
        rule => Err(format!("unexpected rule {:?}", rule)),
    }
}

fn parse_key_name(name: &str) -> Result<HidKeyCode, String> {
    HidKeyCode::from_str(name).map_err(|_| format!("unknown key '{}'", name))
}

fn parse_layer<'i>(mut inner: impl Iterator<Item = Pair<'i, Rule>>) -> Result<u8, String> {
    let number = inner.next().ok_or_else(|| "missing layer number".to_string())?;
    match number.as_str().parse::<u8>() {
        Ok(layer) if (layer as usize) < MATRIX_MAX_LAYERS => Ok(layer),
        _ => Err(format!(
            "layer {} out of range, at most {} layers are supported",
            number.as_str(),
            MATRIX_MAX_LAYERS
        )),
    }
}

/// Fold nested modifier wrappers into one combination. Left and right hand modifiers share the
/// side bit, so mixing them is rejected.
fn parse_modified_key(pair: Pair<'_, Rule>) -> Result<(ModifierCombination, HidKeyCode), String> {
    let mut inner = pair.into_inner();
    let modifier = inner.next().ok_or_else(|| "missing modifier".to_string())?;
    let combination = match modifier.as_str().to_ascii_lowercase().as_str() {
        "lctl" => ModifierCombination::LCTRL,
        "lsft" => ModifierCombination::LSHIFT,
        "lalt" => ModifierCombination::LALT,
        "lgui" => ModifierCombination::LGUI,
        "rctl" => ModifierCombination::RCTRL,
        "rsft" => ModifierCombination::RSHIFT,
        "ralt" => ModifierCombination::RALT,
        "rgui" => ModifierCombination::RGUI,
        other => return Err(format!("unknown modifier '{}'", other)),
    };

    let wrapped = inner.next().ok_or_else(|| "modifier requires a key".to_string())?;
    let (nested, key) = match wrapped.as_rule() {
        Rule::modified_key => parse_modified_key(wrapped)?,
        _ => (ModifierCombination::new(), parse_key_name(wrapped.as_str())?),
    };
    if !nested.is_empty() && nested.right() != combination.right() {
        return Err("cannot mix left and right hand modifiers".to_string());
    }
    Ok((nested | combination, key))
}

impl KeyboardTomlConfig {
    /// Flatten `layout.keymap` into `(layer * rows + row) * cols + col` order, parsing every cell.
    pub fn build_keymap(&self) -> ConfigResult<Vec<Keycode>> {
        let layout = &self.layout;
        if layout.keymap.len() != layout.layers as usize {
            return Err(ConfigError::Validation {
                field: "layout.keymap".to_string(),
                message: format!("expected {} layers, found {}", layout.layers, layout.keymap.len()),
            });
        }

        let mut keymap = Vec::with_capacity(layout.layers as usize * layout.rows as usize * layout.cols as usize);
        for (layer, rows) in layout.keymap.iter().enumerate() {
            if rows.len() != layout.rows as usize {
                return Err(ConfigError::Validation {
                    field: format!("layout.keymap[{}]", layer),
                    message: format!("expected {} rows, found {}", layout.rows, rows.len()),
                });
            }
            for (row, cols) in rows.iter().enumerate() {
                if cols.len() != layout.cols as usize {
                    return Err(ConfigError::Validation {
                        field: format!("layout.keymap[{}][{}]", layer, row),
                        message: format!("expected {} cols, found {}", layout.cols, cols.len()),
                    });
                }
                for (col, expr) in cols.iter().enumerate() {
                    let keycode = parse_keycode(expr).map_err(|message| ConfigError::InvalidKeycode {
                        layer,
                        row,
                        col,
                        expr: expr.clone(),
                        message,
                    })?;
                    keymap.push(keycode);
                }
            }
        }
        Ok(keymap)
    }
}
