//! # qmatrix types
//!
//! Fundamental type definitions shared by the qmatrix crates.
//!
//! ## Modules
//!
//! - [`keycode`] - HID keyboard page usages, their names and Linux input codes
//! - [`modifier`] - Modifier combinations and the HID modifier byte
//! - [`quantum`] - 16-bit keymap keycodes: range table, builders and [`quantum::classify`]
//! - [`protocol`] - Transport message tags
//!
//! The keymap authoring side (`qmatrix-config`) and the dispatcher (`qmatrix`) both encode and
//! decode keycodes through this crate, so the range boundaries exist in one place only.

#![no_std]

pub mod keycode;
pub mod modifier;
pub mod protocol;
pub mod quantum;
