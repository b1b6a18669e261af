//! gitpane application library
//!
//! Adapters, the operation coordinator and the terminal UI.

pub mod adapters;
pub mod runtime;
pub mod services;
pub mod tui;
