//! Keyboard and mouse actions
//!
//! Event injection itself is platform specific and lives behind [`InputSink`];
//! this module owns key naming, action sequences and the enable gate.

pub mod actions;
pub mod keys;

pub use actions::{ActionGate, ActionRunner, InputAction, InputError, InputSink, MouseButton, RunOutcome};
pub use keys::{Key, KeyParseError};
