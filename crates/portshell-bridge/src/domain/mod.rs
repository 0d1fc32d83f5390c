//! Domain layer for portshell-bridge.
//!
//! Pure message types: no I/O, no browser APIs, no async runtime.

pub mod ports;

pub use ports::{PortMessage, PortName};
