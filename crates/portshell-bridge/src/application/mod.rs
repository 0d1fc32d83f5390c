//! Application layer for portshell-bridge.
//!
//! Knows *what* each port message does; delegates *how* to the effect traits
//! implemented in the infrastructure layer.

pub mod effects;
pub mod port_bridge;
pub mod ui_module;

pub use effects::{Clipboard, DialogElement, Document, DomError};
pub use port_bridge::{BridgeError, Port, PortBridge, Ports, Subscription};
pub use ui_module::{run_event_loop, Outbox, UiModule};
