//! portshell-bridge library crate.
//!
//! Binds the outbound ports of a compiled UI module to browser-side effects.
//!
//! # What does the bridge do?
//!
//! The UI module (the single-page application itself) cannot touch the
//! clipboard or open native `<dialog>` elements on its own.  It emits a
//! message on one of three one-way ports instead, and the bridge performs the
//! effect:
//!
//! | Port           | Payload    | Effect                                  |
//! |----------------|------------|-----------------------------------------|
//! | `copy`         | text       | `navigator.clipboard.writeText(text)`   |
//! | `open-dialog`  | element id | `document.getElementById(id).showModal()` |
//! | `close-dialog` | element id | `document.getElementById(id).close()`   |
//!
//! Nothing is returned to the UI module.  A clipboard failure is not
//! observed; a missing dialog is fatal.
//!
//! # Architecture
//!
//! ```text
//! [portshell-bridge]
//!   ├── domain/          PortName, PortMessage
//!   ├── application/     Port, Ports, PortBridge, UiModule, effect traits
//!   └── infrastructure/
//!         ├── memory/    In-memory clipboard and document
//!         └── browser/   web-sys effects + `attach` (wasm32, feature "web")
//! ```

/// Domain layer: port names and messages.
pub mod domain;

/// Application layer: ports, reactions, and the UI module event loop.
pub mod application;

/// Infrastructure layer: effect implementations.
pub mod infrastructure;
