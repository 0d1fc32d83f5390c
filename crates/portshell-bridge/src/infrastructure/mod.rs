//! Infrastructure layer for the port bridge.
//!
//! Concrete implementations of the effect traits.
//!
//! **Dependency rule**: this layer may depend on `application` and `domain`,
//! but MUST NOT be imported by them.
//!
//! # Sub-modules
//!
//! - **`memory`** – in-memory clipboard and document.  Used by native hosts
//!   and by tests that need to observe what the bridge did.
//!
//! - **`browser`** – `web-sys` implementations plus the `attach` entry point
//!   for a JavaScript UI module.  Compiled only for `wasm32` with the `web`
//!   feature.

pub mod memory;

#[cfg(all(target_arch = "wasm32", feature = "web"))]
pub mod browser;
