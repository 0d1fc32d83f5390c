//! Outbound port messages emitted by the UI module.
//!
//! The UI module talks to its host shell through named one-way channels
//! ("ports").  Each message carries a single string payload and expects no
//! reply.
//!
//! # JSON representation
//!
//! When a message crosses a text boundary (for example a JavaScript UI module
//! posting to the host, or a recorded session replayed in a test) it is a
//! JSON object with a `"port"` discriminant and a `"payload"` field:
//!
//! ```json
//! {"port":"copy","payload":"https://example.test/share/42"}
//! {"port":"open-dialog","payload":"settings-dialog"}
//! {"port":"close-dialog","payload":"settings-dialog"}
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

// ── Port names ────────────────────────────────────────────────────────────────

/// The three outbound ports exposed by the UI module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PortName {
    /// Place text on the system clipboard.
    Copy,
    /// Show a `<dialog>` element as modal.
    OpenDialog,
    /// Close a `<dialog>` element.
    CloseDialog,
}

impl PortName {
    /// Every port, in the order the bridge installs its handlers.
    pub const ALL: [PortName; 3] = [PortName::Copy, PortName::OpenDialog, PortName::CloseDialog];

    /// Canonical (kebab-case) name used in logs and in the JSON form.
    pub fn as_str(self) -> &'static str {
        match self {
            PortName::Copy => "copy",
            PortName::OpenDialog => "open-dialog",
            PortName::CloseDialog => "close-dialog",
        }
    }

    /// Property name of this port on a JavaScript UI module's `app.ports`
    /// object.
    ///
    /// JavaScript identifiers cannot contain `-`, so the compiled UI module
    /// exposes the dialog ports in camelCase.
    pub fn js_name(self) -> &'static str {
        match self {
            PortName::Copy => "copy",
            PortName::OpenDialog => "openDialog",
            PortName::CloseDialog => "closeDialog",
        }
    }
}

impl fmt::Display for PortName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Messages ──────────────────────────────────────────────────────────────────

/// A single message emitted by the UI module on one of its ports.
///
/// A message is created on a user action, consumed exactly once by the
/// reaction registered for its port, and then dropped.  It is never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "port", content = "payload", rename_all = "kebab-case")]
pub enum PortMessage {
    /// Text to place on the clipboard.  May be empty.
    Copy(String),
    /// Identifier of the dialog element to show as modal.
    OpenDialog(String),
    /// Identifier of the dialog element to close.
    CloseDialog(String),
}

impl PortMessage {
    /// The port this message travels on.
    pub fn port(&self) -> PortName {
        match self {
            PortMessage::Copy(_) => PortName::Copy,
            PortMessage::OpenDialog(_) => PortName::OpenDialog,
            PortMessage::CloseDialog(_) => PortName::CloseDialog,
        }
    }

    /// The string payload, whatever the port.
    pub fn payload(&self) -> &str {
        match self {
            PortMessage::Copy(s) | PortMessage::OpenDialog(s) | PortMessage::CloseDialog(s) => s,
        }
    }

    /// Builds the message for `port` carrying `payload`.
    pub fn new(port: PortName, payload: impl Into<String>) -> Self {
        let payload = payload.into();
        match port {
            PortName::Copy => PortMessage::Copy(payload),
            PortName::OpenDialog => PortMessage::OpenDialog(payload),
            PortName::CloseDialog => PortMessage::CloseDialog(payload),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
