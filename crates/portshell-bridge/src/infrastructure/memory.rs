//! In-memory clipboard and document.
//!
//! These stand in for the browser when the bridge runs natively.  Every call
//! is recorded so callers (and tests) can inspect exactly what happened:
//!
//! ```ignore
//! let clipboard = Arc::new(MemoryClipboard::new());
//! let document = Arc::new(MemoryDocument::new());
//! let settings = document.add_dialog("settings");
//!
//! let bridge = PortBridge::new(clipboard.clone(), document.clone());
//! bridge.on_open_dialog("settings").unwrap();
//!
//! assert!(settings.is_open());
//! assert_eq!(settings.show_modal_calls(), 1);
//! ```
//!
//! # `deny_writes`
//!
//! [`MemoryClipboard::denying`] builds a clipboard that rejects every write,
//! mimicking a browser without clipboard permission.  The rejection is logged
//! and dropped; the bridge never sees it.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::application::effects::{Clipboard, DialogElement, Document, DomError};

// ── Clipboard ─────────────────────────────────────────────────────────────────

/// A clipboard that keeps every write in memory.
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    writes: Mutex<Vec<String>>,
    deny_writes: bool,
}

impl MemoryClipboard {
    /// Creates an empty clipboard that accepts writes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a clipboard whose writes all fail (permission denied).
    pub fn denying() -> Self {
        Self {
            writes: Mutex::new(Vec::new()),
            deny_writes: true,
        }
    }

    /// Every accepted write, oldest first.
    pub fn writes(&self) -> Vec<String> {
        self.writes.lock().unwrap().clone()
    }

    /// The current clipboard contents (the last accepted write).
    pub fn contents(&self) -> Option<String> {
        self.writes.lock().unwrap().last().cloned()
    }
}

impl Clipboard for MemoryClipboard {
    fn write_text(&self, text: &str) {
        if self.deny_writes {
            debug!("clipboard write rejected: permission denied");
            return;
        }
        self.writes.lock().unwrap().push(text.to_string());
    }
}

// ── Dialogs ───────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct DialogState {
    open: AtomicBool,
    connected: AtomicBool,
    show_modal_calls: AtomicUsize,
    close_calls: AtomicUsize,
}

/// A `<dialog>` element held by a [`MemoryDocument`].
///
/// Cloning yields another handle to the same element.
#[derive(Debug, Clone)]
pub struct MemoryDialog {
    state: Arc<DialogState>,
}

impl MemoryDialog {
    fn new() -> Self {
        let state = DialogState::default();
        state.connected.store(true, Ordering::SeqCst);
        Self {
            state: Arc::new(state),
        }
    }

    /// Whether the dialog is currently open.
    pub fn is_open(&self) -> bool {
        self.state.open.load(Ordering::SeqCst)
    }

    /// Number of `showModal()` invocations, successful or not.
    pub fn show_modal_calls(&self) -> usize {
        self.state.show_modal_calls.load(Ordering::SeqCst)
    }

    /// Number of `close()` invocations.
    pub fn close_calls(&self) -> usize {
        self.state.close_calls.load(Ordering::SeqCst)
    }
}

impl DialogElement for MemoryDialog {
    fn show_modal(&self) -> Result<(), DomError> {
        self.state.show_modal_calls.fetch_add(1, Ordering::SeqCst);
        if !self.state.connected.load(Ordering::SeqCst) {
            return Err(DomError::InvalidState(
                "dialog is not connected to the document".into(),
            ));
        }
        // Showing an already-open modal dialog is a no-op.
        self.state.open.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn close(&self) {
        self.state.close_calls.fetch_add(1, Ordering::SeqCst);
        self.state.open.store(false, Ordering::SeqCst);
    }
}

// ── Document ──────────────────────────────────────────────────────────────────

/// A document holding dialogs and plain elements by `id`.
#[derive(Debug, Default)]
pub struct MemoryDocument {
    dialogs: Mutex<HashMap<String, MemoryDialog>>,
    other_elements: Mutex<HashSet<String>>,
}

impl MemoryDocument {
    /// Creates an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a closed `<dialog id="{id}">` and returns a handle to it.
    ///
    /// Re-adding an existing id returns the existing dialog.
    pub fn add_dialog(&self, id: &str) -> MemoryDialog {
        self.dialogs
            .lock()
            .unwrap()
            .entry(id.to_string())
            .or_insert_with(MemoryDialog::new)
            .clone()
    }

    /// Adds a non-dialog element (e.g. a `<div>`) with this `id`.
    pub fn add_element(&self, id: &str) {
        self.other_elements.lock().unwrap().insert(id.to_string());
    }

    /// Detaches the dialog from the document.  Handles stay valid, but the
    /// id no longer resolves and `showModal()` on a handle fails.
    pub fn remove(&self, id: &str) {
        if let Some(dialog) = self.dialogs.lock().unwrap().remove(id) {
            dialog.state.connected.store(false, Ordering::SeqCst);
        }
        self.other_elements.lock().unwrap().remove(id);
    }

    /// Handle to the dialog `id`, if present.
    pub fn dialog(&self, id: &str) -> Option<MemoryDialog> {
        self.dialogs.lock().unwrap().get(id).cloned()
    }
}

impl Document for MemoryDocument {
    fn dialog_by_id(&self, id: &str) -> Option<Box<dyn DialogElement>> {
        if self.other_elements.lock().unwrap().contains(id) {
            debug!(id, "element exists but is not a dialog");
            return None;
        }
        self.dialog(id)
            .map(|d| Box::new(d) as Box<dyn DialogElement>)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
