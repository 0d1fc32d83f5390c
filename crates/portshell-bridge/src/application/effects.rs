//! Browser-side effects the port bridge drives.
//!
//! The bridge never touches `navigator` or `document` directly.  It talks to
//! these traits, and the infrastructure layer provides the implementations:
//! `web-sys` backed ones in the browser, in-memory ones for native hosts and
//! tests.

use thiserror::Error;

/// A DOM call that the browser rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomError {
    /// The element was in a state that does not allow the call, e.g.
    /// `showModal()` on a dialog that is already open non-modally or is not
    /// connected to the document.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Any other exception thrown by the DOM.
    #[error("DOM exception: {0}")]
    Exception(String),
}

/// The system clipboard.
pub trait Clipboard: Send + Sync {
    /// Starts writing `text` to the clipboard.
    ///
    /// The write is asynchronous and its outcome is not reported back:
    /// permission denials and insecure-context failures stay inside the
    /// implementation.
    fn write_text(&self, text: &str);
}

/// A `<dialog>` element.
pub trait DialogElement {
    /// Shows the dialog as modal (`HTMLDialogElement.showModal()`).
    ///
    /// # Errors
    ///
    /// Returns [`DomError`] when the browser rejects the call.
    fn show_modal(&self) -> Result<(), DomError>;

    /// Closes the dialog (`HTMLDialogElement.close()`).  Closing a closed
    /// dialog does nothing.
    fn close(&self);
}

/// Element lookup in the current document.
pub trait Document: Send + Sync {
    /// Returns the element whose `id` equals `id`, if it exists and is a
    /// dialog.
    fn dialog_by_id(&self, id: &str) -> Option<Box<dyn DialogElement>>;
}
