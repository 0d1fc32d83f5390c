//! Ports and the bridge reactions subscribed to them.
//!
//! A [`Port`] is a one-way channel owned by the UI module.  The host shell
//! subscribes handlers to it; the UI module sends values through it.  Nothing
//! flows back: handlers return `Ok(())` or a fatal [`BridgeError`], never a
//! value for the UI module.
//!
//! [`PortBridge`] holds the browser effects and [`PortBridge::install`]
//! registers exactly one reaction on each of the three ports:
//!
//! ```text
//! copy(text)        →  Clipboard::write_text(text)        (not awaited)
//! open-dialog(id)   →  Document::dialog_by_id(id).show_modal()
//! close-dialog(id)  →  Document::dialog_by_id(id).close()
//! ```

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, trace};

use crate::application::effects::{Clipboard, DialogElement, Document, DomError};
use crate::domain::{PortMessage, PortName};

/// Fatal failures of a port reaction.
///
/// None of these are recovered.  The event loop stops on the first one and
/// the browser entry point rethrows it as an uncaught exception.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// No element with this identifier exists, or it is not a `<dialog>`.
    #[error("no dialog element with id '{id}'")]
    MissingDialog { id: String },

    /// The dialog exists but the browser rejected the call.
    #[error("dialog '{id}' rejected {port}: {source}")]
    Dom {
        id: String,
        port: PortName,
        #[source]
        source: DomError,
    },

    /// A port received something other than a string.
    #[error("port '{0}' expects a string payload")]
    InvalidPayload(PortName),

    /// The UI module's event loop is no longer running.
    #[error("UI module has stopped; message on port '{0}' was not delivered")]
    ModuleStopped(PortName),
}

// ── Port ──────────────────────────────────────────────────────────────────────

type Handler<T> = Box<dyn Fn(&T) -> Result<(), BridgeError>>;

/// Handle returned by [`Port::subscribe`]; pass it to [`Port::unsubscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription {
    port: PortName,
    id: u64,
}

impl Subscription {
    /// The port this subscription belongs to.
    pub fn port(&self) -> PortName {
        self.port
    }
}

/// A named one-way channel from the UI module to its host.
pub struct Port<T> {
    name: PortName,
    next_id: u64,
    handlers: Vec<(Subscription, Handler<T>)>,
}

impl<T> Port<T> {
    /// Creates a port with no subscribers.
    pub fn new(name: PortName) -> Self {
        Self {
            name,
            next_id: 0,
            handlers: Vec::new(),
        }
    }

    /// The port's name.
    pub fn name(&self) -> PortName {
        self.name
    }

    /// Registers `handler`.  Handlers run in registration order.
    pub fn subscribe<F>(&mut self, handler: F) -> Subscription
    where
        F: Fn(&T) -> Result<(), BridgeError> + 'static,
    {
        let subscription = Subscription {
            port: self.name,
            id: self.next_id,
        };
        self.next_id += 1;
        self.handlers.push((subscription, Box::new(handler)));
        debug!(port = %self.name, "handler subscribed");
        subscription
    }

    /// Removes a handler.  Returns `false` if it was not subscribed here.
    pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(s, _)| *s != subscription);
        before != self.handlers.len()
    }

    /// Number of subscribed handlers.
    pub fn subscriber_count(&self) -> usize {
        self.handlers.len()
    }

    /// Delivers `value` to every handler, once each.
    ///
    /// A port without subscribers drops the value.
    ///
    /// # Errors
    ///
    /// Returns the first handler error; later handlers do not run.
    pub fn send(&self, value: &T) -> Result<(), BridgeError> {
        if self.handlers.is_empty() {
            trace!(port = %self.name, "no subscribers; message dropped");
            return Ok(());
        }
        for (_, handler) in &self.handlers {
            handler(value)?;
        }
        Ok(())
    }
}

// ── Ports ─────────────────────────────────────────────────────────────────────

/// The outbound ports of the UI module.
pub struct Ports {
    pub copy: Port<String>,
    pub open_dialog: Port<String>,
    pub close_dialog: Port<String>,
}

impl Default for Ports {
    fn default() -> Self {
        Self::new()
    }
}

impl Ports {
    /// Creates the three ports with no subscribers.
    pub fn new() -> Self {
        Self {
            copy: Port::new(PortName::Copy),
            open_dialog: Port::new(PortName::OpenDialog),
            close_dialog: Port::new(PortName::CloseDialog),
        }
    }

    /// Looks up a port by name.
    pub fn port(&self, name: PortName) -> &Port<String> {
        match name {
            PortName::Copy => &self.copy,
            PortName::OpenDialog => &self.open_dialog,
            PortName::CloseDialog => &self.close_dialog,
        }
    }

    /// Looks up a port by name for subscribing.
    pub fn port_mut(&mut self, name: PortName) -> &mut Port<String> {
        match name {
            PortName::Copy => &mut self.copy,
            PortName::OpenDialog => &mut self.open_dialog,
            PortName::CloseDialog => &mut self.close_dialog,
        }
    }

    /// Routes `message` to the port of its kind, and only that port.
    ///
    /// # Errors
    ///
    /// Propagates the fatal error of the reaction, if any.
    pub fn deliver(&self, message: &PortMessage) -> Result<(), BridgeError> {
        let port = self.port(message.port());
        match message {
            PortMessage::Copy(text) => port.send(text),
            PortMessage::OpenDialog(id) | PortMessage::CloseDialog(id) => port.send(id),
        }
    }
}

// ── Bridge ────────────────────────────────────────────────────────────────────

/// Stateless reactions binding the ports to browser effects.
pub struct PortBridge {
    clipboard: Arc<dyn Clipboard>,
    document: Arc<dyn Document>,
}

impl PortBridge {
    /// Creates a bridge over the given effects.
    pub fn new(clipboard: Arc<dyn Clipboard>, document: Arc<dyn Document>) -> Self {
        Self {
            clipboard,
            document,
        }
    }

    /// Registers one reaction per port.
    ///
    /// Call this once, at startup, right after the UI module is initialised.
    pub fn install(self: Arc<Self>, ports: &mut Ports) -> [Subscription; 3] {
        let bridge = Arc::clone(&self);
        let copy = ports.copy.subscribe(move |text| bridge.on_copy(text));

        let bridge = Arc::clone(&self);
        let open = ports.open_dialog.subscribe(move |id| bridge.on_open_dialog(id));

        let bridge = self;
        let close = ports.close_dialog.subscribe(move |id| bridge.on_close_dialog(id));

        [copy, open, close]
    }

    /// `copy` reaction: starts a clipboard write of `text`.
    ///
    /// Never fails; the clipboard's own failures are not observed here.
    pub fn on_copy(&self, text: &str) -> Result<(), BridgeError> {
        debug!(len = text.len(), "copy → clipboard");
        self.clipboard.write_text(text);
        Ok(())
    }

    /// `open-dialog` reaction: shows the dialog `id` as modal.
    ///
    /// # Errors
    ///
    /// [`BridgeError::MissingDialog`] if no such dialog exists,
    /// [`BridgeError::Dom`] if the browser rejects `showModal()`.
    pub fn on_open_dialog(&self, id: &str) -> Result<(), BridgeError> {
        debug!(id, "open-dialog");
        self.find_dialog(id)?
            .show_modal()
            .map_err(|source| BridgeError::Dom {
                id: id.to_string(),
                port: PortName::OpenDialog,
                source,
            })
    }

    /// `close-dialog` reaction: closes the dialog `id`.
    ///
    /// # Errors
    ///
    /// [`BridgeError::MissingDialog`] if no such dialog exists.
    pub fn on_close_dialog(&self, id: &str) -> Result<(), BridgeError> {
        debug!(id, "close-dialog");
        self.find_dialog(id)?.close();
        Ok(())
    }

    fn find_dialog(&self, id: &str) -> Result<Box<dyn DialogElement>, BridgeError> {
        self.document
            .dialog_by_id(id)
            .ok_or_else(|| BridgeError::MissingDialog { id: id.to_string() })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
