//! The UI module instance and its event loop.
//!
//! The UI module is initialised once at startup and lives until the page (or
//! process) goes away.  It emits port messages asynchronously through an
//! [`Outbox`]; [`UiModule::run`] consumes them one per turn and hands each to
//! its port.
//!
//! ```text
//! UI side                         host side
//! ───────                         ─────────
//! outbox.copy("…")  ──mpsc──▶  run_event_loop  ──▶  Ports::deliver  ──▶  reaction
//! ```
//!
//! Only one message is in flight at a time, so no two reactions ever overlap.

use tokio::sync::mpsc;
use tracing::{error, info, trace};

use crate::application::port_bridge::{BridgeError, Ports};
use crate::domain::{PortMessage, PortName};

/// Sending half held by the UI module.
///
/// Cloneable: every clone feeds the same event loop.  Once all clones are
/// dropped the loop finishes.
#[derive(Debug, Clone)]
pub struct Outbox {
    tx: mpsc::UnboundedSender<PortMessage>,
}

impl Outbox {
    /// Emits `message`.  Never blocks.
    ///
    /// # Errors
    ///
    /// [`BridgeError::ModuleStopped`] if the event loop has ended.
    pub fn emit(&self, message: PortMessage) -> Result<(), BridgeError> {
        let port = message.port();
        self.tx
            .send(message)
            .map_err(|_| BridgeError::ModuleStopped(port))
    }

    /// Emits on the `copy` port.
    pub fn copy(&self, text: impl Into<String>) -> Result<(), BridgeError> {
        self.emit(PortMessage::new(PortName::Copy, text))
    }

    /// Emits on the `open-dialog` port.
    pub fn open_dialog(&self, id: impl Into<String>) -> Result<(), BridgeError> {
        self.emit(PortMessage::new(PortName::OpenDialog, id))
    }

    /// Emits on the `close-dialog` port.
    pub fn close_dialog(&self, id: impl Into<String>) -> Result<(), BridgeError> {
        self.emit(PortMessage::new(PortName::CloseDialog, id))
    }
}

/// The running UI module: its ports plus the receiving end of its outbox.
pub struct UiModule {
    ports: Ports,
    outbox: Outbox,
    inbox: mpsc::UnboundedReceiver<PortMessage>,
}

impl UiModule {
    /// Initialises the module with fresh, unsubscribed ports.
    pub fn init() -> Self {
        let (tx, inbox) = mpsc::unbounded_channel();
        info!("UI module initialised");
        Self {
            ports: Ports::new(),
            outbox: Outbox { tx },
            inbox,
        }
    }

    /// The module's ports, for subscribing host handlers.
    pub fn ports_mut(&mut self) -> &mut Ports {
        &mut self.ports
    }

    /// The module's ports.
    pub fn ports(&self) -> &Ports {
        &self.ports
    }

    /// A new handle for emitting messages.
    pub fn outbox(&self) -> Outbox {
        self.outbox.clone()
    }

    /// Delivers `message` synchronously, bypassing the outbox.
    ///
    /// Used by hosts whose message source already runs on the event loop
    /// (e.g. a JavaScript port callback).
    ///
    /// # Errors
    ///
    /// Propagates the reaction's fatal error.
    pub fn deliver(&self, message: &PortMessage) -> Result<(), BridgeError> {
        self.ports.deliver(message)
    }

    /// Like [`UiModule::deliver`], for a payload from an untyped host.
    ///
    /// `None` stands for a value that was not a string.
    ///
    /// # Errors
    ///
    /// [`BridgeError::InvalidPayload`] for `None`, otherwise as
    /// [`UiModule::deliver`].
    pub fn deliver_payload(&self, port: PortName, payload: Option<String>) -> Result<(), BridgeError> {
        let payload = payload.ok_or(BridgeError::InvalidPayload(port))?;
        self.deliver(&PortMessage::new(port, payload))
    }

    /// Runs the event loop until every [`Outbox`] is dropped.
    ///
    /// # Errors
    ///
    /// Returns the first fatal reaction error; the loop does not continue
    /// past it.
    pub async fn run(self) -> Result<(), BridgeError> {
        let UiModule {
            ports,
            outbox,
            inbox,
        } = self;
        // The module's own sender must not keep the loop alive.
        drop(outbox);
        run_event_loop(&ports, inbox).await
    }
}

/// Consumes `inbox` one message per turn, delivering each to `ports`.
///
/// # Errors
///
/// Returns the first fatal reaction error.
pub async fn run_event_loop(
    ports: &Ports,
    mut inbox: mpsc::UnboundedReceiver<PortMessage>,
) -> Result<(), BridgeError> {
    while let Some(message) = inbox.recv().await {
        trace!(port = %message.port(), "delivering message");
        if let Err(e) = ports.deliver(&message) {
            error!("fatal port reaction failure: {e}");
            return Err(e);
        }
    }
    info!("all outboxes closed; UI module event loop finished");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
