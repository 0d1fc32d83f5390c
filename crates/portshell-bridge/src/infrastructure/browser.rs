//! Browser effects over `web-sys` and the wasm entry point.
//!
//! The page bootstraps the compiled UI module first, then hands it to
//! [`attach`]:
//!
//! ```js
//! import init, { attach } from './pkg/portshell_bridge.js';
//! import { Elm } from './Main.elm';
//!
//! await init();
//! attach(Elm.Main.init());
//! ```
//!
//! `attach` subscribes one callback to each of `app.ports.copy`,
//! `app.ports.openDialog`, and `app.ports.closeDialog`.  A fatal bridge error
//! inside a callback, including a payload that is not a string, is thrown
//! back into JavaScript and surfaces as an uncaught exception.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use js_sys::{Function, Reflect};
use tracing::{debug, info, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{DomException, HtmlDialogElement};

use crate::application::effects::{Clipboard, DialogElement, Document, DomError};
use crate::application::port_bridge::PortBridge;
use crate::application::ui_module::UiModule;
use crate::domain::PortName;

// ── Effects ───────────────────────────────────────────────────────────────────

/// `navigator.clipboard`.
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserClipboard;

impl Clipboard for BrowserClipboard {
    fn write_text(&self, text: &str) {
        let Some(window) = web_sys::window() else {
            debug!("no window; clipboard write skipped");
            return;
        };
        let promise = window.navigator().clipboard().write_text(text);
        // Fire and forget: the rejection (permission, insecure context) is
        // only logged.
        wasm_bindgen_futures::spawn_local(async move {
            if let Err(e) = JsFuture::from(promise).await {
                debug!("clipboard write failed: {e:?}");
            }
        });
    }
}

/// `window.document`.
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserDocument;

impl Document for BrowserDocument {
    fn dialog_by_id(&self, id: &str) -> Option<Box<dyn DialogElement>> {
        let element = web_sys::window()?.document()?.get_element_by_id(id)?;
        match element.dyn_into::<HtmlDialogElement>() {
            Ok(dialog) => Some(Box::new(BrowserDialog(dialog))),
            Err(_) => {
                debug!(id, "element exists but is not a <dialog>");
                None
            }
        }
    }
}

struct BrowserDialog(HtmlDialogElement);

impl DialogElement for BrowserDialog {
    fn show_modal(&self) -> Result<(), DomError> {
        self.0.show_modal().map_err(dom_error)
    }

    fn close(&self) {
        self.0.close();
    }
}

fn dom_error(value: JsValue) -> DomError {
    match value.dyn_ref::<DomException>() {
        Some(e) if e.name() == "InvalidStateError" => DomError::InvalidState(e.message()),
        Some(e) => DomError::Exception(format!("{}: {}", e.name(), e.message())),
        None => DomError::Exception(format!("{value:?}")),
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

thread_local! {
    // The single UI module of this page.  Never torn down.
    static MODULE: RefCell<Option<Rc<UiModule>>> = const { RefCell::new(None) };
}

/// Binds a JavaScript UI module's ports to the browser effects.
///
/// # Errors
///
/// Throws if called twice, or if `app.ports` or a port's `subscribe` is not
/// what a compiled UI module exposes.
#[wasm_bindgen]
pub fn attach(app: JsValue) -> Result<(), JsValue> {
    if MODULE.with(|m| m.borrow().is_some()) {
        return Err(JsValue::from_str("portshell: UI module already attached"));
    }

    let mut module = UiModule::init();
    let bridge = Arc::new(PortBridge::new(
        Arc::new(BrowserClipboard),
        Arc::new(BrowserDocument),
    ));
    bridge.install(module.ports_mut());
    let module = Rc::new(module);

    let ports = Reflect::get(&app, &JsValue::from_str("ports"))?;
    for name in PortName::ALL {
        let port = Reflect::get(&ports, &JsValue::from_str(name.js_name()))?;
        if port.is_undefined() {
            // The UI compiler drops ports the program never uses.
            warn!(port = name.js_name(), "port not exposed by UI module; skipped");
            continue;
        }
        let subscribe: Function = Reflect::get(&port, &JsValue::from_str("subscribe"))?.dyn_into()?;

        let module = Rc::clone(&module);
        let callback = Closure::<dyn Fn(JsValue)>::new(move |value: JsValue| {
            if let Err(e) = module.deliver_payload(name, value.as_string()) {
                wasm_bindgen::throw_str(&e.to_string());
            }
        });
        subscribe.call1(&port, callback.as_ref().unchecked_ref())?;
        // The subscription lives as long as the page.
        callback.forget();
    }

    MODULE.with(|m| *m.borrow_mut() = Some(module));
    info!("port bridge attached");
    Ok(())
}
