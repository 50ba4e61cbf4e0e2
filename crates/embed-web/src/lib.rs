//! posfra Embed Loader
//!
//! WASM entry point: scans the page for `.posfra` and `.cinfra` markers
//! once the document is ready, mounts a payment iframe in each and polls
//! every widget's status in the background.

mod cookie;
mod dom;
mod logging;
mod page;
mod timer;

use std::rc::Rc;

use embed_core::{
    ElementScanner, EmbedSettings, HttpStatusClient, ProductVariant, StatusClient, StatusPoller,
    Timer, WidgetHost, WidgetRegistry,
};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, HtmlDocument, Window};

pub use cookie::DocumentCookieStore;
pub use dom::DomMarker;
pub use page::WindowPage;
pub use timer::GlooTimer;

/// Global object exposed to page scripts
const GLOBAL_NAME: &str = "PosfraEmbed";

thread_local! {
    static REGISTRY: Rc<WidgetRegistry> = Rc::new(WidgetRegistry::new());
}

/// WASM entry point
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    logging::init();

    if let Err(e) = start() {
        tracing::error!(error = ?e, "Embed loader failed to start");
    }
}

/// Resolve a widget from outside the poll loop (e.g. a message from the hosted surface)
#[wasm_bindgen(js_name = notifyExternalCompletion)]
pub fn notify_external_completion(instance: u32) -> bool {
    REGISTRY.with(|registry| registry.notify_external_completion(instance))
}

/// Ids of the widgets mounted on this page
#[wasm_bindgen(js_name = widgetIds)]
pub fn widget_ids() -> Vec<u32> {
    REGISTRY.with(|registry| registry.ids())
}

fn start() -> Result<(), JsValue> {
    let window = web_sys::window().ok_or("no window")?;
    let document = window.document().ok_or("no document")?;
    expose_global(&window)?;

    if document.ready_state() == "loading" {
        let ready = Closure::once_into_js(|| {
            if let Err(e) = scan_page() {
                tracing::error!(error = ?e, "Marker scan failed");
            }
        });
        document.add_event_listener_with_callback("DOMContentLoaded", ready.unchecked_ref())?;
        Ok(())
    } else {
        scan_page()
    }
}

fn scan_page() -> Result<(), JsValue> {
    let window = web_sys::window().ok_or("no window")?;
    let document = window.document().ok_or("no document")?;
    let settings = EmbedSettings::from_build_env();

    let host = WidgetHost {
        settings: settings.clone(),
        cookies: Rc::new(DocumentCookieStore::new(html_document(&document)?)),
        page: Rc::new(WindowPage::new(window)),
    };
    let registry = REGISTRY.with(Rc::clone);
    let scanner = ElementScanner::new(host, registry);

    let client: Rc<dyn StatusClient> = Rc::new(HttpStatusClient::new(settings.api_base_url.as_str()));
    let timer: Rc<dyn Timer> = Rc::new(GlooTimer);

    for variant in ProductVariant::ALL {
        let markers = DomMarker::query(&document, variant)?;
        if markers.is_empty() {
            continue;
        }

        let report = scanner.scan(variant, &markers);
        for widget in report.mounted {
            let poller =
                StatusPoller::new(widget, client.clone(), timer.clone(), settings.poll_interval);
            wasm_bindgen_futures::spawn_local(async move {
                poller.run().await;
                let pruned = REGISTRY.with(|registry| registry.prune_resolved());
                tracing::debug!(pruned, "Resolved widgets released");
            });
        }
    }
    Ok(())
}

fn html_document(document: &Document) -> Result<HtmlDocument, JsValue> {
    document
        .clone()
        .dyn_into::<HtmlDocument>()
        .map_err(|_| JsValue::from_str("document is not an HTML document"))
}

/// `window.PosfraEmbed.notifyExternalCompletion(id)` for scripts that do not import the module
fn expose_global(window: &Window) -> Result<(), JsValue> {
    let api = js_sys::Object::new();
    let notify = Closure::<dyn Fn(u32) -> bool>::new(notify_external_completion);
    js_sys::Reflect::set(&api, &"notifyExternalCompletion".into(), notify.as_ref())?;
    notify.forget();
    js_sys::Reflect::set(window, &GLOBAL_NAME.into(), &api)?;
    Ok(())
}
