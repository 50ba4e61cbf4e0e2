//! DOM Markers
//!
//! Marker elements (`.posfra`, `.cinfra`) wrapped for the core scanner.

use embed_core::mount::REF_ATTRIBUTE;
use embed_core::{AttributeSource, EmbedError, IframeSpec, LoadCallback, MarkerElement, ProductVariant};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{AddEventListenerOptions, Document, Element, HtmlIFrameElement};

/// Map a thrown JS value into the core error type
pub(crate) fn js_error(value: JsValue) -> EmbedError {
    EmbedError::Host(
        value
            .as_string()
            .unwrap_or_else(|| format!("{value:?}")),
    )
}

/// A marker element in the live document
pub struct DomMarker {
    element: Element,
}

impl DomMarker {
    /// All markers of `variant` in document order
    pub fn query(document: &Document, variant: ProductVariant) -> Result<Vec<Self>, JsValue> {
        let nodes = document.query_selector_all(&format!(".{}", variant.marker_class()))?;
        Ok((0..nodes.length())
            .filter_map(|i| nodes.item(i))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .map(|element| Self { element })
            .collect())
    }
}

impl AttributeSource for DomMarker {
    fn attribute(&self, name: &str) -> Option<String> {
        self.element.get_attribute(name)
    }

    fn has_attribute(&self, name: &str) -> bool {
        self.element.has_attribute(name)
    }
}

impl MarkerElement for DomMarker {
    fn mount(&self, iframe: &IframeSpec, on_load: LoadCallback) -> embed_core::Result<()> {
        let document = self
            .element
            .owner_document()
            .ok_or_else(|| EmbedError::Host("marker is not attached to a document".into()))?;

        let frame: HtmlIFrameElement = document
            .create_element("iframe")
            .map_err(js_error)?
            .dyn_into()
            .map_err(|_| EmbedError::Host("created element is not an iframe".into()))?;

        for (name, value) in &iframe.attributes {
            frame.set_attribute(name, value).map_err(js_error)?;
        }
        let style = frame.style();
        for (property, value) in &iframe.styles {
            style.set_property(property, value).map_err(js_error)?;
        }

        // Freed by wasm-bindgen after the first call; `once` keeps later loads away from it
        let listener = Closure::once_into_js(move || on_load());
        let options = AddEventListenerOptions::new();
        options.set_once(true);
        frame
            .add_event_listener_with_callback_and_add_event_listener_options(
                "load",
                listener.unchecked_ref(),
                &options,
            )
            .map_err(js_error)?;

        self.element.set_inner_html("");
        self.element.append_child(&frame).map_err(js_error)?;
        Ok(())
    }

    fn set_reference(&self, reference: &str) -> embed_core::Result<()> {
        self.element
            .set_attribute(REF_ATTRIBUTE, reference)
            .map_err(js_error)
    }
}
