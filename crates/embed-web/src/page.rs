//! Window services: leave-page prompts and redirects

use std::cell::RefCell;

use embed_core::{PageHost, UnloadPrompt};
use url::Url;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{BeforeUnloadEvent, Window};

use crate::dom::js_error;

type UnloadHandler = Closure<dyn FnMut(BeforeUnloadEvent)>;

/// Page host backed by the browser window
pub struct WindowPage {
    window: Window,
}

impl WindowPage {
    pub const fn new(window: Window) -> Self {
        Self { window }
    }
}

impl PageHost for WindowPage {
    fn unload_prompt(&self) -> Box<dyn UnloadPrompt> {
        Box::new(BeforeUnloadPrompt {
            window: self.window.clone(),
            handler: RefCell::new(None),
        })
    }

    fn navigate(&self, url: &Url) -> embed_core::Result<()> {
        self.window
            .location()
            .set_href(url.as_str())
            .map_err(js_error)
    }
}

/// One `beforeunload` listener; owns its closure so removal drops it
struct BeforeUnloadPrompt {
    window: Window,
    handler: RefCell<Option<UnloadHandler>>,
}

impl UnloadPrompt for BeforeUnloadPrompt {
    fn install(&self, message: &str) -> embed_core::Result<()> {
        self.remove()?;

        let message = message.to_owned();
        let handler = UnloadHandler::new(move |event: BeforeUnloadEvent| {
            event.prevent_default();
            event.set_return_value(&message);
        });
        self.window
            .add_event_listener_with_callback("beforeunload", handler.as_ref().unchecked_ref())
            .map_err(js_error)?;
        *self.handler.borrow_mut() = Some(handler);
        Ok(())
    }

    fn remove(&self) -> embed_core::Result<()> {
        let Some(handler) = self.handler.borrow_mut().take() else {
            return Ok(());
        };
        self.window
            .remove_event_listener_with_callback("beforeunload", handler.as_ref().unchecked_ref())
            .map_err(js_error)
    }
}
