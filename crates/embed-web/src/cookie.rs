//! `document.cookie` store

use embed_core::cookie::parse_cookie_header;
use embed_core::{CookieSpec, CookieStore};
use web_sys::HtmlDocument;

use crate::dom::js_error;

/// Cookie store over the page's `document.cookie`
pub struct DocumentCookieStore {
    document: HtmlDocument,
}

impl DocumentCookieStore {
    pub const fn new(document: HtmlDocument) -> Self {
        Self { document }
    }
}

impl CookieStore for DocumentCookieStore {
    fn get(&self, name: &str) -> embed_core::Result<Option<String>> {
        let header = self.document.cookie().map_err(js_error)?;
        Ok(parse_cookie_header(&header, name))
    }

    fn set(&self, cookie: &CookieSpec) -> embed_core::Result<()> {
        self.document
            .set_cookie(&cookie.to_cookie_string())
            .map_err(js_error)
    }

    fn delete(&self, name: &str) -> embed_core::Result<()> {
        self.document
            .set_cookie(&CookieSpec::expired(name))
            .map_err(js_error)
    }
}
