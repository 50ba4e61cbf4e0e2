//! Iframe Mounting
//!
//! Describes the sandboxed iframe; the host element swaps it in.

use crate::config::AttributeSource;
use crate::error::Result;
use crate::payload::EncodedPayload;

/// Scripts and same-origin only: no forms, no popups, no top navigation
pub const SANDBOX_FLAGS: &str = "allow-scripts allow-same-origin";

/// Attribute written back to the marker once mounted
pub const REF_ATTRIBUTE: &str = "data-ref";

/// Everything the host needs to create the iframe element
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IframeSpec {
    pub src: String,
    pub attributes: Vec<(&'static str, String)>,
    pub styles: Vec<(&'static str, &'static str)>,
}

impl IframeSpec {
    pub fn new(embed_base_url: &str, payload: &EncodedPayload) -> Self {
        let src = payload.iframe_url(embed_base_url);
        Self {
            attributes: vec![
                ("width", "100%".into()),
                ("height", "600".into()),
                ("frameborder", "0".into()),
                ("loading", "lazy".into()),
                ("sandbox", SANDBOX_FLAGS.into()),
                ("src", src.clone()),
            ],
            styles: vec![
                ("width", "300px"),
                ("height", "500px"),
                ("border", "0"),
                ("display", "block"),
            ],
            src,
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Invoked once when the iframe finishes its first document load
pub type LoadCallback = Box<dyn FnOnce()>;

/// A marker element found on the page
pub trait MarkerElement: AttributeSource {
    /// Replace all children with the iframe in one step and wire `on_load`
    fn mount(&self, iframe: &IframeSpec, on_load: LoadCallback) -> Result<()>;

    /// Record the reference on the marker (`data-ref`)
    fn set_reference(&self, reference: &str) -> Result<()>;

    /// Already handled by an earlier scan
    fn is_mounted(&self) -> bool {
        self.non_empty_attribute(REF_ATTRIBUTE).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigBuilder, ProductVariant};
    use crate::payload::PayloadEncoder;
    use crate::reference::TransactionReference;
    use std::collections::HashMap;

    #[test]
    fn test_iframe_spec() {
        let attrs: HashMap<String, String> = [("data-embed-token", "tok1"), ("data-btc", "0.01")]
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        let config = ConfigBuilder::new(ProductVariant::PaymentRequest).build(&attrs).unwrap();
        let payload =
            PayloadEncoder::encode(&config, &TransactionReference::generate(), None).unwrap();

        let spec = IframeSpec::new("https://pay.example.com/embed", &payload);
        assert_eq!(spec.attribute("sandbox"), Some("allow-scripts allow-same-origin"));
        assert_eq!(spec.attribute("src"), Some(spec.src.as_str()));
        assert!(spec.src.ends_with(payload.as_str()));
        assert!(!spec.src.contains('?'));
    }
}
