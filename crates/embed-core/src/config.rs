//! Widget Configuration
//!
//! Turns the `data-*` attributes of one marker element into a [`WidgetConfig`].

use std::collections::{BTreeMap, HashMap};

use url::Url;

use crate::error::ConfigError;

/// Longest metadata string forwarded to the hosted surface
pub const MAX_METADATA_CHARS: usize = 255;

/// Product variants served by the loader
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProductVariant {
    /// Single amount + currency checkout
    Checkout,
    /// Multi-currency payment request
    PaymentRequest,
}

impl ProductVariant {
    pub const ALL: [Self; 2] = [Self::PaymentRequest, Self::Checkout];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Checkout => "checkout",
            Self::PaymentRequest => "payment_request",
        }
    }

    /// Class name carried by marker elements of this variant
    pub const fn marker_class(self) -> &'static str {
        match self {
            Self::Checkout => "cinfra",
            Self::PaymentRequest => "posfra",
        }
    }

    /// Cookie holding the last known reference
    pub const fn cookie_name(self) -> &'static str {
        match self {
            Self::Checkout => "cinfra_ref",
            Self::PaymentRequest => "posfra_ref",
        }
    }

    /// Boolean field of the status body that signals completion
    pub const fn terminal_field(self) -> &'static str {
        match self {
            Self::Checkout => "isAccepted",
            Self::PaymentRequest => "isPaid",
        }
    }
}

impl std::fmt::Display for ProductVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Currencies a payment request can be settled in
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PaymentOption {
    Btc,
    Lightning,
    Eth,
    Usdt,
    Usdc,
}

impl PaymentOption {
    pub const ALL: [Self; 5] = [Self::Btc, Self::Lightning, Self::Eth, Self::Usdt, Self::Usdc];

    /// Code used both as the `data-{code}` attribute suffix and as the payload key
    pub const fn code(self) -> &'static str {
        match self {
            Self::Btc => "btc",
            Self::Lightning => "ln",
            Self::Eth => "eth",
            Self::Usdt => "usdt",
            Self::Usdc => "usdc",
        }
    }
}

impl std::fmt::Display for PaymentOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Anything that exposes element attributes by full name (`data-embed-token`)
pub trait AttributeSource {
    fn attribute(&self, name: &str) -> Option<String>;

    /// Attribute value with empty strings treated as absent
    fn non_empty_attribute(&self, name: &str) -> Option<String> {
        self.attribute(name).filter(|v| !v.is_empty())
    }

    fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }
}

impl AttributeSource for HashMap<String, String> {
    fn attribute(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

impl AttributeSource for BTreeMap<String, String> {
    fn attribute(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Validated per-instance configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WidgetConfig {
    pub variant: ProductVariant,

    /// Opaque merchant credential
    pub embed_token: String,

    /// Payment request amounts, raw decimal strings keyed by currency
    pub options: BTreeMap<PaymentOption, String>,

    /// Checkout amount
    pub amount: Option<String>,

    /// Checkout currency
    pub currency: Option<String>,

    /// Where to send the top-level page once the transaction completes
    pub redirect_url: Option<Url>,

    /// Suppress the leave-page warning
    pub no_warning: bool,

    pub allow_custom: bool,
    pub allow_custom_message: bool,

    /// Free-form merchant metadata, at most [`MAX_METADATA_CHARS`] characters
    pub metadata: Option<String>,

    pub username: Option<String>,
}

impl WidgetConfig {
    /// Value sent in the `embedtoken` header of status requests
    pub fn auth_token(&self) -> String {
        match &self.username {
            Some(user) => format!("{}:{}", self.embed_token, user),
            None => self.embed_token.clone(),
        }
    }
}

/// Reads marker attributes into a [`WidgetConfig`]
#[derive(Clone, Copy, Debug)]
pub struct ConfigBuilder {
    variant: ProductVariant,
}

impl ConfigBuilder {
    pub const fn new(variant: ProductVariant) -> Self {
        Self { variant }
    }

    /// Build the configuration; only the embed token is checked here,
    /// amounts are validated by the payload encoder
    pub fn build<S: AttributeSource + ?Sized>(
        &self,
        source: &S,
    ) -> Result<WidgetConfig, ConfigError> {
        let embed_token = source
            .non_empty_attribute("data-embed-token")
            .ok_or_else(|| ConfigError::MissingRequiredAttribute("embed-token".into()))?;

        let options = match self.variant {
            ProductVariant::PaymentRequest => PaymentOption::ALL
                .iter()
                .filter_map(|option| {
                    source
                        .non_empty_attribute(&format!("data-{}", option.code()))
                        .map(|amount| (*option, amount))
                })
                .collect(),
            ProductVariant::Checkout => BTreeMap::new(),
        };

        let (amount, currency) = match self.variant {
            ProductVariant::Checkout => (
                source.non_empty_attribute("data-amount"),
                source.non_empty_attribute("data-currency"),
            ),
            ProductVariant::PaymentRequest => (None, None),
        };

        let no_warning = match self.variant {
            ProductVariant::Checkout => source.has_attribute("data-no-warning"),
            ProductVariant::PaymentRequest => is_true(source, "data-no-warning"),
        };

        Ok(WidgetConfig {
            variant: self.variant,
            embed_token,
            options,
            amount,
            currency,
            redirect_url: source
                .non_empty_attribute("data-redirect-url")
                .and_then(|raw| parse_redirect(&raw)),
            no_warning,
            allow_custom: is_true(source, "data-allow-custom"),
            allow_custom_message: is_true(source, "data-allow-message"),
            metadata: source.non_empty_attribute("data-meta").map(clamp_metadata),
            username: source.non_empty_attribute("data-username"),
        })
    }
}

fn is_true<S: AttributeSource + ?Sized>(source: &S, name: &str) -> bool {
    source.attribute(name).is_some_and(|v| v == "true")
}

/// Absolute http(s) URLs only; anything else disables the redirect
fn parse_redirect(raw: &str) -> Option<Url> {
    match Url::parse(raw) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Some(url),
        Ok(url) => {
            tracing::warn!(scheme = %url.scheme(), "Ignoring redirect URL with unsupported scheme");
            None
        }
        Err(e) => {
            tracing::warn!(url = %raw, error = %e, "Ignoring invalid redirect URL");
            None
        }
    }
}

fn clamp_metadata(meta: String) -> String {
    if meta.chars().count() <= MAX_METADATA_CHARS {
        return meta;
    }
    tracing::warn!(
        max = MAX_METADATA_CHARS,
        "Metadata exceeds the maximum length and was truncated"
    );
    meta.chars().take(MAX_METADATA_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_missing_token() {
        let err = ConfigBuilder::new(ProductVariant::PaymentRequest)
            .build(&attrs(&[("data-btc", "0.01")]))
            .unwrap_err();
        assert_eq!(err, ConfigError::MissingRequiredAttribute("embed-token".into()));
    }

    #[test]
    fn test_empty_token_is_missing() {
        let result = ConfigBuilder::new(ProductVariant::PaymentRequest)
            .build(&attrs(&[("data-embed-token", "")]));
        assert!(matches!(result, Err(ConfigError::MissingRequiredAttribute(_))));
    }

    #[test]
    fn test_payment_request_options() {
        let config = ConfigBuilder::new(ProductVariant::PaymentRequest)
            .build(&attrs(&[
                ("data-embed-token", "tok1"),
                ("data-btc", "0.01"),
                ("data-eth", ""),
                ("data-usdc", "25"),
            ]))
            .unwrap();

        assert_eq!(config.options.len(), 2);
        assert_eq!(config.options[&PaymentOption::Btc], "0.01");
        assert_eq!(config.options[&PaymentOption::Usdc], "25");
        assert!(config.amount.is_none());
    }

    #[test]
    fn test_redirect_validation() {
        let builder = ConfigBuilder::new(ProductVariant::PaymentRequest);

        let config = builder
            .build(&attrs(&[
                ("data-embed-token", "tok1"),
                ("data-redirect-url", "https://shop.example.com/thanks"),
            ]))
            .unwrap();
        assert_eq!(
            config.redirect_url.unwrap().as_str(),
            "https://shop.example.com/thanks"
        );

        let config = builder
            .build(&attrs(&[
                ("data-embed-token", "tok1"),
                ("data-redirect-url", "/thanks"),
            ]))
            .unwrap();
        assert!(config.redirect_url.is_none());

        let config = builder
            .build(&attrs(&[
                ("data-embed-token", "tok1"),
                ("data-redirect-url", "javascript:alert(1)"),
            ]))
            .unwrap();
        assert!(config.redirect_url.is_none());
    }

    #[test]
    fn test_metadata_clamped() {
        let long = "é".repeat(300);
        let config = ConfigBuilder::new(ProductVariant::PaymentRequest)
            .build(&attrs(&[("data-embed-token", "tok1"), ("data-meta", long.as_str())]))
            .unwrap();
        assert_eq!(config.metadata.unwrap().chars().count(), MAX_METADATA_CHARS);
    }

    #[test]
    fn test_no_warning_by_variant() {
        let present = attrs(&[("data-embed-token", "tok1"), ("data-no-warning", "")]);
        let explicit = attrs(&[("data-embed-token", "tok1"), ("data-no-warning", "true")]);

        assert!(ConfigBuilder::new(ProductVariant::Checkout).build(&present).unwrap().no_warning);
        assert!(!ConfigBuilder::new(ProductVariant::PaymentRequest).build(&present).unwrap().no_warning);
        assert!(ConfigBuilder::new(ProductVariant::PaymentRequest).build(&explicit).unwrap().no_warning);
    }

    #[test]
    fn test_auth_token_with_username() {
        let config = ConfigBuilder::new(ProductVariant::PaymentRequest)
            .build(&attrs(&[("data-embed-token", "tok1"), ("data-username", "alice")]))
            .unwrap();
        assert_eq!(config.auth_token(), "tok1:alice");
    }

    #[test]
    fn test_checkout_fields() {
        let config = ConfigBuilder::new(ProductVariant::Checkout)
            .build(&attrs(&[
                ("data-embed-token", "tok1"),
                ("data-amount", "12.50"),
                ("data-currency", "EUR"),
                ("data-btc", "0.1"),
            ]))
            .unwrap();
        assert_eq!(config.amount.as_deref(), Some("12.50"));
        assert_eq!(config.currency.as_deref(), Some("EUR"));
        assert!(config.options.is_empty());
    }
}
