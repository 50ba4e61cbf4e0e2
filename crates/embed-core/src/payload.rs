//! Payload Encoding
//!
//! The hosted surface receives its configuration as
//! `base64(JSON(payload))` in the last path segment of the iframe address.
//! Key names are a wire contract: they are short, fixed per variant, and
//! always present (absent values are explicit `null`).

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::{PaymentOption, ProductVariant, WidgetConfig};
use crate::error::{ConfigError, EmbedError, Result};
use crate::reference::TransactionReference;

/// Payment request wire format
#[derive(Serialize)]
struct PaymentRequestPayload<'a> {
    et: &'a str,
    r: &'a str,
    cr: Option<&'a str>,
    btc: Option<&'a str>,
    ln: Option<&'a str>,
    eth: Option<&'a str>,
    usdt: Option<&'a str>,
    usdc: Option<&'a str>,
    ac: bool,
    am: bool,
    m: Option<&'a str>,
    u: Option<&'a str>,
}

/// Checkout wire format; the token key is `e`, unlike payment requests
#[derive(Serialize)]
struct CheckoutPayload<'a> {
    e: &'a str,
    r: &'a str,
    cr: Option<&'a str>,
    a: &'a str,
    c: &'a str,
}

/// Encoded configuration, immutable once built
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedPayload {
    json: String,
    encoded: String,
}

impl EncodedPayload {
    /// JSON document before encoding
    pub fn json(&self) -> &str {
        &self.json
    }

    /// Base64 form placed in the URL
    pub fn as_str(&self) -> &str {
        &self.encoded
    }

    /// Iframe address for this payload
    pub fn iframe_url(&self, embed_base_url: &str) -> String {
        format!("{}/{}", embed_base_url.trim_end_matches('/'), self.encoded)
    }

    /// Decode a path segment produced by [`PayloadEncoder::encode`]
    pub fn decode(segment: &str) -> Result<Map<String, Value>> {
        let bytes = BASE64_STANDARD
            .decode(segment.trim_matches('/'))
            .map_err(|e| EmbedError::Parse(format!("payload is not base64: {e}")))?;
        match serde_json::from_slice(&bytes)? {
            Value::Object(map) => Ok(map),
            _ => Err(EmbedError::Parse("payload is not a JSON object".into())),
        }
    }
}

/// `digits* '.'? digits+`
pub fn is_valid_amount(amount: &str) -> bool {
    let (whole, fraction) = match amount.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => ("", amount),
    };
    !fraction.is_empty()
        && whole.bytes().all(|b| b.is_ascii_digit())
        && fraction.bytes().all(|b| b.is_ascii_digit())
}

/// Builds the payload handed to the hosted surface
pub struct PayloadEncoder;

impl PayloadEncoder {
    /// Check amounts and required options without encoding anything
    pub fn validate(config: &WidgetConfig) -> std::result::Result<(), ConfigError> {
        match config.variant {
            ProductVariant::PaymentRequest => {
                if let Some((option, _)) = config
                    .options
                    .iter()
                    .find(|(_, amount)| !is_valid_amount(amount))
                {
                    return Err(ConfigError::InvalidAmount {
                        option: option.code().into(),
                    });
                }
                if config.options.is_empty() {
                    return Err(ConfigError::MissingOption(
                        PaymentOption::ALL.map(PaymentOption::code).join("|"),
                    ));
                }
            }
            ProductVariant::Checkout => {
                let amount = config
                    .amount
                    .as_deref()
                    .ok_or_else(|| ConfigError::MissingOption("amount".into()))?;
                if config.currency.is_none() {
                    return Err(ConfigError::MissingOption("currency".into()));
                }
                if !is_valid_amount(amount) {
                    return Err(ConfigError::InvalidAmount {
                        option: "amount".into(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Validate, serialize and encode
    pub fn encode(
        config: &WidgetConfig,
        reference: &TransactionReference,
        cookie_ref: Option<&str>,
    ) -> Result<EncodedPayload> {
        Self::validate(config)?;

        let json = match config.variant {
            ProductVariant::PaymentRequest => {
                let amount = |option: PaymentOption| config.options.get(&option).map(String::as_str);
                to_json(&PaymentRequestPayload {
                    et: &config.embed_token,
                    r: reference.as_str(),
                    cr: cookie_ref,
                    btc: amount(PaymentOption::Btc),
                    ln: amount(PaymentOption::Lightning),
                    eth: amount(PaymentOption::Eth),
                    usdt: amount(PaymentOption::Usdt),
                    usdc: amount(PaymentOption::Usdc),
                    ac: config.allow_custom,
                    am: config.allow_custom_message,
                    m: config.metadata.as_deref(),
                    u: config.username.as_deref(),
                })?
            }
            ProductVariant::Checkout => to_json(&CheckoutPayload {
                e: &config.embed_token,
                r: reference.as_str(),
                cr: cookie_ref,
                a: config.amount.as_deref().unwrap_or_default(),
                c: config.currency.as_deref().unwrap_or_default(),
            })?,
        };

        let encoded = BASE64_STANDARD.encode(json.as_bytes());
        Ok(EncodedPayload { json, encoded })
    }
}

fn to_json<T: Serialize>(payload: &T) -> Result<String> {
    Ok(serde_json::to_string(payload)?)
}
