//! HTTP Handlers

use std::fmt::Write as _;
use std::str::FromStr;

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::Html,
};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{Map, Value};

use embed_core::status::EMBED_TOKEN_HEADER;
use embed_core::{EncodedPayload, PaymentOption, ProductVariant, TransactionReference};

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Body polled by the loader; both variants' terminal fields are present
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub is_paid: bool,
    pub is_accepted: bool,
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Stand-in for the hosted payment surface: a summary of the decoded payload
pub async fn embed_page(Path(payload): Path<String>) -> Result<Html<String>, AppError> {
    let fields =
        EncodedPayload::decode(&payload).map_err(|e| AppError::InvalidPayload(e.to_string()))?;
    let variant = detect_variant(&fields);

    let amounts = parse_amounts(variant, &fields)?;
    let reference = text_field(&fields, "r").unwrap_or_default();

    tracing::info!(variant = %variant, reference = %reference, "Serving hosted surface");
    Ok(Html(render_summary(variant, &fields, &amounts)))
}

/// Status endpoint polled by the loader
pub async fn reference_status(
    State(state): State<AppState>,
    Path(reference): Path<String>,
    headers: HeaderMap,
) -> Result<Json<StatusResponse>, AppError> {
    let token = headers
        .get(EMBED_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .ok_or(AppError::MissingToken)?;
    check_reference(&reference)?;

    let complete = state.ledger.is_complete(&reference).await;
    let merchant = token.split(':').next().unwrap_or_default();
    tracing::debug!(reference = %reference, merchant, complete, "Status checked");

    Ok(Json(StatusResponse {
        is_paid: complete,
        is_accepted: complete,
    }))
}

/// Mark a reference complete (simulates the payment arriving)
pub async fn complete_reference(
    State(state): State<AppState>,
    Path(reference): Path<String>,
) -> Result<StatusCode, AppError> {
    check_reference(&reference)?;

    if state.ledger.complete(&reference).await {
        tracing::info!(reference = %reference, "Reference completed");
    }
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Helpers
// ============================================================================

fn check_reference(reference: &str) -> Result<(), AppError> {
    if TransactionReference::is_well_formed(reference) {
        Ok(())
    } else {
        Err(AppError::InvalidReference(reference.to_string()))
    }
}

/// Checkout payloads carry the token as `e`, payment requests as `et`
fn detect_variant(fields: &Map<String, Value>) -> ProductVariant {
    if fields.contains_key("e") {
        ProductVariant::Checkout
    } else {
        ProductVariant::PaymentRequest
    }
}

fn text_field<'a>(fields: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    fields.get(key).and_then(Value::as_str)
}

/// Amount fields present in the payload, parsed as decimals
fn parse_amounts(
    variant: ProductVariant,
    fields: &Map<String, Value>,
) -> Result<Vec<(&'static str, Decimal)>, AppError> {
    let keys: Vec<&'static str> = match variant {
        ProductVariant::PaymentRequest => PaymentOption::ALL.iter().map(|o| o.code()).collect(),
        ProductVariant::Checkout => vec!["a"],
    };

    keys.into_iter()
        .filter_map(|key| text_field(fields, key).map(|value| (key, value)))
        .map(|(key, value)| {
            Decimal::from_str(value)
                .map(|amount| (key, amount.normalize()))
                .map_err(|_| AppError::InvalidAmount {
                    field: key.to_string(),
                    value: value.to_string(),
                })
        })
        .collect()
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn render_summary(
    variant: ProductVariant,
    fields: &Map<String, Value>,
    amounts: &[(&'static str, Decimal)],
) -> String {
    let mut rows = String::new();
    for (key, amount) in amounts {
        let label = if *key == "a" {
            text_field(fields, "c").unwrap_or_default().to_string()
        } else {
            key.to_uppercase()
        };
        let _ = writeln!(
            rows,
            "<tr><th>{}</th><td>{amount}</td></tr>",
            escape_html(&label)
        );
    }
    for (key, label) in [("m", "Message"), ("u", "User"), ("cr", "Previous reference")] {
        if let Some(value) = text_field(fields, key) {
            let _ = writeln!(
                rows,
                "<tr><th>{label}</th><td>{}</td></tr>",
                escape_html(value)
            );
        }
    }

    let reference = escape_html(text_field(fields, "r").unwrap_or_default());
    format!(
        "<!doctype html>\n<html><head><meta charset=\"utf-8\"><title>{variant}</title></head>\n\
         <body>\n<h1>{variant}</h1>\n<p>Reference <code>{reference}</code></p>\n\
         <table>\n{rows}</table>\n\
         <p>Complete with <code>POST /api/ref/{reference}/complete</code></p>\n</body></html>\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_detect_variant_by_token_key() {
        let checkout = fields(json!({"e": "tok1", "r": "1234a678", "a": "9.99", "c": "USD"}));
        assert_eq!(detect_variant(&checkout), ProductVariant::Checkout);

        let request = fields(json!({"et": "tok1", "r": "1234a678", "btc": "0.01"}));
        assert_eq!(detect_variant(&request), ProductVariant::PaymentRequest);
    }

    #[test]
    fn test_parse_amounts_payment_request() {
        let fields = fields(json!({"btc": "0.0100", "ln": null, "usdt": "25"}));
        let amounts = parse_amounts(ProductVariant::PaymentRequest, &fields).unwrap();
        assert_eq!(
            amounts,
            vec![("btc", Decimal::new(1, 2)), ("usdt", Decimal::new(25, 0))]
        );
    }

    #[test]
    fn test_parse_amounts_rejects_garbage() {
        let fields = fields(json!({"a": "12,50"}));
        let err = parse_amounts(ProductVariant::Checkout, &fields).unwrap_err();
        assert!(matches!(err, AppError::InvalidAmount { ref field, .. } if field == "a"));
    }

    #[test]
    fn test_summary_escapes_markup() {
        let fields = fields(json!({"r": "1234a678", "m": "<script>x</script>"}));
        let html = render_summary(ProductVariant::PaymentRequest, &fields, &[]);
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }
}
