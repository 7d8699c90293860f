//! # Provider Payloads
//!
//! Tolerant readers over the raw JSON each platform sent.
//!
//! ## Where Fields Live
//! ```text
//! ┌──────────┬──────────────────────────────┬────────────────────────────────────┬─────────────────────┐
//! │ provider │ order total                  │ payment                            │ status              │
//! ├──────────┼──────────────────────────────┼────────────────────────────────────┼─────────────────────┤
//! │ iFood    │ total.orderAmount            │ payments.methods[0].{method,type}  │ fullCode | code     │
//! │ Takeat   │ total_service_price          │ payments[0].payment_method         │ status              │
//! │          │ | total_price                │   .{keyword,name}                  │                     │
//! │ 99Food   │ order_info.price.order_price │ order_info.{pay_method,pay_type}   │ order_info.status   │
//! └──────────┴──────────────────────────────┴────────────────────────────────────┴─────────────────────┘
//! ```
//!
//! Every reader returns `None`/defaults for missing or odd-shaped fields;
//! historical orders routinely lack some of them.

use serde_json::Value;

use crate::money::Money;
use crate::types::{OrderStatus, PaymentInfo, Provider};

// =============================================================================
// Status Tables
// =============================================================================

const IFOOD_STATUS: &[(&str, OrderStatus)] = &[
    ("plc", OrderStatus::Placed),
    ("placed", OrderStatus::Placed),
    ("cfm", OrderStatus::Confirmed),
    ("confirmed", OrderStatus::Confirmed),
    ("rtp", OrderStatus::Dispatched),
    ("ready_to_pickup", OrderStatus::Dispatched),
    ("dsp", OrderStatus::Dispatched),
    ("dispatched", OrderStatus::Dispatched),
    ("con", OrderStatus::Concluded),
    ("concluded", OrderStatus::Concluded),
    ("can", OrderStatus::Cancelled),
    ("cancelled", OrderStatus::Cancelled),
];

const TAKEAT_STATUS: &[(&str, OrderStatus)] = &[
    ("pending", OrderStatus::Placed),
    ("accepted", OrderStatus::Confirmed),
    ("production", OrderStatus::Confirmed),
    ("ready", OrderStatus::Dispatched),
    ("delivering", OrderStatus::Dispatched),
    ("finished", OrderStatus::Concluded),
    ("closed", OrderStatus::Concluded),
    ("canceled", OrderStatus::Cancelled),
    ("cancelled", OrderStatus::Cancelled),
];

const FOOD99_STATUS: &[(&str, OrderStatus)] = &[
    ("new", OrderStatus::Placed),
    ("created", OrderStatus::Placed),
    ("accepted", OrderStatus::Confirmed),
    ("delivering", OrderStatus::Dispatched),
    ("arrived", OrderStatus::Dispatched),
    ("completed", OrderStatus::Concluded),
    ("finished", OrderStatus::Concluded),
    ("cancelled", OrderStatus::Cancelled),
    ("canceled", OrderStatus::Cancelled),
];

fn status_table(provider: Provider) -> &'static [&'static [(&'static str, OrderStatus)]] {
    match provider {
        Provider::Ifood => &[IFOOD_STATUS],
        Provider::Takeat => &[TAKEAT_STATUS],
        Provider::NinetyNineFood => &[FOOD99_STATUS],
        Provider::Other => &[IFOOD_STATUS, TAKEAT_STATUS, FOOD99_STATUS],
    }
}

// =============================================================================
// Field Readers
// =============================================================================

/// Reads a money amount at a JSON pointer; accepts numbers and numeric strings.
pub fn money_at(payload: &Value, pointer: &str) -> Option<Money> {
    match payload.pointer(pointer)? {
        Value::Number(n) => Money::parse_decimal(&n.to_string()),
        Value::String(s) => Money::parse_decimal(s),
        _ => None,
    }
}

/// Reads a non-empty text field at a JSON pointer; numbers are stringified.
pub fn text_at(payload: &Value, pointer: &str) -> Option<String> {
    let text = match payload.pointer(pointer)? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn first_text(payload: &Value, pointers: &[&str]) -> Option<String> {
    pointers.iter().find_map(|p| text_at(payload, p))
}

// =============================================================================
// Extraction
// =============================================================================

/// Order total as reported by the provider.
pub fn extract_total(provider: Provider, payload: &Value) -> Option<Money> {
    match provider {
        Provider::Ifood => money_at(payload, "/total/orderAmount"),
        Provider::Takeat => money_at(payload, "/total_service_price")
            .or_else(|| money_at(payload, "/total_price")),
        Provider::NinetyNineFood => {
            let in_cents = text_at(payload, "/order_info/price/unit")
                .is_some_and(|unit| unit.eq_ignore_ascii_case("cent"));
            if in_cents {
                payload
                    .pointer("/order_info/price/order_price")
                    .and_then(Value::as_i64)
                    .map(Money::from_cents)
            } else {
                money_at(payload, "/order_info/price/order_price")
            }
        }
        Provider::Other => money_at(payload, "/total").or_else(|| money_at(payload, "/total_price")),
    }
}

/// Payment fields as reported by the provider.
pub fn extract_payment(provider: Provider, payload: &Value) -> PaymentInfo {
    match provider {
        Provider::Ifood => PaymentInfo {
            method: text_at(payload, "/payments/methods/0/method"),
            method_name: first_text(
                payload,
                &["/payments/methods/0/card/brand", "/payments/methods/0/wallet/name"],
            ),
            payment_type: text_at(payload, "/payments/methods/0/type"),
        },
        Provider::Takeat => PaymentInfo {
            method: text_at(payload, "/payments/0/payment_method/keyword"),
            method_name: first_text(
                payload,
                &["/payments/0/payment_method/name", "/payment_method"],
            ),
            payment_type: text_at(payload, "/payments/0/payment_method/type"),
        },
        Provider::NinetyNineFood => PaymentInfo {
            method: None,
            method_name: text_at(payload, "/order_info/pay_method"),
            payment_type: text_at(payload, "/order_info/pay_type"),
        },
        Provider::Other => PaymentInfo {
            method: text_at(payload, "/payment_method_code"),
            method_name: text_at(payload, "/payment_method"),
            payment_type: text_at(payload, "/payment_type"),
        },
    }
}

/// Raw status code as reported by the provider.
pub fn extract_status_code(provider: Provider, payload: &Value) -> Option<String> {
    match provider {
        Provider::Ifood => first_text(payload, &["/fullCode", "/code", "/status"]),
        Provider::Takeat => first_text(payload, &["/status", "/order_status"]),
        Provider::NinetyNineFood => first_text(payload, &["/order_info/status", "/status"]),
        Provider::Other => first_text(payload, &["/status"]),
    }
}

/// Normalizes a provider status code; unknown codes become `Unknown`.
///
/// ## Example
/// ```rust
/// use margin_core::payload::normalize_status;
/// use margin_core::types::{OrderStatus, Provider};
///
/// assert_eq!(normalize_status(Provider::Ifood, "CAN"), OrderStatus::Cancelled);
/// assert_eq!(normalize_status(Provider::Takeat, "finished"), OrderStatus::Concluded);
/// assert_eq!(normalize_status(Provider::Ifood, "???"), OrderStatus::Unknown);
/// ```
pub fn normalize_status(provider: Provider, code: &str) -> OrderStatus {
    let code = code.trim().to_lowercase();

    let exact = status_table(provider)
        .iter()
        .flat_map(|table| table.iter())
        .find(|(known, _)| *known == code)
        .map(|(_, status)| *status);

    match exact {
        Some(status) => status,
        None if code.contains("cancel") => OrderStatus::Cancelled,
        None => OrderStatus::Unknown,
    }
}

/// Canonical status read from the payload.
pub fn extract_status(provider: Provider, payload: &Value) -> OrderStatus {
    extract_status_code(provider, payload)
        .map(|code| normalize_status(provider, &code))
        .unwrap_or_default()
}

// =============================================================================
// Unit Tests
// =============================================================================
