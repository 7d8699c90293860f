//! # Payment Classification
//!
//! Maps free-text payment fields onto a canonical method and payment type.
//!
//! Providers disagree on how they describe a payment: iFood sends a method
//! code (`"CREDIT"`), Takeat a display name (`"Cartão de Crédito"`), 99Food
//! sometimes both. Detection is a heuristic, so the term tables below are
//! data and every lookup has an explicit fallback.
//!
//! ```text
//! code present & known? ──yes──► CODE_ALIASES
//!        │ no
//!        ▼
//! name contains a term? ──yes──► NAME_TERMS (first match wins)
//!        │ no
//!        ▼
//!     Others
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// =============================================================================
// Canonical Method
// =============================================================================

/// Canonical payment method code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalMethod {
    Pix,
    Debit,
    Credit,
    Cash,
    Voucher,
    /// Nothing recognizable.
    #[default]
    Others,
}

impl CanonicalMethod {
    /// Code stored in fee rule `condition_values`.
    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalMethod::Pix => "pix",
            CanonicalMethod::Debit => "debit",
            CanonicalMethod::Credit => "credit",
            CanonicalMethod::Cash => "cash",
            CanonicalMethod::Voucher => "voucher",
            CanonicalMethod::Others => "others",
        }
    }
}

impl std::fmt::Display for CanonicalMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the platform collected the payment or the store did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    Online,
    #[default]
    Offline,
}

// =============================================================================
// Term Tables
// =============================================================================

/// Provider method codes, matched exactly (case-insensitive).
pub const CODE_ALIASES: &[(&str, CanonicalMethod)] = &[
    ("pix", CanonicalMethod::Pix),
    ("debit", CanonicalMethod::Debit),
    ("debit_card", CanonicalMethod::Debit),
    ("debito", CanonicalMethod::Debit),
    ("credit", CanonicalMethod::Credit),
    ("credit_card", CanonicalMethod::Credit),
    ("credito", CanonicalMethod::Credit),
    ("cash", CanonicalMethod::Cash),
    ("money", CanonicalMethod::Cash),
    ("dinheiro", CanonicalMethod::Cash),
    ("meal_voucher", CanonicalMethod::Voucher),
    ("food_voucher", CanonicalMethod::Voucher),
    ("voucher", CanonicalMethod::Voucher),
    ("vale", CanonicalMethod::Voucher),
    ("others", CanonicalMethod::Others),
];

/// Display-name terms, matched as substrings (case-insensitive), in order.
pub const NAME_TERMS: &[(&str, CanonicalMethod)] = &[
    ("pix", CanonicalMethod::Pix),
    ("débito", CanonicalMethod::Debit),
    ("debito", CanonicalMethod::Debit),
    ("debit", CanonicalMethod::Debit),
    ("crédito", CanonicalMethod::Credit),
    ("credito", CanonicalMethod::Credit),
    ("credit", CanonicalMethod::Credit),
    ("dinheiro", CanonicalMethod::Cash),
    ("cash", CanonicalMethod::Cash),
    ("money", CanonicalMethod::Cash),
    ("vale", CanonicalMethod::Voucher),
    ("voucher", CanonicalMethod::Voucher),
];

/// Terms that mark a payment as collected online by the platform.
pub const ONLINE_TERMS: &[&str] = &["online", "marketplace"];

// =============================================================================
// Classification
// =============================================================================

fn lookup_code(code: &str) -> Option<CanonicalMethod> {
    let code = code.trim().to_lowercase();
    CODE_ALIASES
        .iter()
        .find(|(alias, _)| *alias == code)
        .map(|(_, method)| *method)
}

fn lookup_name(name: &str) -> Option<CanonicalMethod> {
    let name = name.to_lowercase();
    NAME_TERMS
        .iter()
        .find(|(term, _)| name.contains(term))
        .map(|(_, method)| *method)
}

/// Detects the canonical method from a provider code and/or display name.
///
/// The code wins when it is a known alias; otherwise the name is searched.
/// Unknown codes are also searched as text (`"CARTAO_CREDITO"`).
///
/// ## Example
/// ```rust
/// use margin_core::payment::{classify, CanonicalMethod};
///
/// assert_eq!(classify(Some("Cartão de Débito"), None), CanonicalMethod::Debit);
/// assert_eq!(classify(Some("Débito"), Some("PIX")), CanonicalMethod::Pix);
/// assert_eq!(classify(Some("Ticket"), None), CanonicalMethod::Others);
/// ```
pub fn classify(name: Option<&str>, code: Option<&str>) -> CanonicalMethod {
    code.and_then(lookup_code)
        .or_else(|| name.and_then(lookup_name))
        .or_else(|| code.and_then(lookup_name))
        .unwrap_or_default()
}

/// Detects online/offline from a provider type field and/or display name.
///
/// ## Example
/// ```rust
/// use margin_core::payment::{classify_payment_type, PaymentType};
///
/// assert_eq!(classify_payment_type(Some("ONLINE"), None), PaymentType::Online);
/// assert_eq!(classify_payment_type(None, Some("Pago no Marketplace")), PaymentType::Online);
/// assert_eq!(classify_payment_type(None, Some("Dinheiro")), PaymentType::Offline);
/// ```
pub fn classify_payment_type(type_field: Option<&str>, name: Option<&str>) -> PaymentType {
    let is_online = |text: &str| {
        let text = text.to_lowercase();
        ONLINE_TERMS.iter().any(|term| text.contains(term))
    };

    if type_field.is_some_and(is_online) || name.is_some_and(is_online) {
        PaymentType::Online
    } else {
        PaymentType::Offline
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_aliases() {
        assert_eq!(classify(None, Some("CREDIT")), CanonicalMethod::Credit);
        assert_eq!(classify(None, Some("meal_voucher")), CanonicalMethod::Voucher);
        assert_eq!(classify(None, Some(" Pix ")), CanonicalMethod::Pix);
    }

    #[test]
    fn test_name_terms_are_case_insensitive() {
        assert_eq!(classify(Some("CRÉDITO - VISA"), None), CanonicalMethod::Credit);
        assert_eq!(classify(Some("Cartão de débito"), None), CanonicalMethod::Debit);
        assert_eq!(classify(Some("Pagamento em Dinheiro"), None), CanonicalMethod::Cash);
        assert_eq!(classify(Some("Vale Refeição"), None), CanonicalMethod::Voucher);
        assert_eq!(classify(Some("Pay with Money"), None), CanonicalMethod::Cash);
    }

    #[test]
    fn test_unknown_code_falls_back_to_name() {
        assert_eq!(classify(Some("Crédito"), Some("XPTO")), CanonicalMethod::Credit);
        assert_eq!(classify(None, Some("CARTAO_CREDITO")), CanonicalMethod::Credit);
    }

    #[test]
    fn test_unmatched_is_others() {
        assert_eq!(classify(None, None), CanonicalMethod::Others);
        assert_eq!(classify(Some(""), Some("")), CanonicalMethod::Others);
        assert_eq!(classify(Some("Ticket Restaurante"), None), CanonicalMethod::Others);
    }

    #[test]
    fn test_payment_type() {
        assert_eq!(classify_payment_type(Some("online"), None), PaymentType::Online);
        assert_eq!(classify_payment_type(Some("OFFLINE"), Some("Crédito")), PaymentType::Offline);
        assert_eq!(classify_payment_type(None, None), PaymentType::Offline);
    }

    #[test]
    fn test_tables_use_lowercase_terms() {
        for (term, _) in CODE_ALIASES.iter().chain(NAME_TERMS) {
            assert_eq!(*term, term.to_lowercase());
        }
    }
}
