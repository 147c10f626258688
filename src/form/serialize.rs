//! Form serialization.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Number;
use tracing::debug;

use crate::dom::{Document, ElementKind};
use crate::identifiers::NodeId;
use crate::value::{FormValue, Record};

// ============================================================================
// Constants
// ============================================================================

/// Plain signed integers.
static INTEGER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?\d+$").expect("valid regex"));

/// A zero followed by more digits, e.g. `007`.
static LEADING_ZERO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^0\d+").expect("valid regex"));

// ============================================================================
// SerializedForm
// ============================================================================

/// A form's data set in structured form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SerializedForm {
    /// Field values; repeated names become lists.
    pub data: Record,

    /// Value of the first `<input>` named after the CSRF field, if non-empty.
    ///
    /// Read even when the input is disabled.
    pub csrf_token: Option<String>,
}

// ============================================================================
// Serialization
// ============================================================================

/// Serializes a form's fields into a [`Record`].
///
/// Names seen once map to a scalar; repeated names accumulate, in order,
/// into a [`FormValue::List`]. Each value goes through [`coerce`].
pub fn serialize_form(document: &dyn Document, form: NodeId, csrf_field: &str) -> SerializedForm {
    let mut grouped: Vec<(String, Vec<FormValue>)> = Vec::new();

    for (name, raw) in document.form_entries(form) {
        let value = coerce(&raw);
        match grouped.iter_mut().find(|(key, _)| *key == name) {
            Some((_, values)) => values.push(value),
            None => grouped.push((name, vec![value])),
        }
    }

    let data: Record = grouped
        .into_iter()
        .map(|(name, mut values)| {
            let value = if values.len() == 1 {
                values.remove(0)
            } else {
                FormValue::List(values)
            };
            (name, value)
        })
        .collect();

    let csrf_token = document
        .named_fields(form, csrf_field)
        .into_iter()
        .find(|&field| matches!(document.kind(field), Some(ElementKind::Input(_))))
        .map(|field| document.value(field))
        .filter(|token| !token.is_empty());

    debug!(form = %form, fields = data.len(), csrf = csrf_token.is_some(), "Form serialized");

    SerializedForm { data, csrf_token }
}

/// Coerces a raw field value.
///
/// Becomes a number only if it is a plain integer without a leading zero,
/// so identifiers like `007` survive. Empty strings stay text.
#[must_use]
pub fn coerce(raw: &str) -> FormValue {
    if raw.is_empty() || !INTEGER.is_match(raw) || LEADING_ZERO.is_match(raw) {
        return FormValue::Text(raw.to_string());
    }

    match raw.parse::<i64>() {
        Ok(n) => FormValue::Number(Number::from(n)),
        Err(_) => raw
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map_or_else(|| FormValue::Text(raw.to_string()), FormValue::Number),
    }
}

// ============================================================================
// Tests
// ============================================================================
