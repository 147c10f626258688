//! Writing structured values back into form fields.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::dom::{Document, ElementKind, InputType};
use crate::identifiers::NodeId;
use crate::value::{FormValue, Record};

// ============================================================================
// Constants
// ============================================================================

/// `#rgb` or `#rrggbb`.
static HEX_COLOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#([0-9A-Fa-f]{3}){1,2}$").expect("valid regex"));

// ============================================================================
// FillWarning
// ============================================================================

/// A value a field refused. The field is left unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FillWarning {
    /// No field carries this name.
    MissingField {
        /// Record key.
        name: String,
    },

    /// A single select has no option with this value.
    NoMatchingOption {
        /// Field name.
        name: String,
        /// Requested value.
        value: String,
    },

    /// Not a `#rgb` / `#rrggbb` color.
    InvalidColor {
        /// Field name.
        name: String,
        /// Rejected value.
        value: String,
    },

    /// Not a number, for a number or range input.
    InvalidNumber {
        /// Field name.
        name: String,
        /// Rejected value.
        value: String,
        /// Input type of the field.
        input_type: InputType,
    },

    /// The document did not accept the value for a date or time input.
    RejectedValue {
        /// Field name.
        name: String,
        /// Rejected value.
        value: String,
        /// Input type of the field.
        input_type: InputType,
    },
}

impl fmt::Display for FillWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField { name } => {
                write!(f, "no form element with name {name:?}")
            }
            Self::NoMatchingOption { name, value } => {
                write!(f, "value {value:?} not found in options of {name:?}")
            }
            Self::InvalidColor { name, value } => {
                write!(f, "invalid color {value:?} for {name:?}")
            }
            Self::InvalidNumber {
                name,
                value,
                input_type,
            } => write!(f, "invalid number {value:?} for {input_type} input {name:?}"),
            Self::RejectedValue {
                name,
                value,
                input_type,
            } => write!(f, "value {value:?} is not valid for {input_type} input {name:?}"),
        }
    }
}

// ============================================================================
// FillReport
// ============================================================================

/// Outcome of filling a form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FillReport {
    /// Fields that took a value.
    pub populated: usize,

    /// Soft failures, in the order they occurred.
    pub warnings: Vec<FillWarning>,
}

impl FillReport {
    /// Returns `true` if every value was accepted.
    #[inline]
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    fn warn(&mut self, warning: FillWarning) {
        warn!(warning = %warning, "Form field left unchanged");
        self.warnings.push(warning);
    }
}

// ============================================================================
// Fill
// ============================================================================

/// Writes every entry of `record` into the matching fields of `form`.
pub fn fill_form(document: &dyn Document, form: NodeId, record: &Record) -> FillReport {
    let mut report = FillReport::default();

    for (name, value) in record.iter() {
        let fields = document.named_fields(form, name);
        if fields.is_empty() {
            report.warn(FillWarning::MissingField {
                name: name.to_string(),
            });
            continue;
        }

        for field in fields {
            populate(document, field, name, value, &mut report);
        }
    }

    debug!(
        form = %form,
        populated = report.populated,
        warnings = report.warnings.len(),
        "Form filled"
    );
    report
}

fn populate(
    document: &dyn Document,
    field: NodeId,
    name: &str,
    value: &FormValue,
    report: &mut FillReport,
) {
    match document.kind(field) {
        Some(ElementKind::Select { multiple: true }) => {
            let wanted = value.text_set();
            for option in document.options(field) {
                let selected = wanted.contains(&document.value(option));
                document.set_selected(option, selected);
            }
            report.populated += 1;
        }
        Some(ElementKind::Select { multiple: false }) => {
            let chosen = match value {
                FormValue::List(items) if !items.is_empty() => &items[0],
                other => other,
            };
            let text = chosen.to_text();
            document.set_value(field, &text);
            if document.value(field) == text {
                report.populated += 1;
            } else {
                report.warn(FillWarning::NoMatchingOption {
                    name: name.to_string(),
                    value: text,
                });
            }
        }
        Some(ElementKind::TextArea) => {
            document.set_value(field, &value.to_text());
            report.populated += 1;
        }
        Some(ElementKind::Input(input_type)) => {
            populate_input(document, field, &input_type, name, value, report);
        }
        _ => {}
    }
}

fn populate_input(
    document: &dyn Document,
    field: NodeId,
    input_type: &InputType,
    name: &str,
    value: &FormValue,
    report: &mut FillReport,
) {
    match input_type {
        InputType::Checkbox => {
            let own = document.value(field);
            let checked = match value {
                FormValue::List(items) => items.iter().any(|item| item.to_text() == own),
                FormValue::Bool(b) => *b,
                other => other.to_text() == own,
            };
            document.set_checked(field, checked);
            report.populated += 1;
        }
        InputType::Radio => {
            let checked = document.value(field) == value.to_text();
            document.set_checked(field, checked);
            report.populated += 1;
        }
        InputType::Color => match value {
            FormValue::Text(color) if HEX_COLOR.is_match(color) => {
                document.set_value(field, color);
                report.populated += 1;
            }
            other if other.is_truthy() => report.warn(FillWarning::InvalidColor {
                name: name.to_string(),
                value: other.to_text(),
            }),
            _ => {}
        },
        InputType::Number | InputType::Range => match numeric_text(value) {
            Some(Some(number)) => {
                document.set_value(field, &number);
                report.populated += 1;
            }
            Some(None) => report.warn(FillWarning::InvalidNumber {
                name: name.to_string(),
                value: value.to_text(),
                input_type: input_type.clone(),
            }),
            None => {}
        },
        temporal if temporal.is_temporal() => {
            if !value.is_truthy() {
                return;
            }
            let text = value.to_text();
            document.set_value(field, &text);
            if document.value(field) == text {
                report.populated += 1;
            } else {
                report.warn(FillWarning::RejectedValue {
                    name: name.to_string(),
                    value: text,
                    input_type: input_type.clone(),
                });
            }
        }
        _ => {
            document.set_value(field, &value.to_text());
            report.populated += 1;
        }
    }
}

/// Number text for a numeric input.
///
/// `None` means nothing to assign; `Some(None)` means the value is not
/// numeric.
fn numeric_text(value: &FormValue) -> Option<Option<String>> {
    match value {
        FormValue::Absent => None,
        FormValue::Number(n) => Some(Some(n.to_string())),
        FormValue::Text(s) => Some(
            s.trim()
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(|f| f.to_string()),
        ),
        FormValue::Bool(_) | FormValue::List(_) => Some(None),
    }
}

// ============================================================================
// Tests
// ============================================================================
