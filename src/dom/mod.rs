//! Document-tree collaborator.
//!
//! The orchestration layer never owns a document. It drives one through the
//! [`Document`] trait, which exposes the query, value, style, layout and
//! markup primitives the engines need.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Document`] | Query/mutation primitives |
//! | [`ElementKind`] | Element classification used by the fill engine |
//! | [`InputType`] | `<input type>` classification |
//! | [`StyleProperty`] | Inline style properties touched by effects |
//! | [`MemoryDocument`] | In-memory implementation for headless use and tests |

// ============================================================================
// Submodules
// ============================================================================

/// In-memory document implementation.
pub mod memory;

/// Compound selector matching for the in-memory document.
pub mod selector;

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use crate::identifiers::NodeId;

// ============================================================================
// Re-exports
// ============================================================================

pub use memory::MemoryDocument;
pub use selector::Selector;

// ============================================================================
// ElementKind
// ============================================================================

/// Classification of an element, as far as the engines care.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementKind {
    /// `<form>`
    Form,
    /// `<select>`, single or multiple.
    Select {
        /// Whether the `multiple` attribute is present.
        multiple: bool,
    },
    /// `<option>`
    Option,
    /// `<textarea>`
    TextArea,
    /// `<input>` of the given type.
    Input(InputType),
    /// Any other element, by lowercase tag name.
    Other(String),
}

impl ElementKind {
    /// Classifies an element from its tag name and `type`/`multiple`
    /// attributes.
    #[must_use]
    pub fn classify(tag: &str, input_type: Option<&str>, multiple: bool) -> Self {
        match tag.to_ascii_lowercase().as_str() {
            "form" => Self::Form,
            "select" => Self::Select { multiple },
            "option" => Self::Option,
            "textarea" => Self::TextArea,
            "input" => Self::Input(InputType::from(input_type.unwrap_or("text"))),
            other => Self::Other(other.to_string()),
        }
    }

    /// Returns `true` for `<form>`.
    #[inline]
    #[must_use]
    pub fn is_form(&self) -> bool {
        matches!(self, Self::Form)
    }
}

// ============================================================================
// InputType
// ============================================================================

/// The `type` of an `<input>` element.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InputType {
    Text,
    Hidden,
    Checkbox,
    Radio,
    Color,
    Number,
    Range,
    Date,
    Month,
    Week,
    Time,
    Submit,
    Reset,
    Button,
    Image,
    File,
    /// Any other type, lowercased.
    Other(String),
}

impl InputType {
    /// Returns `true` for types whose value is a date or time of day.
    #[inline]
    #[must_use]
    pub fn is_temporal(&self) -> bool {
        matches!(self, Self::Date | Self::Month | Self::Week | Self::Time)
    }

    /// Returns `true` for types that are never part of a form's data set.
    #[inline]
    #[must_use]
    pub fn is_excluded_from_entries(&self) -> bool {
        matches!(
            self,
            Self::Submit | Self::Reset | Self::Button | Self::Image | Self::File
        )
    }

    /// Returns the lowercase type name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Text => "text",
            Self::Hidden => "hidden",
            Self::Checkbox => "checkbox",
            Self::Radio => "radio",
            Self::Color => "color",
            Self::Number => "number",
            Self::Range => "range",
            Self::Date => "date",
            Self::Month => "month",
            Self::Week => "week",
            Self::Time => "time",
            Self::Submit => "submit",
            Self::Reset => "reset",
            Self::Button => "button",
            Self::Image => "image",
            Self::File => "file",
            Self::Other(name) => name,
        }
    }
}

impl From<&str> for InputType {
    fn from(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "" | "text" => Self::Text,
            "hidden" => Self::Hidden,
            "checkbox" => Self::Checkbox,
            "radio" => Self::Radio,
            "color" => Self::Color,
            "number" => Self::Number,
            "range" => Self::Range,
            "date" => Self::Date,
            "month" => Self::Month,
            "week" => Self::Week,
            "time" => Self::Time,
            "submit" => Self::Submit,
            "reset" => Self::Reset,
            "button" => Self::Button,
            "image" => Self::Image,
            "file" => Self::File,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for InputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// StyleProperty
// ============================================================================

/// Inline style properties an effect may touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StyleProperty {
    Transition,
    Opacity,
    Height,
    Width,
    Transform,
    Overflow,
}

impl StyleProperty {
    /// Every property, in capture order.
    pub const ALL: [StyleProperty; 6] = [
        Self::Transition,
        Self::Opacity,
        Self::Height,
        Self::Width,
        Self::Transform,
        Self::Overflow,
    ];

    /// Returns the CSS property name.
    #[must_use]
    pub fn css_name(self) -> &'static str {
        match self {
            Self::Transition => "transition",
            Self::Opacity => "opacity",
            Self::Height => "height",
            Self::Width => "width",
            Self::Transform => "transform",
            Self::Overflow => "overflow",
        }
    }
}

// ============================================================================
// InsertPosition
// ============================================================================

/// Where adjacent markup is inserted relative to a node's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertPosition {
    /// Before the first child.
    AfterBegin,
    /// After the last child.
    BeforeEnd,
}

// ============================================================================
// Layout
// ============================================================================

/// Layout metrics of a node. Reading them forces a layout flush.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Layout {
    pub offset_width: u32,
    pub offset_height: u32,
    pub scroll_width: u32,
    pub scroll_height: u32,
}

// ============================================================================
// Document
// ============================================================================

/// Query and mutation primitives of a document tree.
///
/// Implementations use interior mutability; every method takes `&self` and
/// is synchronous. Operations on a handle that no longer refers to a node
/// are no-ops returning empty values.
pub trait Document: Send + Sync {
    /// Returns the first attached node matching `selector`.
    fn query(&self, selector: &str) -> Option<NodeId>;

    /// Returns every attached node matching `selector`, in document order.
    fn query_all(&self, selector: &str) -> Vec<NodeId>;

    /// Returns `true` while `node` is attached to the document.
    fn contains(&self, node: NodeId) -> bool;

    /// Classifies `node`.
    fn kind(&self, node: NodeId) -> Option<ElementKind>;

    /// Returns the form's data set as `(name, value)` pairs in tree order.
    fn form_entries(&self, form: NodeId) -> Vec<(String, String)>;

    /// Returns the form's controls whose `name` is exactly `name`.
    fn named_fields(&self, form: NodeId, name: &str) -> Vec<NodeId>;

    /// Returns the current value of a control or option.
    fn value(&self, node: NodeId) -> String;

    /// Sets the value of a control. The document may sanitize it.
    fn set_value(&self, node: NodeId, value: &str);

    /// Returns the checkedness of a checkbox or radio.
    fn checked(&self, node: NodeId) -> bool;

    /// Sets the checkedness of a checkbox or radio.
    fn set_checked(&self, node: NodeId, checked: bool);

    /// Returns the options of a select, in order.
    fn options(&self, select: NodeId) -> Vec<NodeId>;

    /// Returns the selectedness of an option.
    fn selected(&self, option: NodeId) -> bool;

    /// Sets the selectedness of an option.
    fn set_selected(&self, option: NodeId, selected: bool);

    /// Returns an inline style value; empty if unset.
    fn style(&self, node: NodeId, property: StyleProperty) -> String;

    /// Sets an inline style value; an empty value removes it.
    fn set_style(&self, node: NodeId, property: StyleProperty, value: &str);

    /// Reads layout metrics, forcing a layout flush.
    fn layout(&self, node: NodeId) -> Layout;

    /// Replaces the node's content with `html`.
    fn set_inner_html(&self, node: NodeId, html: &str);

    /// Replaces the node itself with `html`, detaching it.
    fn set_outer_html(&self, node: NodeId, html: &str);

    /// Inserts `html` at the start or end of the node's content.
    fn insert_html(&self, node: NodeId, position: InsertPosition, html: &str);
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(ElementKind::classify("FORM", None, false), ElementKind::Form);
        assert_eq!(
            ElementKind::classify("select", None, true),
            ElementKind::Select { multiple: true }
        );
        assert_eq!(
            ElementKind::classify("input", None, false),
            ElementKind::Input(InputType::Text)
        );
        assert_eq!(
            ElementKind::classify("input", Some("Checkbox"), false),
            ElementKind::Input(InputType::Checkbox)
        );
        assert_eq!(
            ElementKind::classify("div", None, false),
            ElementKind::Other("div".to_string())
        );
    }

    #[test]
    fn test_input_type_roundtrip_name() {
        for name in ["date", "week", "range", "color", "tel"] {
            assert_eq!(InputType::from(name).as_str(), name);
        }
    }

    #[test]
    fn test_temporal() {
        assert!(InputType::Week.is_temporal());
        assert!(!InputType::Number.is_temporal());
    }

    #[test]
    fn test_style_property_names() {
        let names: Vec<_> = StyleProperty::ALL.iter().map(|p| p.css_name()).collect();
        assert_eq!(
            names,
            ["transition", "opacity", "height", "width", "transform", "overflow"]
        );
    }
}
