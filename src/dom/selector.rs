//! Compound selector parsing and matching.
//!
//! Supports a single compound selector: an optional tag (or `*`) followed by
//! any number of `#id`, `.class` and `[attr]` / `[attr=value]` parts.
//! Combinators and pseudo-classes are not supported.
//!
//! # Example
//!
//! ```ignore
//! use sxkit::dom::Selector;
//!
//! let selector = Selector::parse(r#"input[name="email"].wide"#)?;
//! assert_eq!(selector.tag(), Some("input"));
//! ```

use crate::error::{Error, Result};

// ============================================================================
// Selector
// ============================================================================

/// A parsed compound selector.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selector {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attributes: Vec<AttributeMatch>,
}

/// An `[attr]` or `[attr=value]` part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeMatch {
    /// Attribute name, lowercased.
    pub name: String,
    /// Required value; `None` only requires presence.
    pub value: Option<String>,
}

// ============================================================================
// Selector - Parsing
// ============================================================================

impl Selector {
    /// Parses a compound selector.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for empty input, combinators or
    /// unterminated attribute parts.
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(Error::invalid_argument("empty selector"));
        }

        let mut selector = Self::default();
        let mut rest = input;

        let tag_len = rest
            .find(|c: char| matches!(c, '#' | '.' | '['))
            .unwrap_or(rest.len());
        if tag_len > 0 {
            let tag = &rest[..tag_len];
            if tag != "*" {
                ensure_identifier(tag, input)?;
                selector.tag = Some(tag.to_ascii_lowercase());
            }
            rest = &rest[tag_len..];
        }

        while let Some(marker) = rest.chars().next() {
            rest = &rest[marker.len_utf8()..];
            match marker {
                '#' | '.' => {
                    let len = rest
                        .find(|c: char| matches!(c, '#' | '.' | '['))
                        .unwrap_or(rest.len());
                    let name = &rest[..len];
                    ensure_identifier(name, input)?;
                    if marker == '#' {
                        selector.id = Some(name.to_string());
                    } else {
                        selector.classes.push(name.to_string());
                    }
                    rest = &rest[len..];
                }
                '[' => {
                    let end = rest.find(']').ok_or_else(|| {
                        Error::invalid_argument(format!("unterminated attribute in {input:?}"))
                    })?;
                    selector.attributes.push(parse_attribute(&rest[..end], input)?);
                    rest = &rest[end + 1..];
                }
                _ => {
                    return Err(Error::invalid_argument(format!(
                        "unsupported selector syntax in {input:?}"
                    )));
                }
            }
        }

        Ok(selector)
    }
}

/// Parses the inside of `[...]`.
fn parse_attribute(body: &str, input: &str) -> Result<AttributeMatch> {
    let (name, value) = match body.split_once('=') {
        Some((name, value)) => (name.trim(), Some(unquote(value.trim()))),
        None => (body.trim(), None),
    };
    ensure_identifier(name, input)?;
    Ok(AttributeMatch {
        name: name.to_ascii_lowercase(),
        value: value.map(str::to_string),
    })
}

/// Strips one pair of matching quotes.
fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|v| v.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}

fn ensure_identifier(name: &str, input: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'));
    if valid {
        Ok(())
    } else {
        Err(Error::invalid_argument(format!(
            "unsupported selector syntax in {input:?}"
        )))
    }
}

// ============================================================================
// Selector - Matching
// ============================================================================

impl Selector {
    /// Returns the required tag, if any.
    #[inline]
    #[must_use]
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    /// Returns the required ID, if any.
    #[inline]
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Returns `true` if an element with this tag and attribute lookup
    /// matches every part of the selector.
    pub fn matches<'a>(&self, tag: &str, attribute: impl Fn(&str) -> Option<&'a str>) -> bool {
        if let Some(required) = &self.tag
            && !required.eq_ignore_ascii_case(tag)
        {
            return false;
        }

        if let Some(required) = &self.id
            && attribute("id") != Some(required.as_str())
        {
            return false;
        }

        if !self.classes.is_empty() {
            let classes = attribute("class").unwrap_or("");
            let present: Vec<&str> = classes.split_whitespace().collect();
            if !self.classes.iter().all(|c| present.contains(&c.as_str())) {
                return false;
            }
        }

        self.attributes.iter().all(|part| match (&part.value, attribute(&part.name)) {
            (_, None) => false,
            (None, Some(_)) => true,
            (Some(expected), Some(actual)) => expected == actual,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
