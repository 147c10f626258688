//! Writing response markup into the document.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use tracing::debug;

use crate::dom::{Document, InsertPosition};
use crate::effect::EffectEngine;
use crate::error::{Error, Result};
use crate::identifiers::NodeId;

// ============================================================================
// SwapMethod
// ============================================================================

/// How response markup replaces or extends a node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum SwapMethod {
    /// Replace the node's content.
    #[default]
    InnerHtml,

    /// Replace the node itself.
    OuterHtml,

    /// Append after the last child.
    BeforeEnd,

    /// Insert before the first child.
    AfterBegin,
}

impl SwapMethod {
    /// Returns the method name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InnerHtml => "innerHTML",
            Self::OuterHtml => "outerHTML",
            Self::BeforeEnd => "beforeend",
            Self::AfterBegin => "afterbegin",
        }
    }
}

impl fmt::Display for SwapMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SwapMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "innerHTML" => Ok(Self::InnerHtml),
            "outerHTML" => Ok(Self::OuterHtml),
            "beforeend" => Ok(Self::BeforeEnd),
            "afterbegin" => Ok(Self::AfterBegin),
            other => Err(Error::invalid_argument(format!(
                "unknown swap method: {other}"
            ))),
        }
    }
}

impl TryFrom<String> for SwapMethod {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

// ============================================================================
// Swap
// ============================================================================

/// Applies `html` to `node` with `method`.
///
/// Replacing the node itself drops any effect revert pending on it.
pub fn apply_swap(
    document: &dyn Document,
    effects: &EffectEngine,
    node: NodeId,
    method: SwapMethod,
    html: &str,
) {
    match method {
        SwapMethod::InnerHtml => document.set_inner_html(node, html),
        SwapMethod::OuterHtml => {
            effects.cancel(node);
            document.set_outer_html(node, html);
        }
        SwapMethod::BeforeEnd => document.insert_html(node, InsertPosition::BeforeEnd, html),
        SwapMethod::AfterBegin => document.insert_html(node, InsertPosition::AfterBegin, html),
    }
    debug!(node = %node, method = %method, bytes = html.len(), "Swapped");
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;
    use std::time::Duration;

    use crate::dom::MemoryDocument;
    use crate::effect::Effect;
    use crate::timer::TokioTimers;

    fn setup() -> (Arc<MemoryDocument>, EffectEngine) {
        let doc = Arc::new(MemoryDocument::new());
        let effects = EffectEngine::new(
            Arc::clone(&doc) as Arc<dyn Document>,
            Arc::new(TokioTimers::new()),
        );
        (doc, effects)
    }

    #[test]
    fn test_parse() {
        assert_eq!("innerHTML".parse::<SwapMethod>().unwrap(), SwapMethod::InnerHtml);
        assert_eq!("outerHTML".parse::<SwapMethod>().unwrap(), SwapMethod::OuterHtml);
        assert_eq!("beforeend".parse::<SwapMethod>().unwrap(), SwapMethod::BeforeEnd);
        assert_eq!("afterbegin".parse::<SwapMethod>().unwrap(), SwapMethod::AfterBegin);

        let err = "replace".parse::<SwapMethod>().unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }));
    }

    #[test]
    fn test_deserialize() {
        let method: SwapMethod = serde_json::from_str(r#""beforeend""#).unwrap();
        assert_eq!(method, SwapMethod::BeforeEnd);
        assert!(serde_json::from_str::<SwapMethod>(r#""sideways""#).is_err());
    }

    #[tokio::test]
    async fn test_positional_swaps() {
        let (doc, effects) = setup();
        let list = doc.append(doc.body(), "ul", &[]);
        doc.append_markup(list, "<li>a</li>");

        apply_swap(doc.as_ref(), &effects, list, SwapMethod::BeforeEnd, "<li>b</li>");
        apply_swap(doc.as_ref(), &effects, list, SwapMethod::AfterBegin, "<li>0</li>");
        assert_eq!(doc.inner_html(list), "<li>0</li><li>a</li><li>b</li>");

        apply_swap(doc.as_ref(), &effects, list, SwapMethod::InnerHtml, "<li>z</li>");
        assert_eq!(doc.inner_html(list), "<li>z</li>");
    }

    #[tokio::test(start_paused = true)]
    async fn test_outer_swap_cancels_pending_revert() {
        let (doc, effects) = setup();
        let div = doc.append(doc.body(), "div", &[]);
        effects.apply(div, Effect::FadeIn, Duration::from_millis(100));
        assert_eq!(effects.pending(), 1);

        apply_swap(doc.as_ref(), &effects, div, SwapMethod::OuterHtml, "<p>new</p>");

        assert_eq!(effects.pending(), 0);
        assert!(!doc.contains(div));
        assert_eq!(doc.inner_html(doc.body()), "<p>new</p>");
    }
}
