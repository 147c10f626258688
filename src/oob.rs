//! Out-of-band updates.
//!
//! Besides its own target, a command can apply the same response to other
//! nodes. Each [`OobConfig`] names a target (default: the command's
//! selector), an optional swap and an optional effect. Configs run as soon
//! as the exchange succeeds, independent of the command's chain.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use serde::{Deserialize, Deserializer};
use tracing::{debug, error};

use crate::dom::Document;
use crate::effect::{Effect, EffectEngine};
use crate::swap::{SwapMethod, apply_swap};

// ============================================================================
// OobConfig
// ============================================================================

/// One out-of-band update.
///
/// Deserializes from `{"id": "#sel", "swap": "innerHTML", "effect":
/// "fadeIn", "duration": 300}`; every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct OobConfig {
    /// Target selector; the command's selector when absent.
    #[serde(default, rename = "id")]
    pub target: Option<String>,

    /// Swap applied to the target.
    #[serde(default)]
    pub swap: Option<SwapMethod>,

    /// Effect applied to the target after the swap.
    #[serde(default)]
    pub effect: Option<Effect>,

    /// Effect duration; the context default when absent or zero.
    #[serde(default, deserialize_with = "millis")]
    pub duration: Option<Duration>,
}

impl OobConfig {
    /// Creates an empty config targeting the command's own selector.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a config for `selector`.
    #[inline]
    #[must_use]
    pub fn target(selector: impl Into<String>) -> Self {
        Self {
            target: Some(selector.into()),
            ..Self::default()
        }
    }

    /// Sets the swap method.
    #[inline]
    #[must_use]
    pub fn with_swap(mut self, method: SwapMethod) -> Self {
        self.swap = Some(method);
        self
    }

    /// Sets the effect.
    #[inline]
    #[must_use]
    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effect = Some(effect);
        self
    }

    /// Sets the effect duration.
    #[inline]
    #[must_use]
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }
}

fn millis<'de, D>(deserializer: D) -> std::result::Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
}

// ============================================================================
// Processing
// ============================================================================

/// Applies `configs` with the response `html`.
///
/// Targets are resolved fresh for every config. A target that matches
/// nothing is logged and skipped; the swap runs even when `html` is empty.
/// Returns the number of configs applied.
pub fn process_oob(
    document: &dyn Document,
    effects: &EffectEngine,
    configs: &[OobConfig],
    default_selector: &str,
    html: &str,
    default_duration: Duration,
) -> usize {
    let mut applied = 0;

    for config in configs {
        let selector = config.target.as_deref().unwrap_or(default_selector);
        let Some(node) = document.query(selector) else {
            error!(selector, "OOB target not found");
            continue;
        };

        if let Some(method) = config.swap {
            apply_swap(document, effects, node, method, html);
        }

        if let Some(effect) = config.effect {
            let duration = config
                .duration
                .filter(|d| !d.is_zero())
                .unwrap_or(default_duration);
            effects.apply(node, effect, duration);
        }

        applied += 1;
    }

    if !configs.is_empty() {
        debug!(applied, total = configs.len(), "OOB updates processed");
    }
    applied
}

// ============================================================================
// Tests
// ============================================================================
