//! Transition effects.
//!
//! An effect writes a start state, forces a layout flush, installs a CSS
//! transition and writes the end state. After the duration every inline
//! property it touched is restored.
//!
//! Reverts are tracked per node: re-applying an effect to a node that is
//! still animating keeps the styles captured by the first application and
//! reschedules the revert; a node replaced by a swap has its revert
//! cancelled.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use sxkit::Effect;
//!
//! let effect: Effect = "slideDown".parse()?;
//! engine.apply(node, effect, Duration::from_millis(300));
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde::Deserialize;
use tracing::{debug, trace};

use crate::dom::{Document, StyleProperty};
use crate::error::{Error, Result};
use crate::identifiers::NodeId;
use crate::timer::{TimerHandle, Timers};

// ============================================================================
// Effect
// ============================================================================

/// A named transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum Effect {
    FadeIn,
    FadeOut,
    SlideUp,
    SlideDown,
    SlideLeft,
    SlideRight,
    ZoomIn,
    ZoomOut,
    Rotate,
}

impl Effect {
    /// Every effect.
    pub const ALL: [Effect; 9] = [
        Self::FadeIn,
        Self::FadeOut,
        Self::SlideUp,
        Self::SlideDown,
        Self::SlideLeft,
        Self::SlideRight,
        Self::ZoomIn,
        Self::ZoomOut,
        Self::Rotate,
    ];

    /// Returns the effect name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FadeIn => "fadeIn",
            Self::FadeOut => "fadeOut",
            Self::SlideUp => "slideUp",
            Self::SlideDown => "slideDown",
            Self::SlideLeft => "slideLeft",
            Self::SlideRight => "slideRight",
            Self::ZoomIn => "zoomIn",
            Self::ZoomOut => "zoomOut",
            Self::Rotate => "rotate",
        }
    }

    /// Animated property with its start and end frames.
    fn keyframes(self) -> (StyleProperty, Frame, Frame) {
        use Frame::{Fixed, ScrollHeight, ScrollWidth};
        use StyleProperty::{Height, Opacity, Transform, Width};

        match self {
            Self::FadeIn => (Opacity, Fixed("0"), Fixed("1")),
            Self::FadeOut => (Opacity, Fixed("1"), Fixed("0")),
            Self::SlideUp => (Height, ScrollHeight, Fixed("0")),
            Self::SlideDown => (Height, Fixed("0"), ScrollHeight),
            Self::SlideLeft => (Width, ScrollWidth, Fixed("0")),
            Self::SlideRight => (Width, Fixed("0"), ScrollWidth),
            Self::ZoomIn => (Transform, Fixed("scale(0)"), Fixed("scale(1)")),
            Self::ZoomOut => (Transform, Fixed("scale(1)"), Fixed("scale(0)")),
            Self::Rotate => (Transform, Fixed("rotate(0deg)"), Fixed("rotate(360deg)")),
        }
    }

    /// Slides clip their content while animating.
    fn clips(self) -> bool {
        matches!(
            self,
            Self::SlideUp | Self::SlideDown | Self::SlideLeft | Self::SlideRight
        )
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Effect {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|effect| effect.as_str() == s)
            .ok_or_else(|| Error::invalid_argument(format!("unknown effect: {s}")))
    }
}

impl TryFrom<String> for Effect {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

/// A style value, fixed or read from layout.
#[derive(Debug, Clone, Copy)]
enum Frame {
    Fixed(&'static str),
    ScrollHeight,
    ScrollWidth,
}

// ============================================================================
// EffectEngine
// ============================================================================

/// Inline styles captured before an effect.
type Snapshot = Vec<(StyleProperty, String)>;

struct PendingRevert {
    snapshot: Snapshot,
    handle: TimerHandle,
    generation: u64,
}

/// Applies effects and owns their pending reverts.
///
/// Cheap to clone; clones share the pending set.
#[derive(Clone)]
pub struct EffectEngine {
    document: Arc<dyn Document>,
    timers: Arc<dyn Timers>,
    pending: Arc<Mutex<FxHashMap<NodeId, PendingRevert>>>,
    generation: Arc<AtomicU64>,
}

impl fmt::Debug for EffectEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectEngine")
            .field("pending", &self.pending.lock().len())
            .finish_non_exhaustive()
    }
}

impl EffectEngine {
    /// Creates an engine over `document`, scheduling reverts on `timers`.
    ///
    /// `timers` must not run a one-shot task before `after` returns.
    #[must_use]
    pub fn new(document: Arc<dyn Document>, timers: Arc<dyn Timers>) -> Self {
        Self {
            document,
            timers,
            pending: Arc::new(Mutex::new(FxHashMap::default())),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Runs `effect` on `node` and schedules its revert after `duration`.
    pub fn apply(&self, node: NodeId, effect: Effect, duration: Duration) {
        if !self.document.contains(node) {
            debug!(node = %node, %effect, "Effect target is not in the document");
            return;
        }

        // Held across capture and animation so a concurrent revert of this
        // node either completes first or finds the new entry.
        let mut pending = self.pending.lock();
        let snapshot = match pending.remove(&node) {
            Some(previous) => {
                previous.handle.cancel();
                previous.snapshot
            }
            None => self.capture(node),
        };

        self.animate(node, effect, duration);

        let generation = self.generation.fetch_add(1, Ordering::Relaxed);
        let engine = self.clone();
        let handle = self.timers.after(
            duration,
            Box::new(move || engine.revert(node, generation)),
        );
        pending.insert(
            node,
            PendingRevert {
                snapshot,
                handle,
                generation,
            },
        );
        drop(pending);

        debug!(node = %node, %effect, duration_ms = duration.as_millis() as u64, "Effect applied");
    }

    /// Cancels the pending revert of `node` without restoring its styles.
    pub fn cancel(&self, node: NodeId) {
        if let Some(pending) = self.pending.lock().remove(&node) {
            pending.handle.cancel();
            trace!(node = %node, "Effect revert cancelled");
        }
    }

    /// Cancels every pending revert.
    pub fn cancel_all(&self) {
        let drained: Vec<_> = self.pending.lock().drain().collect();
        for (_, pending) in &drained {
            pending.handle.cancel();
        }
        if !drained.is_empty() {
            debug!(count = drained.len(), "Effect reverts cancelled");
        }
    }

    /// Number of nodes with a pending revert.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.lock().len()
    }

    fn capture(&self, node: NodeId) -> Snapshot {
        StyleProperty::ALL
            .into_iter()
            .map(|property| (property, self.document.style(node, property)))
            .collect()
    }

    fn animate(&self, node: NodeId, effect: Effect, duration: Duration) {
        let document = &self.document;
        let (property, start, end) = effect.keyframes();

        document.set_style(node, StyleProperty::Transition, "none");
        if effect.clips() {
            document.set_style(node, StyleProperty::Overflow, "hidden");
        }

        let start = self.resolve(node, start);
        document.set_style(node, property, &start);
        document.layout(node);

        let transition = format!(
            "{} {}ms ease-in-out",
            property.css_name(),
            duration.as_millis()
        );
        document.set_style(node, StyleProperty::Transition, &transition);
        let end = self.resolve(node, end);
        document.set_style(node, property, &end);
    }

    fn resolve(&self, node: NodeId, frame: Frame) -> String {
        match frame {
            Frame::Fixed(value) => value.to_string(),
            Frame::ScrollHeight => format!("{}px", self.document.layout(node).scroll_height),
            Frame::ScrollWidth => format!("{}px", self.document.layout(node).scroll_width),
        }
    }

    fn revert(&self, node: NodeId, generation: u64) {
        let mut pending = self.pending.lock();
        let entry = match pending.get(&node) {
            Some(entry) if entry.generation == generation => pending.remove(&node),
            _ => None,
        };
        let Some(entry) = entry else {
            return;
        };

        if !self.document.contains(node) {
            trace!(node = %node, "Revert skipped for detached node");
            return;
        }

        // Restored under the lock so a concurrent apply never snapshots the end state.
        for (property, value) in &entry.snapshot {
            self.document.set_style(node, *property, value);
        }
        trace!(node = %node, "Effect reverted");
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::time::sleep;

    use crate::dom::{Layout, MemoryDocument};
    use crate::timer::TokioTimers;

    fn engine(doc: &Arc<MemoryDocument>) -> EffectEngine {
        EffectEngine::new(
            Arc::clone(doc) as Arc<dyn Document>,
            Arc::new(TokioTimers::new()),
        )
    }

    #[test]
    fn test_parse_names() {
        for effect in Effect::ALL {
            assert_eq!(effect.as_str().parse::<Effect>().unwrap(), effect);
        }
        assert!("spin".parse::<Effect>().unwrap_err().to_string().contains("spin"));
        assert!("FadeIn".parse::<Effect>().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fade_in_sets_end_state_then_reverts() {
        let doc = Arc::new(MemoryDocument::new());
        let div = doc.append(doc.body(), "div", &[]);
        doc.set_style(div, StyleProperty::Opacity, "0.5");
        let engine = engine(&doc);

        engine.apply(div, Effect::FadeIn, Duration::from_millis(200));

        assert_eq!(doc.style(div, StyleProperty::Opacity), "1");
        assert_eq!(
            doc.style(div, StyleProperty::Transition),
            "opacity 200ms ease-in-out"
        );
        assert!(doc.layout_flushes() >= 1);

        sleep(Duration::from_millis(201)).await;

        assert_eq!(doc.style(div, StyleProperty::Opacity), "0.5");
        assert_eq!(doc.style(div, StyleProperty::Transition), "");
        assert_eq!(engine.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slide_down_uses_scroll_height() {
        let doc = Arc::new(MemoryDocument::new());
        let div = doc.append(doc.body(), "div", &[]);
        doc.set_layout(
            div,
            Layout {
                scroll_height: 120,
                ..Layout::default()
            },
        );
        let engine = engine(&doc);

        engine.apply(div, Effect::SlideDown, Duration::from_millis(100));

        assert_eq!(doc.style(div, StyleProperty::Height), "120px");
        assert_eq!(doc.style(div, StyleProperty::Overflow), "hidden");

        sleep(Duration::from_millis(150)).await;
        assert_eq!(doc.style(div, StyleProperty::Height), "");
        assert_eq!(doc.style(div, StyleProperty::Overflow), "");
    }

    #[tokio::test(start_paused = true)]
    async fn test_reapply_keeps_first_snapshot() {
        let doc = Arc::new(MemoryDocument::new());
        let div = doc.append(doc.body(), "div", &[]);
        doc.set_style(div, StyleProperty::Transform, "translateX(4px)");
        let engine = engine(&doc);

        engine.apply(div, Effect::ZoomIn, Duration::from_millis(100));
        sleep(Duration::from_millis(50)).await;
        engine.apply(div, Effect::Rotate, Duration::from_millis(100));

        sleep(Duration::from_millis(60)).await;
        assert_eq!(doc.style(div, StyleProperty::Transform), "rotate(360deg)");

        sleep(Duration::from_millis(50)).await;
        assert_eq!(doc.style(div, StyleProperty::Transform), "translateX(4px)");
        assert_eq!(engine.pending(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_overlapping_reverts_restore_original_styles() {
        let doc = Arc::new(MemoryDocument::new());
        let div = doc.append(doc.body(), "div", &[]);
        doc.set_style(div, StyleProperty::Opacity, "0.3");
        let engine = engine(&doc);

        let workers: Vec<_> = (0..4)
            .map(|_| {
                let engine = engine.clone();
                tokio::spawn(async move {
                    for _ in 0..25 {
                        engine.apply(div, Effect::FadeIn, Duration::from_millis(1));
                        sleep(Duration::from_millis(1)).await;
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.await.unwrap();
        }

        sleep(Duration::from_millis(50)).await;
        assert_eq!(doc.style(div, StyleProperty::Opacity), "0.3");
        assert_eq!(doc.style(div, StyleProperty::Transition), "");
        assert_eq!(engine.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_keeps_end_state() {
        let doc = Arc::new(MemoryDocument::new());
        let div = doc.append(doc.body(), "div", &[]);
        let engine = engine(&doc);

        engine.apply(div, Effect::FadeOut, Duration::from_millis(100));
        engine.cancel(div);
        sleep(Duration::from_millis(200)).await;

        assert_eq!(doc.style(div, StyleProperty::Opacity), "0");
        assert_eq!(engine.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_detached_node_is_not_reverted() {
        let doc = Arc::new(MemoryDocument::new());
        let parent = doc.append(doc.body(), "div", &[]);
        let child = doc.append(parent, "span", &[]);
        let engine = engine(&doc);

        engine.apply(child, Effect::FadeIn, Duration::from_millis(100));
        doc.set_inner_html(parent, "<p>replaced</p>");
        sleep(Duration::from_millis(150)).await;

        assert_eq!(doc.style(child, StyleProperty::Opacity), "1");
        assert_eq!(engine.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_all() {
        let doc = Arc::new(MemoryDocument::new());
        let a = doc.append(doc.body(), "div", &[]);
        let b = doc.append(doc.body(), "div", &[]);
        let engine = engine(&doc);

        engine.apply(a, Effect::FadeIn, Duration::from_millis(100));
        engine.apply(b, Effect::FadeIn, Duration::from_millis(100));
        assert_eq!(engine.pending(), 2);

        engine.cancel_all();
        assert_eq!(engine.pending(), 0);
    }
}
