//! Display surfaces the widget renders into
//!
//! These are the stand-ins for the two page elements the widget owns: a
//! numeric display for the mirrored tally and a clickable visual whose
//! frame source is swapped between resting and active representations.
//! The widget only ever pushes resolved strings; hosts decide how to
//! render them.

/// Numeric display target for the mirrored count
pub trait CounterDisplay: Send + Sync {
    /// Replace the visible text with an already-formatted tally
    fn set_text(&self, text: &str);
}

/// Clickable visual target
///
/// Receives fully resolved frame sources: the resting source verbatim,
/// or the active source with a cache-bust query appended so the
/// animation restarts from its first frame.
pub trait SpinSurface: Send + Sync {
    /// Swap the visual to the given frame source
    fn set_source(&self, source: &str);
}
