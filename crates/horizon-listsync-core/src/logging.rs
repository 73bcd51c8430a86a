//! Logging facilities for Horizon ListSync.
//!
//! Horizon ListSync uses the `tracing` crate for instrumentation. To see logs,
//! install a tracing subscriber in your application:
//!
//! ```ignore
//! fn main() {
//!     tracing_subscriber::fmt()
//!         .with_env_filter("horizon_listsync::list=debug")
//!         .init();
//! }
//! ```
//!
//! Every subsystem logs under one of the [`targets`] so a host can turn a
//! single layer up without drowning in the rest.

/// Span names used throughout Horizon ListSync for tracing.
pub mod span_names {
    /// Structural list mutation span.
    pub const LIST_MUTATION: &str = "horizon_listsync::list_mutation";
    /// Row refresh span.
    pub const REFRESH: &str = "horizon_listsync::refresh";
    /// UI task processing span.
    pub const TASK: &str = "horizon_listsync::task";
}

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Core crate target.
    pub const CORE: &str = "horizon_listsync_core";
    /// Signal system target.
    pub const SIGNAL: &str = "horizon_listsync_core::signal";
    /// Posted UI task queue target.
    pub const TASK: &str = "horizon_listsync_core::task";
    /// Shared property store target.
    pub const PROPERTY: &str = "horizon_listsync_core::property";
    /// Managed list engine target.
    pub const LIST: &str = "horizon_listsync::list";
    /// Managed item target.
    pub const ITEM: &str = "horizon_listsync::item";
    /// Window lifecycle target.
    pub const WINDOW: &str = "horizon_listsync::window";
    /// Property timer target.
    pub const TIMER: &str = "horizon_listsync::timer";
}

/// Guard for a performance tracing span.
///
/// The span stays entered until the guard is dropped, so wrapping a refresh
/// pass in a `PerfSpan` shows its duration in any timing-aware subscriber.
pub struct PerfSpan {
    #[allow(dead_code)]
    span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Create a new performance span.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!(target: "horizon_listsync::perf", "perf", operation = name);
        Self {
            span: span.entered(),
        }
    }
}
