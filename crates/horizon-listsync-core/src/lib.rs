//! Core systems for Horizon ListSync.
//!
//! This crate provides the plumbing shared by the list engine and the window
//! layer:
//!
//! - **Signals**: Type-safe change notifications ([`Signal`])
//! - **Property store**: Shared string key-value state written by background
//!   work and read by the UI thread ([`PropertyStore`])
//! - **UI task queue**: Cross-thread handoff of deferred results
//!   ([`UiTaskQueue`])
//! - **Errors**: Native-control, item and configuration errors
//! - **Logging**: `tracing` targets for per-subsystem filtering
//!
//! # Signal Example
//!
//! ```
//! use horizon_listsync_core::Signal;
//!
//! let selection_changed = Signal::<Option<usize>>::new();
//! selection_changed.connect(|pos| println!("selected: {pos:?}"));
//! selection_changed.emit(Some(3));
//! ```

mod error;
pub mod logging;
pub mod property;
pub mod signal;
pub mod task;

pub use error::{
    ConfigError, ControlError, ItemError, ListSyncError, Result, SignalError,
};
pub use logging::PerfSpan;
pub use property::PropertyStore;
pub use signal::{ConnectionId, Signal};
pub use task::{TaskId, UiTaskQueue, UiTaskSender};
