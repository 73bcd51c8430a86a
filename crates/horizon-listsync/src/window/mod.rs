//! Window lifecycle bookkeeping.
//!
//! The host toolkit owns windows, rendering and input. This module tracks the
//! state around them: which window initialised last, what background is on
//! screen, which properties are overridden, and when a timed property should
//! revert.
//!
//! # Core Components
//!
//! - [`HostWindow`]: The interface a host window implements
//! - [`WindowContext`]: Process-wide state shared by every window
//! - [`WindowLifecycle`]: Open/close/re-init state of one window or dialog
//! - [`BackgroundCrossfade`]: Background layer properties
//! - [`PropertyScope`] and [`GlobalPropertyScope`]: Overrides restored on drop
//! - [`PropertyTimer`]: A property that reverts after a timeout
//! - [`MultiWindow`]: Cycling between a fixed set of windows
//!
//! [`HeadlessWindow`] implements [`HostWindow`] without a screen.

mod background;
mod context;
mod headless;
mod host;
mod lifecycle;
mod multi_window;
mod property_scope;
mod property_timer;

pub use background::{BACKGROUND_PROPERTY, BACKGROUND_STATIC_PROPERTY, BackgroundCrossfade};
pub use context::{GLOBAL_WINDOW_ID, WindowContext};
pub use headless::{HOME_WINDOW_ID, HeadlessWindow};
pub use host::{HostWindow, PropertyTarget};
pub use lifecycle::{
    CUSTOM_WINDOW_ID_BASE, InitOutcome, LifecycleOptions, LifecycleState, WindowKind,
    WindowLifecycle,
};
pub use multi_window::{MultiWindow, NextWindow};
pub use property_scope::{GlobalPropertyScope, PropertyScope};
pub use property_timer::{CloseHook, PropertyTimer, PropertyTimerBuilder, TimerCallback, TimerInit};
