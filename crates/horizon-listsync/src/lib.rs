//! Horizon ListSync - managed lists over host toolkit list controls.
//!
//! The host toolkit owns the event loop, rendering and the on-screen list
//! control. This crate owns the ordered items behind it and keeps the two in
//! step: identities, selection, visible window and partial refreshes.
//!
//! - [`model`]: Items, the managed list engine and the native control interface
//! - [`window`]: Window lifecycle, backgrounds, property scopes and timers
//! - [`config`]: TOML-loadable list and window settings
//!
//! Core plumbing (signals, property store, UI task queue, errors) is
//! re-exported from `horizon-listsync-core`.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use horizon_listsync::model::{ManagedItem, ManagedList, MemoryListControl};
//!
//! let control = Arc::new(MemoryListControl::new(101));
//! let list = ManagedList::new(control.clone(), 9);
//!
//! list.add_items([ManagedItem::new("A"), ManagedItem::new("B"), ManagedItem::new("C")]);
//! list.set_selected_position(2);
//! list.insert_item(0, ManagedItem::new("D"));
//!
//! assert_eq!(control.labels(), ["D", "A", "B", "C"]);
//! assert_eq!(list.selected_position(), Some(3));
//! ```

pub use horizon_listsync_core::*;

pub mod config;
pub mod model;
pub mod window;
