//! Managed list model.
//!
//! This module keeps an ordered collection of lightweight items consistent
//! with a host toolkit's native list control.
//!
//! # Core Components
//!
//! - [`ManagedItem`]: One list entry (labels, art, properties, caller data)
//! - [`ManagedList`]: The ordered collection mirrored into a native control
//! - [`ViewHandle`]: An item's lazily bound native row
//! - [`ViewportTracker`]: Visible-window arithmetic
//! - [`IdentityAllocator`]: Monotonic identity tokens for staleness checks
//!
//! # Host Interface
//!
//! Hosts implement [`ListControl`] and [`NativeRow`] over their own widgets.
//! [`MemoryListControl`] is a complete headless implementation.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use horizon_listsync::model::{ManagedItem, ManagedList, MemoryListControl};
//!
//! let control = Arc::new(MemoryListControl::new(101));
//! let list = ManagedList::new(control.clone(), 9);
//! list.add_items([ManagedItem::new("A"), ManagedItem::new("B"), ManagedItem::new("C")]);
//!
//! list.set_selected_position(2);
//! list.remove_item(2);
//! assert_eq!(list.selected_position(), Some(1));
//! ```

mod control;
mod identity;
mod item;
mod managed_list;
mod memory;
mod view;
mod viewport;

pub use control::{ContextMenuEntry, ListControl, NativeRow, RowData, RowHandle};
pub use identity::{ID_PROPERTY, INDEX_PROPERTY, IdentityAllocator, ItemId};
pub use item::{DataSource, ManagedItem};
pub use managed_list::{ListSignals, ManagedList, SortFn};
pub use memory::{DEFAULT_VISIBLE_ROWS, MemoryListControl, MemoryRow};
pub use view::ViewHandle;
pub use viewport::{ShiftPlan, ViewportTracker};
