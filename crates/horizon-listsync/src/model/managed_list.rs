//! The managed list synchronization engine.
//!
//! [`ManagedList`] owns an ordered sequence of [`ManagedItem`]s and mirrors
//! every structural change into one native [`ListControl`]. The list is the
//! source of truth for which item sits at which position; the control is the
//! source of truth for the selection cursor and the scroll offset.
//!
//! After every mutating operation the list length equals the control's row
//! count and position `i` is displayed by native row `i`.
//!
//! # Refresh bounds
//!
//! Rows are rewritten only where their content may have changed:
//!
//! | Operation            | Rows rewritten                |
//! |----------------------|-------------------------------|
//! | `add_item(s)`        | none (rows are created filled) |
//! | `insert_item(k, _)`  | `k..len`                      |
//! | `move_item(_, d)`    | `min(src, d)..=max(src, d)`   |
//! | `swap_items(a, b)`   | `a` and `b` through their own rows |
//! | `replace_item(k, _)` | `k`                           |
//! | `sort`, `reverse`, `replace_items`, `new_control` | every row |
//!
//! # Failure handling
//!
//! Native control failures are logged and turn the operation into a no-op
//! that returns `false`. The logical sequence stays usable so a caller can
//! rebind the list to a fresh control with [`ManagedList::re_init`] or
//! [`ManagedList::new_control`].
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
//! list.add_items(["A", "B", "C"].map(ManagedItem::new));
//! list.insert_item(0, ManagedItem::new("D"));
//! assert_eq!(control.labels(), ["D", "A", "B", "C"]);
//! ```

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::ops::Range;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use horizon_listsync_core::logging::{span_names, targets};
use horizon_listsync_core::{ControlError, PerfSpan, Signal};

use super::control::{ListControl, RowData, RowHandle};
use super::identity::{ID_PROPERTY, INDEX_PROPERTY, IdentityAllocator, ItemId};
use super::item::{DataSource, DestroyHook, ItemOwner, ManagedItem};
use super::view::ViewHandle;
use super::viewport::ViewportTracker;
use crate::config::ListConfig;
use crate::window::HostWindow;

/// Comparator used to sort a list.
pub type SortFn = Arc<dyn Fn(&ManagedItem, &ManagedItem) -> Ordering + Send + Sync>;

/// Change notifications emitted by a [`ManagedList`].
///
/// Signals fire after the list has released its internal lock, so slots may
/// call back into the list. Row ranges are inclusive `(first, last)`.
#[derive(Default)]
pub struct ListSignals {
    /// Rows were inserted.
    pub rows_inserted: Signal<(usize, usize)>,
    /// Rows were removed.
    pub rows_removed: Signal<(usize, usize)>,
    /// One row moved. Args: (source, destination)
    pub rows_moved: Signal<(usize, usize)>,
    /// Two rows exchanged their native rows.
    pub rows_swapped: Signal<(usize, usize)>,
    /// Rows were rewritten from their items.
    pub data_changed: Signal<(usize, usize)>,
    /// The whole sequence was reordered.
    pub layout_changed: Signal<()>,
    /// Every item was dropped.
    pub model_reset: Signal<()>,
    /// The list moved the control's selection cursor.
    pub selection_changed: Signal<Option<usize>>,
    /// The list was bound to a new native control. Args: control id
    pub control_rebound: Signal<u32>,
}

enum ListEvent {
    Inserted(usize, usize),
    Removed(usize, usize),
    Moved(usize, usize),
    Swapped(usize, usize),
    DataChanged(usize, usize),
    LayoutChanged,
    Reset,
    Selection(Option<usize>),
    Rebound(u32),
}

/// Work deferred until the state lock is released.
#[derive(Default)]
struct Pending {
    events: Vec<ListEvent>,
    hooks: Vec<DestroyHook>,
}

struct ListState {
    control: Arc<dyn ListControl>,
    items: Vec<ManagedItem>,
    property_keys: BTreeSet<String>,
    ids: IdentityAllocator,
    viewport: ViewportTracker,
    sort_key: Option<SortFn>,
    data_source: Option<DataSource>,
}

impl ListState {
    fn position_of(&self, item: &ManagedItem) -> Option<usize> {
        self.items.iter().position(|i| i.ptr_eq(item))
    }

    /// Selected position, clamped to the last row when the control reports
    /// a stale position.
    fn selected(&self) -> Option<usize> {
        let size = self.items.len();
        if size == 0 {
            return None;
        }
        match self.control.selected_position() {
            Some(pos) if pos < size => Some(pos),
            _ => Some(size - 1),
        }
    }

    fn select(&self, pos: usize, pending: &mut Pending) -> bool {
        match self.control.select(pos) {
            Ok(()) => {
                pending.events.push(ListEvent::Selection(Some(pos)));
                true
            }
            Err(error) => {
                tracing::warn!(target: targets::LIST, pos, %error, "failed to select row");
                false
            }
        }
    }

    fn attach(&mut self, item: &ManagedItem, owner: &Weak<dyn ItemOwner>) -> Option<RowData> {
        match item.attach(&mut self.ids, owner.clone()) {
            Ok(data) => {
                self.property_keys.extend(
                    data.properties
                        .keys()
                        .filter(|k| k.as_str() != ID_PROPERTY)
                        .cloned(),
                );
                Some(data)
            }
            Err(error) => {
                tracing::debug!(target: targets::LIST, ?item, %error, "item rejected");
                None
            }
        }
    }

    /// Append items and materialize their rows in order.
    fn push(
        &mut self,
        items: Vec<ManagedItem>,
        owner: &Weak<dyn ItemOwner>,
        pending: &mut Pending,
    ) -> bool {
        let start = self.items.len();
        let mut accepted = true;
        let mut rows = Vec::with_capacity(items.len());
        for item in items {
            match self.attach(&item, owner) {
                Some(data) => {
                    rows.push(data);
                    self.items.push(item);
                }
                None => accepted = false,
            }
        }
        if rows.is_empty() {
            return accepted;
        }

        let end = self.items.len();
        let materialized = match self.control.add_rows(rows) {
            Ok(()) => true,
            Err(error) => {
                tracing::warn!(target: targets::LIST, %error, "failed to add native rows");
                false
            }
        };
        pending.events.push(ListEvent::Inserted(start, end - 1));
        if start == 0 {
            pending.events.push(ListEvent::Selection(self.selected()));
        }
        accepted && materialized
    }

    fn remove(&mut self, index: usize, pending: &mut Pending) -> bool {
        if index >= self.items.len() {
            tracing::debug!(target: targets::LIST, index, len = self.items.len(), "remove out of range");
            return false;
        }

        // Invalidate first so nothing can write to the row being removed.
        let item = self.items.remove(index);
        pending.hooks.extend(item.invalidate());
        pending.events.push(ListEvent::Removed(index, index));

        if let Err(error) = self.control.remove_row(index) {
            tracing::warn!(target: targets::LIST, index, %error, "failed to remove native row");
            return false;
        }

        let size = self.items.len();
        if size == 0 {
            pending.events.push(ListEvent::Selection(None));
            return true;
        }
        self.select(index.min(size - 1), pending);
        true
    }

    /// Rewrite rows in `range` from their items, fetching each row fresh.
    fn refresh(&mut self, range: Range<usize>, pending: &mut Pending) -> bool {
        let range = range.start..range.end.min(self.items.len());
        if range.is_empty() {
            return true;
        }
        let _span = PerfSpan::new(span_names::REFRESH);
        self.property_keys.insert(INDEX_PROPERTY.to_string());

        for index in range.clone() {
            let row = match self.control.row(index) {
                Ok(row) => row,
                Err(error) if error.is_missing_control() => {
                    tracing::warn!(target: targets::LIST, %error, "refresh aborted");
                    return false;
                }
                Err(error) => {
                    tracing::debug!(target: targets::LIST, index, %error, "skipping row");
                    continue;
                }
            };
            if let Err(error) = self.items[index].bind_row(row, &self.property_keys, index) {
                tracing::warn!(target: targets::LIST, index, %error, "row update failed");
                if error.is_missing_control() {
                    return false;
                }
            }
        }
        pending
            .events
            .push(ListEvent::DataChanged(range.start, range.end - 1));
        true
    }

    /// Rewrite one row through the item's current view, fetching the row
    /// only if the item has none bound.
    fn rewrite(&self, index: usize) -> bool {
        let item = &self.items[index];
        let row = match item.view() {
            ViewHandle::Bound(row) => row,
            ViewHandle::Suspended => return true,
            ViewHandle::Detached => match self.control.row(index) {
                Ok(row) => row,
                Err(error) => {
                    tracing::warn!(target: targets::LIST, index, %error, "row lookup failed");
                    return false;
                }
            },
        };
        match item.bind_row(row, &self.property_keys, index) {
            Ok(()) => true,
            Err(error) => {
                tracing::warn!(target: targets::LIST, index, %error, "row update failed");
                false
            }
        }
    }
}

struct ListCore {
    state: RwLock<ListState>,
    signals: ListSignals,
}

impl ListCore {
    fn finish(&self, pending: Pending) {
        for hook in pending.hooks {
            hook();
        }
        let signals = &self.signals;
        for event in pending.events {
            match event {
                ListEvent::Inserted(first, last) => signals.rows_inserted.emit((first, last)),
                ListEvent::Removed(first, last) => signals.rows_removed.emit((first, last)),
                ListEvent::Moved(from, to) => signals.rows_moved.emit((from, to)),
                ListEvent::Swapped(a, b) => signals.rows_swapped.emit((a, b)),
                ListEvent::DataChanged(first, last) => signals.data_changed.emit((first, last)),
                ListEvent::LayoutChanged => signals.layout_changed.emit(()),
                ListEvent::Reset => signals.model_reset.emit(()),
                ListEvent::Selection(pos) => signals.selection_changed.emit(pos),
                ListEvent::Rebound(id) => signals.control_rebound.emit(id),
            }
        }
    }
}

impl ItemOwner for ListCore {
    fn position_of(&self, item: &ManagedItem) -> Option<usize> {
        self.state.read().position_of(item)
    }

    fn row_for(&self, item: &ManagedItem) -> Option<RowHandle> {
        let state = self.state.read();
        let pos = state.position_of(item)?;
        match state.control.row(pos) {
            Ok(row) => Some(row),
            Err(error) => {
                tracing::debug!(target: targets::LIST, pos, %error, "lazy row lookup failed");
                None
            }
        }
    }

    fn note_property_key(&self, key: &str) {
        if key == ID_PROPERTY || self.state.read().property_keys.contains(key) {
            return;
        }
        self.state.write().property_keys.insert(key.to_string());
    }

    fn property_keys(&self) -> Vec<String> {
        self.state.read().property_keys.iter().cloned().collect()
    }
}

/// An ordered collection of managed items mirrored into a native list control.
///
/// `ManagedList` is a cheap handle; clones share the same list.
#[derive(Clone)]
pub struct ManagedList {
    core: Arc<ListCore>,
}

impl fmt::Debug for ManagedList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.core.state.read();
        f.debug_struct("ManagedList")
            .field("control_id", &state.control.control_id())
            .field("len", &state.items.len())
            .field("max_view_index", &state.viewport.max_view_index())
            .finish()
    }
}

impl ManagedList {
    /// Create an empty list bound to `control`.
    ///
    /// `max_view_index` is the offset of the last row that fits in the
    /// viewport; zero disables [`shift_view`](Self::shift_view).
    pub fn new(control: Arc<dyn ListControl>, max_view_index: usize) -> Self {
        Self {
            core: Arc::new(ListCore {
                state: RwLock::new(ListState {
                    control,
                    items: Vec::new(),
                    property_keys: BTreeSet::new(),
                    ids: IdentityAllocator::new(),
                    viewport: ViewportTracker::new(max_view_index),
                    sort_key: None,
                    data_source: None,
                }),
                signals: ListSignals::default(),
            }),
        }
    }

    /// Create a list from configuration, pre-seeding its property key set.
    pub fn from_config(control: Arc<dyn ListControl>, config: &ListConfig) -> Self {
        let list = Self::new(control, config.max_view_index());
        list.core
            .state
            .write()
            .property_keys
            .extend(config.property_keys().iter().cloned());
        list
    }

    /// Create a list bound to the configured control of `window`.
    pub fn from_window(window: &dyn HostWindow, config: &ListConfig) -> Result<Self, ControlError> {
        let control_id = config.control_id();
        let control = window
            .list_control(control_id)
            .ok_or(ControlError::MissingControl { control_id })?;
        Ok(Self::from_config(control, config))
    }

    /// Attach caller data to the list itself.
    pub fn with_data_source(self, source: DataSource) -> Self {
        self.set_data_source(Some(source));
        self
    }

    /// Change notifications.
    pub fn signals(&self) -> &ListSignals {
        &self.core.signals
    }

    fn owner(&self) -> Weak<dyn ItemOwner> {
        let weak: Weak<ListCore> = Arc::downgrade(&self.core);
        weak
    }

    fn mutate<R>(&self, f: impl FnOnce(&mut ListState, &mut Pending) -> R) -> R {
        let _span = PerfSpan::new(span_names::LIST_MUTATION);
        let mut pending = Pending::default();
        let mut state = self.core.state.write();
        let result = f(&mut state, &mut pending);
        drop(state);
        self.core.finish(pending);
        result
    }

    // =========================================================================
    // Structural operations
    // =========================================================================

    /// Append one item.
    ///
    /// Fails if the item is invalidated or already belongs to a list.
    #[tracing::instrument(skip_all, target = "horizon_listsync::list", level = "trace")]
    pub fn add_item(&self, item: ManagedItem) -> bool {
        let owner = self.owner();
        self.mutate(|state, pending| state.push(vec![item], &owner, pending))
    }

    /// Append several items in order.
    ///
    /// Items that cannot be attached are skipped and the call returns `false`.
    #[tracing::instrument(skip_all, target = "horizon_listsync::list", level = "trace")]
    pub fn add_items(&self, items: impl IntoIterator<Item = ManagedItem>) -> bool {
        let owner = self.owner();
        let items: Vec<_> = items.into_iter().collect();
        self.mutate(|state, pending| state.push(items, &owner, pending))
    }

    /// Insert `item` at `index`, appending if `index` is past the end.
    ///
    /// Only rows from `index` to the end are rewritten. If the insertion
    /// lands at or before the selected row, the selection advances by one so
    /// the same item stays selected.
    #[tracing::instrument(skip(self, item), target = "horizon_listsync::list", level = "trace")]
    pub fn insert_item(&self, index: usize, item: ManagedItem) -> bool {
        let owner = self.owner();
        self.mutate(|state, pending| {
            if index >= state.items.len() {
                return state.push(vec![item], &owner, pending);
            }

            let selected = state.selected();
            let Some(data) = state.attach(&item, &owner) else {
                return false;
            };
            state.items.insert(index, item);
            // The control can only append; the shifted tail is rewritten below.
            if let Err(error) = state.control.add_row(data) {
                tracing::warn!(target: targets::LIST, index, %error, "failed to add native row");
                return false;
            }
            pending.events.push(ListEvent::Inserted(index, index));

            let end = state.items.len();
            let refreshed = state.refresh(index..end, pending);
            if let Some(selected) = selected {
                if index <= selected {
                    state.select(selected + 1, pending);
                }
            }
            refreshed
        })
    }

    /// Remove the item at `index`, invalidating it.
    ///
    /// The selection moves to `index`, or to the new last row if `index` is
    /// now past the end.
    #[tracing::instrument(skip(self), target = "horizon_listsync::list", level = "trace")]
    pub fn remove_item(&self, index: usize) -> bool {
        self.mutate(|state, pending| state.remove(index, pending))
    }

    /// Remove `item` wherever it is.
    pub fn remove_managed_item(&self, item: &ManagedItem) -> bool {
        self.mutate(|state, pending| match state.position_of(item) {
            Some(index) => state.remove(index, pending),
            None => false,
        })
    }

    /// Put `item` at `index` in place of the current item, which is
    /// invalidated. The native row is reused.
    #[tracing::instrument(skip(self, item), target = "horizon_listsync::list", level = "trace")]
    pub fn replace_item(&self, index: usize, item: ManagedItem) -> bool {
        let owner = self.owner();
        self.mutate(|state, pending| {
            if index >= state.items.len() {
                tracing::debug!(target: targets::LIST, index, "replace out of range");
                return false;
            }
            if state.attach(&item, &owner).is_none() {
                return false;
            }
            let old = std::mem::replace(&mut state.items[index], item);
            pending.hooks.extend(old.invalidate());
            state.refresh(index..index + 1, pending)
        })
    }

    /// Replace the whole sequence.
    ///
    /// Items present in both the old and the new sequence stay attached with
    /// their identity; the others are invalidated. Native rows are added or
    /// removed at the tail to match the new length, then every row is
    /// rewritten. The selection is kept if still valid, else clamped to the
    /// new last row.
    #[tracing::instrument(skip_all, target = "horizon_listsync::list", level = "trace")]
    pub fn replace_items(&self, items: impl IntoIterator<Item = ManagedItem>) -> bool {
        let owner = self.owner();
        let items: Vec<_> = items.into_iter().collect();
        self.mutate(|state, pending| {
            if state.items.is_empty() {
                return state.push(items, &owner, pending);
            }

            let old_size = state.items.len();
            let previous = std::mem::take(&mut state.items);
            let previous_keys: HashSet<usize> = previous.iter().map(ManagedItem::addr).collect();

            let mut accepted = true;
            let mut seen = HashSet::with_capacity(items.len());
            let mut next = Vec::with_capacity(items.len());
            for item in items {
                if !seen.insert(item.addr()) {
                    accepted = false;
                    continue;
                }
                if previous_keys.contains(&item.addr()) || state.attach(&item, &owner).is_some() {
                    next.push(item);
                } else {
                    accepted = false;
                }
            }
            for old in previous {
                if !seen.contains(&old.addr()) {
                    pending.hooks.extend(old.invalidate());
                }
            }
            state.items = next;

            let size = state.items.len();
            if size != old_size {
                let selected = state.control.selected_position();
                let resized = if size > old_size {
                    pending.events.push(ListEvent::Inserted(old_size, size - 1));
                    state
                        .control
                        .add_rows(vec![RowData::default(); size - old_size])
                } else {
                    pending.events.push(ListEvent::Removed(size, old_size - 1));
                    (size..old_size)
                        .rev()
                        .try_for_each(|index| state.control.remove_row(index))
                };
                if let Err(error) = resized {
                    tracing::warn!(target: targets::LIST, %error, "failed to resize native rows");
                    return false;
                }
                match selected {
                    Some(pos) if pos < size => {
                        state.select(pos, pending);
                    }
                    Some(_) if size > 0 => {
                        state.select(size - 1, pending);
                    }
                    _ if size == 0 => pending.events.push(ListEvent::Selection(None)),
                    _ => {}
                }
            }

            let refreshed = state.refresh(0..size, pending);
            accepted && refreshed
        })
    }

    /// Move `item` to `dest`, rewriting only the rows between the two
    /// positions. The selection cursor is not moved.
    #[tracing::instrument(skip(self, item), target = "horizon_listsync::list", level = "trace")]
    pub fn move_item(&self, item: &ManagedItem, dest: usize) -> bool {
        self.mutate(|state, pending| {
            let Some(source) = state.position_of(item) else {
                return false;
            };
            if dest >= state.items.len() {
                tracing::debug!(target: targets::LIST, dest, "move destination out of range");
                return false;
            }
            if source == dest {
                return true;
            }

            let moved = state.items.remove(source);
            state.items.insert(dest, moved);
            pending.events.push(ListEvent::Moved(source, dest));
            state.refresh(source.min(dest)..source.max(dest) + 1, pending)
        })
    }

    /// Exchange the items at two positions by swapping their native rows.
    ///
    /// No range refresh happens: each item is rewritten through the row it
    /// received. Returns `false` if either position is invalid.
    #[tracing::instrument(skip(self), target = "horizon_listsync::list", level = "trace")]
    pub fn swap_items(&self, pos1: usize, pos2: usize) -> bool {
        self.mutate(|state, pending| {
            let size = state.items.len();
            if pos1 >= size || pos2 >= size {
                return false;
            }
            if pos1 == pos2 {
                return true;
            }

            state.items.swap(pos1, pos2);
            let first = state.items[pos1].replace_view(ViewHandle::Detached);
            let second = state.items[pos2].replace_view(first);
            state.items[pos1].replace_view(second);

            let rewritten = state.rewrite(pos1) & state.rewrite(pos2);
            pending.events.push(ListEvent::Swapped(pos1, pos2));
            rewritten
        })
    }

    /// Set the comparator used by [`sort`](Self::sort).
    pub fn set_sort<F>(&self, compare: F)
    where
        F: Fn(&ManagedItem, &ManagedItem) -> Ordering + Send + Sync + 'static,
    {
        self.core.state.write().sort_key = Some(Arc::new(compare));
    }

    /// Sort with the comparator set by [`set_sort`](Self::set_sort).
    ///
    /// Returns `false` if no comparator was set.
    pub fn sort(&self, reverse: bool) -> bool {
        let Some(compare) = self.core.state.read().sort_key.clone() else {
            tracing::debug!(target: targets::LIST, "sort without comparator");
            return false;
        };
        self.sort_by(|a, b| compare(a, b), reverse)
    }

    /// Stable sort with `compare`, then rewrite every row.
    ///
    /// The comparator runs while the list is locked and must not call back
    /// into it (for example through [`ManagedItem::pos`]).
    #[tracing::instrument(skip_all, target = "horizon_listsync::list", level = "trace")]
    pub fn sort_by<F>(&self, compare: F, reverse: bool) -> bool
    where
        F: Fn(&ManagedItem, &ManagedItem) -> Ordering,
    {
        self.mutate(|state, pending| {
            if reverse {
                state.items.sort_by(|a, b| compare(b, a));
            } else {
                state.items.sort_by(|a, b| compare(a, b));
            }
            pending.events.push(ListEvent::LayoutChanged);
            let size = state.items.len();
            state.refresh(0..size, pending)
        })
    }

    /// Reverse the sequence, then rewrite every row.
    #[tracing::instrument(skip_all, target = "horizon_listsync::list", level = "trace")]
    pub fn reverse(&self) -> bool {
        self.mutate(|state, pending| {
            state.items.reverse();
            pending.events.push(ListEvent::LayoutChanged);
            let size = state.items.len();
            state.refresh(0..size, pending)
        })
    }

    /// Invalidate every item and clear the control. The list stays bound to
    /// the same control and its data source is dropped.
    #[tracing::instrument(skip_all, target = "horizon_listsync::list", level = "trace")]
    pub fn reset(&self) -> bool {
        self.mutate(|state, pending| {
            state.data_source = None;
            for item in state.items.drain(..) {
                pending.hooks.extend(item.invalidate());
            }
            pending.events.push(ListEvent::Reset);
            pending.events.push(ListEvent::Selection(None));
            match state.control.reset() {
                Ok(()) => true,
                Err(error) => {
                    tracing::warn!(target: targets::LIST, %error, "failed to reset control");
                    false
                }
            }
        })
    }

    /// Release every item's row binding without removing anything.
    ///
    /// Field writes are dropped until the next refresh rebinds the rows.
    /// Used when the hosting window is going away.
    pub fn invalidate_views(&self) {
        let state = self.core.state.read();
        for item in &state.items {
            item.replace_view(ViewHandle::Suspended);
        }
    }

    /// Bind to a new control and re-materialize every item on it in order,
    /// issuing fresh identity tokens.
    #[tracing::instrument(skip_all, target = "horizon_listsync::list", level = "trace")]
    pub fn re_init(&self, control: Arc<dyn ListControl>) -> bool {
        self.mutate(|state, pending| {
            let control_id = control.control_id();
            state.control = control;
            let ids = &mut state.ids;
            let rows: Vec<RowData> = state
                .items
                .iter()
                .filter_map(|item| item.reissue(ids))
                .collect();
            pending.events.push(ListEvent::Rebound(control_id));
            if rows.is_empty() {
                return true;
            }

            let count = rows.len();
            match state.control.add_rows(rows) {
                Ok(()) => {
                    pending.events.push(ListEvent::Inserted(0, count - 1));
                    true
                }
                Err(error) => {
                    tracing::warn!(target: targets::LIST, control_id, %error, "re-init failed");
                    false
                }
            }
        })
    }

    /// Bind to a new control by filling it with blank rows and rewriting
    /// every row. Identity tokens are kept.
    #[tracing::instrument(skip_all, target = "horizon_listsync::list", level = "trace")]
    pub fn new_control(&self, control: Arc<dyn ListControl>) -> bool {
        self.mutate(|state, pending| {
            let control_id = control.control_id();
            state.control = control;
            for item in &state.items {
                item.replace_view(ViewHandle::Detached);
            }
            pending.events.push(ListEvent::Rebound(control_id));

            let size = state.items.len();
            if size == 0 {
                return true;
            }
            if let Err(error) = state.control.add_rows(vec![RowData::default(); size]) {
                tracing::warn!(target: targets::LIST, control_id, %error, "failed to fill new control");
                return false;
            }
            pending.events.push(ListEvent::Inserted(0, size - 1));
            state.refresh(0..size, pending)
        })
    }

    /// Replace the caller data attached to the list.
    pub fn set_data_source(&self, source: Option<DataSource>) {
        self.core.state.write().data_source = source;
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Number of items.
    pub fn len(&self) -> usize {
        self.core.state.read().items.len()
    }

    /// Returns `true` if the list holds no items.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the items in display order.
    pub fn items(&self) -> Vec<ManagedItem> {
        self.core.state.read().items.clone()
    }

    /// The item at `pos`.
    pub fn item_at(&self, pos: usize) -> Option<ManagedItem> {
        self.core.state.read().items.get(pos).cloned()
    }

    /// The first item whose data source is `source` (compared by reference).
    pub fn item_by_data_source(&self, source: &DataSource) -> Option<ManagedItem> {
        self.core
            .state
            .read()
            .items
            .iter()
            .find(|item| {
                item.data_source()
                    .is_some_and(|own| Arc::ptr_eq(&own, source))
            })
            .cloned()
    }

    /// The item currently carrying identity token `id`.
    pub fn item_by_identity(&self, id: ItemId) -> Option<ManagedItem> {
        self.core
            .state
            .read()
            .items
            .iter()
            .find(|item| item.has_identity(id))
            .cloned()
    }

    /// Display position of `item`.
    pub fn position_of(&self, item: &ManagedItem) -> Option<usize> {
        self.core.state.read().position_of(item)
    }

    /// Returns `true` if `item` belongs to this list.
    pub fn contains(&self, item: &ManagedItem) -> bool {
        self.position_of(item).is_some()
    }

    /// Caller data attached to the list.
    pub fn data_source(&self) -> Option<DataSource> {
        self.core.state.read().data_source.clone()
    }

    /// Property names written to every refreshed row.
    pub fn property_keys(&self) -> Vec<String> {
        self.core.state.read().property_keys.iter().cloned().collect()
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// The selected position, clamped to the last row if the control reports
    /// a stale one. `None` for an empty list.
    pub fn selected_position(&self) -> Option<usize> {
        self.core.state.read().selected()
    }

    /// The selected item.
    pub fn selected_item(&self) -> Option<ManagedItem> {
        let state = self.core.state.read();
        state.selected().map(|pos| state.items[pos].clone())
    }

    /// Select `pos` if it is valid.
    pub fn set_selected_position(&self, pos: usize) -> bool {
        self.mutate(|state, pending| pos < state.items.len() && state.select(pos, pending))
    }

    /// Select `item` if it belongs to the list.
    pub fn set_selected_item(&self, item: &ManagedItem) -> bool {
        self.mutate(|state, pending| match state.position_of(item) {
            Some(pos) => state.select(pos, pending),
            None => false,
        })
    }

    /// Select the first item whose data source is `source`.
    pub fn set_selected_by_data_source(&self, source: &DataSource) -> bool {
        match self.item_by_data_source(source) {
            Some(item) => self.set_selected_item(&item),
            None => false,
        }
    }

    /// Returns `true` if `item` (or the selected item) is the last one.
    pub fn is_last_item(&self, item: Option<&ManagedItem>) -> bool {
        let state = self.core.state.read();
        let pos = match item {
            Some(item) => state.position_of(item),
            None => state.selected(),
        };
        pos.is_some_and(|pos| pos + 1 == state.items.len())
    }

    /// Returns `true` if the first row is selected.
    pub fn top_has_focus(&self) -> bool {
        self.selected_position() == Some(0)
    }

    /// Returns `true` if the last row is selected.
    pub fn bottom_has_focus(&self) -> bool {
        let state = self.core.state.read();
        !state.items.is_empty() && state.selected() == Some(state.items.len() - 1)
    }

    /// The position above the selection, or `0` at the top.
    pub fn prev_position(&self) -> usize {
        self.selected_position()
            .and_then(|pos| pos.checked_sub(1))
            .unwrap_or(0)
    }

    // =========================================================================
    // Viewport
    // =========================================================================

    /// Offset of the selected row from the top of the viewport.
    pub fn view_position(&self) -> usize {
        self.core.state.read().control.view_position()
    }

    /// The configured maximum visible row offset.
    pub fn max_view_index(&self) -> usize {
        self.core.state.read().viewport.max_view_index()
    }

    /// Rows currently scrolled into view.
    pub fn view_range(&self) -> Range<usize> {
        let state = self.core.state.read();
        let size = state.items.len();
        match state.selected() {
            Some(selected) => {
                state
                    .viewport
                    .view_range(selected, state.control.view_position(), size)
            }
            None => 0..0,
        }
    }

    /// Scroll the viewport by `delta` rows.
    ///
    /// The selection is pushed past the viewport edge so the host scrolls,
    /// then either restored (`hold_selected`) or settled on the row that
    /// keeps its on-screen offset. Returns `false` if nothing moved.
    #[tracing::instrument(skip(self), target = "horizon_listsync::list", level = "trace")]
    pub fn shift_view(&self, delta: isize, hold_selected: bool) -> bool {
        self.mutate(|state, pending| {
            let Some(selected) = state.selected() else {
                return false;
            };
            let view_position = state.control.view_position();
            let Some(plan) =
                state
                    .viewport
                    .plan_shift(selected, view_position, delta, state.items.len())
            else {
                return false;
            };

            state.select(plan.push, pending);
            if hold_selected {
                state.select(selected, pending);
            } else if let Some(settle) = plan.settle {
                state.select(settle, pending);
            }
            true
        })
    }

    // =========================================================================
    // Native control pass-through
    // =========================================================================

    /// The bound native control.
    pub fn control(&self) -> Arc<dyn ListControl> {
        self.core.state.read().control.clone()
    }

    /// The bound control's id.
    pub fn control_id(&self) -> u32 {
        self.core.state.read().control.control_id()
    }

    /// Whether the bound control is visible.
    pub fn is_visible(&self) -> bool {
        self.core.state.read().control.is_visible()
    }

    /// Whether the bound control has focus.
    pub fn has_focus(&self) -> bool {
        self.core.state.read().control.has_focus()
    }
}

static_assertions::assert_impl_all!(ManagedList: Send, Sync);
