//! In-memory list control.
//!
//! [`MemoryListControl`] behaves like a host list control without a screen:
//! it keeps rows in order, tracks a selection cursor and a scrolled viewport,
//! and records which rows were fetched and how often each row was written.
//! Headless hosts can drive a [`ManagedList`](super::ManagedList) with it and
//! tests use the recordings to check refresh bounds.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::Mutex;

use horizon_listsync_core::ControlError;

use super::control::{ContextMenuEntry, ListControl, NativeRow, RowData, RowHandle};

/// Default number of rows that fit in the simulated viewport.
pub const DEFAULT_VISIBLE_ROWS: usize = 10;

/// A row held by a [`MemoryListControl`].
pub struct MemoryRow {
    data: Mutex<RowData>,
    alive: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryRow {
    fn new(data: RowData) -> Self {
        Self {
            data: Mutex::new(data),
            alive: AtomicBool::new(true),
            writes: AtomicUsize::new(0),
        }
    }

    /// Copy of the row's current fields.
    pub fn snapshot(&self) -> RowData {
        self.data.lock().clone()
    }

    /// Number of field writes applied to this row.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Returns `false` once the row was removed from its control.
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    fn release(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }

    fn write(&self, apply: impl FnOnce(&mut RowData)) -> Result<(), ControlError> {
        if !self.is_alive() {
            return Err(ControlError::host("row was removed from its control"));
        }
        apply(&mut self.data.lock());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl NativeRow for MemoryRow {
    fn set_label(&self, label: &str) -> Result<(), ControlError> {
        self.write(|d| d.label = label.to_string())
    }

    fn set_label2(&self, label: &str) -> Result<(), ControlError> {
        self.write(|d| d.label2 = label.to_string())
    }

    fn set_art(&self, icon: &str, thumbnail: &str) -> Result<(), ControlError> {
        self.write(|d| {
            d.icon = icon.to_string();
            d.thumbnail = thumbnail.to_string();
        })
    }

    fn set_path(&self, path: &str) -> Result<(), ControlError> {
        self.write(|d| d.path = path.to_string())
    }

    fn set_property(&self, key: &str, value: &str) -> Result<(), ControlError> {
        self.write(|d| {
            d.properties.insert(key.to_string(), value.to_string());
        })
    }

    fn property(&self, key: &str) -> String {
        self.data
            .lock()
            .properties
            .get(key)
            .cloned()
            .unwrap_or_default()
    }

    fn add_context_menu_items(
        &self,
        items: &[ContextMenuEntry],
        replace: bool,
    ) -> Result<(), ControlError> {
        self.write(|d| {
            if replace {
                d.context_menu.clear();
            }
            d.context_menu.extend_from_slice(items);
        })
    }

    fn set_selected(&self, selected: bool) -> Result<(), ControlError> {
        self.write(|d| d.selected = selected)
    }

    fn is_selected(&self) -> bool {
        self.data.lock().selected
    }
}

#[derive(Default)]
struct MemoryState {
    rows: Vec<Arc<MemoryRow>>,
    selected: Option<usize>,
    top: usize,
    reported: Option<Option<usize>>,
    fetched: Vec<usize>,
    selects: Vec<usize>,
}

/// A headless list control backed by a `Vec` of rows.
pub struct MemoryListControl {
    control_id: u32,
    visible_rows: usize,
    state: Mutex<MemoryState>,
    destroyed: AtomicBool,
    visible: AtomicBool,
    focused: AtomicBool,
}

impl MemoryListControl {
    /// Create an empty control with the default viewport height.
    pub fn new(control_id: u32) -> Self {
        Self::with_visible_rows(control_id, DEFAULT_VISIBLE_ROWS)
    }

    /// Create an empty control showing `visible_rows` rows at a time.
    pub fn with_visible_rows(control_id: u32, visible_rows: usize) -> Self {
        Self {
            control_id,
            visible_rows: visible_rows.max(1),
            state: Mutex::new(MemoryState::default()),
            destroyed: AtomicBool::new(false),
            visible: AtomicBool::new(true),
            focused: AtomicBool::new(false),
        }
    }

    /// Simulate the hosting window being torn down. Every later call fails
    /// with [`ControlError::MissingControl`] and existing rows stop accepting
    /// writes.
    pub fn destroy(&self) {
        self.destroyed.store(true, Ordering::SeqCst);
        for row in &self.state.lock().rows {
            row.release();
        }
    }

    /// Make the control report `position` as selected until the next
    /// `select` call, even if it is out of range.
    pub fn set_reported_selection(&self, position: Option<usize>) {
        self.state.lock().reported = Some(position);
    }

    /// Set the visibility flag reported through [`ListControl::is_visible`].
    pub fn set_visible(&self, visible: bool) {
        self.visible.store(visible, Ordering::SeqCst);
    }

    /// Set the focus flag reported through [`ListControl::has_focus`].
    pub fn set_focus(&self, focused: bool) {
        self.focused.store(focused, Ordering::SeqCst);
    }

    /// Indices passed to [`ListControl::row`], in call order.
    pub fn fetched_rows(&self) -> Vec<usize> {
        self.state.lock().fetched.clone()
    }

    /// Return and clear the fetch log.
    pub fn take_fetched_rows(&self) -> Vec<usize> {
        std::mem::take(&mut self.state.lock().fetched)
    }

    /// Indices passed to [`ListControl::select`], in call order.
    pub fn select_calls(&self) -> Vec<usize> {
        self.state.lock().selects.clone()
    }

    /// Clear the fetch and select logs.
    pub fn clear_logs(&self) {
        let mut state = self.state.lock();
        state.fetched.clear();
        state.selects.clear();
    }

    /// Copy of the row at `index`.
    pub fn row_snapshot(&self, index: usize) -> Option<RowData> {
        self.state.lock().rows.get(index).map(|r| r.snapshot())
    }

    /// Primary labels of every row, in display order.
    pub fn labels(&self) -> Vec<String> {
        self.state
            .lock()
            .rows
            .iter()
            .map(|r| r.data.lock().label.clone())
            .collect()
    }

    /// A property of the row at `index`, `""` if unset or out of range.
    pub fn row_property(&self, index: usize, key: &str) -> String {
        self.state
            .lock()
            .rows
            .get(index)
            .map(|r| r.property(key))
            .unwrap_or_default()
    }

    /// Field writes applied to the row at `index`.
    pub fn row_writes(&self, index: usize) -> usize {
        self.state
            .lock()
            .rows
            .get(index)
            .map(|r| r.write_count())
            .unwrap_or(0)
    }

    /// Field writes applied across all current rows.
    pub fn total_row_writes(&self) -> usize {
        self.state.lock().rows.iter().map(|r| r.write_count()).sum()
    }

    fn check_alive(&self) -> Result<(), ControlError> {
        if self.destroyed.load(Ordering::SeqCst) {
            return Err(ControlError::MissingControl {
                control_id: self.control_id,
            });
        }
        Ok(())
    }

    fn scroll_to(&self, state: &mut MemoryState, index: usize) {
        if index < state.top {
            state.top = index;
        } else if index >= state.top + self.visible_rows {
            state.top = index + 1 - self.visible_rows;
        }
    }
}

impl ListControl for MemoryListControl {
    fn control_id(&self) -> u32 {
        self.control_id
    }

    fn add_row(&self, row: RowData) -> Result<(), ControlError> {
        self.check_alive()?;
        let mut state = self.state.lock();
        state.rows.push(Arc::new(MemoryRow::new(row)));
        if state.selected.is_none() {
            state.selected = Some(0);
            state.top = 0;
        }
        Ok(())
    }

    fn row(&self, index: usize) -> Result<RowHandle, ControlError> {
        self.check_alive()?;
        let mut state = self.state.lock();
        state.fetched.push(index);
        match state.rows.get(index) {
            Some(row) => Ok(row.clone() as RowHandle),
            None => Err(ControlError::StaleRow { index }),
        }
    }

    fn remove_row(&self, index: usize) -> Result<(), ControlError> {
        self.check_alive()?;
        let mut state = self.state.lock();
        if index >= state.rows.len() {
            return Err(ControlError::StaleRow { index });
        }
        state.rows.remove(index).release();

        let len = state.rows.len();
        if len == 0 {
            state.selected = None;
            state.top = 0;
        } else if let Some(selected) = state.selected {
            if selected >= len {
                state.selected = Some(len - 1);
            }
            state.top = state.top.min(len - 1);
        }
        Ok(())
    }

    fn select(&self, index: usize) -> Result<(), ControlError> {
        self.check_alive()?;
        let mut state = self.state.lock();
        state.selects.push(index);
        state.reported = None;
        if index >= state.rows.len() {
            return Ok(());
        }
        state.selected = Some(index);
        self.scroll_to(&mut state, index);
        Ok(())
    }

    fn selected_position(&self) -> Option<usize> {
        let state = self.state.lock();
        match state.reported {
            Some(reported) => reported,
            None => state.selected,
        }
    }

    fn size(&self) -> usize {
        self.state.lock().rows.len()
    }

    fn reset(&self) -> Result<(), ControlError> {
        self.check_alive()?;
        let mut state = self.state.lock();
        for row in state.rows.drain(..) {
            row.release();
        }
        state.selected = None;
        state.top = 0;
        state.reported = None;
        Ok(())
    }

    fn view_position(&self) -> usize {
        let state = self.state.lock();
        state
            .selected
            .map(|s| s.saturating_sub(state.top))
            .unwrap_or(0)
    }

    fn is_visible(&self) -> bool {
        self.visible.load(Ordering::SeqCst)
    }

    fn has_focus(&self) -> bool {
        self.focused.load(Ordering::SeqCst)
    }
}

static_assertions::assert_impl_all!(MemoryListControl: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;

    fn labelled(label: &str) -> RowData {
        RowData {
            label: label.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_first_row_selects_zero() {
        let control = MemoryListControl::new(1);
        assert_eq!(control.selected_position(), None);
        control.add_row(labelled("a")).unwrap();
        control.add_row(labelled("b")).unwrap();
        assert_eq!(control.selected_position(), Some(0));
        assert_eq!(control.size(), 2);
    }

    #[test]
    fn test_remove_clamps_selection() {
        let control = MemoryListControl::new(1);
        control
            .add_rows(vec![labelled("a"), labelled("b"), labelled("c")])
            .unwrap();
        control.select(2).unwrap();
        let row = control.row(2).unwrap();

        control.remove_row(2).unwrap();
        assert_eq!(control.selected_position(), Some(1));
        assert!(row.set_label("late").is_err());
        assert_eq!(control.remove_row(5), Err(ControlError::StaleRow { index: 5 }));
    }

    #[test]
    fn test_viewport_scrolls_with_selection() {
        let control = MemoryListControl::with_visible_rows(1, 3);
        control
            .add_rows((0..10).map(|i| labelled(&i.to_string())).collect())
            .unwrap();
        control.select(5).unwrap();
        // Rows 3..=5 visible with 5 at the bottom.
        assert_eq!(control.view_position(), 2);
        control.select(4).unwrap();
        assert_eq!(control.view_position(), 1);
        control.select(0).unwrap();
        assert_eq!(control.view_position(), 0);
    }

    #[test]
    fn test_reported_selection_override() {
        let control = MemoryListControl::new(1);
        control.add_row(labelled("a")).unwrap();
        control.set_reported_selection(Some(7));
        assert_eq!(control.selected_position(), Some(7));
        control.select(0).unwrap();
        assert_eq!(control.selected_position(), Some(0));
    }

    #[test]
    fn test_destroyed_control_fails() {
        let control = MemoryListControl::new(9);
        control.add_row(labelled("a")).unwrap();
        let row = control.row(0).unwrap();
        control.destroy();

        assert!(matches!(control.row(0), Err(error) if error.is_missing_control()));
        assert!(control.add_row(labelled("b")).is_err());
        assert!(row.set_label("x").is_err());
    }

    #[test]
    fn test_fetch_log_and_write_counts() {
        let control = MemoryListControl::new(1);
        control.add_rows(vec![labelled("a"), labelled("b")]).unwrap();
        let row = control.row(1).unwrap();
        row.set_label("B").unwrap();
        row.set_property("k", "v").unwrap();

        assert_eq!(control.fetched_rows(), vec![1]);
        assert_eq!(control.row_writes(1), 2);
        assert_eq!(control.row_writes(0), 0);
        assert_eq!(control.row_property(1, "k"), "v");
        assert_eq!(control.take_fetched_rows(), vec![1]);
        assert!(control.fetched_rows().is_empty());
    }
}
