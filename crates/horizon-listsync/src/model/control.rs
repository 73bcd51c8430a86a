//! Native list control interface.
//!
//! The host toolkit owns the on-screen list control and its rows. The list
//! engine only sees them through the two traits in this module:
//!
//! - [`ListControl`]: the control itself (row count, row lookup, selection,
//!   scroll position)
//! - [`NativeRow`]: one materialized row whose display fields can be written
//!
//! The control is the source of truth for selection and scroll offset; the
//! engine is the source of truth for which item sits at which row.

use std::collections::BTreeMap;
use std::sync::Arc;

use horizon_listsync_core::ControlError;

/// Shared handle to a native row.
pub type RowHandle = Arc<dyn NativeRow>;

/// A single context-menu entry attached to a row.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContextMenuEntry {
    /// Text shown in the menu.
    pub label: String,
    /// Host action executed when the entry is chosen.
    pub action: String,
}

impl ContextMenuEntry {
    /// Create a new entry.
    pub fn new(label: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            action: action.into(),
        }
    }
}

/// Snapshot of the display fields used to materialize a native row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowData {
    /// Primary label.
    pub label: String,
    /// Secondary label.
    pub label2: String,
    /// Icon art reference.
    pub icon: String,
    /// Thumbnail art reference.
    pub thumbnail: String,
    /// Path or URI.
    pub path: String,
    /// String properties.
    pub properties: BTreeMap<String, String>,
    /// Context-menu entries.
    pub context_menu: Vec<ContextMenuEntry>,
    /// Native selected flag.
    pub selected: bool,
}

/// A materialized row inside a host list control.
///
/// Rows are shared handles: the control keeps them in display order and the
/// engine may hold one per bound item. Every write can fail if the row was
/// removed or its window torn down.
pub trait NativeRow: Send + Sync {
    /// Set the primary label.
    fn set_label(&self, label: &str) -> Result<(), ControlError>;

    /// Set the secondary label.
    fn set_label2(&self, label: &str) -> Result<(), ControlError>;

    /// Set icon and thumbnail art.
    fn set_art(&self, icon: &str, thumbnail: &str) -> Result<(), ControlError>;

    /// Set the path or URI.
    fn set_path(&self, path: &str) -> Result<(), ControlError>;

    /// Set a string property.
    fn set_property(&self, key: &str, value: &str) -> Result<(), ControlError>;

    /// Read a string property, `""` if unset.
    fn property(&self, key: &str) -> String;

    /// Attach context-menu entries, optionally replacing the existing ones.
    fn add_context_menu_items(
        &self,
        items: &[ContextMenuEntry],
        replace: bool,
    ) -> Result<(), ControlError>;

    /// Set the row's native selected flag (multi-select highlight).
    fn set_selected(&self, selected: bool) -> Result<(), ControlError>;

    /// Read the row's native selected flag.
    fn is_selected(&self) -> bool;
}

/// A host list control.
///
/// Methods beyond the mutating set are the fixed pass-through queries the
/// engine forwards without interpreting: [`control_id`](Self::control_id),
/// [`is_visible`](Self::is_visible) and [`has_focus`](Self::has_focus).
pub trait ListControl: Send + Sync {
    /// The control's id inside its window.
    fn control_id(&self) -> u32;

    /// Append one row.
    fn add_row(&self, row: RowData) -> Result<(), ControlError>;

    /// Append several rows in order.
    fn add_rows(&self, rows: Vec<RowData>) -> Result<(), ControlError> {
        for row in rows {
            self.add_row(row)?;
        }
        Ok(())
    }

    /// Look up the row currently at `index`.
    fn row(&self, index: usize) -> Result<RowHandle, ControlError>;

    /// Remove the row at `index`, shifting later rows up.
    fn remove_row(&self, index: usize) -> Result<(), ControlError>;

    /// Move the selection cursor to `index`.
    fn select(&self, index: usize) -> Result<(), ControlError>;

    /// The selection cursor as reported by the host.
    ///
    /// The host may report a stale position (past the end) after rows are
    /// removed; callers must validate it.
    fn selected_position(&self) -> Option<usize>;

    /// Number of rows in the control.
    fn size(&self) -> usize;

    /// Remove every row.
    fn reset(&self) -> Result<(), ControlError>;

    /// Offset of the selected row from the top of the visible window.
    fn view_position(&self) -> usize;

    /// Whether the control is currently visible.
    fn is_visible(&self) -> bool {
        true
    }

    /// Whether the control currently has focus.
    fn has_focus(&self) -> bool {
        false
    }
}
