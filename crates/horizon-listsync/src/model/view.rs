//! Binding between a managed item and its native row.

use std::fmt;

use horizon_listsync_core::ControlError;

use super::control::{NativeRow, RowData, RowHandle};
use super::identity::{ID_PROPERTY, ItemId};

/// Projection of a managed item onto a native row.
///
/// Rows are bound lazily: an item appended to a list is materialized by the
/// control but stays [`Detached`](Self::Detached) until the list refreshes it
/// or one of its setters needs the row.
#[derive(Clone, Default)]
pub enum ViewHandle {
    /// No native row fetched yet. The next write looks the row up.
    #[default]
    Detached,
    /// Bound to a native row.
    Bound(RowHandle),
    /// Views were released in bulk; writes are dropped until the next
    /// refresh rebinds the row.
    Suspended,
}

impl ViewHandle {
    /// The bound row, if any.
    pub fn row(&self) -> Option<&RowHandle> {
        match self {
            Self::Bound(row) => Some(row),
            _ => None,
        }
    }

    /// Returns `true` if a native row is bound.
    pub fn is_bound(&self) -> bool {
        matches!(self, Self::Bound(_))
    }

    /// Returns `true` if writes are currently dropped.
    pub fn is_suspended(&self) -> bool {
        matches!(self, Self::Suspended)
    }
}

impl fmt::Debug for ViewHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Detached => f.write_str("Detached"),
            Self::Bound(_) => f.write_str("Bound"),
            Self::Suspended => f.write_str("Suspended"),
        }
    }
}

/// Write every display field of `data` onto `row`.
///
/// Each key in `keys` is written even when `data` does not set it, so a row
/// that previously showed another item cannot leak that item's properties.
pub(crate) fn write_row<'a>(
    row: &dyn NativeRow,
    id: ItemId,
    data: &RowData,
    keys: impl IntoIterator<Item = &'a String>,
) -> Result<(), ControlError> {
    row.set_property(ID_PROPERTY, &id.to_string())?;
    row.set_label(&data.label)?;
    row.set_label2(&data.label2)?;
    row.set_art(&data.icon, &data.thumbnail)?;
    row.set_path(&data.path)?;
    for key in keys {
        let value = data.properties.get(key).map(String::as_str).unwrap_or("");
        row.set_property(key, value)?;
    }
    row.set_selected(data.selected)
}
