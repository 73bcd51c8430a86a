//! Host window interface.

use std::sync::Arc;

use horizon_listsync_core::{ControlError, PropertyStore};

use crate::model::ListControl;

/// Something that exposes string properties to a skin.
pub trait PropertyTarget: Send + Sync {
    /// Set a property.
    fn set_property(&self, key: &str, value: &str) -> Result<(), ControlError>;

    /// Read a property, `""` if unset.
    fn property(&self, key: &str) -> String;
}

impl PropertyTarget for PropertyStore {
    fn set_property(&self, key: &str, value: &str) -> Result<(), ControlError> {
        self.set(key, value);
        Ok(())
    }

    fn property(&self, key: &str) -> String {
        self.get(key)
    }
}

/// A host toolkit window or dialog.
///
/// Rendering, input and layout stay with the host; this layer only needs
/// properties, its list controls and the open/close primitives.
pub trait HostWindow: PropertyTarget {
    /// Look up a list control by id.
    fn list_control(&self, control_id: u32) -> Option<Arc<dyn ListControl>>;

    /// Id of the window the host currently shows on top.
    fn current_window_id(&self) -> u32;

    /// Id of the dialog the host currently shows on top.
    fn current_dialog_id(&self) -> u32;

    /// Show the window without blocking.
    fn show(&self) -> Result<(), ControlError>;

    /// Close the window.
    fn close(&self) -> Result<(), ControlError>;
}
