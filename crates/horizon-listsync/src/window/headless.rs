//! A window without a screen.
//!
//! [`HeadlessWindow`] stores its properties in a [`PropertyStore`] and keeps
//! list controls in a map. Showing it makes its id the host's current window
//! id; closing it falls back to the id it replaced.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};

use parking_lot::RwLock;

use horizon_listsync_core::{ControlError, PropertyStore};

use super::host::{HostWindow, PropertyTarget};
use crate::model::ListControl;

/// Id reported when nothing custom is on screen.
pub const HOME_WINDOW_ID: u32 = 10000;

/// An in-memory [`HostWindow`].
pub struct HeadlessWindow {
    window_id: u32,
    properties: PropertyStore,
    controls: RwLock<HashMap<u32, Arc<dyn ListControl>>>,
    current: AtomicU32,
    previous: AtomicU32,
    dialog: AtomicU32,
    shown: AtomicUsize,
    closed: AtomicUsize,
    destroyed: AtomicBool,
}

impl HeadlessWindow {
    /// Create a window with the given id. The host starts on
    /// [`HOME_WINDOW_ID`].
    pub fn new(window_id: u32) -> Self {
        Self {
            window_id,
            properties: PropertyStore::new(),
            controls: RwLock::new(HashMap::new()),
            current: AtomicU32::new(HOME_WINDOW_ID),
            previous: AtomicU32::new(HOME_WINDOW_ID),
            dialog: AtomicU32::new(0),
            shown: AtomicUsize::new(0),
            closed: AtomicUsize::new(0),
            destroyed: AtomicBool::new(false),
        }
    }

    /// Register a list control.
    pub fn with_list_control(self, control: Arc<dyn ListControl>) -> Self {
        self.controls.write().insert(control.control_id(), control);
        self
    }

    /// This window's id.
    pub fn window_id(&self) -> u32 {
        self.window_id
    }

    /// The window's properties.
    pub fn properties(&self) -> &PropertyStore {
        &self.properties
    }

    /// Force the id the host reports as current.
    pub fn set_current_window_id(&self, id: u32) {
        self.current.store(id, Ordering::SeqCst);
    }

    /// Force the id the host reports as the current dialog.
    pub fn set_current_dialog_id(&self, id: u32) {
        self.dialog.store(id, Ordering::SeqCst);
    }

    /// Number of `show` calls.
    pub fn show_count(&self) -> usize {
        self.shown.load(Ordering::SeqCst)
    }

    /// Number of `close` calls.
    pub fn close_count(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    /// Simulate the host tearing the window down.
    pub fn destroy(&self) {
        self.destroyed.store(true, Ordering::SeqCst);
    }

    fn check_alive(&self) -> Result<(), ControlError> {
        if self.destroyed.load(Ordering::SeqCst) {
            return Err(ControlError::host(format!("window {} is gone", self.window_id)));
        }
        Ok(())
    }
}

impl PropertyTarget for HeadlessWindow {
    fn set_property(&self, key: &str, value: &str) -> Result<(), ControlError> {
        self.check_alive()?;
        self.properties.set(key, value);
        Ok(())
    }

    fn property(&self, key: &str) -> String {
        self.properties.get(key)
    }
}

impl HostWindow for HeadlessWindow {
    fn list_control(&self, control_id: u32) -> Option<Arc<dyn ListControl>> {
        self.controls.read().get(&control_id).cloned()
    }

    fn current_window_id(&self) -> u32 {
        self.current.load(Ordering::SeqCst)
    }

    fn current_dialog_id(&self) -> u32 {
        self.dialog.load(Ordering::SeqCst)
    }

    fn show(&self) -> Result<(), ControlError> {
        self.check_alive()?;
        self.shown.fetch_add(1, Ordering::SeqCst);
        let replaced = self.current.swap(self.window_id, Ordering::SeqCst);
        if replaced != self.window_id {
            self.previous.store(replaced, Ordering::SeqCst);
        }
        Ok(())
    }

    fn close(&self) -> Result<(), ControlError> {
        self.check_alive()?;
        self.closed.fetch_add(1, Ordering::SeqCst);
        let previous = self.previous.load(Ordering::SeqCst);
        let _ = self.current.compare_exchange(
            self.window_id,
            previous,
            Ordering::SeqCst,
            Ordering::SeqCst,
        );
        Ok(())
    }
}

static_assertions::assert_impl_all!(HeadlessWindow: Send, Sync);
