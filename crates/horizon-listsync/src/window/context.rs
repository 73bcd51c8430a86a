//! Process-wide window state.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use horizon_listsync_core::{PropertyStore, Signal};

use crate::config::WindowSettings;

/// Window id of the host's home window, which carries global properties.
pub const GLOBAL_WINDOW_ID: u32 = 10000;

#[derive(Default)]
struct ContextState {
    last_background_url: Option<String>,
    last_window_id: Option<u32>,
    last_dialog_id: Option<u32>,
}

struct ContextInner {
    settings: RwLock<WindowSettings>,
    state: Mutex<ContextState>,
    global: PropertyStore,
    close_windows: Signal<()>,
    close_dialogs: Signal<()>,
}

/// State shared by every window of one process.
///
/// Windows receive a clone at construction; clones share the same state.
/// Holds the last background URL for crossfading, the ids of the most
/// recently initialised window and dialog, the global property store and
/// the broadcast close requests.
#[derive(Clone)]
pub struct WindowContext {
    inner: Arc<ContextInner>,
}

impl Default for WindowContext {
    fn default() -> Self {
        Self::new(WindowSettings::default())
    }
}

impl std::fmt::Debug for WindowContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("WindowContext")
            .field("last_background_url", &state.last_background_url)
            .field("last_window_id", &state.last_window_id)
            .field("last_dialog_id", &state.last_dialog_id)
            .finish_non_exhaustive()
    }
}

impl WindowContext {
    /// Create a context with the given settings.
    pub fn new(settings: WindowSettings) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                settings: RwLock::new(settings),
                state: Mutex::new(ContextState::default()),
                global: PropertyStore::new(),
                close_windows: Signal::new(),
                close_dialogs: Signal::new(),
            }),
        }
    }

    /// Use an existing store for global properties.
    pub fn with_global_properties(settings: WindowSettings, global: PropertyStore) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                settings: RwLock::new(settings),
                state: Mutex::new(ContextState::default()),
                global,
                close_windows: Signal::new(),
                close_dialogs: Signal::new(),
            }),
        }
    }

    /// Current display settings.
    pub fn settings(&self) -> WindowSettings {
        self.inner.settings.read().clone()
    }

    /// Replace the display settings.
    pub fn set_settings(&self, settings: WindowSettings) {
        *self.inner.settings.write() = settings;
    }

    // =========================================================================
    // Shared bookkeeping
    // =========================================================================

    /// The background most recently shown by any window.
    pub fn last_background_url(&self) -> Option<String> {
        self.inner.state.lock().last_background_url.clone()
    }

    /// Record the background most recently shown.
    pub fn set_last_background_url(&self, url: Option<String>) {
        self.inner.state.lock().last_background_url = url;
    }

    /// Id of the window that initialised last.
    pub fn last_window_id(&self) -> Option<u32> {
        self.inner.state.lock().last_window_id
    }

    /// Id of the dialog that initialised last.
    pub fn last_dialog_id(&self) -> Option<u32> {
        self.inner.state.lock().last_dialog_id
    }

    pub(crate) fn record_window(&self, id: u32) {
        self.inner.state.lock().last_window_id = Some(id);
    }

    pub(crate) fn record_dialog(&self, id: u32) {
        self.inner.state.lock().last_dialog_id = Some(id);
    }

    // =========================================================================
    // Global properties
    // =========================================================================

    /// Properties of the global (home) window.
    pub fn global_properties(&self) -> &PropertyStore {
        &self.inner.global
    }

    /// Namespaced key for a global property, e.g. `listsync.busy`.
    pub fn global_key(&self, property: &str) -> String {
        format!("{}.{}", self.inner.settings.read().property_namespace(), property)
    }

    /// Read a namespaced global property.
    pub fn global_property(&self, property: &str) -> String {
        self.inner.global.get(&self.global_key(property))
    }

    /// Write a namespaced global property.
    pub fn set_global_property(&self, property: &str, value: &str) {
        self.inner.global.set(self.global_key(property), value);
    }

    // =========================================================================
    // Close broadcasts
    // =========================================================================

    /// Emitted when every listening window should close.
    pub fn close_windows(&self) -> &Signal<()> {
        &self.inner.close_windows
    }

    /// Emitted when every listening dialog should close.
    pub fn close_dialogs(&self) -> &Signal<()> {
        &self.inner.close_dialogs
    }

    /// Ask every listening window to close.
    pub fn request_close_windows(&self) {
        tracing::debug!(target: horizon_listsync_core::logging::targets::WINDOW, "close windows requested");
        self.inner.close_windows.emit(());
    }

    /// Ask every listening dialog to close.
    pub fn request_close_dialogs(&self) {
        tracing::debug!(target: horizon_listsync_core::logging::targets::WINDOW, "close dialogs requested");
        self.inner.close_dialogs.emit(());
    }
}

static_assertions::assert_impl_all!(WindowContext: Send, Sync);
