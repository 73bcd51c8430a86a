//! Window and dialog lifecycle bookkeeping.
//!
//! A [`WindowLifecycle`] wraps one [`HostWindow`] and tracks where it is in
//! `Created → Open → Closing → Closed`. The host still opens, renders and
//! closes the window; this type decides what to write into it on each
//! transition.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use horizon_listsync::window::{
//!     HeadlessWindow, InitOutcome, WindowContext, WindowKind, WindowLifecycle,
//! };
//!
//! let host = Arc::new(HeadlessWindow::new(13001));
//! let window = WindowLifecycle::new(WindowKind::Window, host.clone(), WindowContext::default());
//!
//! window.show();
//! assert_eq!(window.on_init(), InitOutcome::FirstInit);
//! assert_eq!(window.on_init(), InitOutcome::ReInit);
//! assert!(window.is_open());
//! ```

use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use horizon_listsync_core::logging::targets;
use horizon_listsync_core::{ConnectionId, ControlError, Signal};

use super::background::BackgroundCrossfade;
use super::context::WindowContext;
use super::host::{HostWindow, PropertyTarget};
use super::property_scope::PropertyScope;

/// Hosts give add-on windows ids from this value upwards.
pub const CUSTOM_WINDOW_ID_BASE: u32 = 13000;

/// Whether the host object is a full window or a dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowKind {
    Window,
    Dialog,
}

/// Where a window is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LifecycleState {
    /// Constructed or shown but not yet on top.
    #[default]
    Created,
    Open,
    /// A close is in progress; property writes are dropped.
    Closing,
    Closed,
}

/// Result of [`WindowLifecycle::on_init`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InitOutcome {
    /// First init: the window should build its content.
    FirstInit,
    /// The host re-initialised a window that was already built.
    ReInit,
}

/// Construction options for a [`WindowLifecycle`].
#[derive(Debug, Clone)]
pub struct LifecycleOptions {
    window_props: Vec<(String, String)>,
    listen_for_close: bool,
}

impl Default for LifecycleOptions {
    fn default() -> Self {
        Self {
            window_props: Vec::new(),
            listen_for_close: true,
        }
    }
}

impl LifecycleOptions {
    /// Add a property written into the host at construction.
    pub fn with_window_prop(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.window_props.push((key.into(), value.into()));
        self
    }

    /// Whether the window closes on the context's broadcast close request.
    /// Root windows such as a home screen turn this off.
    pub fn with_close_listener(mut self, listen: bool) -> Self {
        self.listen_for_close = listen;
        self
    }
}

struct LifecycleInner {
    state: LifecycleState,
    window_id: Option<u32>,
    started: bool,
    finished_init: bool,
    close_signalled: bool,
    close_connection: Option<ConnectionId>,
}

/// Lifecycle of one host window or dialog.
pub struct WindowLifecycle {
    kind: WindowKind,
    host: Arc<dyn HostWindow>,
    context: WindowContext,
    background: BackgroundCrossfade,
    listen_for_close: bool,
    inner: Mutex<LifecycleInner>,
    weak_self: Weak<WindowLifecycle>,
}

impl std::fmt::Debug for WindowLifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("WindowLifecycle")
            .field("kind", &self.kind)
            .field("state", &inner.state)
            .field("window_id", &inner.window_id)
            .field("started", &inner.started)
            .finish_non_exhaustive()
    }
}

impl WindowLifecycle {
    /// Wrap a host window with default options.
    pub fn new(kind: WindowKind, host: Arc<dyn HostWindow>, context: WindowContext) -> Arc<Self> {
        Self::with_options(kind, host, context, LifecycleOptions::default())
    }

    /// Wrap a host window, writing `options`' window properties into it.
    pub fn with_options(
        kind: WindowKind,
        host: Arc<dyn HostWindow>,
        context: WindowContext,
        options: LifecycleOptions,
    ) -> Arc<Self> {
        for (key, value) in &options.window_props {
            if let Err(error) = host.set_property(key, value) {
                tracing::warn!(target: targets::WINDOW, key, %error, "failed to carry window property");
            }
        }

        Arc::new_cyclic(|weak_self| Self {
            kind,
            host,
            background: BackgroundCrossfade::new(context.clone()),
            context,
            listen_for_close: options.listen_for_close,
            inner: Mutex::new(LifecycleInner {
                state: LifecycleState::Created,
                window_id: None,
                started: false,
                finished_init: false,
                close_signalled: false,
                close_connection: None,
            }),
            weak_self: weak_self.clone(),
        })
    }

    /// The wrapped host window.
    pub fn host(&self) -> &Arc<dyn HostWindow> {
        &self.host
    }

    /// The shared window context.
    pub fn context(&self) -> &WindowContext {
        &self.context
    }

    /// Window or dialog.
    pub fn kind(&self) -> WindowKind {
        self.kind
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Handle the host's init callback.
    ///
    /// Records the window id in the shared context and writes the background
    /// colour properties. The first call also restores the shared background
    /// and subscribes to the context's close broadcast.
    #[tracing::instrument(skip(self), target = "horizon_listsync::window", level = "trace")]
    pub fn on_init(&self) -> InitOutcome {
        let id = match self.kind {
            WindowKind::Window => {
                let id = self.host.current_window_id();
                self.context.record_window(id);
                id
            }
            WindowKind::Dialog => {
                let id = self.host.current_dialog_id();
                self.context.record_dialog(id);
                id
            }
        };

        let first = {
            let mut inner = self.inner.lock();
            inner.window_id = Some(id);
            inner.state = LifecycleState::Open;
            let first = !inner.started;
            inner.started = true;
            first
        };

        if self.kind == WindowKind::Window {
            self.write_background_colours();
        }

        if !first {
            tracing::debug!(target: targets::WINDOW, id, "window re-initialised");
            return InitOutcome::ReInit;
        }

        if self.kind == WindowKind::Window {
            if let Some(last) = self.context.last_background_url() {
                self.background.apply(self, Some(&last));
            }
        }
        if self.listen_for_close {
            let weak = self.weak_self.clone();
            let connection = self.close_signal().connect(move |_| {
                if let Some(window) = weak.upgrade() {
                    window.on_close_signal();
                }
            });
            self.inner.lock().close_connection = Some(connection);
        }

        self.inner.lock().finished_init = true;
        tracing::debug!(target: targets::WINDOW, id, kind = ?self.kind, "window initialised");
        InitOutcome::FirstInit
    }

    /// Show the window without blocking.
    ///
    /// A window counts as open once the host reports a custom window id on
    /// top; a dialog is open as soon as it is shown.
    pub fn show(&self) -> bool {
        self.inner.lock().state = LifecycleState::Created;
        if let Err(error) = self.host.show() {
            tracing::warn!(target: targets::WINDOW, %error, "failed to show window");
            return false;
        }

        let open = match self.kind {
            WindowKind::Window => self.host.current_window_id() >= CUSTOM_WINDOW_ID_BASE,
            WindowKind::Dialog => true,
        };
        if open {
            self.inner.lock().state = LifecycleState::Open;
        }
        open
    }

    /// Close the window.
    ///
    /// Unsubscribes from the close broadcast. A window that is not open is
    /// left alone and `false` is returned; dialogs always close.
    #[tracing::instrument(skip(self), target = "horizon_listsync::window", level = "trace")]
    pub fn do_close(&self) -> bool {
        let connection = self.inner.lock().close_connection.take();
        if let Some(connection) = connection {
            self.close_signal().disconnect(connection);
        }

        {
            let mut inner = self.inner.lock();
            if self.kind == WindowKind::Window && inner.state != LifecycleState::Open {
                return false;
            }
            inner.state = LifecycleState::Closing;
        }

        let result = self.host.close();
        self.inner.lock().state = LifecycleState::Closed;
        match result {
            Ok(()) => true,
            Err(error) => {
                tracing::warn!(target: targets::WINDOW, %error, "host failed to close window");
                false
            }
        }
    }

    /// React to the context's broadcast close request.
    pub fn on_close_signal(&self) {
        self.inner.lock().close_signalled = true;
        self.do_close();
    }

    fn close_signal(&self) -> &Signal<()> {
        match self.kind {
            WindowKind::Window => self.context.close_windows(),
            WindowKind::Dialog => self.context.close_dialogs(),
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Current lifecycle state.
    pub fn state(&self) -> LifecycleState {
        self.inner.lock().state
    }

    /// Whether the window is open.
    pub fn is_open(&self) -> bool {
        self.state() == LifecycleState::Open
    }

    /// Whether a close is in progress or done.
    pub fn is_closing(&self) -> bool {
        matches!(self.state(), LifecycleState::Closing | LifecycleState::Closed)
    }

    /// Whether the first init ran.
    pub fn is_started(&self) -> bool {
        self.inner.lock().started
    }

    /// Whether the first init completed.
    pub fn finished_init(&self) -> bool {
        self.inner.lock().finished_init
    }

    /// Whether a broadcast close request closed this window.
    pub fn close_signalled(&self) -> bool {
        self.inner.lock().close_signalled
    }

    /// Host id recorded at init.
    pub fn window_id(&self) -> Option<u32> {
        self.inner.lock().window_id
    }

    /// Whether this is the most recently initialised window (or dialog).
    pub fn is_active(&self) -> bool {
        let Some(id) = self.window_id() else {
            return false;
        };
        let last = match self.kind {
            WindowKind::Window => self.context.last_window_id(),
            WindowKind::Dialog => self.context.last_dialog_id(),
        };
        last == Some(id)
    }

    /// Whether the host currently shows this window on top.
    pub fn is_current_window(&self) -> bool {
        let current = match self.kind {
            WindowKind::Window => self.host.current_window_id(),
            WindowKind::Dialog => self.host.current_dialog_id(),
        };
        self.window_id() == Some(current)
    }

    // =========================================================================
    // Properties
    // =========================================================================

    /// Set several properties, stopping at the first host failure.
    pub fn set_properties<K, V>(&self, pairs: impl IntoIterator<Item = (K, V)>) -> Result<(), ControlError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in pairs {
            self.set_property(key.as_ref(), value.as_ref())?;
        }
        Ok(())
    }

    /// Set a property using the `"1"` / `""` convention.
    pub fn set_bool_property(&self, key: &str, value: bool) -> Result<(), ControlError> {
        self.set_property(key, if value { "1" } else { "" })
    }

    /// Override a property until the returned scope drops.
    pub fn property_scope(&self, key: &str, value: &str) -> PropertyScope<'_> {
        PropertyScope::new(self, key, value)
    }

    /// Show `value` as the window background, crossfading if enabled.
    pub fn set_background(&self, value: Option<&str>) -> Option<String> {
        self.background.apply(self, value)
    }

    /// Show an item's art as the background when art-driven backgrounds
    /// are enabled.
    pub fn update_background_from(&self, art: Option<&str>) -> Option<String> {
        if !self.context.settings().dynamic_backgrounds() {
            return None;
        }
        self.set_background(art)
    }

    fn write_background_colours(&self) {
        let settings = self.context.settings();
        let writes = match settings.background_colour() {
            Some(colour) => {
                let colour = if colour == "-" { "ff000000" } else { colour };
                let colour = format!("0x{}", colour.to_lowercase());
                [
                    ("use_solid_background", "1".to_string()),
                    ("background_colour", colour.clone()),
                    ("background_colour_opaque", colour),
                ]
            }
            None => {
                let colour = if settings.crossfade() { "0x00000000" } else { "0xff111111" };
                [
                    ("use_solid_background", String::new()),
                    ("background_colour", colour.to_string()),
                    ("background_colour_opaque", "0xff111111".to_string()),
                ]
            }
        };

        let flags = [
            ("use_bg_fallback", settings.use_bg_fallback()),
            ("dynamic_backgrounds", settings.dynamic_backgrounds()),
        ];
        let result = self.set_properties(writes).and_then(|()| {
            flags
                .into_iter()
                .try_for_each(|(key, value)| self.set_bool_property(key, value))
        });
        if let Err(error) = result {
            tracing::warn!(target: targets::WINDOW, %error, "failed to write background colours");
        }
    }
}

impl PropertyTarget for WindowLifecycle {
    /// Writes are dropped while the window is closing.
    fn set_property(&self, key: &str, value: &str) -> Result<(), ControlError> {
        if self.is_closing() {
            tracing::trace!(target: targets::WINDOW, key, "window closing, property write dropped");
            return Ok(());
        }
        self.host.set_property(key, value)
    }

    fn property(&self, key: &str) -> String {
        self.host.property(key)
    }
}

static_assertions::assert_impl_all!(WindowLifecycle: Send, Sync);
