//! Cycling between a fixed set of windows.
//!
//! A [`MultiWindow`] shows one window kind at a time. The current window can
//! ask for the next kind (or a specific one); the controller closes it and
//! the run loop opens the next. Properties set on the controller are carried
//! into every window it opens.

use std::collections::BTreeMap;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use horizon_listsync_core::ConnectionId;
use horizon_listsync_core::logging::targets;

use super::context::WindowContext;
use super::host::PropertyTarget;
use super::lifecycle::WindowLifecycle;

/// Which window [`MultiWindow::next_window`] should open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextWindow<K> {
    /// The kind after the current one, wrapping around.
    Cycle,
    /// Reopen the current kind.
    Restart,
    /// A specific kind.
    Specific(K),
}

struct MultiState<K> {
    next: K,
    current: Option<K>,
    current_window: Option<Arc<WindowLifecycle>>,
    properties: BTreeMap<String, String>,
    all_closed: bool,
    close_connection: Option<ConnectionId>,
}

/// Controller that cycles through window kinds `K`.
pub struct MultiWindow<K> {
    windows: Vec<K>,
    state: Mutex<MultiState<K>>,
}

impl<K> MultiWindow<K>
where
    K: Clone + PartialEq + std::fmt::Debug + Send + Sync + 'static,
{
    /// Create a controller over `windows`, starting at `default` or the first
    /// kind. Returns `None` when `windows` is empty.
    pub fn new(windows: Vec<K>, default: Option<K>) -> Option<Self> {
        let next = default.or_else(|| windows.first().cloned())?;
        Some(Self {
            windows,
            state: Mutex::new(MultiState {
                next,
                current: None,
                current_window: None,
                properties: BTreeMap::new(),
                all_closed: false,
                close_connection: None,
            }),
        })
    }

    /// The window kinds, in cycle order.
    pub fn windows(&self) -> &[K] {
        &self.windows
    }

    /// The kind currently shown.
    pub fn current(&self) -> Option<K> {
        self.state.lock().current.clone()
    }

    /// The kind the run loop opens next.
    pub fn next(&self) -> K {
        self.state.lock().next.clone()
    }

    /// Whether [`do_close`](Self::do_close) was called.
    pub fn all_closed(&self) -> bool {
        self.state.lock().all_closed
    }

    /// Index of `kind` in the cycle, `0` if absent.
    pub fn window_index(&self, kind: &K) -> usize {
        self.windows.iter().position(|k| k == kind).unwrap_or(0)
    }

    /// Properties carried into every window.
    pub fn properties(&self) -> BTreeMap<String, String> {
        self.state.lock().properties.clone()
    }

    /// Set a property on the current window and carry it into later ones.
    pub fn set_property(&self, key: &str, value: &str) {
        let window = {
            let mut state = self.state.lock();
            state.properties.insert(key.to_string(), value.to_string());
            state.current_window.clone()
        };
        if let Some(window) = window {
            if let Err(error) = window.set_property(key, value) {
                tracing::warn!(target: targets::WINDOW, key, %error, "failed to set carried property");
            }
        }
    }

    /// Register the window just opened for the current kind and replay the
    /// carried properties into it.
    pub fn attach_current(&self, window: Arc<WindowLifecycle>) {
        let properties = {
            let mut state = self.state.lock();
            state.current_window = Some(window.clone());
            state.properties.clone()
        };
        for (key, value) in &properties {
            if let Err(error) = window.set_property(key, value) {
                tracing::warn!(target: targets::WINDOW, key = %key, %error, "failed to replay carried property");
            }
        }
    }

    /// Switch windows: record the next kind and close the current window.
    ///
    /// Returns the kind that will open next, or `None` when nothing is
    /// shown or `Specific` names the kind already shown.
    #[tracing::instrument(skip(self), target = "horizon_listsync::window", level = "trace")]
    pub fn next_window(&self, next: NextWindow<K>) -> Option<K> {
        let (target, window) = {
            let mut state = self.state.lock();
            let current = state.current.clone()?;
            let target = match next {
                NextWindow::Restart => current,
                NextWindow::Specific(kind) if kind == current => return None,
                NextWindow::Specific(kind) => kind,
                NextWindow::Cycle => {
                    let index = (self.window_index(&current) + 1) % self.windows.len();
                    self.windows[index].clone()
                }
            };
            state.next = target.clone();
            (target, state.current_window.clone())
        };

        tracing::debug!(target: targets::WINDOW, next = ?target, "switching window");
        if let Some(window) = window {
            window.do_close();
        }
        Some(target)
    }

    /// Close the current window and end the run loop.
    pub fn do_close(&self) {
        let window = {
            let mut state = self.state.lock();
            state.all_closed = true;
            state.current_window.clone()
        };
        if let Some(window) = window {
            window.do_close();
        }
    }

    /// Close on the context's broadcast close request.
    pub fn listen_for_close(self: &Arc<Self>, context: &WindowContext) {
        let weak: Weak<Self> = Arc::downgrade(self);
        let connection = context.close_windows().connect(move |_| {
            if let Some(multi) = weak.upgrade() {
                multi.do_close();
            }
        });
        self.state.lock().close_connection = Some(connection);
    }

    /// Stop listening for the broadcast close request.
    pub fn stop_listening(&self, context: &WindowContext) {
        if let Some(connection) = self.state.lock().close_connection.take() {
            context.close_windows().disconnect(connection);
        }
    }

    /// Open windows until [`do_close`](Self::do_close) is called or `abort`
    /// returns `true`.
    ///
    /// `show_modal` opens the given kind and returns once that window has
    /// closed; it should pass the window to
    /// [`attach_current`](Self::attach_current) after creating it. Returns
    /// the number of windows opened.
    pub fn run<A, F>(&self, mut abort: A, mut show_modal: F) -> usize
    where
        A: FnMut() -> bool,
        F: FnMut(&K, &Self),
    {
        let mut opened = 0;
        loop {
            let kind = {
                let mut state = self.state.lock();
                if state.all_closed {
                    break;
                }
                let kind = state.next.clone();
                state.current = Some(kind.clone());
                state.current_window = None;
                kind
            };
            if abort() {
                break;
            }

            opened += 1;
            tracing::debug!(target: targets::WINDOW, ?kind, "opening window");
            show_modal(&kind, self);
        }

        let mut state = self.state.lock();
        state.current = None;
        state.current_window = None;
        opened
    }
}

static_assertions::assert_impl_all!(MultiWindow<u32>: Send, Sync);

impl<K: std::fmt::Debug> std::fmt::Debug for MultiWindow<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("MultiWindow")
            .field("windows", &self.windows)
            .field("current", &state.current)
            .field("next", &state.next)
            .field("all_closed", &state.all_closed)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::{HeadlessWindow, WindowKind};

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Screen {
        Home,
        Library,
        Search,
    }

    fn multi() -> MultiWindow<Screen> {
        MultiWindow::new(vec![Screen::Home, Screen::Library, Screen::Search], None).unwrap()
    }

    #[test]
    fn test_empty_set_is_rejected() {
        assert!(MultiWindow::<Screen>::new(Vec::new(), None).is_none());
        let m = MultiWindow::new(vec![Screen::Home], Some(Screen::Search)).unwrap();
        assert_eq!(m.next(), Screen::Search);
    }

    #[test]
    fn test_cycle_wraps_and_stops() {
        let multi = multi();
        let mut seen = Vec::new();
        let opened = multi.run(
            || false,
            |kind, multi| {
                seen.push(*kind);
                if seen.len() < 4 {
                    multi.next_window(NextWindow::Cycle);
                } else {
                    multi.do_close();
                }
            },
        );
        assert_eq!(opened, 4);
        assert_eq!(seen, [Screen::Home, Screen::Library, Screen::Search, Screen::Home]);
        assert!(multi.all_closed());
        assert_eq!(multi.current(), None);
    }

    #[test]
    fn test_specific_and_restart() {
        let multi = multi();
        let mut seen = Vec::new();
        multi.run(
            || false,
            |kind, multi| {
                seen.push(*kind);
                match seen.len() {
                    1 => {
                        assert_eq!(multi.next_window(NextWindow::Specific(Screen::Home)), None);
                        assert_eq!(multi.next_window(NextWindow::Specific(Screen::Search)), Some(Screen::Search));
                    }
                    2 => {
                        multi.next_window(NextWindow::Restart);
                    }
                    _ => multi.do_close(),
                }
            },
        );
        assert_eq!(seen, [Screen::Home, Screen::Search, Screen::Search]);
    }

    #[test]
    fn test_abort_stops_loop() {
        let multi = multi();
        let mut calls = 0;
        let opened = multi.run(
            || {
                calls += 1;
                calls > 2
            },
            |_, multi| {
                multi.next_window(NextWindow::Cycle);
            },
        );
        assert_eq!(opened, 2);
        assert!(!multi.all_closed());
    }

    #[test]
    fn test_next_window_without_current() {
        assert_eq!(multi().next_window(NextWindow::Cycle), None);
    }

    #[test]
    fn test_properties_carried_into_each_window() {
        let multi = multi();
        let context = WindowContext::default();
        let hosts: Vec<Arc<HeadlessWindow>> = (0..2).map(|i| Arc::new(HeadlessWindow::new(13001 + i))).collect();
        multi.set_property("section", "tv");

        let mut opened = 0;
        multi.run(
            || false,
            |_, multi| {
                let host = hosts[opened].clone();
                opened += 1;
                let window = WindowLifecycle::new(WindowKind::Window, host, context.clone());
                window.show();
                multi.attach_current(window.clone());
                if opened == 1 {
                    multi.set_property("filter", "unwatched");
                    multi.next_window(NextWindow::Cycle);
                } else {
                    multi.do_close();
                }
                assert!(window.is_closing());
            },
        );

        assert_eq!(hosts[0].property("section"), "tv");
        assert_eq!(hosts[0].property("filter"), "unwatched");
        assert_eq!(hosts[1].property("section"), "tv");
        assert_eq!(hosts[1].property("filter"), "unwatched");
        assert_eq!(hosts[1].close_count(), 1);
    }

    #[test]
    fn test_broadcast_close_ends_loop() {
        let multi = Arc::new(multi());
        let context = WindowContext::default();
        multi.listen_for_close(&context);

        let opened = multi.run(|| false, |_, _| context.request_close_windows());
        assert_eq!(opened, 1);
        assert!(multi.all_closed());

        multi.stop_listening(&context);
        assert_eq!(context.close_windows().connection_count(), 0);
    }

    #[test]
    fn test_close_requested_from_another_thread() {
        let multi = Arc::new(multi());
        let context = WindowContext::default();
        multi.listen_for_close(&context);

        let requester = context.clone();
        std::thread::spawn(move || requester.request_close_windows())
            .join()
            .unwrap();
        assert!(multi.all_closed());
        assert_eq!(multi.run(|| false, |_, _| {}), 0);
    }
}
