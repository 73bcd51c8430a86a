//! Timed property expiry.
//!
//! A [`PropertyTimer`] sets a property to an "active" value, then writes an
//! expiry value from a background thread once the timeout passes without a
//! reset. The timer thread never touches a list or window object; it only
//! writes into property targets, which the UI thread reads on its next pump.
//! Work that must run on the UI thread should be posted from the callback
//! through a [`UiTaskQueue`](horizon_listsync_core::UiTaskQueue).
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use horizon_listsync::window::{PropertyTimerBuilder, TimerInit};
//! use horizon_listsync_core::PropertyStore;
//!
//! let props = PropertyStore::new();
//! let timer = PropertyTimerBuilder::new("osd_visible", Duration::from_secs(4))
//!     .build(Arc::new(props.clone()));
//!
//! // Show the OSD and (re)arm the timer on every key press.
//! timer.reset(TimerInit::Default, None);
//! assert_eq!(props.get("osd_visible"), "1");
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};
use parking_lot::Mutex;

use horizon_listsync_core::PropertyStore;
use horizon_listsync_core::logging::targets;

use super::context::WindowContext;
use super::host::PropertyTarget;

/// Callback run on the timer thread after the property expires.
pub type TimerCallback = Arc<dyn Fn() + Send + Sync>;

/// Hook run once on expiry, typically closing a window.
pub type CloseHook = Box<dyn FnOnce() + Send>;

/// What [`PropertyTimer::reset`] writes before arming.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TimerInit {
    /// Write the configured init value.
    #[default]
    Default,
    /// Write this value.
    Value(String),
    /// Leave the property alone.
    Skip,
}

enum TimerCommand {
    Extend(Instant),
    Stop { trigger: bool },
}

/// Builder for [`PropertyTimer`].
pub struct PropertyTimerBuilder {
    property: String,
    timeout: Duration,
    value: String,
    init_value: String,
    global: Option<(PropertyStore, String)>,
    callback: Option<TimerCallback>,
}

impl PropertyTimerBuilder {
    /// A timer for `property` expiring after `timeout`.
    ///
    /// Defaults: init value `"1"`, expiry value `""`, no global mirror.
    pub fn new(property: impl Into<String>, timeout: Duration) -> Self {
        Self {
            property: property.into(),
            timeout,
            value: String::new(),
            init_value: "1".to_string(),
            global: None,
            callback: None,
        }
    }

    /// Value written on expiry.
    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    /// Value written by [`TimerInit::Default`].
    pub fn init_value(mut self, value: impl Into<String>) -> Self {
        self.init_value = value.into();
        self
    }

    /// Mirror every write into the context's namespaced global property.
    pub fn global(mut self, context: &WindowContext) -> Self {
        let key = context.global_key(&self.property);
        self.global = Some((context.global_properties().clone(), key));
        self
    }

    /// Run `callback` on the timer thread after expiry.
    pub fn callback<F>(mut self, callback: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.callback = Some(Arc::new(callback));
        self
    }

    /// Build the timer. No thread runs until the first reset.
    pub fn build(self, target: Arc<dyn PropertyTarget>) -> PropertyTimer {
        PropertyTimer {
            shared: Arc::new(TimerShared {
                target,
                global: self.global,
                property: self.property,
                value: self.value,
                callback: self.callback,
                close_hook: Mutex::new(None),
                running: AtomicBool::new(false),
                gate: Mutex::new(()),
                fired: AtomicUsize::new(0),
            }),
            init_value: self.init_value,
            timeout: self.timeout,
            closed: AtomicBool::new(false),
            sender: Mutex::new(None),
            handle: Mutex::new(None),
        }
    }
}

/// State shared between the timer handle and its thread.
struct TimerShared {
    target: Arc<dyn PropertyTarget>,
    global: Option<(PropertyStore, String)>,
    property: String,
    value: String,
    callback: Option<TimerCallback>,
    close_hook: Mutex<Option<CloseHook>>,
    running: AtomicBool,
    /// Held by `reset` while extending and by the thread while it decides to
    /// fire, so an extension is either seen or refused.
    gate: Mutex<()>,
    fired: AtomicUsize,
}

impl TimerShared {
    fn write(&self, value: &str) {
        if let Err(error) = self.target.set_property(&self.property, value) {
            tracing::warn!(target: targets::TIMER, property = %self.property, %error, "failed to write timer property");
        }
        if let Some((store, key)) = &self.global {
            store.set(key.as_str(), value);
        }
    }

    fn fire(&self) {
        tracing::debug!(target: targets::TIMER, property = %self.property, "property timer expired");
        self.write(&self.value);
        self.fired.fetch_add(1, Ordering::AcqRel);
        let hook = self.close_hook.lock().take();
        if let Some(hook) = hook {
            hook();
        }
        if let Some(callback) = &self.callback {
            callback();
        }
    }
}

/// A property that reverts after a period of inactivity.
///
/// Each [`reset`](Self::reset) pushes the deadline out by the full timeout.
/// Dropping the timer closes it.
pub struct PropertyTimer {
    shared: Arc<TimerShared>,
    init_value: String,
    timeout: Duration,
    closed: AtomicBool,
    sender: Mutex<Option<Sender<TimerCommand>>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl PropertyTimer {
    /// The managed property name.
    pub fn property(&self) -> &str {
        &self.shared.property
    }

    /// The configured timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Whether the timer thread is counting down.
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    /// Whether [`close`](Self::close) was called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// How many times the timer has expired.
    pub fn fire_count(&self) -> usize {
        self.shared.fired.load(Ordering::Acquire)
    }

    /// Write the init value without arming the timer.
    pub fn init(&self, init: TimerInit) {
        let value = match &init {
            TimerInit::Skip => return,
            TimerInit::Default => self.init_value.as_str(),
            TimerInit::Value(value) => value.as_str(),
        };
        self.shared.write(value);
    }

    /// Write the init value and (re)arm the timer.
    ///
    /// `close_hook` replaces any hook from an earlier reset. Returns `false`
    /// when the timer is closed, has a zero timeout, or its thread could not
    /// be started.
    #[tracing::instrument(skip(self, close_hook), target = "horizon_listsync::timer", level = "trace")]
    pub fn reset(&self, init: TimerInit, close_hook: Option<CloseHook>) -> bool {
        self.init(init);
        if self.is_closed() || self.timeout.is_zero() {
            return false;
        }

        *self.shared.close_hook.lock() = close_hook;
        let deadline = Instant::now() + self.timeout;

        let extended = self.is_running() && {
            let _gate = self.shared.gate.lock();
            self.is_running()
                && self
                    .sender
                    .lock()
                    .as_ref()
                    .is_some_and(|sender| sender.send(TimerCommand::Extend(deadline)).is_ok())
        };
        if extended {
            return true;
        }
        self.start(deadline)
    }

    /// Stop counting down. With `trigger` a running timer expires now.
    ///
    /// Blocks until the timer thread exits. Returns `true` if a thread was
    /// running.
    pub fn stop(&self, trigger: bool) -> bool {
        let Some(sender) = self.sender.lock().take() else {
            return false;
        };
        let was_running = self.is_running();
        let _ = sender.send(TimerCommand::Stop { trigger });
        self.join();
        was_running
    }

    /// Stop without triggering and refuse further resets.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.stop(false);
    }

    fn start(&self, deadline: Instant) -> bool {
        self.join();

        let (sender, receiver) = unbounded();
        let shared = self.shared.clone();
        shared.running.store(true, Ordering::Release);

        let spawned = thread::Builder::new()
            .name(format!("property-timer:{}", self.shared.property))
            .spawn(move || {
                let fire = timer_loop(&receiver, deadline, &shared);
                drop(receiver);
                shared.running.store(false, Ordering::Release);
                if fire {
                    shared.fire();
                }
            });

        match spawned {
            Ok(handle) => {
                *self.sender.lock() = Some(sender);
                *self.handle.lock() = Some(handle);
                true
            }
            Err(error) => {
                self.shared.running.store(false, Ordering::Release);
                tracing::warn!(target: targets::TIMER, property = %self.shared.property, %error, "failed to spawn timer thread");
                false
            }
        }
    }

    fn join(&self) {
        let Some(handle) = self.handle.lock().take() else {
            return;
        };
        // A callback that drops its own timer must not wait on itself.
        if handle.thread().id() == thread::current().id() {
            return;
        }
        if handle.join().is_err() {
            tracing::warn!(target: targets::TIMER, property = %self.shared.property, "timer thread panicked");
        }
    }
}

impl std::fmt::Debug for PropertyTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropertyTimer")
            .field("property", &self.shared.property)
            .field("timeout", &self.timeout)
            .field("running", &self.is_running())
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

impl Drop for PropertyTimer {
    fn drop(&mut self) {
        self.close();
    }
}

static_assertions::assert_impl_all!(PropertyTimer: Send, Sync);

/// Wait for the deadline, following extensions. Returns whether to fire.
fn timer_loop(receiver: &Receiver<TimerCommand>, mut deadline: Instant, shared: &TimerShared) -> bool {
    loop {
        let wait = deadline.saturating_duration_since(Instant::now());
        match receiver.recv_timeout(wait) {
            Ok(TimerCommand::Extend(next)) => deadline = next,
            Ok(TimerCommand::Stop { trigger }) => return trigger,
            Err(RecvTimeoutError::Timeout) => {
                if Instant::now() < deadline {
                    continue;
                }
                let _gate = shared.gate.lock();
                if let Some(trigger) = drain_pending(receiver, &mut deadline) {
                    return trigger;
                }
                if Instant::now() >= deadline {
                    shared.running.store(false, Ordering::Release);
                    return true;
                }
            }
            Err(RecvTimeoutError::Disconnected) => return false,
        }
    }
}

/// Apply commands queued while the wait ran out. Returns the trigger flag of
/// a queued stop.
fn drain_pending(receiver: &Receiver<TimerCommand>, deadline: &mut Instant) -> Option<bool> {
    while let Ok(command) = receiver.try_recv() {
        match command {
            TimerCommand::Extend(next) => *deadline = next,
            TimerCommand::Stop { trigger } => return Some(trigger),
        }
    }
    None
}
