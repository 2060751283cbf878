// libfirmata-rs/libfirmata/src/device/watchdog.rs

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use log::{debug, error, warn};
use parking_lot::Mutex;

use crate::protocol::event::Event;
use crate::Result;

const THREAD_NAME: &str = "firmata-watchdog";

type Action = Box<dyn Fn() + Send + Sync>;

struct WatchThread {
    wake: Sender<()>,
    handle: JoinHandle<()>,
}

struct WatchdogInner {
    timeout: Duration,
    action: Action,
    active: AtomicBool,
    last_event: Mutex<Option<Instant>>,
    thread: Mutex<Option<WatchThread>>,
}

/// Runs an action whenever no event has been observed for `timeout`.
///
/// Register [`handler`](Self::handler) as a wildcard protocol handler. The
/// watchdog enables itself on the first observed event and then checks
/// once per timeout period until disabled.
#[derive(Clone)]
pub struct Watchdog {
    inner: Arc<WatchdogInner>,
}

impl Watchdog {
    pub fn new<F>(timeout: Duration, action: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(WatchdogInner {
                timeout,
                action: Box::new(action),
                active: AtomicBool::new(false),
                last_event: Mutex::new(None),
                thread: Mutex::new(None),
            }),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.inner.timeout
    }

    /// Record an event. The first one enables the watchdog.
    pub fn observe(&self, event: &Event) {
        let first = self.inner.last_event.lock().replace(event.timestamp).is_none();
        if first {
            if let Err(e) = self.enable() {
                error!("failed to enable watchdog: {}", e);
            }
        }
    }

    /// Wildcard handler feeding [`observe`](Self::observe).
    pub fn handler(&self) -> impl Fn(&Event) + Send + Sync + 'static {
        let watchdog = self.clone();
        move |event: &Event| watchdog.observe(event)
    }

    pub fn is_active(&self) -> bool {
        self.inner.active.load(Ordering::Acquire)
    }

    /// Start periodic checks. No-op when already active.
    pub fn enable(&self) -> Result<()> {
        let mut thread = self.inner.thread.lock();
        if self.inner.active.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        let (wake, rx) = channel::bounded(1);
        let weak = Arc::downgrade(&self.inner);
        let spawned = thread::Builder::new()
            .name(THREAD_NAME.to_string())
            .spawn(move || watch(weak, rx));
        match spawned {
            Ok(handle) => {
                *thread = Some(WatchThread { wake, handle });
                debug!("watchdog enabled ({:?})", self.inner.timeout);
                Ok(())
            }
            Err(e) => {
                self.inner.active.store(false, Ordering::Release);
                Err(e.into())
            }
        }
    }

    /// Stop periodic checks. The action may call this itself.
    pub fn disable(&self) {
        self.inner.active.store(false, Ordering::Release);
        let Some(WatchThread { wake, handle }) = self.inner.thread.lock().take() else {
            return;
        };
        let _ = wake.try_send(());
        drop(wake);
        if handle.thread().id() == thread::current().id() {
            return;
        }
        if handle.join().is_err() {
            error!("watchdog thread panicked");
        }
        debug!("watchdog disabled");
    }
}

fn watch(inner: Weak<WatchdogInner>, wake: Receiver<()>) {
    loop {
        let timeout = match inner.upgrade() {
            Some(inner) => inner.timeout,
            None => return,
        };
        match wake.recv_timeout(timeout) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(RecvTimeoutError::Disconnected) => return,
        }
        let Some(inner) = inner.upgrade() else {
            return;
        };
        if !inner.active.load(Ordering::Acquire) {
            return;
        }
        let quiet = inner
            .last_event
            .lock()
            .map_or(true, |last| last.elapsed() >= inner.timeout);
        if quiet {
            warn!("no event for {:?}, running watchdog action", inner.timeout);
            (inner.action)();
        }
    }
}

impl Drop for WatchdogInner {
    fn drop(&mut self) {
        if let Some(thread) = self.thread.get_mut().take() {
            // the thread only holds a weak reference and exits on disconnect
            drop(thread.wake);
        }
    }
}

impl fmt::Debug for Watchdog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Watchdog")
            .field("timeout", &self.inner.timeout)
            .field("active", &self.is_active())
            .finish()
    }
}
