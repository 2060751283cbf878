// libfirmata-rs/libfirmata/src/dispatch/dispatcher.rs

use std::any::Any;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam::channel::{self, Sender, TrySendError};
use log::{debug, error, warn};
use parking_lot::{Mutex, RwLock};

use crate::protocol::event::{Event, EventName};
use crate::protocol::fsm::EventSink;
use crate::utils::Worker;
use crate::Result;

/// Event callback. Runs on the dispatch thread (or the publishing thread in
/// inline mode) and must not block for long.
pub type Handler = Arc<dyn Fn(&Event) + Send + Sync>;

/// Registration handle returned by `add_handler` / `add_wildcard_handler`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

/// Where handlers run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Execution {
    /// One dedicated `firmata-event-handler` thread fed through a bounded
    /// queue.
    #[default]
    Threaded,
    /// Handlers run on the thread that publishes the event.
    Inline,
}

const WORKER_NAME: &str = "firmata-event-handler";

#[derive(Default)]
struct Registry {
    named: RwLock<HashMap<EventName, Vec<(HandlerId, Handler)>>>,
    wildcard: RwLock<Vec<(HandlerId, Handler)>>,
}

impl Registry {
    /// Named chain first, then wildcards, each in registration order. Both
    /// lists are snapshotted so handlers may register handlers.
    fn deliver(&self, event: &Event) {
        let name = event.name();
        let named: Vec<Handler> = self
            .named
            .read()
            .get(&name)
            .map(|chain| chain.iter().map(|(_, h)| Arc::clone(h)).collect())
            .unwrap_or_default();
        let wildcard: Vec<Handler> = self
            .wildcard
            .read()
            .iter()
            .map(|(_, h)| Arc::clone(h))
            .collect();

        for handler in named.iter().chain(wildcard.iter()) {
            if let Err(panic) = catch_unwind(AssertUnwindSafe(|| handler(event))) {
                error!(
                    "handler for {} event panicked: {}",
                    name,
                    panic_message(panic.as_ref())
                );
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}

struct Running {
    tx: Sender<Event>,
    worker: Worker<Event>,
}

/// Routes events to handler chains keyed by [`EventName`], plus wildcard
/// handlers that see every event.
///
/// A panicking handler is logged and skipped; it never reaches the parser.
/// In threaded mode a full queue drops the event with a warning instead of
/// blocking ingestion.
pub struct Dispatcher {
    registry: Arc<Registry>,
    execution: Execution,
    capacity: usize,
    running: Mutex<Option<Running>>,
    next_id: AtomicU64,
    dropped: AtomicU64,
}

impl Dispatcher {
    pub fn new(execution: Execution, capacity: usize) -> Self {
        Self {
            registry: Arc::new(Registry::default()),
            execution,
            capacity: capacity.max(1),
            running: Mutex::new(None),
            next_id: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    pub fn execution(&self) -> Execution {
        self.execution
    }

    fn next_id(&self) -> HandlerId {
        HandlerId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Append `handler` to the chain for `name`.
    pub fn add_handler<F>(&self, name: EventName, handler: F) -> HandlerId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.registry
            .named
            .write()
            .entry(name)
            .or_default()
            .push((id, Arc::new(handler)));
        id
    }

    pub fn add_wildcard_handler<F>(&self, handler: F) -> HandlerId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.registry.wildcard.write().push((id, Arc::new(handler)));
        id
    }

    /// Returns whether a handler was registered under `id`.
    pub fn remove_handler(&self, id: HandlerId) -> bool {
        let mut removed = false;
        for chain in self.registry.named.write().values_mut() {
            let before = chain.len();
            chain.retain(|(hid, _)| *hid != id);
            removed |= chain.len() != before;
        }
        let mut wildcard = self.registry.wildcard.write();
        let before = wildcard.len();
        wildcard.retain(|(hid, _)| *hid != id);
        removed || wildcard.len() != before
    }

    /// Start the dispatch thread. No-op in inline mode or when running.
    pub fn start(&self) -> Result<()> {
        if self.execution == Execution::Inline {
            return Ok(());
        }
        let mut running = self.running.lock();
        if running.is_some() {
            return Ok(());
        }
        let (tx, rx) = channel::bounded::<Event>(self.capacity);
        let registry = Arc::clone(&self.registry);
        let worker = Worker::spawn(WORKER_NAME, rx, move |event: Event| {
            registry.deliver(&event);
        })?;
        *running = Some(Running { tx, worker });
        debug!("dispatcher started (queue capacity {})", self.capacity);
        Ok(())
    }

    /// Stop the dispatch thread. Events still queued are discarded.
    pub fn stop(&self) {
        let running = self.running.lock().take();
        if let Some(Running { tx, mut worker }) = running {
            drop(tx);
            worker.stop();
            debug!("dispatcher stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        match self.execution {
            Execution::Inline => true,
            Execution::Threaded => self.running.lock().is_some(),
        }
    }

    /// Events dropped because the queue was full or the dispatcher stopped.
    pub fn dropped_events(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn dispatch(&self, event: Event) {
        if self.execution == Execution::Inline {
            self.registry.deliver(&event);
            return;
        }
        let tx = match self.running.lock().as_ref() {
            Some(running) => running.tx.clone(),
            None => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                debug!("dispatcher not running, {} event dropped", event.name());
                return;
            }
        };
        match tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                warn!("event queue full, {} event dropped", event.name());
            }
            Err(TrySendError::Disconnected(event)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                debug!("event queue closed, {} event dropped", event.name());
            }
        }
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

impl EventSink for Arc<Dispatcher> {
    fn publish(&mut self, event: Event) {
        self.dispatch(event);
    }
}
