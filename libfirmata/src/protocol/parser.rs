// libfirmata-rs/libfirmata/src/protocol/parser.rs

//! Ingestion: owns the state machine and feeds it from the transport.
//!
//! Threaded mode runs the machine on a `firmata-parser` thread fed through
//! a bounded queue of byte chunks. Inline mode decodes on the pushing
//! thread; a push made while the machine is busy (for example from an
//! inline event handler) is queued and drained by the outer push.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam::channel::{self, Sender, TrySendError};
use log::{debug, trace, warn};
use parking_lot::Mutex;

use crate::dispatch::{Dispatcher, Execution};
use crate::protocol::fsm::StateMachine;
use crate::utils::{HexBytes, Worker};
use crate::{Error, Result};

const WORKER_NAME: &str = "firmata-parser";

type Machine = StateMachine<Arc<Dispatcher>>;

struct InlineCore {
    pending: Mutex<VecDeque<Vec<u8>>>,
    machine: Mutex<Machine>,
    stopped: AtomicBool,
}

impl InlineCore {
    fn push(&self, bytes: &[u8]) {
        if self.stopped.load(Ordering::Acquire) {
            debug!("parser stopped, {} bytes discarded", bytes.len());
            return;
        }
        self.pending.lock().push_back(bytes.to_vec());
        loop {
            let Some(mut machine) = self.machine.try_lock() else {
                // the thread holding the machine drains our chunk
                return;
            };
            loop {
                let next = self.pending.lock().pop_front();
                match next {
                    Some(chunk) => {
                        trace!("<- {}", HexBytes(&chunk));
                        machine.process_bytes(&chunk);
                    }
                    None => break,
                }
            }
            drop(machine);
            if self.pending.lock().is_empty() {
                return;
            }
        }
    }
}

#[derive(Clone)]
enum SinkInner {
    Threaded {
        tx: Sender<Vec<u8>>,
        dropped: Arc<AtomicU64>,
    },
    Inline(Arc<InlineCore>),
}

/// Cloneable push handle handed to the transport. Bytes must be pushed in
/// the order they were received.
#[derive(Clone)]
pub struct ByteSink {
    inner: SinkInner,
}

impl ByteSink {
    pub fn push(&self, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        match &self.inner {
            SinkInner::Threaded { tx, dropped } => match tx.try_send(bytes.to_vec()) {
                Ok(()) => {}
                Err(TrySendError::Full(chunk)) => {
                    dropped.fetch_add(1, Ordering::Relaxed);
                    warn!("parser queue full, {} bytes dropped", chunk.len());
                }
                Err(TrySendError::Disconnected(chunk)) => {
                    debug!("parser stopped, {} bytes discarded", chunk.len());
                }
            },
            SinkInner::Inline(core) => core.push(bytes),
        }
    }
}

impl std::fmt::Debug for ByteSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mode = match self.inner {
            SinkInner::Threaded { .. } => "threaded",
            SinkInner::Inline(_) => "inline",
        };
        f.debug_struct("ByteSink").field("mode", &mode).finish()
    }
}

enum Running {
    Threaded {
        sink: ByteSink,
        worker: Worker<Vec<u8>>,
    },
    Inline {
        sink: ByteSink,
        core: Arc<InlineCore>,
    },
}

impl Running {
    fn sink(&self) -> ByteSink {
        match self {
            Self::Threaded { sink, .. } | Self::Inline { sink, .. } => sink.clone(),
        }
    }
}

/// Owner of the decoding pipeline between a transport and a dispatcher.
pub struct Parser {
    dispatcher: Arc<Dispatcher>,
    execution: Execution,
    capacity: usize,
    custom_sysex: Mutex<HashSet<u8>>,
    running: Mutex<Option<Running>>,
    dropped: Arc<AtomicU64>,
}

impl Parser {
    pub fn new(dispatcher: Arc<Dispatcher>, execution: Execution, capacity: usize) -> Self {
        Self {
            dispatcher,
            execution,
            capacity: capacity.max(1),
            custom_sysex: Mutex::new(HashSet::new()),
            running: Mutex::new(None),
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Route sysex `command` to custom sysex events. Takes effect on the
    /// next `start`.
    pub fn register_custom_sysex(&self, command: u8) -> Result<()> {
        if command > 0x7F {
            return Err(Error::InvalidArgument(format!(
                "sysex command {:#04x} is not a 7-bit value",
                command
            )));
        }
        self.custom_sysex.lock().insert(command);
        Ok(())
    }

    fn new_machine(&self) -> Result<Machine> {
        let mut machine = StateMachine::new(Arc::clone(&self.dispatcher));
        for &command in self.custom_sysex.lock().iter() {
            machine.register_custom_sysex(command)?;
        }
        Ok(machine)
    }

    /// Start decoding. Idempotent: a running parser returns its sink.
    pub fn start(&self) -> Result<ByteSink> {
        let mut running = self.running.lock();
        if let Some(r) = running.as_ref() {
            return Ok(r.sink());
        }
        let mut machine = self.new_machine()?;
        let started = match self.execution {
            Execution::Threaded => {
                let (tx, rx) = channel::bounded::<Vec<u8>>(self.capacity);
                let worker = Worker::spawn(WORKER_NAME, rx, move |chunk: Vec<u8>| {
                    trace!("<- {}", HexBytes(&chunk));
                    machine.process_bytes(&chunk);
                })?;
                let sink = ByteSink {
                    inner: SinkInner::Threaded {
                        tx,
                        dropped: Arc::clone(&self.dropped),
                    },
                };
                Running::Threaded { sink, worker }
            }
            Execution::Inline => {
                let core = Arc::new(InlineCore {
                    pending: Mutex::new(VecDeque::new()),
                    machine: Mutex::new(machine),
                    stopped: AtomicBool::new(false),
                });
                let sink = ByteSink {
                    inner: SinkInner::Inline(Arc::clone(&core)),
                };
                Running::Inline { sink, core }
            }
        };
        let sink = started.sink();
        *running = Some(started);
        debug!("parser started ({:?})", self.execution);
        Ok(sink)
    }

    /// Stop decoding. Sinks handed out earlier discard further input.
    pub fn stop(&self) {
        let running = self.running.lock().take();
        match running {
            Some(Running::Threaded { sink, mut worker }) => {
                drop(sink);
                worker.stop();
            }
            Some(Running::Inline { core, .. }) => {
                core.stopped.store(true, Ordering::Release);
            }
            None => return,
        }
        debug!("parser stopped");
    }

    pub fn is_running(&self) -> bool {
        self.running.lock().is_some()
    }

    /// Sink of the running parser.
    pub fn sink(&self) -> Option<ByteSink> {
        self.running.lock().as_ref().map(Running::sink)
    }

    /// Chunks dropped because the parser queue was full.
    pub fn dropped_chunks(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Drop for Parser {
    fn drop(&mut self) {
        self.stop();
    }
}
