//! Named worker thread draining a crossbeam queue.

use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{Receiver, RecvTimeoutError};
use log::{debug, error};

use crate::Result;

/// How often an idle worker re-checks its shutdown flag.
const SHUTDOWN_POLL: Duration = Duration::from_millis(100);

/// A thread that feeds every item of a queue to a handler.
///
/// - shutdown through an atomic flag checked between items
/// - exits on its own when every sender is gone
/// - joined by `stop` and on drop, except from inside its own handler
pub struct Worker<T: Send + 'static> {
    handle: Option<JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
    name: String,
    _phantom: PhantomData<T>,
}

impl<T: Send + 'static> Worker<T> {
    pub fn spawn<F>(name: &str, rx: Receiver<T>, mut handler: F) -> Result<Self>
    where
        F: FnMut(T) + Send + 'static,
    {
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_flag = Arc::clone(&shutdown);
        let thread_name = name.to_string();

        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                debug!("[{}] started", thread_name);
                while !shutdown_flag.load(Ordering::Acquire) {
                    match rx.recv_timeout(SHUTDOWN_POLL) {
                        Ok(item) => handler(item),
                        Err(RecvTimeoutError::Timeout) => continue,
                        Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                debug!("[{}] exiting", thread_name);
            })?;

        Ok(Self {
            handle: Some(handle),
            shutdown,
            name: name.to_string(),
            _phantom: PhantomData,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Signal the worker to stop and wait for it to finish. Called from the
    /// worker thread itself the join is skipped; the loop exits after the
    /// current item.
    pub fn stop(&mut self) {
        self.shutdown.store(true, Ordering::Release);
        let Some(handle) = self.handle.take() else {
            return;
        };
        if handle.thread().id() == thread::current().id() {
            debug!("[{}] stop requested from its own thread, not joining", self.name);
            return;
        }
        if handle.join().is_err() {
            error!("[{}] worker thread panicked", self.name);
        }
    }

    pub fn is_running(&self) -> bool {
        !self.shutdown.load(Ordering::Acquire)
            && self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl<T: Send + 'static> Drop for Worker<T> {
    fn drop(&mut self) {
        self.stop();
    }
}
