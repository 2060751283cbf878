// libfirmata-rs/libfirmata/src/transport/mock.rs

use std::collections::VecDeque;
use std::io;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::protocol::parser::ByteSink;
use crate::transport::traits::Transport;
use crate::{Error, Result};

/// Produces the board's replies to one written message.
pub type Responder = Box<dyn FnMut(&[u8]) -> Vec<Vec<u8>> + Send>;

#[derive(Default)]
struct MockState {
    sent: Vec<Vec<u8>>,
    inbox: VecDeque<Vec<u8>>,
    sink: Option<ByteSink>,
    responder: Option<Responder>,
    auto_pump: bool,
    write_failures: usize,
    fail_start: bool,
    fail_stop: bool,
    start_count: usize,
    stop_count: usize,
}

/// Mock transport for tests. It records written messages and delivers
/// queued (or responder-generated) input to the parser.
///
/// Clones share state, so a test keeps one handle while the device owns
/// another. Input is delivered by [`pump`](Self::pump), outside of any
/// lock, so handlers may write back through the device. With
/// [`set_auto_pump`](Self::set_auto_pump) replies are pushed straight from
/// `write`; only do that with a threaded parser.
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mock whose replies are generated from each written message.
    pub fn with_responder<F>(responder: F) -> Self
    where
        F: FnMut(&[u8]) -> Vec<Vec<u8>> + Send + 'static,
    {
        let mock = Self::new();
        mock.set_responder(responder);
        mock
    }

    pub fn set_responder<F>(&self, responder: F)
    where
        F: FnMut(&[u8]) -> Vec<Vec<u8>> + Send + 'static,
    {
        self.state.lock().responder = Some(Box::new(responder));
    }

    pub fn set_auto_pump(&self, enabled: bool) {
        self.state.lock().auto_pump = enabled;
    }

    /// Make the next `n` writes fail with a broken pipe.
    pub fn fail_next_writes(&self, n: usize) {
        self.state.lock().write_failures = n;
    }

    pub fn set_fail_start(&self, fail: bool) {
        self.state.lock().fail_start = fail;
    }

    pub fn set_fail_stop(&self, fail: bool) {
        self.state.lock().fail_stop = fail;
    }

    /// Messages written so far, in order.
    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.state.lock().sent.clone()
    }

    pub fn take_sent(&self) -> Vec<Vec<u8>> {
        std::mem::take(&mut self.state.lock().sent)
    }

    pub fn clear_sent(&self) {
        self.state.lock().sent.clear();
    }

    /// Number of written messages equal to `message`.
    pub fn count_sent(&self, message: &[u8]) -> usize {
        self.state
            .lock()
            .sent
            .iter()
            .filter(|m| m.as_slice() == message)
            .count()
    }

    pub fn is_started(&self) -> bool {
        self.state.lock().sink.is_some()
    }

    pub fn start_count(&self) -> usize {
        self.state.lock().start_count
    }

    pub fn stop_count(&self) -> usize {
        self.state.lock().stop_count
    }

    /// Queue bytes as if the board had sent them. Delivered by `pump`.
    pub fn queue_input(&self, bytes: &[u8]) {
        self.state.lock().inbox.push_back(bytes.to_vec());
    }

    /// Push bytes into the parser right away.
    pub fn feed(&self, bytes: &[u8]) -> Result<()> {
        let sink = self.state.lock().sink.clone().ok_or(Error::NotStarted)?;
        sink.push(bytes);
        Ok(())
    }

    /// Deliver queued input until the inbox stays empty, including replies
    /// to messages written while delivering. Returns the chunks delivered.
    pub fn pump(&self) -> usize {
        let mut delivered = 0;
        loop {
            let next = {
                let mut state = self.state.lock();
                match state.sink.clone() {
                    Some(sink) => state.inbox.pop_front().map(|chunk| (sink, chunk)),
                    None => None,
                }
            };
            let Some((sink, chunk)) = next else {
                return delivered;
            };
            sink.push(&chunk);
            delivered += 1;
        }
    }
}

impl Transport for MockTransport {
    fn start(&mut self, sink: ByteSink) -> Result<()> {
        let mut state = self.state.lock();
        if state.fail_start {
            return Err(Error::Transport("mock start failure".into()));
        }
        state.sink = Some(sink);
        state.start_count += 1;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        let mut state = self.state.lock();
        state.sink = None;
        state.stop_count += 1;
        if state.fail_stop {
            return Err(Error::Transport("mock stop failure".into()));
        }
        Ok(())
    }

    fn write(&mut self, data: &[u8]) -> Result<()> {
        let push_now = {
            let mut state = self.state.lock();
            if state.sink.is_none() {
                return Err(Error::NotStarted);
            }
            if state.write_failures > 0 {
                state.write_failures -= 1;
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "mock write failure").into());
            }
            state.sent.push(data.to_vec());
            let replies = match state.responder.as_mut() {
                Some(responder) => responder(data),
                None => Vec::new(),
            };
            if state.auto_pump {
                state.sink.clone().map(|sink| (sink, replies))
            } else {
                state.inbox.extend(replies);
                None
            }
        };
        if let Some((sink, replies)) = push_now {
            for reply in replies {
                sink.push(&reply);
            }
        }
        Ok(())
    }
}
