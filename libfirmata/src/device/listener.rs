// libfirmata-rs/libfirmata/src/device/listener.rs

//! Listener traits and the copy-on-iterate set that holds them.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;

use crate::device::handle::Device;
use crate::device::pin::Pin;
use crate::types::PinMode;

/// Registration handle returned by every `add_listener`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Listeners in registration order. Notification iterates a snapshot, so
/// listeners may add or remove listeners while being notified.
pub struct ListenerSet<T: ?Sized> {
    next_id: AtomicU64,
    entries: RwLock<Vec<(ListenerId, Arc<T>)>>,
}

impl<T: ?Sized> Default for ListenerSet<T> {
    fn default() -> Self {
        Self {
            next_id: AtomicU64::new(0),
            entries: RwLock::new(Vec::new()),
        }
    }
}

impl<T: ?Sized> ListenerSet<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, listener: Arc<T>) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.entries.write().push((id, listener));
        id
    }

    /// Returns whether `id` was registered.
    pub fn remove(&self, id: ListenerId) -> bool {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|(lid, _)| *lid != id);
        entries.len() != before
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn snapshot(&self) -> Vec<Arc<T>> {
        self.entries
            .read()
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect()
    }

    /// Call `f` for every listener of the current snapshot. No lock is held
    /// during the calls.
    pub fn for_each<F: FnMut(&T)>(&self, mut f: F) {
        for listener in self.snapshot() {
            f(&*listener);
        }
    }
}

/// Pin mode or value change, with the state after the change.
#[derive(Debug, Clone)]
pub struct PinEvent {
    pub pin: Pin,
    pub mode: Option<PinMode>,
    pub value: Option<u32>,
    pub timestamp: Instant,
}

/// Data read from an I2C device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct I2cEvent {
    pub address: u8,
    pub register: u8,
    pub data: Vec<u8>,
    pub timestamp: Instant,
}

/// Encoder position or attachment change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderEvent {
    pub encoder: u8,
    pub position: i64,
    pub attached: bool,
    pub timestamp: Instant,
}

/// Device-wide notifications. Every method defaults to a no-op.
pub trait DeviceListener: Send + Sync {
    /// Initialization handshake finished.
    fn on_start(&self, _device: &Device) {}
    fn on_stop(&self, _device: &Device) {}
    /// Fired before the pin's own listeners.
    fn on_pin_change(&self, _event: &PinEvent) {}
    /// STRING_DATA message from the board.
    fn on_message_receive(&self, _device: &Device, _message: &str) {}
    /// Fired before the encoder's own listeners.
    fn on_encoder_change(&self, _event: &EncoderEvent) {}
}

pub trait PinListener: Send + Sync {
    fn on_mode_change(&self, _event: &PinEvent) {}
    fn on_value_change(&self, _event: &PinEvent) {}
}

pub trait I2cListener: Send + Sync {
    fn on_receive(&self, event: &I2cEvent);
}

impl<F> I2cListener for F
where
    F: Fn(&I2cEvent) + Send + Sync,
{
    fn on_receive(&self, event: &I2cEvent) {
        self(event)
    }
}

pub trait EncoderListener: Send + Sync {
    fn on_position_change(&self, _event: &EncoderEvent) {}
    fn on_attach_change(&self, _event: &EncoderEvent) {}
}
