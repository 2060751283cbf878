// libfirmata-rs/libfirmata/src/device/i2c.rs

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Instant;

use log::debug;
use parking_lot::Mutex;

use crate::device::handle::{Device, DeviceShared};
use crate::device::listener::{I2cEvent, I2cListener, ListenerId, ListenerSet};
use crate::protocol::commands::{encode_i2c_read, encode_i2c_stop_continuous, encode_i2c_write};
use crate::{Error, Result};

struct I2cInner {
    address: u8,
    /// One-shot listeners keyed by register tag.
    pending: Mutex<HashMap<u8, Arc<dyn I2cListener>>>,
    subscribers: ListenerSet<dyn I2cListener>,
    receiving: AtomicBool,
    device: Weak<DeviceShared>,
}

/// A device on the board's I2C bus. Obtained from
/// [`Device::i2c_device`]; clones share state.
#[derive(Clone)]
pub struct I2cDevice {
    inner: Arc<I2cInner>,
}

impl I2cDevice {
    pub(crate) fn new(address: u8, device: Weak<DeviceShared>) -> Self {
        Self {
            inner: Arc::new(I2cInner {
                address,
                pending: Mutex::new(HashMap::new()),
                subscribers: ListenerSet::new(),
                receiving: AtomicBool::new(false),
                device,
            }),
        }
    }

    pub fn address(&self) -> u8 {
        self.inner.address
    }

    pub fn device(&self) -> Result<Device> {
        self.inner
            .device
            .upgrade()
            .map(Device::from_shared)
            .ok_or(Error::DeviceDropped)
    }

    /// Raise the board-wide delay between an I2C write and the following
    /// read. Lower values than the current maximum are ignored.
    pub fn set_delay(&self, delay_us: u16) -> Result<()> {
        self.device()?.raise_i2c_delay(delay_us)
    }

    /// Write `data` to the device.
    pub fn tell(&self, data: &[u8]) -> Result<()> {
        self.device()?
            .send(&encode_i2c_write(self.address(), data))
    }

    /// Read `length` bytes once from `register` (0 for none). The reply
    /// tagged with `register` goes to `listener` exactly once instead of the
    /// subscribers.
    pub fn ask<L>(&self, register: u8, length: u16, listener: L) -> Result<()>
    where
        L: I2cListener + 'static,
    {
        let device = self.device()?;
        self.inner
            .pending
            .lock()
            .insert(register, Arc::new(listener));
        let sent = device.send(&encode_i2c_read(self.address(), register, length, false));
        if sent.is_err() {
            self.inner.pending.lock().remove(&register);
        }
        sent
    }

    pub fn subscribe(&self, listener: Arc<dyn I2cListener>) -> ListenerId {
        self.inner.subscribers.add(listener)
    }

    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.inner.subscribers.remove(id)
    }

    /// Ask the board to read `length` bytes continuously. Returns false
    /// when updates were already running.
    pub fn start_receiving_updates(&self, length: u16) -> Result<bool> {
        self.start_receiving_updates_from(0, length)
    }

    /// Continuous read starting at `register`.
    pub fn start_receiving_updates_from(&self, register: u8, length: u16) -> Result<bool> {
        let device = self.device()?;
        if self
            .inner
            .receiving
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Ok(false);
        }
        if let Err(e) = device.send(&encode_i2c_read(self.address(), register, length, true)) {
            self.inner.receiving.store(false, Ordering::Release);
            return Err(e);
        }
        Ok(true)
    }

    /// Stop a continuous read. Returns false when none was running.
    pub fn stop_receiving_updates(&self) -> Result<bool> {
        let device = self.device()?;
        if self
            .inner
            .receiving
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Ok(false);
        }
        if let Err(e) = device.send(&encode_i2c_stop_continuous(self.address())) {
            self.inner.receiving.store(true, Ordering::Release);
            return Err(e);
        }
        Ok(true)
    }

    pub fn is_receiving_updates(&self) -> bool {
        self.inner.receiving.load(Ordering::Acquire)
    }

    /// Route a reply: the pending listener for `register` if any,
    /// subscribers otherwise.
    pub(crate) fn on_receive(&self, register: u8, data: Vec<u8>) {
        let event = I2cEvent {
            address: self.address(),
            register,
            data,
            timestamp: Instant::now(),
        };
        let pending = self.inner.pending.lock().remove(&register);
        match pending {
            Some(listener) => listener.on_receive(&event),
            None => {
                if self.inner.subscribers.is_empty() {
                    debug!(
                        "i2c reply from {:#04x} register {} has no listener",
                        event.address, register
                    );
                }
                self.inner.subscribers.for_each(|l| l.on_receive(&event));
            }
        }
    }
}

impl fmt::Debug for I2cDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("I2cDevice")
            .field("address", &self.inner.address)
            .field("receiving", &self.is_receiving_updates())
            .finish()
    }
}
