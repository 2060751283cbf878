// libfirmata-rs/libfirmata/src/device/encoder.rs

use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Instant;

use parking_lot::Mutex;

use crate::device::handle::{Device, DeviceShared};
use crate::device::listener::{EncoderEvent, EncoderListener, ListenerId, ListenerSet};
use crate::protocol::commands::{
    encode_encoder_attach, encode_encoder_detach, encode_encoder_report_position,
    encode_encoder_reset_position,
};
use crate::types::PinMode;
use crate::{Error, Result};

#[derive(Debug, Default, Clone, Copy)]
struct EncoderState {
    pins: Option<(u8, u8)>,
    position: i64,
}

struct EncoderInner {
    index: u8,
    state: Mutex<EncoderState>,
    /// Serializes attach, detach and reset.
    op: Mutex<()>,
    listeners: ListenerSet<dyn EncoderListener>,
    device: Weak<DeviceShared>,
}

/// A quadrature encoder slot of the board's encoder extension. Obtained
/// from [`Device::encoder`]; clones share state.
#[derive(Clone)]
pub struct Encoder {
    inner: Arc<EncoderInner>,
}

impl Encoder {
    pub(crate) fn new(index: u8, device: Weak<DeviceShared>) -> Self {
        Self {
            inner: Arc::new(EncoderInner {
                index,
                state: Mutex::new(EncoderState::default()),
                op: Mutex::new(()),
                listeners: ListenerSet::new(),
                device,
            }),
        }
    }

    pub fn index(&self) -> u8 {
        self.inner.index
    }

    pub fn position(&self) -> i64 {
        self.inner.state.lock().position
    }

    pub fn is_attached(&self) -> bool {
        self.inner.state.lock().pins.is_some()
    }

    /// Pins the encoder is attached to.
    pub fn pins(&self) -> Option<(u8, u8)> {
        self.inner.state.lock().pins
    }

    pub fn device(&self) -> Result<Device> {
        self.inner
            .device
            .upgrade()
            .map(Device::from_shared)
            .ok_or(Error::DeviceDropped)
    }

    pub fn add_listener(&self, listener: Arc<dyn EncoderListener>) -> ListenerId {
        self.inner.listeners.add(listener)
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.inner.listeners.remove(id)
    }

    /// Attach the encoder to two pins. At least one of them must support
    /// ENCODER mode (interrupt capable). The board switches both pins to
    /// ENCODER mode, which is mirrored in the local pin cache.
    pub fn attach(&self, pin_a: u8, pin_b: u8) -> Result<()> {
        let device = self.device()?;
        let (a, b) = {
            let _op = self.inner.op.lock();
            if self.is_attached() {
                return Err(Error::InvalidState(format!(
                    "encoder {} is already attached",
                    self.index()
                )));
            }
            let a = device.pin(pin_a as usize)?;
            let b = device.pin(pin_b as usize)?;
            if !a.supports(PinMode::Encoder) && !b.supports(PinMode::Encoder) {
                return Err(Error::InvalidArgument(format!(
                    "neither pin {} nor pin {} supports ENCODER mode",
                    pin_a, pin_b
                )));
            }
            device.send(&encode_encoder_attach(self.index(), pin_a, pin_b))?;
            self.inner.state.lock().pins = Some((pin_a, pin_b));
            (a, b)
        };
        // listeners may re-enter this encoder
        a.update_mode(&device, PinMode::Encoder);
        b.update_mode(&device, PinMode::Encoder);
        self.notify_attach_change();
        Ok(())
    }

    /// Detach the encoder. Pin modes are left as ENCODER.
    pub fn detach(&self) -> Result<()> {
        let device = self.device()?;
        {
            let _op = self.inner.op.lock();
            if !self.is_attached() {
                return Err(Error::InvalidState(format!(
                    "encoder {} is not attached",
                    self.index()
                )));
            }
            device.send(&encode_encoder_detach(self.index()))?;
            self.inner.state.lock().pins = None;
        }
        self.notify_attach_change();
        Ok(())
    }

    /// Zero the position on the board and locally.
    pub fn reset_position(&self) -> Result<()> {
        let device = self.device()?;
        let changed = {
            let _op = self.inner.op.lock();
            device.send(&encode_encoder_reset_position(self.index()))?;
            self.store_position(0)
        };
        if changed {
            self.notify_position_change(&device);
        }
        Ok(())
    }

    /// Ask the board to report this encoder's position.
    pub fn request_position(&self) -> Result<()> {
        self.device()?
            .send(&encode_encoder_report_position(self.index()))
    }

    /// Position reported by the board, notified when it changed.
    pub(crate) fn update_position(&self, device: &Device, position: i64) {
        if self.store_position(position) {
            self.notify_position_change(device);
        }
    }

    fn store_position(&self, position: i64) -> bool {
        let mut state = self.inner.state.lock();
        if state.position == position {
            return false;
        }
        state.position = position;
        true
    }

    fn notify_position_change(&self, device: &Device) {
        let event = self.event();
        device.notify_encoder_change(&event);
        self.inner
            .listeners
            .for_each(|l| l.on_position_change(&event));
    }

    fn event(&self) -> EncoderEvent {
        let state = *self.inner.state.lock();
        EncoderEvent {
            encoder: self.index(),
            position: state.position,
            attached: state.pins.is_some(),
            timestamp: Instant::now(),
        }
    }

    fn notify_attach_change(&self) {
        let event = self.event();
        self.inner.listeners.for_each(|l| l.on_attach_change(&event));
    }
}

impl fmt::Debug for Encoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = *self.inner.state.lock();
        f.debug_struct("Encoder")
            .field("index", &self.inner.index)
            .field("pins", &state.pins)
            .field("position", &state.position)
            .finish()
    }
}
