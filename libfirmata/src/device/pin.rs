// libfirmata-rs/libfirmata/src/device/pin.rs

use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Instant;

use log::debug;
use parking_lot::Mutex;

use crate::constants::PINS_PER_PORT;
use crate::device::config::validate_servo_pulses;
use crate::device::handle::{Device, DeviceShared};
use crate::device::listener::{ListenerId, ListenerSet, PinEvent, PinListener};
use crate::protocol::commands::{
    encode_analog_value, encode_digital_port, encode_pin_state_query, encode_servo_config,
    encode_set_digital_pin_value, encode_set_pin_mode,
};
use crate::types::PinMode;
use crate::{Error, Result};

#[derive(Debug, Default, Clone, Copy)]
struct PinState {
    /// `None` until the first pin-state response.
    mode: Option<PinMode>,
    /// `None` when unknown, e.g. right after switching to servo mode.
    value: Option<u32>,
}

struct PinInner {
    index: u8,
    supported: Vec<PinMode>,
    state: Mutex<PinState>,
    /// Serializes mode and value changes of this pin.
    op: Mutex<()>,
    listeners: ListenerSet<dyn PinListener>,
    device: Weak<DeviceShared>,
}

/// One pin of the board. Cheap to clone; clones share state.
///
/// Supported modes are fixed by capability negotiation. Mode and value are
/// cached locally and updated optimistically once a command has been
/// written to the transport, without waiting for the board to confirm it.
#[derive(Clone)]
pub struct Pin {
    inner: Arc<PinInner>,
}

impl Pin {
    pub(crate) fn new(index: u8, supported: Vec<PinMode>, device: Weak<DeviceShared>) -> Self {
        Self {
            inner: Arc::new(PinInner {
                index,
                supported,
                state: Mutex::new(PinState::default()),
                op: Mutex::new(()),
                listeners: ListenerSet::new(),
                device,
            }),
        }
    }

    pub fn index(&self) -> u8 {
        self.inner.index
    }

    pub fn supported_modes(&self) -> &[PinMode] {
        &self.inner.supported
    }

    pub fn supports(&self, mode: PinMode) -> bool {
        self.inner.supported.contains(&mode)
    }

    pub fn mode(&self) -> Option<PinMode> {
        self.inner.state.lock().mode
    }

    pub fn value(&self) -> Option<u32> {
        self.inner.state.lock().value
    }

    pub fn device(&self) -> Result<Device> {
        self.inner
            .device
            .upgrade()
            .map(Device::from_shared)
            .ok_or(Error::DeviceDropped)
    }

    pub fn add_listener(&self, listener: Arc<dyn PinListener>) -> ListenerId {
        self.inner.listeners.add(listener)
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.inner.listeners.remove(id)
    }

    pub fn remove_all_listeners(&self) {
        self.inner.listeners.clear();
    }

    /// Switch the pin to `mode`. Servo mode uses the configured default
    /// pulse range. Nothing is sent when the pin is already in `mode`.
    pub fn set_mode(&self, mode: PinMode) -> Result<()> {
        self.apply_mode(mode, None)
    }

    /// Switch the pin to servo mode with an explicit pulse range (us).
    pub fn set_servo_mode(&self, min_pulse: u16, max_pulse: u16) -> Result<()> {
        validate_servo_pulses(min_pulse, max_pulse)?;
        self.apply_mode(PinMode::Servo, Some((min_pulse, max_pulse)))
    }

    fn apply_mode(&self, mode: PinMode, pulses: Option<(u16, u16)>) -> Result<()> {
        if !self.supports(mode) {
            return Err(Error::UnsupportedMode {
                pin: self.index(),
                mode,
            });
        }
        let device = self.device()?;
        {
            let _op = self.inner.op.lock();
            if self.mode() == Some(mode) {
                return Ok(());
            }
            if mode == PinMode::Servo {
                let (min, max) = pulses.unwrap_or_else(|| device.servo_pulses());
                device.send(&encode_servo_config(self.index(), min, max))?;
                // the servo moves to its center position, value unknown
                self.inner.state.lock().value = None;
            }
            device.send(&encode_set_pin_mode(self.index(), mode))?;
            self.inner.state.lock().mode = Some(mode);
        }
        // listeners may call back into this pin
        self.notify_mode_change(&device);
        device.send(&encode_pin_state_query(self.index()))
    }

    /// Write `value` to the pin.
    ///
    /// OUTPUT pins send the whole 8-pin port byte (any value > 0 drives
    /// the pin high); ANALOG, PWM and SERVO pins send an analog message.
    /// Nothing is sent when the cached value already equals the new one.
    pub fn set_value(&self, value: u32) -> Result<()> {
        let device = self.device()?;
        if self.write_value(&device, value)? {
            self.notify_value_change(&device);
        }
        Ok(())
    }

    fn write_value(&self, device: &Device, value: u32) -> Result<bool> {
        let _op = self.inner.op.lock();
        match self.mode() {
            Some(PinMode::Output) => {
                let level = u32::from(value > 0);
                let _port = device.digital_write_lock();
                if self.value() == Some(level) {
                    return Ok(false);
                }
                let port = self.index() / PINS_PER_PORT as u8;
                let bit = 1u8 << (self.index() % PINS_PER_PORT as u8);
                let mut port_value = device.output_port_value(port);
                if level > 0 {
                    port_value |= bit;
                } else {
                    port_value &= !bit;
                }
                device.send(&encode_digital_port(port, port_value))?;
                Ok(self.store_value(level))
            }
            Some(mode) if mode.is_analog_output() => {
                if self.value() == Some(value) {
                    return Ok(false);
                }
                device.send(&encode_analog_value(self.index(), value))?;
                Ok(self.store_value(value))
            }
            other => Err(Error::InvalidState(format!(
                "pin {} is in {} mode and its value cannot be set",
                self.index(),
                other.map_or_else(|| "unknown".to_string(), |m| m.to_string())
            ))),
        }
    }

    /// Drive a single OUTPUT pin with SET_DIGITAL_PIN_VALUE instead of a
    /// whole port message.
    pub fn set_digital_value(&self, high: bool) -> Result<()> {
        let device = self.device()?;
        let changed = {
            let _op = self.inner.op.lock();
            if self.mode() != Some(PinMode::Output) {
                return Err(Error::InvalidState(format!(
                    "pin {} is not an OUTPUT pin",
                    self.index()
                )));
            }
            let level = u32::from(high);
            let _port = device.digital_write_lock();
            if self.value() == Some(level) {
                return Ok(());
            }
            device.send(&encode_set_digital_pin_value(self.index(), high))?;
            self.store_value(level)
        };
        if changed {
            self.notify_value_change(&device);
        }
        Ok(())
    }

    /// Whether the board has reported this pin's state yet.
    pub(crate) fn is_initialized(&self) -> bool {
        self.inner.state.lock().mode.is_some()
    }

    /// Apply a pin-state response. The first one initializes mode and value
    /// silently and returns true; later ones update the value with
    /// notification.
    pub(crate) fn apply_board_state(&self, device: &Device, mode: PinMode, value: u32) -> bool {
        {
            let mut state = self.inner.state.lock();
            if state.mode.is_none() {
                state.mode = Some(mode);
                state.value = Some(value);
                debug!("pin {} initialized: {} = {}", self.index(), mode, value);
                return true;
            }
        }
        self.update_value(device, value);
        false
    }

    /// Value reported by the board, notified when it changed.
    pub(crate) fn update_value(&self, device: &Device, value: u32) {
        if self.store_value(value) {
            self.notify_value_change(device);
        }
    }

    /// Mode switched by the board itself (e.g. attaching an encoder).
    pub(crate) fn update_mode(&self, device: &Device, mode: PinMode) {
        let changed = {
            let mut state = self.inner.state.lock();
            let changed = state.mode != Some(mode);
            state.mode = Some(mode);
            changed
        };
        if changed {
            self.notify_mode_change(device);
        }
    }

    fn store_value(&self, value: u32) -> bool {
        let mut state = self.inner.state.lock();
        if state.value == Some(value) {
            return false;
        }
        state.value = Some(value);
        true
    }

    fn event(&self) -> PinEvent {
        let state = *self.inner.state.lock();
        PinEvent {
            pin: self.clone(),
            mode: state.mode,
            value: state.value,
            timestamp: Instant::now(),
        }
    }

    // device listeners receive the event first, then pin listeners
    fn notify_mode_change(&self, device: &Device) {
        let event = self.event();
        device.notify_pin_change(&event);
        self.inner.listeners.for_each(|l| l.on_mode_change(&event));
    }

    fn notify_value_change(&self, device: &Device) {
        let event = self.event();
        device.notify_pin_change(&event);
        self.inner.listeners.for_each(|l| l.on_value_change(&event));
    }
}

impl PartialEq for Pin {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = *self.inner.state.lock();
        f.debug_struct("Pin")
            .field("index", &self.inner.index)
            .field("mode", &state.mode)
            .field("value", &state.value)
            .field("supported", &self.inner.supported)
            .finish()
    }
}
