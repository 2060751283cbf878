// libfirmata-rs/libfirmata/src/device/handle.rs

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::{debug, error, info, trace, warn};
use parking_lot::{Mutex, MutexGuard, RwLock};

use crate::constants::{ENCODER_CHANNEL_MASK, MAX_SAFE_STRING_LEN, PINS_PER_PORT};
use crate::device::config::DeviceConfig;
use crate::device::encoder::Encoder;
use crate::device::i2c::I2cDevice;
use crate::device::listener::{
    DeviceListener, EncoderEvent, ListenerId, ListenerSet, PinEvent,
};
use crate::device::pin::Pin;
use crate::dispatch::{Dispatcher, HandlerId};
use crate::protocol::commands::*;
use crate::protocol::event::{Event, EventKind, EventName};
use crate::protocol::parser::Parser;
use crate::transport::Transport;
use crate::types::{FirmwareInfo, InitPhase, PinMode, ProtocolVersion, Readiness};
use crate::utils::{self, HexBytes};
use crate::{Error, Result};

pub(crate) struct DeviceShared {
    config: DeviceConfig,
    transport: Mutex<Box<dyn Transport>>,
    dispatcher: Arc<Dispatcher>,
    parser: Parser,
    /// Serializes start and stop.
    lifecycle: Mutex<()>,
    started: AtomicBool,
    phase: Mutex<InitPhase>,
    firmware: RwLock<Option<FirmwareInfo>>,
    protocol_version: RwLock<Option<ProtocolVersion>>,
    analog_mapping: RwLock<BTreeMap<u8, u8>>,
    pins: RwLock<Vec<Pin>>,
    initialized_pins: AtomicUsize,
    i2c_devices: Mutex<HashMap<u8, I2cDevice>>,
    encoders: Mutex<HashMap<u8, Encoder>>,
    listeners: ListenerSet<dyn DeviceListener>,
    longest_i2c_delay: AtomicU32,
    /// Held while a digital port byte is computed and written.
    digital_write: Mutex<()>,
}

impl Drop for DeviceShared {
    fn drop(&mut self) {
        if self.started.load(Ordering::Acquire) {
            debug!("device dropped while started, tearing down");
            self.parser.stop();
            if let Err(e) = self.transport.get_mut().stop() {
                warn!("transport stop failed during drop: {}", e);
            }
        }
        self.dispatcher.stop();
    }
}

/// Connection to one Firmata board. Cheap to clone; clones share state.
///
/// `start` opens the transport and runs the initialization handshake:
/// firmware report, capability query, one pin-state query per pin, analog
/// mapping. The device is ready once the mapping arrives; reporting is then
/// enabled and listeners receive `on_start`.
#[derive(Clone)]
pub struct Device {
    shared: Arc<DeviceShared>,
}

impl Device {
    pub(crate) fn new(transport: Box<dyn Transport>, config: DeviceConfig) -> Result<Self> {
        config.validate()?;
        let dispatcher = Arc::new(Dispatcher::new(
            config.execution,
            config.event_queue_capacity,
        ));
        let parser = Parser::new(
            Arc::clone(&dispatcher),
            config.execution,
            config.parser_queue_capacity,
        );
        let shared = Arc::new(DeviceShared {
            config,
            transport: Mutex::new(transport),
            dispatcher,
            parser,
            lifecycle: Mutex::new(()),
            started: AtomicBool::new(false),
            phase: Mutex::new(InitPhase::Uninitialized),
            firmware: RwLock::new(None),
            protocol_version: RwLock::new(None),
            analog_mapping: RwLock::new(BTreeMap::new()),
            pins: RwLock::new(Vec::new()),
            initialized_pins: AtomicUsize::new(0),
            i2c_devices: Mutex::new(HashMap::new()),
            encoders: Mutex::new(HashMap::new()),
            listeners: ListenerSet::new(),
            longest_i2c_delay: AtomicU32::new(0),
            digital_write: Mutex::new(()),
        });
        register_handlers(&shared);
        Ok(Self { shared })
    }

    pub(crate) fn from_shared(shared: Arc<DeviceShared>) -> Self {
        Self { shared }
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.shared.config
    }

    // ---- lifecycle -------------------------------------------------------

    /// Open the connection and request the firmware report. Idempotent.
    /// On failure everything started so far is torn down again.
    pub fn start(&self) -> Result<()> {
        let s = &self.shared;
        let _lifecycle = s.lifecycle.lock();
        if s.started.load(Ordering::Acquire) {
            return Ok(());
        }
        self.reset_handshake();

        s.dispatcher.start()?;
        let sink = match s.parser.start() {
            Ok(sink) => sink,
            Err(e) => {
                s.dispatcher.stop();
                *s.phase.lock() = InitPhase::Uninitialized;
                return Err(e);
            }
        };
        if let Err(e) = s.transport.lock().start(sink) {
            s.parser.stop();
            s.dispatcher.stop();
            *s.phase.lock() = InitPhase::Uninitialized;
            return Err(e);
        }
        s.started.store(true, Ordering::Release);

        // Boards resetting on port open miss this request but report their
        // firmware once booted.
        if let Err(e) = self.send(&encode_report_firmware()) {
            s.started.store(false, Ordering::Release);
            s.parser.stop();
            if let Err(stop_err) = s.transport.lock().stop() {
                warn!("transport stop failed during rollback: {}", stop_err);
            }
            s.dispatcher.stop();
            *s.phase.lock() = InitPhase::Uninitialized;
            return Err(e);
        }
        info!("device started, waiting for firmware report");
        Ok(())
    }

    fn reset_handshake(&self) {
        let s = &self.shared;
        *s.phase.lock() = InitPhase::AwaitingFirmware;
        s.pins.write().clear();
        s.initialized_pins.store(0, Ordering::Release);
        *s.firmware.write() = None;
        s.analog_mapping.write().clear();
    }

    /// Disable reporting and close the connection. Idempotent. Listeners
    /// receive `on_stop` even when part of the teardown fails; the first
    /// error is returned.
    pub fn stop(&self) -> Result<()> {
        let s = &self.shared;
        let mut first_error = None;
        {
            let _lifecycle = s.lifecycle.lock();
            if !s.started.swap(false, Ordering::AcqRel) {
                return Ok(());
            }
            *s.phase.lock() = InitPhase::Uninitialized;

            for message in [encode_report_analog(false), encode_report_digital(false)] {
                if let Err(e) = self.write(&message) {
                    warn!("failed to disable reporting: {}", e);
                    first_error.get_or_insert(e);
                }
            }
            s.parser.stop();
            if let Err(e) = s.transport.lock().stop() {
                warn!("transport stop failed: {}", e);
                first_error.get_or_insert(e);
            }
            s.dispatcher.stop();
            info!("device stopped");
        }
        // outside the lifecycle lock: listeners may restart the device
        s.listeners.for_each(|l| l.on_stop(self));
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Start if needed and wait for the handshake within the configured
    /// timeout.
    pub fn ensure_initialization_is_done(&self) -> Result<()> {
        self.ensure_initialization_is_done_within(self.shared.config.init_timeout)
    }

    /// Like [`ensure_initialization_is_done`](Self::ensure_initialization_is_done)
    /// with an explicit timeout. A timeout leaves the connection open.
    pub fn ensure_initialization_is_done_within(&self, timeout: Duration) -> Result<()> {
        if !self.shared.started.load(Ordering::Acquire) {
            self.start()?;
        }
        if utils::wait_until(timeout, self.shared.config.init_poll_interval, || {
            self.is_ready()
        }) {
            Ok(())
        } else {
            warn!(
                "initialization not done after {:?} (phase {:?})",
                timeout,
                self.init_phase()
            );
            Err(Error::Timeout)
        }
    }

    pub fn is_started(&self) -> bool {
        self.shared.started.load(Ordering::Acquire)
    }

    pub fn is_ready(&self) -> bool {
        *self.shared.phase.lock() == InitPhase::Ready
    }

    pub fn readiness(&self) -> Readiness {
        self.shared.phase.lock().readiness()
    }

    pub fn init_phase(&self) -> InitPhase {
        *self.shared.phase.lock()
    }

    // ---- model -----------------------------------------------------------

    /// Pins in index order. Empty until capabilities were received.
    pub fn pins(&self) -> Vec<Pin> {
        self.shared.pins.read().clone()
    }

    pub fn pin(&self, index: usize) -> Result<Pin> {
        let pins = self.shared.pins.read();
        pins.get(index).cloned().ok_or(Error::PinOutOfRange {
            index,
            count: pins.len(),
        })
    }

    pub fn pin_count(&self) -> usize {
        self.shared.pins.read().len()
    }

    /// I2C device at `address`, created on first use. Every call sends
    /// I2C_CONFIG with the current longest read delay.
    pub fn i2c_device(&self, address: u8) -> Result<I2cDevice> {
        if address > 0x7F {
            return Err(Error::InvalidArgument(format!(
                "i2c address {:#04x} is not a 7-bit address",
                address
            )));
        }
        let device = self
            .shared
            .i2c_devices
            .lock()
            .entry(address)
            .or_insert_with(|| I2cDevice::new(address, Arc::downgrade(&self.shared)))
            .clone();
        let delay = self.shared.longest_i2c_delay.load(Ordering::Acquire);
        self.send(&encode_i2c_config(delay as u16))?;
        Ok(device)
    }

    /// Encoder slot `index`, created on first use.
    pub fn encoder(&self, index: u8) -> Result<Encoder> {
        if index > ENCODER_CHANNEL_MASK {
            return Err(Error::InvalidArgument(format!(
                "encoder index {} out of range (max {})",
                index, ENCODER_CHANNEL_MASK
            )));
        }
        Ok(self
            .shared
            .encoders
            .lock()
            .entry(index)
            .or_insert_with(|| Encoder::new(index, Arc::downgrade(&self.shared)))
            .clone())
    }

    pub fn firmware(&self) -> Option<FirmwareInfo> {
        self.shared.firmware.read().clone()
    }

    /// Firmware description, `"<name> - <major>.<minor>"`.
    pub fn protocol(&self) -> Option<String> {
        self.firmware().map(|fw| fw.to_string())
    }

    pub fn protocol_version(&self) -> Option<ProtocolVersion> {
        *self.shared.protocol_version.read()
    }

    /// Analog channel to pin index, as last reported by the board.
    pub fn analog_mapping(&self) -> BTreeMap<u8, u8> {
        self.shared.analog_mapping.read().clone()
    }

    // ---- listeners and handlers ------------------------------------------

    pub fn add_listener(&self, listener: Arc<dyn DeviceListener>) -> ListenerId {
        self.shared.listeners.add(listener)
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.shared.listeners.remove(id)
    }

    /// Low-level handler for every event named `name`, run after the
    /// device's own handling.
    pub fn add_protocol_handler<F>(&self, name: EventName, handler: F) -> HandlerId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.shared.dispatcher.add_handler(name, handler)
    }

    pub fn add_wildcard_handler<F>(&self, handler: F) -> HandlerId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.shared.dispatcher.add_wildcard_handler(handler)
    }

    pub fn remove_protocol_handler(&self, id: HandlerId) -> bool {
        self.shared.dispatcher.remove_handler(id)
    }

    /// Decode sysex `command` into `EventKind::CustomSysex` events. Takes
    /// effect on the next `start`.
    pub fn register_custom_sysex(&self, command: u8) -> Result<()> {
        self.shared.parser.register_custom_sysex(command)
    }

    /// Events dropped by a full dispatch queue, and byte chunks dropped by a
    /// full parser queue.
    pub fn dropped_counts(&self) -> (u64, u64) {
        (
            self.shared.dispatcher.dropped_events(),
            self.shared.parser.dropped_chunks(),
        )
    }

    // ---- outgoing messages -----------------------------------------------

    /// Write a raw, already encoded message.
    pub fn send_message(&self, message: &[u8]) -> Result<()> {
        self.send(message)
    }

    /// Send a STRING_DATA message.
    pub fn send_string(&self, text: &str) -> Result<()> {
        if text.chars().count() > MAX_SAFE_STRING_LEN {
            warn!(
                "string of {} characters may overflow the board's input buffer (safe: {})",
                text.chars().count(),
                MAX_SAFE_STRING_LEN
            );
        }
        self.send(&encode_string_data(text))
    }

    pub fn send_command(&self, command: &Command) -> Result<()> {
        self.send(&command.encode()?)
    }

    /// Interval between analog reports, clamped to 10..=100 ms.
    pub fn set_sampling_interval(&self, interval_ms: u16) -> Result<()> {
        self.send(&encode_sampling_interval(interval_ms))
    }

    /// Toggle automatic position reports of attached encoders.
    pub fn set_encoder_reporting(&self, enable: bool) -> Result<()> {
        self.send(&encode_encoder_report_auto(enable))
    }

    pub fn request_encoder_positions(&self) -> Result<()> {
        self.send(&encode_encoder_report_positions())
    }

    pub fn system_reset(&self) -> Result<()> {
        self.send(&encode_system_reset())
    }

    /// Write to the transport of a started device.
    pub(crate) fn send(&self, message: &[u8]) -> Result<()> {
        if !self.shared.started.load(Ordering::Acquire) {
            return Err(Error::NotStarted);
        }
        self.write(message)
    }

    fn write(&self, message: &[u8]) -> Result<()> {
        trace!("-> {}", HexBytes(message));
        self.shared.transport.lock().write(message)
    }

    // ---- helpers for pins, I2C devices and encoders ----------------------

    pub(crate) fn servo_pulses(&self) -> (u16, u16) {
        (
            self.shared.config.servo_min_pulse,
            self.shared.config.servo_max_pulse,
        )
    }

    pub(crate) fn digital_write_lock(&self) -> MutexGuard<'_, ()> {
        self.shared.digital_write.lock()
    }

    /// Port byte with the bits of OUTPUT pins currently driven high.
    pub(crate) fn output_port_value(&self, port: u8) -> u8 {
        let pins = self.shared.pins.read();
        let first = port as usize * PINS_PER_PORT;
        (0..PINS_PER_PORT)
            .filter_map(|i| pins.get(first + i).map(|p| (i, p)))
            .filter(|(_, p)| p.mode() == Some(PinMode::Output) && p.value().unwrap_or(0) > 0)
            .fold(0u8, |acc, (i, _)| acc | (1 << i))
    }

    /// Raise the longest I2C delay; I2C_CONFIG is sent only when this call
    /// raised it.
    pub(crate) fn raise_i2c_delay(&self, delay_us: u16) -> Result<()> {
        let cell = &self.shared.longest_i2c_delay;
        if !utils::raise(cell, delay_us as u32) {
            return Ok(());
        }
        // a concurrent raise may have gone higher meanwhile
        let longest = cell.load(Ordering::Acquire);
        self.send(&encode_i2c_config(longest as u16))
    }

    pub(crate) fn notify_pin_change(&self, event: &PinEvent) {
        self.shared.listeners.for_each(|l| l.on_pin_change(event));
    }

    pub(crate) fn notify_encoder_change(&self, event: &EncoderEvent) {
        self.shared.listeners.for_each(|l| l.on_encoder_change(event));
    }

    // ---- event handling --------------------------------------------------

    fn on_protocol_version(&self, version: ProtocolVersion) {
        *self.shared.protocol_version.write() = Some(version);
        let supported = ProtocolVersion::SUPPORTED;
        if !version.is_compatible() {
            error!(
                "firmata protocol {} on the board is not compatible with supported {}",
                version, supported
            );
        } else if version.minor != supported.minor {
            warn!(
                "firmata protocol {} on the board differs from supported {}, some features may misbehave",
                version, supported
            );
        } else {
            debug!("firmata protocol {}", version);
        }
    }

    fn on_firmware(&self, firmware: &FirmwareInfo) {
        {
            let mut phase = self.shared.phase.lock();
            if *phase != InitPhase::AwaitingFirmware {
                debug!("firmware report {} outside the handshake ignored", firmware);
                return;
            }
            *self.shared.firmware.write() = Some(firmware.clone());
            *phase = InitPhase::AwaitingCapabilities;
        }
        info!("firmware {}", firmware);
        if let Err(e) = self.send(&encode_capability_query()) {
            error!("failed to request capabilities: {}", e);
        }
    }

    fn on_capability(&self, index: u8, modes: &[PinMode]) {
        if *self.shared.phase.lock() != InitPhase::AwaitingCapabilities {
            debug!("capability of pin {} outside the handshake ignored", index);
            return;
        }
        {
            let mut pins = self.shared.pins.write();
            if index as usize != pins.len() {
                // a repeated capability response must not shift the pin list
                warn!(
                    "capability of pin {} ignored, expected pin {}",
                    index,
                    pins.len()
                );
                return;
            }
            pins.push(Pin::new(index, modes.to_vec(), Arc::downgrade(&self.shared)));
        }
        if modes.is_empty() {
            // nothing to query, the pin is initialized as is
            self.count_initialized_pin();
            return;
        }
        if let Err(e) = self.send(&encode_pin_state_query(index)) {
            error!("failed to request state of pin {}: {}", index, e);
        }
        let batch = self.shared.config.pin_state_batch;
        if index > 0 && index as usize % batch == 0 {
            thread::sleep(self.shared.config.pin_state_batch_delay);
        }
    }

    fn on_capabilities_end(&self, pin_count: usize) {
        let request_mapping = {
            let mut phase = self.shared.phase.lock();
            if *phase != InitPhase::AwaitingCapabilities {
                return;
            }
            let initialized = self.shared.initialized_pins.load(Ordering::Acquire);
            let remaining = pin_count.saturating_sub(initialized);
            debug!("{} pins reported, {} awaiting state", pin_count, remaining);
            if remaining == 0 {
                *phase = InitPhase::AwaitingAnalogMapping;
                true
            } else {
                *phase = InitPhase::AwaitingPinStates { remaining };
                false
            }
        };
        if request_mapping {
            self.request_analog_mapping();
        }
    }

    /// Count one more initialized pin during the handshake. The last one
    /// moves the handshake to the analog mapping, exactly once.
    fn count_initialized_pin(&self) {
        let request_mapping = {
            let mut phase = self.shared.phase.lock();
            if !phase.counts_pin_states() {
                return;
            }
            let initialized = self.shared.initialized_pins.fetch_add(1, Ordering::AcqRel) + 1;
            match *phase {
                InitPhase::AwaitingPinStates { .. } => {
                    let remaining = self.pin_count().saturating_sub(initialized);
                    if remaining == 0 {
                        *phase = InitPhase::AwaitingAnalogMapping;
                        true
                    } else {
                        *phase = InitPhase::AwaitingPinStates { remaining };
                        false
                    }
                }
                _ => false,
            }
        };
        if request_mapping {
            self.request_analog_mapping();
        }
    }

    fn request_analog_mapping(&self) {
        if let Err(e) = self.send(&encode_analog_mapping_query()) {
            error!("failed to request analog mapping: {}", e);
        }
    }

    fn on_pin_state(&self, index: u8, mode: PinMode, value: u32) {
        let Ok(pin) = self.pin(index as usize) else {
            debug!("state of unknown pin {} ignored", index);
            return;
        };
        let first = !pin.is_initialized();
        pin.apply_board_state(self, mode, value);
        if first {
            self.count_initialized_pin();
        }
    }

    fn on_analog_mapping(&self, mapping: &BTreeMap<u8, u8>) {
        *self.shared.analog_mapping.write() = mapping.clone();
        if *self.shared.phase.lock() != InitPhase::AwaitingAnalogMapping {
            debug!("analog mapping refreshed");
            return;
        }
        for message in [encode_report_analog(true), encode_report_digital(true)] {
            if let Err(e) = self.send(&message) {
                error!("failed to enable reporting: {}", e);
            }
        }
        {
            let mut phase = self.shared.phase.lock();
            if *phase != InitPhase::AwaitingAnalogMapping {
                // stopped meanwhile
                return;
            }
            *phase = InitPhase::Ready;
        }
        info!("device ready with {} pins", self.pin_count());
        self.shared.listeners.for_each(|l| l.on_start(self));
    }

    fn on_digital_value(&self, index: u8, value: u8) {
        if let Ok(pin) = self.pin(index as usize) {
            if pin.mode().is_some_and(|m| m.is_digital_input()) {
                pin.update_value(self, value as u32);
            }
        }
    }

    fn on_analog_value(&self, channel: u8, value: u32) {
        let Some(index) = self.shared.analog_mapping.read().get(&channel).copied() else {
            return;
        };
        if let Ok(pin) = self.pin(index as usize) {
            if pin.mode() == Some(PinMode::Analog) {
                pin.update_value(self, value);
            }
        }
    }

    fn on_string_message(&self, text: &str) {
        debug!("board says: {}", text);
        self.shared
            .listeners
            .for_each(|l| l.on_message_receive(self, text));
    }

    fn on_i2c_reply(&self, address: u8, register: u8, data: &[u8]) {
        let device = self.shared.i2c_devices.lock().get(&address).cloned();
        match device {
            Some(device) => device.on_receive(register, data.to_vec()),
            None => debug!("i2c reply from unknown address {:#04x}", address),
        }
    }

    fn on_encoder_position(&self, index: u8, position: i64) {
        let encoder = self.shared.encoders.lock().get(&index).cloned();
        match encoder {
            Some(encoder) => encoder.update_position(self, position),
            None => debug!("position of unknown encoder {} ignored", index),
        }
    }

    fn handle(&self, kind: &EventKind) {
        match kind {
            EventKind::ProtocolVersion(version) => self.on_protocol_version(*version),
            EventKind::Firmware(firmware) => self.on_firmware(firmware),
            EventKind::Capability { pin, modes } => self.on_capability(*pin, modes),
            EventKind::CapabilitiesEnd { pin_count } => self.on_capabilities_end(*pin_count),
            EventKind::PinState { pin, mode, value } => self.on_pin_state(*pin, *mode, *value),
            EventKind::AnalogMapping(mapping) => self.on_analog_mapping(mapping),
            EventKind::DigitalValue { pin, value } => self.on_digital_value(*pin, *value),
            EventKind::AnalogValue { channel, value } => self.on_analog_value(*channel, *value),
            EventKind::StringMessage { text } => self.on_string_message(text),
            EventKind::I2cReply {
                address,
                register,
                data,
            } => self.on_i2c_reply(*address, *register, data),
            EventKind::EncoderPosition { encoder, position } => {
                self.on_encoder_position(*encoder, *position)
            }
            EventKind::SystemReset => info!("board sent system reset"),
            EventKind::Error { description, .. } => debug!("protocol error: {}", description),
            EventKind::CustomSysex { .. } | EventKind::TerminalState { .. } => {}
        }
    }
}

/// Device handlers run first in every chain: they are registered before
/// the device is handed out.
fn register_handlers(shared: &Arc<DeviceShared>) {
    const HANDLED: [EventName; 13] = [
        EventName::ProtocolVersion,
        EventName::Firmware,
        EventName::Capability,
        EventName::CapabilitiesEnd,
        EventName::PinState,
        EventName::AnalogMapping,
        EventName::DigitalValue,
        EventName::AnalogValue,
        EventName::StringMessage,
        EventName::I2cReply,
        EventName::EncoderPosition,
        EventName::SystemReset,
        EventName::Error,
    ];
    for name in HANDLED {
        let weak = Arc::downgrade(shared);
        shared.dispatcher.add_handler(name, move |event| {
            if let Some(shared) = weak.upgrade() {
                Device::from_shared(shared).handle(&event.kind);
            }
        });
    }
}

impl fmt::Debug for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Device")
            .field("firmware", &self.firmware())
            .field("phase", &self.init_phase())
            .field("pins", &self.pin_count())
            .finish()
    }
}
