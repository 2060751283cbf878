// libfirmata-rs/libfirmata/src/device/config.rs

use std::time::Duration;

use crate::dispatch::Execution;
use crate::{Error, Result};

/// How long `ensure_initialization_is_done` waits for the handshake.
pub const DEFAULT_INIT_TIMEOUT: Duration = Duration::from_secs(15);
/// Readiness polling period while waiting for the handshake.
pub const DEFAULT_INIT_POLL_INTERVAL: Duration = Duration::from_millis(100);
/// Pin-state queries sent back to back before pausing. Matches the pin
/// count of an Arduino UNO.
pub const DEFAULT_PIN_STATE_BATCH: usize = 14;
/// Pause between pin-state query batches, so boards with many pins do not
/// overflow their serial input buffer.
pub const DEFAULT_PIN_STATE_BATCH_DELAY: Duration = Duration::from_millis(10);
/// Arduino Servo library defaults (microseconds).
pub const DEFAULT_SERVO_MIN_PULSE: u16 = 544;
pub const DEFAULT_SERVO_MAX_PULSE: u16 = 2400;
/// Byte chunks buffered between the transport and the parser thread.
pub const DEFAULT_PARSER_QUEUE_CAPACITY: usize = 128;
/// Events buffered between the parser and the dispatch thread.
pub const DEFAULT_EVENT_QUEUE_CAPACITY: usize = 1024;

/// Device tuning knobs. `Default` gives the values above with threaded
/// execution.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceConfig {
    pub init_timeout: Duration,
    pub init_poll_interval: Duration,
    pub pin_state_batch: usize,
    pub pin_state_batch_delay: Duration,
    pub servo_min_pulse: u16,
    pub servo_max_pulse: u16,
    pub parser_queue_capacity: usize,
    pub event_queue_capacity: usize,
    /// Threaded runs the parser and the handlers on their own threads;
    /// inline decodes and dispatches on the thread pushing bytes.
    pub execution: Execution,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            init_timeout: DEFAULT_INIT_TIMEOUT,
            init_poll_interval: DEFAULT_INIT_POLL_INTERVAL,
            pin_state_batch: DEFAULT_PIN_STATE_BATCH,
            pin_state_batch_delay: DEFAULT_PIN_STATE_BATCH_DELAY,
            servo_min_pulse: DEFAULT_SERVO_MIN_PULSE,
            servo_max_pulse: DEFAULT_SERVO_MAX_PULSE,
            parser_queue_capacity: DEFAULT_PARSER_QUEUE_CAPACITY,
            event_queue_capacity: DEFAULT_EVENT_QUEUE_CAPACITY,
            execution: Execution::Threaded,
        }
    }
}

impl DeviceConfig {
    pub fn with_init_timeout(mut self, timeout: Duration) -> Self {
        self.init_timeout = timeout;
        self
    }

    pub fn with_init_poll_interval(mut self, interval: Duration) -> Self {
        self.init_poll_interval = interval;
        self
    }

    pub fn with_pin_state_throttle(mut self, batch: usize, delay: Duration) -> Self {
        self.pin_state_batch = batch;
        self.pin_state_batch_delay = delay;
        self
    }

    pub fn with_servo_pulses(mut self, min_pulse: u16, max_pulse: u16) -> Self {
        self.servo_min_pulse = min_pulse;
        self.servo_max_pulse = max_pulse;
        self
    }

    pub fn with_queue_capacities(mut self, parser: usize, events: usize) -> Self {
        self.parser_queue_capacity = parser;
        self.event_queue_capacity = events;
        self
    }

    pub fn with_execution(mut self, execution: Execution) -> Self {
        self.execution = execution;
        self
    }

    /// Reject settings the device cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.init_poll_interval.is_zero() {
            return Err(Error::InvalidArgument(
                "init poll interval must be non-zero".into(),
            ));
        }
        if self.pin_state_batch == 0 {
            return Err(Error::InvalidArgument(
                "pin state batch must be at least 1".into(),
            ));
        }
        if self.parser_queue_capacity == 0 || self.event_queue_capacity == 0 {
            return Err(Error::InvalidArgument(
                "queue capacities must be at least 1".into(),
            ));
        }
        validate_servo_pulses(self.servo_min_pulse, self.servo_max_pulse)
    }
}

/// Pulses are sent as 14-bit values and the range must not be empty.
pub(crate) fn validate_servo_pulses(min_pulse: u16, max_pulse: u16) -> Result<()> {
    if min_pulse >= max_pulse || max_pulse > 0x3FFF {
        return Err(Error::InvalidArgument(format!(
            "invalid servo pulse range {}..{}",
            min_pulse, max_pulse
        )));
    }
    Ok(())
}
