// libfirmata-rs/libfirmata/src/device/builder.rs

use crate::device::config::DeviceConfig;
use crate::device::handle::Device;
use crate::dispatch::Execution;
use crate::transport::Transport;
use crate::{Error, Result};

/// Helper to construct a Device with optional configuration.
#[derive(Default)]
pub struct DeviceBuilder {
    transport: Option<Box<dyn Transport>>,
    config: DeviceConfig,
}

impl DeviceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provide an already-created transport instance (e.g. MockTransport)
    pub fn with_transport(mut self, transport: Box<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn with_config(mut self, config: DeviceConfig) -> Self {
        self.config = config;
        self
    }

    /// Parse and dispatch on the thread that delivers the bytes instead of
    /// worker threads.
    pub fn synchronous(mut self) -> Self {
        self.config.execution = Execution::Inline;
        self
    }

    /// Consume the builder and return a device that is not started yet.
    /// Requires a transport to be provided; otherwise returns TransportMissing.
    pub fn build(self) -> Result<Device> {
        match self.transport {
            Some(t) => Device::new(t, self.config),
            None => Err(Error::TransportMissing),
        }
    }
}
