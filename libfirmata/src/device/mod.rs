// libfirmata-rs/libfirmata/src/device/mod.rs

//! The board model: device handle, pins, I2C devices, encoders and their
//! listeners.

pub mod builder;
pub mod config;
pub mod encoder;
pub mod handle;
pub mod i2c;
pub mod listener;
pub mod pin;
pub mod watchdog;

pub use builder::DeviceBuilder;
pub use config::DeviceConfig;
pub use encoder::Encoder;
pub use handle::Device;
pub use i2c::I2cDevice;
pub use listener::{
    DeviceListener, EncoderEvent, EncoderListener, I2cEvent, I2cListener, ListenerId,
    ListenerSet, PinEvent, PinListener,
};
pub use pin::Pin;
pub use watchdog::Watchdog;
