// libfirmata-rs/libfirmata/src/protocol/fsm/state.rs

/// Decoder states. Multi-byte states collect their bytes in the machine
/// buffer, which is cleared every time a state is entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum State {
    /// Expecting a command byte.
    #[default]
    Waiting,
    /// DIGITAL_MESSAGE for `port`, two data bytes follow.
    ParsingDigital { port: u8 },
    /// ANALOG_MESSAGE for `channel`, two data bytes follow.
    ParsingAnalog { channel: u8 },
    /// REPORT_VERSION, major and minor follow.
    ParsingVersion,
    /// START_SYSEX seen, the sub-command byte follows.
    ParsingSysex,
    ParsingFirmware,
    ParsingExtendedAnalog,
    /// Capability response, collecting the (mode, resolution) list of `pin`.
    ParsingCapabilityResponse { pin: u8 },
    ParsingAnalogMapping,
    ParsingPinState,
    ParsingString,
    ParsingI2cReply,
    ParsingEncoderPosition,
    /// Sysex sub-command registered by the application.
    ParsingCustomSysex { command: u8 },
}

impl State {
    pub fn is_waiting(&self) -> bool {
        matches!(self, Self::Waiting)
    }

    /// States that collect bytes until END_SYSEX.
    pub fn is_sysex_body(&self) -> bool {
        !matches!(
            self,
            Self::Waiting
                | Self::ParsingDigital { .. }
                | Self::ParsingAnalog { .. }
                | Self::ParsingVersion
                | Self::ParsingSysex
        )
    }
}

