use libfirmata::protocol::{Command, EncoderOp};
use libfirmata::{Error, PinMode};

fn wire(command: Command) -> Vec<u8> {
    command.encode().unwrap()
}

#[test]
fn handshake_queries() {
    assert_eq!(wire(Command::ReportVersion), vec![0xF9]);
    assert_eq!(wire(Command::ReportFirmware), vec![0xF0, 0x79, 0xF7]);
    assert_eq!(wire(Command::CapabilityQuery), vec![0xF0, 0x6B, 0xF7]);
    assert_eq!(wire(Command::AnalogMappingQuery), vec![0xF0, 0x69, 0xF7]);
    assert_eq!(
        wire(Command::PinStateQuery { pin: 13 }),
        vec![0xF0, 0x6D, 13, 0xF7]
    );
}

#[test]
fn pin_messages() {
    assert_eq!(
        wire(Command::SetPinMode {
            pin: 9,
            mode: PinMode::Servo
        }),
        vec![0xF4, 9, 0x04]
    );
    // pins 0 and 7 of port 1 high
    assert_eq!(
        wire(Command::DigitalPortValue {
            port: 1,
            value: 0x81
        }),
        vec![0x91, 0x01, 0x01]
    );
    assert_eq!(
        wire(Command::SetDigitalPinValue {
            pin: 4,
            value: true
        }),
        vec![0xF5, 4, 1]
    );
}

#[test]
fn analog_value_switches_to_extended_message() {
    let compact = Command::AnalogValue { pin: 3, value: 255 };
    assert_eq!(compact.command_byte(), 0xE3);
    assert_eq!(wire(compact), vec![0xE3, 0x7F, 0x01]);

    let high_pin = Command::AnalogValue { pin: 20, value: 90 };
    assert_eq!(high_pin.command_byte(), 0xF0);
    assert_eq!(wire(high_pin), vec![0xF0, 0x6F, 20, 90, 0, 0, 0, 0xF7]);

    let wide_value = Command::AnalogValue {
        pin: 2,
        value: 0x4000,
    };
    assert_eq!(wire(wide_value), vec![0xF0, 0x6F, 2, 0, 0, 1, 0, 0xF7]);
}

#[test]
fn reporting_and_sampling() {
    let analog_on = wire(Command::ReportAnalog { enable: true });
    assert_eq!(analog_on.len(), 32);
    assert_eq!(&analog_on[..4], &[0xC0, 1, 0xC1, 1]);
    assert_eq!(&analog_on[30..], &[0xCF, 1]);

    let digital_off = wire(Command::ReportDigital { enable: false });
    assert!(digital_off.chunks(2).all(|pair| pair[1] == 0));
    assert_eq!(digital_off[0], 0xD0);

    assert_eq!(
        wire(Command::SamplingInterval { interval_ms: 1 }),
        vec![0xF0, 0x7A, 10, 0, 0xF7]
    );
    assert_eq!(
        wire(Command::SamplingInterval { interval_ms: 500 }),
        vec![0xF0, 0x7A, 100, 0, 0xF7]
    );
}

#[test]
fn servo_config_pulses_are_14_bit() {
    assert_eq!(
        wire(Command::ServoConfig {
            pin: 9,
            min_pulse: 544,
            max_pulse: 2400
        }),
        vec![0xF0, 0x70, 9, 0x20, 0x04, 0x60, 0x12, 0xF7]
    );
}

#[test]
fn i2c_requests() {
    assert_eq!(
        wire(Command::I2cConfig { delay_us: 200 }),
        vec![0xF0, 0x78, 0x48, 0x01, 0xF7]
    );
    assert_eq!(
        wire(Command::I2cWrite {
            address: 0x3C,
            data: vec![0x00, 0xAF]
        }),
        vec![0xF0, 0x76, 0x3C, 0x00, 0x00, 0x00, 0x2F, 0x01, 0xF7]
    );
    assert_eq!(
        wire(Command::I2cRead {
            address: 0x48,
            register: 0x10,
            length: 2,
            continuous: false
        }),
        vec![0xF0, 0x76, 0x48, 0x08, 0x10, 0x00, 0x02, 0x00, 0xF7]
    );
    // register 0 is omitted
    assert_eq!(
        wire(Command::I2cRead {
            address: 0x48,
            register: 0,
            length: 6,
            continuous: true
        }),
        vec![0xF0, 0x76, 0x48, 0x10, 0x06, 0x00, 0xF7]
    );
    assert_eq!(
        wire(Command::I2cStopContinuous { address: 0x48 }),
        vec![0xF0, 0x76, 0x48, 0x18, 0xF7]
    );
}

#[test]
fn encoder_requests() {
    assert_eq!(
        wire(Command::Encoder(EncoderOp::Attach {
            encoder: 0,
            pin_a: 2,
            pin_b: 3
        })),
        vec![0xF0, 0x61, 0x00, 0, 2, 3, 0xF7]
    );
    assert_eq!(
        wire(Command::Encoder(EncoderOp::ReportPositions)),
        vec![0xF0, 0x61, 0x02, 0xF7]
    );
    assert_eq!(
        wire(Command::Encoder(EncoderOp::ReportAuto { enable: true })),
        vec![0xF0, 0x61, 0x04, 1, 0xF7]
    );
    assert_eq!(
        wire(Command::Encoder(EncoderOp::Detach { encoder: 1 })),
        vec![0xF0, 0x61, 0x05, 1, 0xF7]
    );
}

#[test]
fn string_and_raw_sysex() {
    assert_eq!(
        wire(Command::StringData {
            text: "hi".to_string()
        }),
        vec![0xF0, 0x71, b'h', 0, b'i', 0, 0xF7]
    );
    assert_eq!(wire(Command::SystemReset), vec![0xFF]);
    assert_eq!(
        wire(Command::Sysex {
            command: 0x01,
            data: vec![0x05]
        }),
        vec![0xF0, 0x01, 0x05, 0xF7]
    );
    assert!(matches!(
        Command::Sysex {
            command: 0x01,
            data: vec![0x90]
        }
        .encode(),
        Err(Error::InvalidArgument(_))
    ));
}
