// fixtures.rs: commonly used boards and frames

use libfirmata::test_support::BoardSim;
use libfirmata::PinMode;

/// Firmware report from the protocol examples: version 2.3, name "fw".
pub fn firmware_fw_2_3() -> Vec<u8> {
    vec![0xF0, 0x79, 2, 3, b'f', 0, b'w', 0, 0xF7]
}

/// Three pins: digital, empty, analog-capable.
pub fn three_pin_capabilities() -> Vec<u8> {
    vec![
        0xF0, 0x6C, // capability response
        0x00, 0x01, 0x01, 0x01, 0x7F, // pin 0: INPUT, OUTPUT
        0x7F, // pin 1: no modes
        0x02, 0x0A, 0x7F, // pin 2: ANALOG 10 bit
        0xF7,
    ]
}

/// UNO-like board: 20 pins, PWM on 3 5 6 9 10 11, encoders on 2 and 3,
/// analog channels 0..5 on pins 14..19. Pins 0 and 1 (serial) have no modes.
pub fn uno_like() -> BoardSim {
    let mut board = BoardSim::new("StandardFirmata.ino");
    for pin in 0..14u8 {
        let mut caps = vec![
            (PinMode::Input, 1),
            (PinMode::Output, 1),
            (PinMode::Pullup, 1),
            (PinMode::Servo, 14),
        ];
        if matches!(pin, 3 | 5 | 6 | 9 | 10 | 11) {
            caps.push((PinMode::Pwm, 8));
        }
        if matches!(pin, 2 | 3) {
            caps.push((PinMode::Encoder, 1));
        }
        let caps = if pin < 2 { Vec::new() } else { caps };
        board = board.with_pin(&caps, PinMode::Output, 0);
    }
    for channel in 0..6u8 {
        board = board.with_analog_pin(channel, 100 + channel as u32);
    }
    board
}
