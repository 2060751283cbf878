#[path = "../common/mod.rs"]
mod common;

use std::sync::Arc;
use std::time::Duration;

use common::Recorder;
use libfirmata::device::{Encoder, EncoderEvent, EncoderListener};
use libfirmata::test_support::{encoder_positions_frame, BoardSim};
use libfirmata::{Error, PinMode};
use parking_lot::Mutex;

#[derive(Default)]
struct Track {
    positions: Mutex<Vec<i64>>,
    attached: Mutex<Vec<bool>>,
}

impl EncoderListener for Track {
    fn on_position_change(&self, event: &EncoderEvent) {
        self.positions.lock().push(event.position);
    }

    fn on_attach_change(&self, event: &EncoderEvent) {
        self.attached.lock().push(event.attached);
    }
}

#[test]
fn attach_switches_pins_to_encoder_mode() {
    let (device, mock) = common::ready_device(BoardSim::small());
    let encoder = device.encoder(0).unwrap();
    let track = Arc::new(Track::default());
    encoder.add_listener(track.clone());

    encoder.attach(2, 3).unwrap();
    assert_eq!(mock.sent(), vec![vec![0xF0, 0x61, 0x00, 0, 2, 3, 0xF7]]);
    assert!(encoder.is_attached());
    assert_eq!(encoder.pins(), Some((2, 3)));
    assert_eq!(device.pin(2).unwrap().mode(), Some(PinMode::Encoder));
    assert_eq!(device.pin(3).unwrap().mode(), Some(PinMode::Encoder));
    assert_eq!(*track.attached.lock(), vec![true]);

    assert!(matches!(encoder.attach(2, 3), Err(Error::InvalidState(_))));
}

#[test]
fn attach_requires_an_encoder_capable_pin() {
    let (device, mock) = common::ready_device(BoardSim::small());
    let encoder = device.encoder(1).unwrap();
    assert!(matches!(encoder.attach(1, 4), Err(Error::InvalidArgument(_))));
    assert!(matches!(
        encoder.attach(1, 42),
        Err(Error::PinOutOfRange { index: 42, .. })
    ));
    assert!(!encoder.is_attached());
    assert!(mock.sent().is_empty());
}

#[test]
fn positions_notify_device_then_encoder_listeners() {
    let (device, mock) = common::ready_device(BoardSim::small());
    let recorder = Recorder::attach(&device);
    let encoder = device.encoder(0).unwrap();
    let track = Arc::new(Track::default());
    encoder.add_listener(track.clone());
    encoder.attach(2, 3).unwrap();

    mock.feed(&encoder_positions_frame(&[(0, -12), (5, 99)]))
        .unwrap();
    assert_eq!(encoder.position(), -12);
    assert_eq!(*recorder.encoder_positions.lock(), vec![(0, -12)]);
    assert_eq!(*track.positions.lock(), vec![-12]);

    // same position again is not a change
    mock.feed(&encoder_positions_frame(&[(0, -12)])).unwrap();
    assert_eq!(track.positions.lock().len(), 1);
}

#[test]
fn reset_and_detach() {
    let (device, mock) = common::ready_device(BoardSim::small());
    let encoder = device.encoder(0).unwrap();
    encoder.attach(2, 3).unwrap();
    mock.feed(&encoder_positions_frame(&[(0, 40)])).unwrap();
    mock.clear_sent();

    encoder.reset_position().unwrap();
    assert_eq!(encoder.position(), 0);
    encoder.request_position().unwrap();
    encoder.detach().unwrap();
    assert!(!encoder.is_attached());
    assert!(matches!(encoder.detach(), Err(Error::InvalidState(_))));

    assert_eq!(
        mock.sent(),
        vec![
            vec![0xF0, 0x61, 0x03, 0, 0xF7],
            vec![0xF0, 0x61, 0x01, 0, 0xF7],
            vec![0xF0, 0x61, 0x05, 0, 0xF7]
        ]
    );
}

#[test]
fn device_wide_encoder_commands() {
    let (device, mock) = common::ready_device(BoardSim::small());
    device.set_encoder_reporting(true).unwrap();
    device.request_encoder_positions().unwrap();
    assert_eq!(
        mock.sent(),
        vec![vec![0xF0, 0x61, 0x04, 1, 0xF7], vec![0xF0, 0x61, 0x02, 0xF7]]
    );
    assert!(device.encoder(0x40).is_err());
    assert_eq!(device.encoder(3).unwrap().index(), 3);
}

/// Detaches its encoder once the position is back at zero.
struct DetachAtZero(Encoder);

impl EncoderListener for DetachAtZero {
    fn on_position_change(&self, event: &EncoderEvent) {
        if event.position == 0 && event.attached {
            self.0.detach().unwrap();
        }
    }
}

#[test]
fn position_listener_may_detach_its_encoder() {
    let (device, mock) = common::ready_device(BoardSim::small());
    let encoder = device.encoder(0).unwrap();
    encoder.attach(2, 3).unwrap();
    encoder.add_listener(Arc::new(DetachAtZero(encoder.clone())));
    mock.feed(&encoder_positions_frame(&[(0, 25)])).unwrap();
    mock.clear_sent();

    let resetting = encoder.clone();
    let result =
        common::finishes_within(Duration::from_secs(3), move || resetting.reset_position());
    assert!(matches!(result, Some(Ok(()))), "reset_position did not return");
    assert_eq!(encoder.position(), 0);
    assert!(!encoder.is_attached());
    assert_eq!(
        mock.sent(),
        vec![vec![0xF0, 0x61, 0x03, 0, 0xF7], vec![0xF0, 0x61, 0x05, 0, 0xF7]]
    );
}

/// Undoes every attach right away.
struct RefuseAttach(Encoder);

impl EncoderListener for RefuseAttach {
    fn on_attach_change(&self, event: &EncoderEvent) {
        if event.attached {
            self.0.detach().unwrap();
        }
    }
}

#[test]
fn attach_listener_may_detach_its_encoder() {
    let (device, mock) = common::ready_device(BoardSim::small());
    let encoder = device.encoder(1).unwrap();
    encoder.add_listener(Arc::new(RefuseAttach(encoder.clone())));

    let attaching = encoder.clone();
    let result = common::finishes_within(Duration::from_secs(3), move || attaching.attach(2, 3));
    assert!(matches!(result, Some(Ok(()))), "attach did not return");
    assert!(!encoder.is_attached());
    assert_eq!(
        mock.sent(),
        vec![
            vec![0xF0, 0x61, 0x00, 1, 2, 3, 0xF7],
            vec![0xF0, 0x61, 0x05, 1, 0xF7]
        ]
    );
}
