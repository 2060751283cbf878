#[path = "../common/mod.rs"]
mod common;

use std::sync::Arc;
use std::time::Duration;

use common::Recorder;
use libfirmata::device::{Device, DeviceBuilder, DeviceConfig, DeviceListener};
use libfirmata::protocol::Command;
use libfirmata::test_support::BoardSim;
use libfirmata::transport::MockTransport;
use libfirmata::{Error, InitPhase, PinMode, ProtocolVersion, Readiness};
use parking_lot::Mutex;
use serial_test::serial;

fn inline_device(board: BoardSim) -> (Device, MockTransport) {
    common::init_logging();
    let mock = board.transport();
    let config = DeviceConfig::default().with_pin_state_throttle(14, Duration::ZERO);
    let device = DeviceBuilder::new()
        .with_transport(Box::new(mock.clone()))
        .with_config(config)
        .synchronous()
        .build()
        .unwrap();
    (device, mock)
}

#[test]
fn handshake_runs_to_ready() {
    let (device, mock) = inline_device(BoardSim::small());
    let recorder = Recorder::attach(&device);
    assert_eq!(device.readiness(), Readiness::NotStarted);

    device.start().unwrap();
    assert_eq!(device.init_phase(), InitPhase::AwaitingFirmware);
    mock.pump();

    assert!(device.is_ready());
    assert_eq!(device.readiness(), Readiness::Ready);
    assert_eq!(*recorder.starts.lock(), 1);
    assert_eq!(device.protocol().as_deref(), Some("SimFirmata - 2.3"));
    assert_eq!(device.pin_count(), 6);
    assert_eq!(device.analog_mapping().get(&0), Some(&4));

    let sent = mock.sent();
    assert_eq!(sent[0], vec![0xF0, 0x79, 0xF7]);
    assert_eq!(sent[1], vec![0xF0, 0x6B, 0xF7]);
    // pin 0 advertises no modes and is never queried
    assert_eq!(mock.count_sent(&[0xF0, 0x6D, 0x00, 0xF7]), 0);
    for pin in 1..6u8 {
        assert_eq!(mock.count_sent(&[0xF0, 0x6D, pin, 0xF7]), 1);
    }
    assert_eq!(mock.count_sent(&[0xF0, 0x69, 0xF7]), 1);
    assert_eq!(sent[sent.len() - 2][..2], [0xC0, 1]);
    assert_eq!(sent[sent.len() - 1][..2], [0xD0, 1]);
}

#[test]
fn pins_reflect_reported_state() {
    let (device, _mock) = common::ready_device(BoardSim::small());
    let pins = device.pins();
    assert_eq!(pins[0].mode(), None);
    assert!(pins[0].supported_modes().is_empty());
    assert_eq!(pins[1].mode(), Some(PinMode::Output));
    assert_eq!(pins[4].mode(), Some(PinMode::Analog));
    assert_eq!(pins[4].value(), Some(512));
    assert!(pins[2].supports(PinMode::Servo));
    assert_eq!(pins[5].index(), 5);
    assert!(matches!(
        device.pin(6),
        Err(Error::PinOutOfRange { index: 6, count: 6 })
    ));
}

#[test]
fn large_board_handshake() -> anyhow::Result<()> {
    let (device, mock) = common::ready_device(common::fixtures::uno_like());
    assert_eq!(device.pin_count(), 20);
    assert_eq!(device.analog_mapping().len(), 6);
    assert_eq!(device.pin(19)?.value(), Some(105));
    assert!(mock.sent().is_empty());
    Ok(())
}

#[test]
fn protocol_version_is_recorded() {
    let (device, mock) = common::ready_device(BoardSim::small().with_version(3, 0));
    assert_eq!(device.protocol_version(), None);
    device.send_command(&Command::ReportVersion).unwrap();
    mock.pump();
    assert_eq!(device.protocol_version(), Some(ProtocolVersion::new(3, 0)));
    assert!(!device.protocol_version().unwrap().is_compatible());
}

#[test]
fn silent_board_times_out_without_teardown() {
    let (device, mock) = inline_device(BoardSim::small().silent());
    let result = device.ensure_initialization_is_done_within(Duration::from_millis(50));
    assert!(matches!(result, Err(Error::Timeout)));
    assert!(device.is_started());
    assert!(mock.is_started());
    assert_eq!(device.readiness(), Readiness::Initializing);
}

#[test]
fn stop_is_idempotent_and_notifies_once() {
    let (device, mock) = inline_device(BoardSim::small());
    let recorder = Recorder::attach(&device);
    device.start().unwrap();
    mock.pump();
    mock.clear_sent();

    device.stop().unwrap();
    device.stop().unwrap();
    assert_eq!(*recorder.stops.lock(), 1);
    assert_eq!(device.readiness(), Readiness::NotStarted);
    assert!(!mock.is_started());

    let sent = mock.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0][..2], [0xC0, 0]);
    assert_eq!(sent[1][..2], [0xD0, 0]);
    assert!(matches!(device.system_reset(), Err(Error::NotStarted)));
}

#[test]
fn restart_after_stop_rebuilds_the_model() {
    let (device, mock) = inline_device(BoardSim::small());
    let recorder = Recorder::attach(&device);
    device.start().unwrap();
    mock.pump();
    let old_pin = device.pin(1).unwrap();
    device.stop().unwrap();

    device.start().unwrap();
    mock.pump();
    assert!(device.is_ready());
    assert_eq!(device.pin_count(), 6);
    assert_ne!(device.pin(1).unwrap(), old_pin);
    assert_eq!(*recorder.starts.lock(), 2);
    assert_eq!(mock.start_count(), 2);
}

#[test]
fn string_messages_reach_listeners() {
    let (device, mock) = common::ready_device(BoardSim::small());
    let recorder = Recorder::attach(&device);
    mock.feed(&libfirmata::test_support::string_frame("hello"))
        .unwrap();
    assert_eq!(*recorder.messages.lock(), vec!["hello".to_string()]);

    device.send_string("a message longer than fifteen").unwrap();
    assert_eq!(mock.sent()[0][..2], [0xF0, 0x71]);
    assert_eq!(mock.sent()[0].len(), 2 + 2 * 29 + 1);
}

#[test]
fn raw_messages_and_sampling_interval() {
    let (device, mock) = common::ready_device(BoardSim::small());
    device.send_message(&[0xF0, 0x01, 0xF7]).unwrap();
    device.set_sampling_interval(5).unwrap();
    device.system_reset().unwrap();
    assert_eq!(
        mock.sent(),
        vec![
            vec![0xF0, 0x01, 0xF7],
            vec![0xF0, 0x7A, 10, 0, 0xF7],
            vec![0xFF]
        ]
    );
}

#[test]
fn submodels_outliving_the_device_fail() {
    let (device, mock) = common::ready_device(BoardSim::small());
    let pin = device.pin(1).unwrap();
    let encoder = device.encoder(0).unwrap();
    drop(device);

    assert!(matches!(pin.device(), Err(Error::DeviceDropped)));
    assert!(matches!(pin.set_value(1), Err(Error::DeviceDropped)));
    assert!(matches!(encoder.reset_position(), Err(Error::DeviceDropped)));
    assert_eq!(mock.stop_count(), 1);
}

#[test]
#[serial]
fn threaded_device_initializes() {
    common::init_logging();
    let mock = BoardSim::small().transport();
    mock.set_auto_pump(true);
    let config = DeviceConfig::default().with_pin_state_throttle(2, Duration::from_millis(1));
    let device = DeviceBuilder::new()
        .with_transport(Box::new(mock.clone()))
        .with_config(config)
        .build()
        .unwrap();
    let recorder = Recorder::attach(&device);

    device
        .ensure_initialization_is_done_within(Duration::from_secs(5))
        .unwrap();
    assert!(device.is_ready());
    assert_eq!(device.pin_count(), 6);
    assert!(libfirmata::utils::wait_until(
        Duration::from_secs(1),
        Duration::from_millis(5),
        || *recorder.starts.lock() == 1
    ));

    device.stop().unwrap();
    assert_eq!(*recorder.stops.lock(), 1);
    assert!(!mock.is_started());
}

/// Reconnects once when the device stops.
#[derive(Default)]
struct RestartOnStop {
    restarts: Mutex<usize>,
}

impl DeviceListener for RestartOnStop {
    fn on_stop(&self, device: &Device) {
        let mut restarts = self.restarts.lock();
        if *restarts > 0 {
            return;
        }
        *restarts += 1;
        // already stopped, so this is a no-op
        device.stop().unwrap();
        device.start().unwrap();
    }
}

#[test]
fn stop_listener_may_restart_the_device() {
    let (device, mock) = common::ready_device(BoardSim::small());
    let listener = Arc::new(RestartOnStop::default());
    device.add_listener(listener.clone());

    let stopping = device.clone();
    let result = common::finishes_within(Duration::from_secs(3), move || stopping.stop());
    assert!(matches!(result, Some(Ok(()))), "stop did not return");
    assert_eq!(*listener.restarts.lock(), 1);
    assert!(device.is_started());
    assert_eq!(device.init_phase(), InitPhase::AwaitingFirmware);

    mock.pump();
    assert!(device.is_ready());
    assert_eq!(device.pin_count(), 6);
}
