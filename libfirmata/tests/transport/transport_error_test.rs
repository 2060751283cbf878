#[path = "../common/mod.rs"]
mod common;

use common::Recorder;
use libfirmata::device::DeviceBuilder;
use libfirmata::test_support::BoardSim;
use libfirmata::transport::MockTransport;
use libfirmata::{Error, Readiness};

#[test]
fn transport_start_failure_rolls_back() {
    common::init_logging();
    let mock = MockTransport::new();
    mock.set_fail_start(true);
    let device = DeviceBuilder::new()
        .with_transport(Box::new(mock.clone()))
        .synchronous()
        .build()
        .unwrap();

    assert!(matches!(device.start(), Err(Error::Transport(_))));
    assert!(!device.is_started());
    assert_eq!(device.readiness(), Readiness::NotStarted);

    mock.set_fail_start(false);
    device.start().unwrap();
    assert!(device.is_started());
}

#[test]
fn firmware_request_failure_stops_the_transport() {
    common::init_logging();
    let mock = BoardSim::small().transport();
    mock.fail_next_writes(1);
    let device = DeviceBuilder::new()
        .with_transport(Box::new(mock.clone()))
        .synchronous()
        .build()
        .unwrap();

    assert!(matches!(device.start(), Err(Error::Io(_))));
    assert!(!mock.is_started());
    assert_eq!(mock.stop_count(), 1);

    device.start().unwrap();
    mock.pump();
    assert!(device.is_ready());
}

#[test]
fn stop_failure_still_notifies_listeners() {
    let (device, mock) = common::ready_device(BoardSim::small());
    let recorder = Recorder::attach(&device);
    mock.set_fail_stop(true);

    assert!(matches!(device.stop(), Err(Error::Transport(_))));
    assert_eq!(*recorder.stops.lock(), 1);
    assert!(!device.is_started());
    assert_eq!(device.readiness(), Readiness::NotStarted);
}

#[test]
fn write_failure_during_stop_is_reported() {
    let (device, mock) = common::ready_device(BoardSim::small());
    mock.fail_next_writes(1);
    assert!(matches!(device.stop(), Err(Error::Io(_))));
    assert!(!mock.is_started());
}

#[test]
fn builder_without_transport() {
    assert!(matches!(
        DeviceBuilder::new().build(),
        Err(Error::TransportMissing)
    ));
}
