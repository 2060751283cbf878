#[path = "../common/mod.rs"]
mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use libfirmata::device::Watchdog;
use libfirmata::test_support::{analog_frame, BoardSim};
use serial_test::serial;

#[test]
#[serial]
fn watchdog_fires_when_the_board_goes_quiet() {
    let (device, mock) = common::ready_device(BoardSim::small());
    let alarms = Arc::new(AtomicUsize::new(0));
    let a = Arc::clone(&alarms);
    let watchdog = Watchdog::new(Duration::from_millis(40), move || {
        a.fetch_add(1, Ordering::SeqCst);
    });
    let id = device.add_wildcard_handler(watchdog.handler());
    assert!(!watchdog.is_active());

    mock.feed(&analog_frame(0, 10)).unwrap();
    assert!(watchdog.is_active());

    thread::sleep(Duration::from_millis(200));
    assert!(alarms.load(Ordering::SeqCst) >= 1);

    watchdog.disable();
    assert!(device.remove_protocol_handler(id));
    let seen = alarms.load(Ordering::SeqCst);
    thread::sleep(Duration::from_millis(100));
    assert_eq!(alarms.load(Ordering::SeqCst), seen);
}

#[test]
#[serial]
fn steady_traffic_keeps_the_watchdog_quiet() {
    let (device, mock) = common::ready_device(BoardSim::small());
    let alarms = Arc::new(AtomicUsize::new(0));
    let a = Arc::clone(&alarms);
    let watchdog = Watchdog::new(Duration::from_millis(300), move || {
        a.fetch_add(1, Ordering::SeqCst);
    });
    device.add_wildcard_handler(watchdog.handler());

    for value in 0..10 {
        mock.feed(&analog_frame(0, value)).unwrap();
        thread::sleep(Duration::from_millis(20));
    }
    assert_eq!(alarms.load(Ordering::SeqCst), 0);
    watchdog.disable();
}
