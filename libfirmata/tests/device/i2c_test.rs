#[path = "../common/mod.rs"]
mod common;

use std::sync::Arc;
use std::thread;

use libfirmata::device::{Device, I2cEvent};
use libfirmata::test_support::{i2c_reply_frame, BoardSim};
use libfirmata::transport::MockTransport;
use parking_lot::Mutex;

fn ready() -> (Device, MockTransport) {
    common::ready_device(BoardSim::small())
}

type Inbox = Arc<Mutex<Vec<(u8, Vec<u8>)>>>;

fn collector() -> (Inbox, impl Fn(&I2cEvent) + Send + Sync + 'static) {
    let inbox: Inbox = Arc::new(Mutex::new(Vec::new()));
    let i = Arc::clone(&inbox);
    (inbox, move |event: &I2cEvent| {
        i.lock().push((event.register, event.data.clone()))
    })
}

#[test]
fn device_lookup_configures_the_bus() {
    let (device, mock) = ready();
    let sensor = device.i2c_device(0x48).unwrap();
    assert_eq!(sensor.address(), 0x48);
    assert_eq!(mock.sent(), vec![vec![0xF0, 0x78, 0, 0, 0xF7]]);

    sensor.tell(&[0x01, 0x60]).unwrap();
    assert_eq!(
        mock.sent()[1],
        vec![0xF0, 0x76, 0x48, 0x00, 0x01, 0x00, 0x60, 0x00, 0xF7]
    );
}

#[test]
fn overlapping_asks_are_routed_by_register() {
    let (device, mock) = ready();
    let sensor = device.i2c_device(0x48).unwrap();
    let (first, on_first) = collector();
    let (second, on_second) = collector();
    let (broadcast, on_broadcast) = collector();
    sensor.subscribe(Arc::new(on_broadcast));

    sensor.ask(0x10, 2, on_first).unwrap();
    sensor.ask(0x20, 1, on_second).unwrap();

    mock.feed(&i2c_reply_frame(0x48, 0x20, &[0xAA])).unwrap();
    mock.feed(&i2c_reply_frame(0x48, 0x10, &[0x01, 0x02])).unwrap();
    mock.feed(&i2c_reply_frame(0x48, 0x10, &[0x03, 0x04])).unwrap();

    assert_eq!(*first.lock(), vec![(0x10, vec![0x01, 0x02])]);
    assert_eq!(*second.lock(), vec![(0x20, vec![0xAA])]);
    assert_eq!(*broadcast.lock(), vec![(0x10, vec![0x03, 0x04])]);
}

#[test]
fn replies_for_unknown_addresses_are_dropped() {
    let (device, mock) = ready();
    let sensor = device.i2c_device(0x48).unwrap();
    let (inbox, on_reply) = collector();
    let id = sensor.subscribe(Arc::new(on_reply));

    mock.feed(&i2c_reply_frame(0x49, 0x00, &[1])).unwrap();
    assert!(inbox.lock().is_empty());

    assert!(sensor.unsubscribe(id));
    mock.feed(&i2c_reply_frame(0x48, 0x00, &[1])).unwrap();
    assert!(inbox.lock().is_empty());
}

#[test]
fn failed_ask_falls_back_to_subscribers() {
    let (device, mock) = ready();
    let sensor = device.i2c_device(0x48).unwrap();
    let (once, on_once) = collector();
    let (broadcast, on_broadcast) = collector();
    sensor.subscribe(Arc::new(on_broadcast));

    mock.fail_next_writes(1);
    assert!(sensor.ask(0x10, 1, on_once).is_err());
    mock.feed(&i2c_reply_frame(0x48, 0x10, &[7])).unwrap();
    assert!(once.lock().is_empty());
    assert_eq!(broadcast.lock().len(), 1);
}

#[test]
fn continuous_updates_latch() {
    let (device, mock) = ready();
    let sensor = device.i2c_device(0x48).unwrap();
    mock.clear_sent();

    assert!(sensor.start_receiving_updates(6).unwrap());
    assert!(!sensor.start_receiving_updates(6).unwrap());
    assert!(sensor.is_receiving_updates());
    assert_eq!(
        mock.count_sent(&[0xF0, 0x76, 0x48, 0x10, 0x06, 0x00, 0xF7]),
        1
    );

    assert!(sensor.stop_receiving_updates().unwrap());
    assert!(!sensor.stop_receiving_updates().unwrap());
    assert_eq!(mock.count_sent(&[0xF0, 0x76, 0x48, 0x18, 0xF7]), 1);

    // latch restored when the request cannot be sent
    mock.fail_next_writes(1);
    assert!(sensor.start_receiving_updates_from(0x02, 6).is_err());
    assert!(!sensor.is_receiving_updates());
}

#[test]
fn delay_is_only_ever_raised() {
    let (device, mock) = ready();
    let sensor = device.i2c_device(0x48).unwrap();
    mock.clear_sent();

    sensor.set_delay(100).unwrap();
    sensor.set_delay(50).unwrap();
    sensor.set_delay(100).unwrap();
    assert_eq!(mock.sent(), vec![vec![0xF0, 0x78, 100, 0, 0xF7]]);

    // new devices are configured with the longest delay
    device.i2c_device(0x3C).unwrap();
    assert_eq!(mock.sent()[1], vec![0xF0, 0x78, 100, 0, 0xF7]);
}

#[test]
fn concurrent_raises_send_once_per_raise() {
    let (device, mock) = ready();
    let sensor = device.i2c_device(0x48).unwrap();
    mock.clear_sent();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let sensor = sensor.clone();
            thread::spawn(move || sensor.set_delay(300).unwrap())
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(mock.sent().len(), 1);
    assert_eq!(mock.sent()[0], vec![0xF0, 0x78, 0x2C, 0x02, 0xF7]);
}
