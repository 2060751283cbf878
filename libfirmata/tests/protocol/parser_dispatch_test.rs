#[path = "../common/mod.rs"]
mod common;

use std::sync::Arc;
use std::time::Duration;

use libfirmata::dispatch::{Dispatcher, Execution};
use libfirmata::protocol::{EventKind, EventName, Parser};
use libfirmata::utils::wait_until;
use parking_lot::Mutex;
use serial_test::serial;

#[test]
#[serial]
fn threaded_pipeline_keeps_order_and_survives_panics() {
    common::init_logging();
    let dispatcher = Arc::new(Dispatcher::new(Execution::Threaded, 64));
    let seen = Arc::new(Mutex::new(Vec::new()));

    dispatcher.add_handler(EventName::SystemReset, |_| panic!("handler failure"));
    let s = Arc::clone(&seen);
    dispatcher.add_wildcard_handler(move |event| s.lock().push(event.name()));
    dispatcher.start().unwrap();

    let parser = Parser::new(Arc::clone(&dispatcher), Execution::Threaded, 16);
    let sink = parser.start().unwrap();
    sink.push(&[0xFF]);
    sink.push(&[0xE1, 0x10]);
    sink.push(&[0x00, 0xF9, 2, 3]);

    assert!(wait_until(
        Duration::from_secs(2),
        Duration::from_millis(5),
        || seen.lock().len() == 3
    ));
    assert_eq!(
        *seen.lock(),
        vec![
            EventName::SystemReset,
            EventName::AnalogValue,
            EventName::ProtocolVersion
        ]
    );

    parser.stop();
    dispatcher.stop();
    assert!(!dispatcher.is_running());
}

#[test]
fn named_chains_run_in_registration_order_before_wildcards() {
    let dispatcher = Arc::new(Dispatcher::new(Execution::Inline, 8));
    let order = Arc::new(Mutex::new(Vec::new()));

    let o = Arc::clone(&order);
    dispatcher.add_wildcard_handler(move |_| o.lock().push("wildcard"));
    let o = Arc::clone(&order);
    dispatcher.add_handler(EventName::StringMessage, move |_| o.lock().push("first"));
    let o = Arc::clone(&order);
    let second = dispatcher.add_handler(EventName::StringMessage, move |_| o.lock().push("second"));

    let parser = Parser::new(Arc::clone(&dispatcher), Execution::Inline, 8);
    let sink = parser.start().unwrap();
    sink.push(&[0xF0, 0x71, b'a', 0, 0xF7]);
    assert_eq!(*order.lock(), vec!["first", "second", "wildcard"]);

    assert!(dispatcher.remove_handler(second));
    order.lock().clear();
    sink.push(&[0xF0, 0x71, b'b', 0, 0xF7]);
    assert_eq!(*order.lock(), vec!["first", "wildcard"]);
}

#[test]
fn custom_sysex_registered_on_parser() {
    let dispatcher = Arc::new(Dispatcher::new(Execution::Inline, 8));
    let data = Arc::new(Mutex::new(Vec::new()));
    let d = Arc::clone(&data);
    dispatcher.add_handler(EventName::CustomSysex, move |event| {
        if let EventKind::CustomSysex { data, .. } = &event.kind {
            d.lock().extend_from_slice(data);
        }
    });

    let parser = Parser::new(Arc::clone(&dispatcher), Execution::Inline, 8);
    parser.register_custom_sysex(0x42).unwrap();
    assert!(parser.register_custom_sysex(0x80).is_err());
    let sink = parser.start().unwrap();
    sink.push(&[0xF0, 0x42, 1, 2, 3, 0xF7]);
    assert_eq!(*data.lock(), vec![1, 2, 3]);
}
