use libfirmata::protocol::Frame;
use libfirmata::Error;

#[test]
fn frame_encode_decode_roundtrip() {
    let payload = vec![0x01, 0x02, 0x7F];
    let bytes = Frame::encode(0x71, &payload).unwrap();
    assert_eq!(bytes, vec![0xF0, 0x71, 0x01, 0x02, 0x7F, 0xF7]);

    let decoded = Frame::decode(&bytes).unwrap();
    assert_eq!(decoded.command, 0x71);
    assert_eq!(decoded.payload, payload);
}

#[test]
fn frame_rejects_eight_bit_bytes() {
    assert!(matches!(
        Frame::encode(0x80, &[]),
        Err(Error::InvalidArgument(_))
    ));
    assert!(matches!(
        Frame::encode(0x10, &[0x01, 0xF7]),
        Err(Error::InvalidArgument(_))
    ));
}

#[test]
fn frame_decode_errors() {
    assert!(matches!(
        Frame::decode(&[0xF0, 0x79]),
        Err(Error::InvalidLength {
            expected: 3,
            actual: 2
        })
    ));
    assert!(matches!(
        Frame::decode(&[0x00, 0x79, 0xF7]),
        Err(Error::FrameFormat(_))
    ));
    assert!(matches!(
        Frame::decode(&[0xF0, 0x79, 0x00]),
        Err(Error::FrameFormat(_))
    ));
}
