//! 指令会话集成测试（Mock 传输）

use robstride_driver::*;
use robstride_protocol::*;
use robstride_serial::{MockHandle, MockTransport};
use std::sync::Arc;

fn session() -> (CommandSession, MockHandle) {
    let (transport, handle) = MockTransport::new();
    let link = Link::new(transport, "mock").unwrap();
    let config = SessionConfig {
        response_timeout_ms: 200,
        ..Default::default()
    };
    let session =
        CommandSession::new(Arc::new(link), FrameBuilder::default(), config).with_settle(NoSettle);
    (session, handle)
}

/// 按参数索引回送读应答：前 7 字节帧头 + 参数回显 + LE 浮点 + 结束符
fn encoder_reply(value: f32) -> impl FnMut(&[u8]) -> Option<Vec<u8>> + Send + 'static {
    move |bytes: &[u8]| {
        let is_read = bytes.len() == FRAME_LEN
            && unpack_header([bytes[2], bytes[3], bytes[4], bytes[5]])
                .map(|h| h.comm_type == CommandType::ReadParameter.code())
                .unwrap_or(false);
        is_read.then(|| {
            let mut reply = vec![0x41, 0x54, 0x88, 0x07, 0xEB, 0xFC, 0x08];
            reply.extend_from_slice(&ParameterIndex::ENCODER_POSITION.to_be_bytes());
            reply.extend_from_slice(&[0x00, 0x00]);
            reply.extend_from_slice(&encode_f32(value, ByteOrder::Little));
            reply.extend_from_slice(&TERMINATOR);
            reply
        })
    }
}

fn params(written: &[Vec<u8>]) -> Vec<(u8, u16)> {
    written
        .iter()
        .map(|bytes| {
            let header = unpack_header([bytes[2], bytes[3], bytes[4], bytes[5]]).unwrap();
            (header.comm_type, u16::from_be_bytes([bytes[7], bytes[8]]))
        })
        .collect()
}

#[test]
fn initialize_writes_mode_then_enable() {
    let (session, handle) = session();
    session.initialize(127, RunMode::Position).unwrap();

    let written = handle.written();
    assert_eq!(written.len(), 2);
    assert_eq!(&written[0][11..15], &POSITION_MODE_SENTINEL);
    assert_eq!(&written[0][7..9], &[0x05, 0x70]);
    let enable = unpack_header([written[1][2], written[1][3], written[1][4], written[1][5]]).unwrap();
    assert_eq!(enable.comm_type, CommandType::Enable.code());
    assert_eq!(enable.motor_id, 127);
}

#[test]
fn set_target_writes_velocity_before_position() {
    let (session, handle) = session();
    session.set_target(127, 1.57, 10.0).unwrap();

    let written = handle.written();
    assert_eq!(params(&written), vec![(18, 0x1770), (18, 0x1670)]);
    assert_eq!(&written[0][11..15], &encode_f32(10.0, ByteOrder::Little));
    assert_eq!(&written[1][11..15], &encode_f32(1.57, ByteOrder::Little));
}

#[test]
fn set_target_rejects_excess_velocity() {
    let (session, handle) = session();
    let result = session.set_target(127, 0.0, 45.0);
    assert!(matches!(result, Err(DriverError::OutOfRange { .. })));
    assert_eq!(handle.write_count(), 0);
}

#[test]
fn reset_zeroes_then_resets_position() {
    let (session, handle) = session();
    session.reset(1).unwrap();

    let written = handle.written();
    assert_eq!(written.len(), 3);
    assert_eq!(&written[0][7..9], &[0x17, 0x70]);
    assert_eq!(&written[0][11..15], &[0, 0, 0, 0]);
    assert_eq!(&written[1][7..9], &[0x16, 0x70]);
    let last = unpack_header([written[2][2], written[2][3], written[2][4], written[2][5]]).unwrap();
    assert_eq!(last.comm_type, CommandType::ResetPosition.code());
}

#[test]
fn disable_and_single_writes() {
    let (session, handle) = session();
    session.disable(127).unwrap();
    session.set_max_current(127, 23.0).unwrap();
    session.set_speed(127, -5.0).unwrap();

    let written = handle.written();
    assert_eq!(written.len(), 3);
    let disable = unpack_header([written[0][2], written[0][3], written[0][4], written[0][5]]).unwrap();
    assert_eq!(disable.comm_type, CommandType::Disable.code());
    assert_eq!(params(&written[1..]), vec![(18, 0x1870), (18, 0x0A70)]);
    assert_eq!(&written[1][11..15], &encode_f32(23.0, ByteOrder::Little));
    assert_eq!(&written[2][11..15], &encode_f32(-5.0, ByteOrder::Little));
}

#[test]
fn set_speed_rejects_out_of_range() {
    let (session, handle) = session();
    assert!(matches!(
        session.set_speed(1, -44.5),
        Err(DriverError::OutOfRange { .. })
    ));
    assert_eq!(handle.write_count(), 0);
}

#[test]
fn invalid_target_sends_nothing() {
    let (session, handle) = session();
    let result = session.initialize(42, RunMode::Velocity);
    assert!(matches!(
        result,
        Err(DriverError::Protocol(ProtocolError::InvalidTarget { motor_id: 42 }))
    ));
    assert_eq!(handle.write_count(), 0);
}

#[test]
fn read_encoder_decodes_little_endian() {
    let (session, handle) = session();
    handle.set_responder(encoder_reply(3.25));

    let value = session.read_encoder(127).unwrap();
    assert_eq!(value, 3.25);
    assert_eq!(params(&handle.written()), vec![(17, 0x1970)]);
}

#[test]
fn read_encoder_publishes_telemetry() {
    let (session, handle) = session();
    handle.set_responder(encoder_reply(-0.75));
    let sink = Arc::new(LatestTelemetry::new());
    let session = session.with_telemetry(sink.clone());

    session.read_encoder(127).unwrap();
    let sample = sink.latest(127).unwrap();
    assert_eq!(sample.value, -0.75);
    assert_eq!(sample.param, ParameterIndex::ENCODER_POSITION);
}

#[test]
fn read_encoder_short_response() {
    let (session, handle) = session();
    handle.set_responder(|_| Some(vec![0x41, 0x54, 0x0D, 0x0A]));

    let result = session.read_encoder(127);
    assert!(matches!(
        result,
        Err(DriverError::Parse(ParseError::TooShort { min: 14, actual: 4 }))
    ));
}

#[test]
fn read_encoder_waits_for_full_frame() {
    let (session, handle) = session();
    // 负载 00 0D 0A 40：前 14 字节恰好以 0D 0A 结尾
    let reply: [u8; FRAME_LEN] = [
        0x41, 0x54, 0x88, 0x07, 0xEB, 0xFC, 0x08, 0x19, 0x70, 0x00, 0x00, 0x00, 0x0D, 0x0A, 0x40,
        0x0D, 0x0A,
    ];
    let late = handle.clone();
    handle.set_responder(move |_| {
        let late = late.clone();
        std::thread::spawn(move || {
            std::thread::sleep(std::time::Duration::from_millis(50));
            late.push_inbound(reply[14..].to_vec());
        });
        Some(reply[..14].to_vec())
    });

    let value = session.read_encoder(127).unwrap();
    assert_eq!(value, decode_f32([0x00, 0x0D, 0x0A, 0x40], ByteOrder::Little));
}

#[test]
fn read_encoder_times_out() {
    let (session, _handle) = session();
    let result = session.read_encoder(127);
    assert!(matches!(result, Err(DriverError::ResponseTimeout(_))));
}

#[test]
fn move_to_maps_shortest_path() {
    let (session, handle) = session();
    let current = 2.0 * std::f32::consts::TAU + 0.1;
    handle.set_responder(encoder_reply(current));

    let target = session.move_to(127, 0.2, 10.0, 20.0).unwrap();
    assert!((target - (current + 0.1)).abs() < 1e-4);

    let written = handle.written();
    assert_eq!(
        params(&written),
        vec![
            (17, 0x1970),
            (18, 0x0570),
            (3, 0x0000),
            (18, 0x1770),
            (18, 0x2470),
            (18, 0x2570),
            (18, 0x1670),
        ]
    );
    assert_eq!(&written[6][11..15], &encode_f32(target, ByteOrder::Little));
}

#[test]
fn drive_velocity_sequence() {
    let (session, handle) = session();
    session.drive_velocity(1, 5.0, 20.0, 23.0).unwrap();

    assert_eq!(
        params(&handle.written()),
        vec![
            (18, 0x0570),
            (3, 0x0000),
            (18, 0x1870),
            (18, 0x2270),
            (18, 0x0A70),
        ]
    );
    assert_eq!(&handle.written()[0][11..15], &VELOCITY_MODE_SENTINEL);
}

#[test]
fn interrupt_reports_partial_sequence() {
    let (session, handle) = session();
    session.link().interrupt_handle().interrupt();

    let err = session.reset(127).unwrap_err();
    assert!(err.is_interrupted());
    assert!(matches!(
        err,
        DriverError::PartialSequence {
            completed: 0,
            total: 3,
            ..
        }
    ));
    assert_eq!(handle.write_count(), 0);
}

#[test]
fn transport_fault_mid_sequence() {
    let (session, handle) = session();
    handle.fail_writes_after(1);

    let err = session.set_target(127, 1.0, 2.0).unwrap_err();
    assert!(err.is_fatal());
    assert!(matches!(
        err,
        DriverError::PartialSequence {
            completed: 1,
            total: 2,
            ..
        }
    ));
    let written = handle.written();
    assert_eq!(params(&written), vec![(18, 0x1770)]);
    assert_eq!(&written[0][11..15], &encode_f32(2.0, ByteOrder::Little));
    assert!(!session.link().is_open());
}

#[test]
fn transport_fault_at_first_frame() {
    let (session, handle) = session();
    session.disable(127).unwrap();
    handle.fail_writes();

    let err = session.set_target(127, 1.0, 1.0).unwrap_err();
    assert!(err.is_fatal());
    assert!(matches!(
        err,
        DriverError::PartialSequence {
            completed: 0,
            total: 2,
            ..
        }
    ));
    assert!(!session.link().is_open());
}
