//! 编解码往返属性测试
//!
//! 使用 proptest 验证帧头与浮点编解码的往返定律。

use proptest::prelude::*;
use robstride_protocol::*;

fn byte_order() -> impl Strategy<Value = ByteOrder> {
    prop_oneof![Just(ByteOrder::Little), Just(ByteOrder::Big)]
}

fn command_type() -> impl Strategy<Value = CommandType> {
    prop_oneof![
        Just(CommandType::Enable),
        Just(CommandType::Disable),
        Just(CommandType::ResetPosition),
        Just(CommandType::ReadParameter),
        Just(CommandType::WriteParameter),
    ]
}

proptest! {
    /// 帧头往返：有效域内 unpack(pack(c, h, m)) == (c, h, m)
    #[test]
    fn header_roundtrip(comm_type in 0u8..=COMM_TYPE_MAX, host_id in any::<u8>(), motor_id in any::<u8>()) {
        let header = pack_header(comm_type, host_id, motor_id).unwrap();
        let fields = unpack_header(header).unwrap();
        prop_assert_eq!(fields, HeaderFields { comm_type, host_id, motor_id });
    }

    /// 超出 5 bit 的通信类型总是被拒绝
    #[test]
    fn header_rejects_wide_comm_type(comm_type in (COMM_TYPE_MAX + 1)..=u8::MAX, host_id in any::<u8>(), motor_id in any::<u8>()) {
        prop_assert!(pack_header(comm_type, host_id, motor_id).is_err());
    }

    /// 浮点往返：所有有限值位精确
    #[test]
    fn float_roundtrip_bit_exact(bits in any::<u32>(), order in byte_order()) {
        let value = f32::from_bits(bits);
        prop_assume!(value.is_finite());
        let decoded = decode_f32(encode_f32(value, order), order);
        prop_assert_eq!(decoded.to_bits(), value.to_bits());
    }

    /// 帧形状：任意指令帧都是 17 字节，前导/长度/结束符固定
    #[test]
    fn frame_shape(
        comm_type in command_type(),
        motor_id in prop_oneof![Just(1u8), Just(127u8)],
        value in -1000.0f32..1000.0f32,
    ) {
        let builder = FrameBuilder::default();
        let frame = builder
            .build_frame(
                comm_type,
                motor_id,
                Some(ParameterIndex::TARGET_POSITION),
                Some(WriteValue::Float(value)),
            )
            .unwrap();
        let bytes = frame.as_bytes();
        prop_assert_eq!(bytes.len(), 17);
        prop_assert_eq!(&bytes[0..2], &PREAMBLE[..]);
        prop_assert_eq!(&bytes[15..17], &TERMINATOR[..]);
        prop_assert_eq!(bytes[6], 8);

        let fields = unpack_header(frame.header()).unwrap();
        prop_assert_eq!(fields.comm_type, comm_type.code());
        prop_assert_eq!(fields.host_id, HOST_ID);
        prop_assert_eq!(fields.motor_id, motor_id);
    }

    /// 写参数帧的负载可被应答解析器按相同字节序还原
    #[test]
    fn write_payload_parses_back(value in -44.0f32..44.0f32) {
        let frame = FrameBuilder::default()
            .write(127, ParameterIndex::TARGET_VELOCITY, value)
            .unwrap();
        let telemetry = parse_response(frame.as_bytes(), CommandType::WriteParameter.value_byte_order()).unwrap();
        prop_assert_eq!(telemetry.value.to_bits(), value.to_bits());
    }
}

#[test]
fn encode_zero_little_endian() {
    assert_eq!(encode_f32(0.0, ByteOrder::Little), [0x00, 0x00, 0x00, 0x00]);
}

#[cfg(feature = "serde")]
#[test]
fn run_mode_serde_lowercase() {
    let json = serde_json::to_string(&RunMode::Velocity).unwrap();
    assert_eq!(json, "\"velocity\"");
    let mode: RunMode = serde_json::from_str("\"position\"").unwrap();
    assert_eq!(mode, RunMode::Position);
}
