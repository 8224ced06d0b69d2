//! 扩展帧头打包/解包
//!
//! 29 bit 扩展 CAN ID 的布局（高位在前）：
//!
//! ```text
//! bit 28..24  通信类型（5 bit）
//! bit 23..16  数据区 2（主机指令中恒为 0）
//! bit 15..8   主机 ID
//! bit 7..0    目标电机 ID
//! ```
//!
//! AT 封装把 CAN ID 左移 3 位，并在最低 3 位填入标志 `0b100`（IDE = 1，RTR = 0），
//! 得到 4 字节帧头，高位字节在前。

use crate::ProtocolError;

/// 通信类型最大值（5 bit）
pub const COMM_TYPE_MAX: u8 = 0x1F;

/// AT 封装的标志位（扩展帧、数据帧）
const FLAG_BITS: u32 = 0b100;
const FLAG_WIDTH: u32 = 3;
const FLAG_MASK: u32 = (1 << FLAG_WIDTH) - 1;

/// 解包后的帧头字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HeaderFields {
    pub comm_type: u8,
    pub host_id: u8,
    pub motor_id: u8,
}

/// 打包扩展帧头
///
/// # 错误
/// - `CommTypeOutOfRange`: `comm_type > 31`，高 3 位会在左移时被丢弃，无法还原
pub fn pack_header(comm_type: u8, host_id: u8, motor_id: u8) -> Result<[u8; 4], ProtocolError> {
    if comm_type > COMM_TYPE_MAX {
        return Err(ProtocolError::CommTypeOutOfRange {
            value: comm_type,
            max: COMM_TYPE_MAX,
        });
    }

    let can_id = (u32::from(comm_type) << 24) | (u32::from(host_id) << 8) | u32::from(motor_id);
    Ok(((can_id << FLAG_WIDTH) | FLAG_BITS).to_be_bytes())
}

/// 解包扩展帧头
///
/// 数据区 2（bit 23..16）不属于主机指令的可变字段，解包时忽略。
///
/// # 错误
/// - `InvalidHeaderFlags`: 最低 3 位不是 `0b100`
pub fn unpack_header(bytes: [u8; 4]) -> Result<HeaderFields, ProtocolError> {
    let raw = u32::from_be_bytes(bytes);

    let flags = raw & FLAG_MASK;
    if flags != FLAG_BITS {
        return Err(ProtocolError::InvalidHeaderFlags { flags: flags as u8 });
    }

    let can_id = raw >> FLAG_WIDTH;
    Ok(HeaderFields {
        comm_type: ((can_id >> 24) as u8) & COMM_TYPE_MAX,
        host_id: (can_id >> 8) as u8,
        motor_id: can_id as u8,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{CommandType, HOST_ID};

    #[test]
    fn test_pack_write_header() {
        // 0x1200FD7F << 3 | 0b100 = 0x9007EBFC
        let header = pack_header(CommandType::WriteParameter.code(), HOST_ID, 127).unwrap();
        assert_eq!(header, [0x90, 0x07, 0xEB, 0xFC]);
    }

    #[test]
    fn test_pack_read_header() {
        let header = pack_header(CommandType::ReadParameter.code(), HOST_ID, 127).unwrap();
        assert_eq!(header, [0x88, 0x07, 0xEB, 0xFC]);
    }

    #[test]
    fn test_pack_enable_header_motor_1() {
        let header = pack_header(CommandType::Enable.code(), HOST_ID, 1).unwrap();
        assert_eq!(header, [0x18, 0x07, 0xE8, 0x0C]);
    }

    #[test]
    fn test_concrete_vectors_roundtrip() {
        for comm_type in [18u8, 17u8] {
            let header = pack_header(comm_type, 253, 127).unwrap();
            let fields = unpack_header(header).unwrap();
            assert_eq!(
                fields,
                HeaderFields {
                    comm_type,
                    host_id: 253,
                    motor_id: 127
                }
            );
        }
    }

    #[test]
    fn test_comm_type_out_of_range() {
        let result = pack_header(32, HOST_ID, 1);
        assert_eq!(
            result,
            Err(ProtocolError::CommTypeOutOfRange { value: 32, max: 31 })
        );
    }

    #[test]
    fn test_unpack_rejects_bad_flags() {
        let result = unpack_header([0x90, 0x07, 0xEB, 0xF8]);
        assert_eq!(
            result,
            Err(ProtocolError::InvalidHeaderFlags { flags: 0b000 })
        );
    }

    #[test]
    fn test_unpack_ignores_data_area_2() {
        // 电机应答会在 bit 23..16 填入状态信息
        let can_id: u32 = (2 << 24) | (0x5A << 16) | (127 << 8) | 253;
        let bytes = ((can_id << 3) | 0b100).to_be_bytes();
        let fields = unpack_header(bytes).unwrap();
        assert_eq!(fields.comm_type, 2);
        assert_eq!(fields.host_id, 127);
        assert_eq!(fields.motor_id, 253);
    }
}
