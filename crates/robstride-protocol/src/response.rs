//! 应答帧解析
//!
//! 适配器返回的数据可能是多帧拼接、也可能被截断。解析只依赖固定偏移：
//! 负载取结束符 `0D 0A` 之前紧邻的 4 字节。
//!
//! 应答不携带关联 ID，解析器无法判断这段数据对应哪条请求，
//! 字节序由调用方根据发出的请求指定。

use crate::float::{ByteOrder, decode_f32};
use crate::header::{HeaderFields, unpack_header};
use crate::ids::*;
use crate::ParseError;

/// 应答最小长度（所有读取路径统一使用的阈值）
pub const MIN_RESPONSE_LEN: usize = 14;

/// 从应答中解出的遥测值
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Telemetry {
    /// 解码后的浮点值
    pub value: f32,
    /// 原始负载字节
    pub raw: [u8; 4],
}

/// 解析应答，提取遥测值
///
/// # 错误
/// - `TooShort`: 少于 14 字节
/// - `MalformedFrame`: 末尾不是结束符 `0D 0A`
pub fn parse_response(bytes: &[u8], order: ByteOrder) -> Result<Telemetry, ParseError> {
    let len = bytes.len();
    if len < MIN_RESPONSE_LEN {
        return Err(ParseError::TooShort {
            min: MIN_RESPONSE_LEN,
            actual: len,
        });
    }

    if bytes[len - 2..] != TERMINATOR {
        return Err(ParseError::MalformedFrame {
            reason: "missing 0D 0A terminator",
        });
    }

    let mut raw = [0u8; 4];
    raw.copy_from_slice(&bytes[len - 6..len - 2]);

    Ok(Telemetry {
        value: decode_f32(raw, order),
        raw,
    })
}

/// 完整应答帧的诊断视图
///
/// 仅用于日志：应答帧头与请求不存在可靠的对应关系。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParsedResponse {
    /// 帧头字段（标志位非法时为 None）
    pub header: Option<HeaderFields>,
    /// 数据区 Byte 0-1 回显的参数索引
    pub param: ParameterIndex,
    pub telemetry: Telemetry,
}

impl ParsedResponse {
    /// 解析缓冲区中最后一个完整的 17 字节帧
    ///
    /// # 错误
    /// - `TooShort`: 少于 17 字节
    /// - `MalformedFrame`: 前导、长度字节或结束符不符
    pub fn parse_last(bytes: &[u8], order: ByteOrder) -> Result<Self, ParseError> {
        let len = bytes.len();
        if len < FRAME_LEN {
            return Err(ParseError::TooShort {
                min: FRAME_LEN,
                actual: len,
            });
        }

        let frame = &bytes[len - FRAME_LEN..];
        if frame[0..2] != PREAMBLE {
            return Err(ParseError::MalformedFrame {
                reason: "missing AT preamble",
            });
        }
        if usize::from(frame[6]) != DATA_LEN {
            return Err(ParseError::MalformedFrame {
                reason: "length byte is not 8",
            });
        }

        let telemetry = parse_response(frame, order)?;
        let header = unpack_header([frame[2], frame[3], frame[4], frame[5]]).ok();

        Ok(Self {
            header,
            param: ParameterIndex::from_be_bytes([frame[7], frame[8]]),
            telemetry,
        })
    }
}
