//! # Robstride Protocol
//!
//! Robstride 关节电机串口 CAN 指令协议定义（无硬件依赖）
//!
//! USB-CAN 适配器使用 AT 帧封装扩展 CAN 帧，每一帧固定 17 字节：
//!
//! ```text
//! 41 54 | H0 H1 H2 H3 | 08 | D0 .. D7 | 0D 0A
//! 前导  | 扩展帧头     | 长度 | 数据区   | 结束符
//! ```
//!
//! ## 模块
//!
//! - `ids`: 通信类型、参数索引、模式哨兵等协议常量
//! - `header`: 扩展帧头打包/解包
//! - `float`: IEEE754 单精度浮点编解码
//! - `frame`: 指令帧构建
//! - `response`: 应答帧解析
//!
//! ## 字节序
//!
//! 帧头与参数索引使用大端字节序（高位在前），
//! 参数值使用 [`ByteOrder`] 显式指定，由通信类型统一决定。
//!
//! ## 已知协议缺陷
//!
//! 应答帧不携带任何与请求对应的关联 ID，只能依靠"请求之后收到的下一段数据"
//! 进行位置关联。解析器不会校验应答帧头与请求是否匹配。

pub mod float;
pub mod frame;
pub mod header;
pub mod ids;
pub mod response;

pub use float::*;
pub use frame::*;
pub use header::*;
pub use ids::*;
pub use response::*;

use thiserror::Error;

/// 指令构建错误类型
///
/// 均为调用方编程错误，构建阶段立即失败（fail fast）。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProtocolError {
    /// 目标电机不在已配置的设备集合中
    #[error("Invalid target: motor id {motor_id} is not a configured device")]
    InvalidTarget { motor_id: u8 },

    /// 读写参数指令缺少参数索引
    #[error("Missing parameter index for {comm_type:?}")]
    MissingParameter { comm_type: CommandType },

    /// 无数值写入（模式选择）只允许用于模式寄存器
    #[error("Unsupported mode write to parameter {param}")]
    UnsupportedModeWrite { param: ParameterIndex },

    /// 参数值不是有限浮点数（NaN / Inf）
    #[error("Non-finite value {value} for parameter {param}")]
    NonFiniteValue { param: ParameterIndex, value: f32 },

    /// 通信类型超出扩展帧头可容纳的 5 bit 范围
    #[error("Communication type {value} exceeds 5-bit range (max {max})")]
    CommTypeOutOfRange { value: u8, max: u8 },

    /// 扩展帧头的标志位不是 0b100
    #[error("Invalid extended header flags: 0b{flags:03b}")]
    InvalidHeaderFlags { flags: u8 },

    /// 未知的通信类型编码
    #[error("Unknown communication type: {value}")]
    UnknownCommandType { value: u8 },
}

/// 应答帧解析错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// 应答长度不足（至少 14 字节才包含负载与结束符）
    #[error("Response too short: expected at least {min} bytes, got {actual}")]
    TooShort { min: usize, actual: usize },

    /// 应答格式错误
    #[error("Malformed frame: {reason}")]
    MalformedFrame { reason: &'static str },
}
