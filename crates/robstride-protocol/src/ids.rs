//! 协议常量定义
//!
//! 通信类型、主机 ID、参数索引表以及模式哨兵。

use crate::ProtocolError;
use crate::float::ByteOrder;
use std::fmt;

// ============================================================================
// 帧结构常量
// ============================================================================

/// 帧前导（ASCII "AT"）
pub const PREAMBLE: [u8; 2] = [0x41, 0x54];

/// 帧结束符（CR LF）
pub const TERMINATOR: [u8; 2] = [0x0D, 0x0A];

/// 数据区长度（长度字节恒为 8）
pub const DATA_LEN: usize = 8;

/// 完整指令帧长度：2 + 4 + 1 + 8 + 2
pub const FRAME_LEN: usize = 17;

/// 主机（上位机）CAN ID，运行期不变
pub const HOST_ID: u8 = 253;

/// 已观测到的电机 CAN ID
pub const DEFAULT_MOTOR_IDS: [u8; 2] = [1, 127];

// ============================================================================
// 通信类型
// ============================================================================

/// 通信类型（协议操作码）
///
/// 决定数据区布局。
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, num_enum::TryFromPrimitive, num_enum::IntoPrimitive,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum CommandType {
    /// 电机使能
    Enable = 3,
    /// 电机失能
    Disable = 4,
    /// 设置机械零位
    ResetPosition = 6,
    /// 读取单个参数
    ReadParameter = 17,
    /// 写入单个参数
    WriteParameter = 18,
}

impl CommandType {
    /// 从协议编码解析通信类型
    pub fn from_code(code: u8) -> Result<Self, ProtocolError> {
        Self::try_from(code).map_err(|_| ProtocolError::UnknownCommandType { value: code })
    }

    /// 协议编码
    pub fn code(self) -> u8 {
        self.into()
    }

    /// 该通信类型下参数值（以及对应应答负载）使用的字节序
    ///
    /// 所有已观测的指令均为小端。
    pub const fn value_byte_order(self) -> ByteOrder {
        ByteOrder::Little
    }

    /// 是否需要参数索引
    pub const fn requires_parameter(self) -> bool {
        matches!(
            self,
            CommandType::ReadParameter | CommandType::WriteParameter
        )
    }
}

// ============================================================================
// 参数索引
// ============================================================================

/// 参数索引（电机参数表中的 16 位寄存器地址）
///
/// 线上编码为 2 字节大端。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParameterIndex(pub u16);

impl ParameterIndex {
    /// 运行模式（模式选择寄存器）
    pub const MODE_SELECT: Self = Self(0x0570);
    /// 速度模式目标速度
    pub const SPEED_TARGET: Self = Self(0x0A70);
    /// 位置模式目标速度（速度限制）
    pub const TARGET_VELOCITY: Self = Self(0x1770);
    /// 位置模式目标位置
    pub const TARGET_POSITION: Self = Self(0x1670);
    /// 速度模式最大电流
    pub const MAX_CURRENT: Self = Self(0x1870);
    /// 机械位置（编码器读数）
    pub const ENCODER_POSITION: Self = Self(0x1970);
    /// 机械速度
    pub const MECH_VELOCITY: Self = Self(0x1B70);
    /// 速度模式加速度
    pub const SPEED_ACCELERATION: Self = Self(0x2270);
    /// 位置模式（CSP 03）速度
    pub const POSITION_03_SPEED: Self = Self(0x2470);
    /// 位置模式加速度
    pub const POSITION_ACCELERATION: Self = Self(0x2570);

    /// 大端字节
    pub const fn to_be_bytes(self) -> [u8; 2] {
        self.0.to_be_bytes()
    }

    /// 从大端字节解析
    pub const fn from_be_bytes(bytes: [u8; 2]) -> Self {
        Self(u16::from_be_bytes(bytes))
    }

    /// 参数名称（未知参数返回 "UNKNOWN_PARAMETER"）
    pub fn name(self) -> &'static str {
        match self {
            Self::MODE_SELECT => "RUN_MODE",
            Self::SPEED_TARGET => "SPEED_TARGET",
            Self::TARGET_VELOCITY => "POSITION_SPEED_LIMIT",
            Self::TARGET_POSITION => "POSITION_TARGET",
            Self::MAX_CURRENT => "SPEED_MAX_CURRENT",
            Self::ENCODER_POSITION => "MECH_POS",
            Self::MECH_VELOCITY => "MECH_VEL",
            Self::SPEED_ACCELERATION => "SPEED_ACCELERATION",
            Self::POSITION_03_SPEED => "POSITION_03_SPEED",
            Self::POSITION_ACCELERATION => "POSITION_ACCELERATION",
            _ => "UNKNOWN_PARAMETER",
        }
    }

    /// 是否为模式选择寄存器（允许无数值写入）
    pub fn is_mode_register(self) -> bool {
        self == Self::MODE_SELECT
    }
}

impl fmt::Display for ParameterIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:04X}", self.0)
    }
}

impl From<u16> for ParameterIndex {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

// ============================================================================
// 运行模式与模式哨兵
// ============================================================================

/// 位置模式哨兵（低字节 1）
pub const POSITION_MODE_SENTINEL: [u8; 4] = [0x01, 0x00, 0x00, 0x00];

/// 速度模式哨兵（低字节 2）
pub const VELOCITY_MODE_SENTINEL: [u8; 4] = [0x02, 0x00, 0x00, 0x00];

/// 电机运行模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum RunMode {
    /// 位置模式
    #[default]
    Position = 1,
    /// 速度模式
    Velocity = 2,
}

impl RunMode {
    /// 写入模式寄存器的哨兵字
    pub const fn sentinel(self) -> [u8; 4] {
        match self {
            RunMode::Position => POSITION_MODE_SENTINEL,
            RunMode::Velocity => VELOCITY_MODE_SENTINEL,
        }
    }
}
