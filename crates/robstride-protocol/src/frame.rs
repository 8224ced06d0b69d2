//! 指令帧构建
//!
//! 提供 [`FrameBuilder`]：根据通信类型、目标电机、参数索引与参数值
//! 构建完整的 17 字节 AT 指令帧。

use crate::float::encode_f32;
use crate::header::pack_header;
use crate::ids::*;
use crate::ProtocolError;
use std::fmt;

/// 写入参数的取值
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WriteValue {
    /// 浮点参数值（按通信类型的字节序编码）
    Float(f32),
    /// 模式选择（写入模式哨兵字）
    Mode(RunMode),
}

impl From<f32> for WriteValue {
    fn from(value: f32) -> Self {
        WriteValue::Float(value)
    }
}

impl From<RunMode> for WriteValue {
    fn from(mode: RunMode) -> Self {
        WriteValue::Mode(mode)
    }
}

/// 17 字节 AT 指令帧
///
/// 帧构建后不可变。数据区是原始二进制，可能包含 `0D 0A`，
/// 因此帧边界只能依靠固定长度识别，不能扫描结束符。
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct MotorFrame {
    bytes: [u8; FRAME_LEN],
    comm_type: CommandType,
    motor_id: u8,
}

impl MotorFrame {
    /// 由帧头与数据区组装完整帧
    fn assemble(comm_type: CommandType, motor_id: u8, header: [u8; 4], data: [u8; DATA_LEN]) -> Self {
        let mut bytes = [0u8; FRAME_LEN];
        bytes[0..2].copy_from_slice(&PREAMBLE);
        bytes[2..6].copy_from_slice(&header);
        bytes[6] = DATA_LEN as u8;
        bytes[7..15].copy_from_slice(&data);
        bytes[15..17].copy_from_slice(&TERMINATOR);

        Self {
            bytes,
            comm_type,
            motor_id,
        }
    }

    /// 完整帧字节
    pub fn as_bytes(&self) -> &[u8; FRAME_LEN] {
        &self.bytes
    }

    /// 扩展帧头（4 字节）
    pub fn header(&self) -> [u8; 4] {
        [self.bytes[2], self.bytes[3], self.bytes[4], self.bytes[5]]
    }

    /// 数据区（8 字节）
    pub fn data(&self) -> [u8; DATA_LEN] {
        let mut data = [0u8; DATA_LEN];
        data.copy_from_slice(&self.bytes[7..15]);
        data
    }

    /// 通信类型
    pub fn comm_type(&self) -> CommandType {
        self.comm_type
    }

    /// 目标电机 ID
    pub fn motor_id(&self) -> u8 {
        self.motor_id
    }

    /// 紧凑十六进制表示（用于日志）
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }
}

/// 字节序列的十六进制表示（空格分隔，用于 "Sent:" / "Received:" 日志）
pub fn format_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|byte| hex::encode([*byte]))
        .collect::<Vec<_>>()
        .join(" ")
}

impl AsRef<[u8]> for MotorFrame {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Display for MotorFrame {
    /// 空格分隔的小写十六进制，如 `41 54 90 07 eb fc 08 ...`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_hex(&self.bytes))
    }
}

impl fmt::Debug for MotorFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MotorFrame")
            .field("comm_type", &self.comm_type)
            .field("motor_id", &self.motor_id)
            .field("bytes", &self.to_hex())
            .finish()
    }
}

/// 已配置的电机集合
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MotorSet {
    ids: Vec<u8>,
}

impl MotorSet {
    /// 创建电机集合（去重，保持顺序）
    pub fn new(ids: impl IntoIterator<Item = u8>) -> Self {
        let mut unique = Vec::new();
        for id in ids {
            if !unique.contains(&id) {
                unique.push(id);
            }
        }
        Self { ids: unique }
    }

    pub fn contains(&self, motor_id: u8) -> bool {
        self.ids.contains(&motor_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        self.ids.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// 校验目标电机
    pub fn check(&self, motor_id: u8) -> Result<(), ProtocolError> {
        if self.contains(motor_id) {
            Ok(())
        } else {
            Err(ProtocolError::InvalidTarget { motor_id })
        }
    }
}

impl Default for MotorSet {
    fn default() -> Self {
        Self::new(DEFAULT_MOTOR_IDS)
    }
}

/// 指令帧构建器
///
/// # Example
///
/// ```
/// use robstride_protocol::{CommandType, FrameBuilder, ParameterIndex, WriteValue};
///
/// let builder = FrameBuilder::default();
/// let frame = builder
///     .build_frame(
///         CommandType::WriteParameter,
///         127,
///         Some(ParameterIndex::TARGET_VELOCITY),
///         Some(WriteValue::Float(10.0)),
///     )
///     .unwrap();
///
/// assert_eq!(frame.as_bytes().len(), 17);
/// assert_eq!(&frame.data()[..4], &[0x17, 0x70, 0x00, 0x00]);
/// ```
#[derive(Debug, Clone)]
pub struct FrameBuilder {
    host_id: u8,
    motors: MotorSet,
}

impl FrameBuilder {
    pub fn new(motors: MotorSet) -> Self {
        Self {
            host_id: HOST_ID,
            motors,
        }
    }

    /// 使用非默认的主机 ID
    pub fn with_host_id(mut self, host_id: u8) -> Self {
        self.host_id = host_id;
        self
    }

    pub fn motors(&self) -> &MotorSet {
        &self.motors
    }

    pub fn host_id(&self) -> u8 {
        self.host_id
    }

    /// 构建指令帧
    ///
    /// # 参数
    /// - `comm_type`: 通信类型
    /// - `motor_id`: 目标电机（必须在已配置集合中）
    /// - `param`: 参数索引（读写参数时必需，其他类型忽略）
    /// - `value`: 参数值（仅写参数使用）
    ///
    /// # 错误
    /// - `InvalidTarget`: 未配置的电机
    /// - `MissingParameter`: 读写参数缺少参数索引
    /// - `UnsupportedModeWrite`: 无数值写入，或向非模式寄存器写入模式
    /// - `NonFiniteValue`: 参数值为 NaN / Inf
    pub fn build_frame(
        &self,
        comm_type: CommandType,
        motor_id: u8,
        param: Option<ParameterIndex>,
        value: Option<WriteValue>,
    ) -> Result<MotorFrame, ProtocolError> {
        self.motors.check(motor_id)?;

        let header = pack_header(comm_type.code(), self.host_id, motor_id)?;
        let mut data = [0u8; DATA_LEN];

        match comm_type {
            CommandType::WriteParameter => {
                let param = param.ok_or(ProtocolError::MissingParameter { comm_type })?;
                data[0..2].copy_from_slice(&param.to_be_bytes());
                // Byte 2-3: 保留
                let word = match value {
                    Some(WriteValue::Float(v)) => {
                        if !v.is_finite() {
                            return Err(ProtocolError::NonFiniteValue { param, value: v });
                        }
                        encode_f32(v, comm_type.value_byte_order())
                    },
                    Some(WriteValue::Mode(mode)) if param.is_mode_register() => mode.sentinel(),
                    Some(WriteValue::Mode(_)) | None => {
                        return Err(ProtocolError::UnsupportedModeWrite { param });
                    },
                };
                data[4..8].copy_from_slice(&word);
            },
            CommandType::ReadParameter => {
                let param = param.ok_or(ProtocolError::MissingParameter { comm_type })?;
                data[0..2].copy_from_slice(&param.to_be_bytes());
            },
            CommandType::ResetPosition => {
                data[0] = 0x01;
            },
            CommandType::Enable | CommandType::Disable => {},
        }

        Ok(MotorFrame::assemble(comm_type, motor_id, header, data))
    }

    /// 写浮点参数
    pub fn write(
        &self,
        motor_id: u8,
        param: ParameterIndex,
        value: f32,
    ) -> Result<MotorFrame, ProtocolError> {
        self.build_frame(
            CommandType::WriteParameter,
            motor_id,
            Some(param),
            Some(WriteValue::Float(value)),
        )
    }

    /// 写模式选择寄存器
    pub fn select_mode(&self, motor_id: u8, mode: RunMode) -> Result<MotorFrame, ProtocolError> {
        self.build_frame(
            CommandType::WriteParameter,
            motor_id,
            Some(ParameterIndex::MODE_SELECT),
            Some(WriteValue::Mode(mode)),
        )
    }

    /// 读参数
    pub fn read(&self, motor_id: u8, param: ParameterIndex) -> Result<MotorFrame, ProtocolError> {
        self.build_frame(CommandType::ReadParameter, motor_id, Some(param), None)
    }

    pub fn enable(&self, motor_id: u8) -> Result<MotorFrame, ProtocolError> {
        self.build_frame(CommandType::Enable, motor_id, None, None)
    }

    pub fn disable(&self, motor_id: u8) -> Result<MotorFrame, ProtocolError> {
        self.build_frame(CommandType::Disable, motor_id, None, None)
    }

    /// 设置机械零位
    pub fn reset_position(&self, motor_id: u8) -> Result<MotorFrame, ProtocolError> {
        self.build_frame(CommandType::ResetPosition, motor_id, None, None)
    }
}

impl Default for FrameBuilder {
    fn default() -> Self {
        Self::new(MotorSet::default())
    }
}
