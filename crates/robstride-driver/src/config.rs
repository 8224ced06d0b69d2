//! 驱动层配置
//!
//! 所有配置结构都实现 `Default`，并可通过 serde 从 TOML 读取
//! （缺省字段使用默认值）。

use robstride_protocol::{DEFAULT_MOTOR_IDS, HOST_ID, MotorSet};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 单个关节指令的最大发送次数
pub const RETRY_LIMIT: u32 = 3;

/// 位置模式下的速度上限（rad/s）
pub const SPEED_LIMIT: f32 = 44.0;

/// "最后发送状态" 的更新策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryPolicy {
    /// 收到确认后才更新；等待确认并重试
    #[default]
    Confirmed,
    /// 发出即更新；只发送一次，不等待确认
    Optimistic,
}

/// 串口链路配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// 设备路径
    pub port: String,
    /// 波特率
    pub baud_rate: u32,
    /// 串口读超时（毫秒），决定监听线程检查退出标志的间隔
    pub read_timeout_ms: u64,
    /// 主机 ID
    pub host_id: u8,
    /// 受控电机 ID 集合
    pub motors: Vec<u8>,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyUSB0".to_string(),
            baud_rate: 921_600,
            read_timeout_ms: 10,
            host_id: HOST_ID,
            motors: DEFAULT_MOTOR_IDS.to_vec(),
        }
    }
}

impl LinkConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn motor_set(&self) -> MotorSet {
        MotorSet::new(self.motors.iter().copied())
    }
}

/// 可靠投递配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    /// 单次等待确认的超时（毫秒）
    pub ack_timeout_ms: u64,
    /// 最大发送次数（至少 1）
    pub retry_limit: u32,
    pub policy: DeliveryPolicy,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            ack_timeout_ms: 500,
            retry_limit: RETRY_LIMIT,
            policy: DeliveryPolicy::Confirmed,
        }
    }
}

impl DeliveryConfig {
    pub fn ack_timeout(&self) -> Duration {
        Duration::from_millis(self.ack_timeout_ms)
    }

    /// 实际发送次数上限（配置为 0 时按 1 处理）
    pub fn attempts(&self) -> u32 {
        self.retry_limit.max(1)
    }
}

/// 指令会话配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// 相邻两帧之间的稳定延时（毫秒）
    pub settle_ms: u64,
    /// 读取参数时等待应答的超时（毫秒）
    pub response_timeout_ms: u64,
    /// 速度上限（rad/s），超出返回 `OutOfRange`
    pub speed_limit: f32,
    /// 速度模式最大电流（A）
    pub max_current: f32,
    /// 默认速度（rad/s）
    pub default_speed: f32,
    /// 默认加速度（rad/s²）
    pub acceleration: f32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            settle_ms: 100,
            response_timeout_ms: 100,
            speed_limit: SPEED_LIMIT,
            max_current: 23.0,
            default_speed: 10.0,
            acceleration: 20.0,
        }
    }
}

impl SessionConfig {
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }
}

/// 完整驱动配置（对应配置文件的三个表）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    pub link: LinkConfig,
    pub delivery: DeliveryConfig,
    pub session: SessionConfig,
}
