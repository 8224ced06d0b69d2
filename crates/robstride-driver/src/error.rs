//! 驱动层错误类型定义

use robstride_protocol::{ParseError, ProtocolError};
use robstride_serial::SerialError;
use std::time::Duration;
use thiserror::Error;

/// 驱动层错误类型
#[derive(Error, Debug)]
pub enum DriverError {
    /// 帧构造错误（发送前即失败，不产生任何传输）
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// 应答解析错误
    #[error("Response parse error: {0}")]
    Parse(#[from] ParseError),

    /// 传输层错误（致命，链路已关闭）
    #[error("Transport error: {0}")]
    Transport(#[from] SerialError),

    /// 监听线程遇到致命读错误后退出
    #[error("Transport fault in listener: {0}")]
    TransportFault(String),

    /// 链路已关闭
    #[error("Link closed")]
    LinkClosed,

    /// 在超时内未收到期望的确认行（由可靠投递层在本地重试）
    #[error("No '{token}' within {timeout:?}")]
    AckTimeout { token: String, timeout: Duration },

    /// 在超时内未收到任何应答
    #[error("No response within {0:?}")]
    ResponseTimeout(Duration),

    /// 用户中断（Ctrl-C）
    #[error("Interrupted")]
    Interrupted,

    /// 数值超出允许范围
    #[error("{what} {value} out of range [-{limit}, {limit}]")]
    OutOfRange {
        what: &'static str,
        value: f32,
        limit: f32,
    },

    /// 多帧序列中途失败
    ///
    /// `completed` 帧已经发出，电机可能处于中间状态。
    #[error("Sequence stopped after {completed}/{total} frames: {source}")]
    PartialSequence {
        completed: usize,
        total: usize,
        #[source]
        source: Box<DriverError>,
    },
}

impl DriverError {
    /// 去掉 `PartialSequence` 包装后的根错误
    pub fn root(&self) -> &DriverError {
        match self {
            DriverError::PartialSequence { source, .. } => source.root(),
            other => other,
        }
    }

    /// 是否由用户中断引起
    pub fn is_interrupted(&self) -> bool {
        matches!(self.root(), DriverError::Interrupted)
    }

    /// 是否为致命的传输错误（链路已不可用）
    pub fn is_fatal(&self) -> bool {
        matches!(
            self.root(),
            DriverError::Transport(_) | DriverError::TransportFault(_) | DriverError::LinkClosed
        )
    }
}

/// 可靠投递错误
#[derive(Error, Debug)]
pub enum DeliveryError {
    /// 重试次数用尽仍未收到确认，关节保持上一次确认的指令
    #[error("{command} not acknowledged after {attempts} attempts")]
    Exhausted { command: String, attempts: u32 },

    /// 链路错误或用户中断
    #[error(transparent)]
    Driver(#[from] DriverError),
}
