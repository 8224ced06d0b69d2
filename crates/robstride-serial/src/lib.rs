//! # Robstride Serial Transport Layer
//!
//! 串口传输抽象层：把 USB-CAN 适配器视为无帧边界的字节流。
//!
//! - 传输层只负责字节收发，不解释任何协议帧
//! - 写端同一时刻只有一个（指令按顺序发出）
//! - 读端只向入站缓冲区追加字节，由上层决定如何消费

use bytes::Bytes;
use std::time::Duration;
use thiserror::Error;

pub mod port;

pub use port::{SerialPortRx, SerialPortTransport, SerialPortTx, available_ports};

#[cfg(any(test, feature = "mock"))]
pub mod mock;

#[cfg(any(test, feature = "mock"))]
pub use mock::{MockHandle, MockTransport};

/// 传输层统一错误类型
#[derive(Error, Debug)]
pub enum SerialError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serial port error: {0}")]
    Port(#[from] serialport::Error),
    #[error("Read timeout")]
    Timeout,
    #[error("Transport closed")]
    Closed,
}

impl SerialError {
    /// 是否为致命错误（会话必须关闭传输并向上传播）
    pub fn is_fatal(&self) -> bool {
        !matches!(self, SerialError::Timeout)
    }
}

/// 字节流传输
pub trait ByteTransport {
    /// 写出全部字节
    fn write(&mut self, bytes: &[u8]) -> Result<(), SerialError>;

    /// 读取当前可用的字节（最多阻塞一个读超时周期，无数据返回空）
    fn read_available(&mut self) -> Result<Bytes, SerialError>;

    /// 设置读超时
    fn set_timeout(&mut self, _timeout: Duration) -> Result<(), SerialError> {
        Ok(())
    }

    /// 丢弃输入缓冲区中尚未读取的字节
    fn clear_input(&mut self) -> Result<(), SerialError> {
        Ok(())
    }
}

/// 接收端
pub trait RxTransport {
    fn read_available(&mut self) -> Result<Bytes, SerialError>;
}

/// 发送端
pub trait TxTransport {
    fn write(&mut self, bytes: &[u8]) -> Result<(), SerialError>;
}

/// 可分离为独立收发端的传输
///
/// 接收端交给后台监听线程，发送端留在控制线程。
pub trait SplittableTransport: ByteTransport {
    type Rx: RxTransport;
    type Tx: TxTransport;
    fn split(self) -> Result<(Self::Rx, Self::Tx), SerialError>;
}
