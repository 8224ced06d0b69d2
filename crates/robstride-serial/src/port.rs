//! 串口后端（serialport）
//!
//! 通过 `try_clone()` 得到同一设备的第二个句柄，实现收发分离。
//! 所有句柄 drop 后串口关闭。

use crate::{ByteTransport, RxTransport, SerialError, SplittableTransport, TxTransport};
use bytes::Bytes;
use serialport::{ClearBuffer, SerialPort};
use std::io::{ErrorKind, Read, Write};
use std::time::Duration;
use tracing::{debug, trace};

/// 单次读取的缓冲区大小
const READ_CHUNK: usize = 512;

/// 列出系统可用串口
pub fn available_ports() -> Result<Vec<String>, SerialError> {
    Ok(serialport::available_ports()?
        .into_iter()
        .map(|p| p.port_name)
        .collect())
}

/// 从串口读取当前可用字节，超时视为无数据
fn read_chunk(port: &mut dyn SerialPort) -> Result<Bytes, SerialError> {
    let mut buf = [0u8; READ_CHUNK];
    match port.read(&mut buf) {
        Ok(n) => {
            if n > 0 {
                trace!("serial rx {} bytes", n);
            }
            Ok(Bytes::copy_from_slice(&buf[..n]))
        },
        Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => {
            Ok(Bytes::new())
        },
        Err(e) if e.kind() == ErrorKind::Interrupted => Ok(Bytes::new()),
        Err(e) => Err(SerialError::Io(e)),
    }
}

fn write_all(port: &mut dyn SerialPort, bytes: &[u8]) -> Result<(), SerialError> {
    port.write_all(bytes)?;
    port.flush()?;
    trace!("serial tx {} bytes", bytes.len());
    Ok(())
}

/// 串口传输
pub struct SerialPortTransport {
    port: Box<dyn SerialPort>,
    name: String,
    baud_rate: u32,
}

impl SerialPortTransport {
    /// 打开串口
    ///
    /// # 参数
    /// - `name`: 设备路径（如 `/dev/ttyUSB0`、`COM7`）
    /// - `baud_rate`: 波特率（适配器默认 921600）
    /// - `timeout`: 读超时，决定监听线程的轮询粒度
    pub fn open(name: &str, baud_rate: u32, timeout: Duration) -> Result<Self, SerialError> {
        let port = serialport::new(name, baud_rate).timeout(timeout).open()?;
        debug!("Opened {} at {} baud", name, baud_rate);
        Ok(Self {
            port,
            name: name.to_string(),
            baud_rate,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }
}

impl ByteTransport for SerialPortTransport {
    fn write(&mut self, bytes: &[u8]) -> Result<(), SerialError> {
        write_all(self.port.as_mut(), bytes)
    }

    fn read_available(&mut self) -> Result<Bytes, SerialError> {
        read_chunk(self.port.as_mut())
    }

    fn set_timeout(&mut self, timeout: Duration) -> Result<(), SerialError> {
        self.port.set_timeout(timeout)?;
        Ok(())
    }

    fn clear_input(&mut self) -> Result<(), SerialError> {
        self.port.clear(ClearBuffer::Input)?;
        Ok(())
    }
}

/// 串口接收端
pub struct SerialPortRx {
    port: Box<dyn SerialPort>,
}

impl RxTransport for SerialPortRx {
    fn read_available(&mut self) -> Result<Bytes, SerialError> {
        read_chunk(self.port.as_mut())
    }
}

/// 串口发送端
pub struct SerialPortTx {
    port: Box<dyn SerialPort>,
}

impl TxTransport for SerialPortTx {
    fn write(&mut self, bytes: &[u8]) -> Result<(), SerialError> {
        write_all(self.port.as_mut(), bytes)
    }
}

impl SplittableTransport for SerialPortTransport {
    type Rx = SerialPortRx;
    type Tx = SerialPortTx;

    fn split(self) -> Result<(Self::Rx, Self::Tx), SerialError> {
        let rx_port = self.port.try_clone()?;
        debug!("Split {} into rx/tx handles", self.name);
        Ok((SerialPortRx { port: rx_port }, SerialPortTx { port: self.port }))
    }
}
