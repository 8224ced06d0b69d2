//! Mock 传输（无硬件依赖）
//!
//! 记录所有写出的字节，并可通过应答脚本模拟适配器回包。

use crate::{ByteTransport, RxTransport, SerialError, SplittableTransport, TxTransport};
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

/// 应答脚本：输入写出的字节，返回需要回送的字节
type Responder = Box<dyn FnMut(&[u8]) -> Option<Vec<u8>> + Send>;

struct MockState {
    written: Vec<Vec<u8>>,
    inbound: VecDeque<Bytes>,
    responder: Option<Responder>,
    fail_writes: bool,
    fail_after: Option<usize>,
    fail_reads: bool,
    poll: Duration,
}

/// Mock 传输的检查/注入句柄
#[derive(Clone)]
pub struct MockHandle {
    state: Arc<Mutex<MockState>>,
}

impl MockHandle {
    /// 所有写出的字节块（按顺序）
    pub fn written(&self) -> Vec<Vec<u8>> {
        self.state.lock().written.clone()
    }

    /// 写出次数
    pub fn write_count(&self) -> usize {
        self.state.lock().written.len()
    }

    /// 注入入站字节
    pub fn push_inbound(&self, bytes: impl Into<Vec<u8>>) {
        self.state.lock().inbound.push_back(Bytes::from(bytes.into()));
    }

    /// 设置应答脚本
    pub fn set_responder<F>(&self, responder: F)
    where
        F: FnMut(&[u8]) -> Option<Vec<u8>> + Send + 'static,
    {
        self.state.lock().responder = Some(Box::new(responder));
    }

    /// 之后的写入全部失败
    pub fn fail_writes(&self) {
        self.state.lock().fail_writes = true;
    }

    /// 再成功写出 `successful` 次后，之后的写入全部失败
    pub fn fail_writes_after(&self, successful: usize) {
        let mut state = self.state.lock();
        state.fail_after = Some(state.written.len() + successful);
    }

    /// 之后的读取全部失败（模拟设备拔出）
    pub fn fail_reads(&self) {
        self.state.lock().fail_reads = true;
    }

    /// 所有收发端是否均已 drop
    pub fn is_closed(&self) -> bool {
        Arc::strong_count(&self.state) == 1
    }
}

/// Mock 传输
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    /// 创建 Mock 传输及其句柄
    pub fn new() -> (Self, MockHandle) {
        let state = Arc::new(Mutex::new(MockState {
            written: Vec::new(),
            inbound: VecDeque::new(),
            responder: None,
            fail_writes: false,
            fail_after: None,
            fail_reads: false,
            poll: Duration::from_millis(1),
        }));
        (
            Self {
                state: state.clone(),
            },
            MockHandle { state },
        )
    }
}

fn mock_write(state: &Mutex<MockState>, bytes: &[u8]) -> Result<(), SerialError> {
    let mut state = state.lock();
    if state.fail_after.is_some_and(|n| state.written.len() >= n) {
        state.fail_writes = true;
    }
    if state.fail_writes {
        return Err(SerialError::Io(std::io::Error::new(
            std::io::ErrorKind::BrokenPipe,
            "mock write failure",
        )));
    }
    state.written.push(bytes.to_vec());
    let reply = state.responder.as_mut().and_then(|r| r(bytes));
    if let Some(reply) = reply {
        state.inbound.push_back(Bytes::from(reply));
    }
    Ok(())
}

fn mock_read(state: &Mutex<MockState>) -> Result<Bytes, SerialError> {
    let poll = {
        let mut state = state.lock();
        if state.fail_reads {
            return Err(SerialError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "mock read failure",
            )));
        }
        if let Some(bytes) = state.inbound.pop_front() {
            return Ok(bytes);
        }
        state.poll
    };
    // 模拟串口读超时
    std::thread::sleep(poll);
    Ok(Bytes::new())
}

impl ByteTransport for MockTransport {
    fn write(&mut self, bytes: &[u8]) -> Result<(), SerialError> {
        mock_write(&self.state, bytes)
    }

    fn read_available(&mut self) -> Result<Bytes, SerialError> {
        mock_read(&self.state)
    }

    fn set_timeout(&mut self, timeout: Duration) -> Result<(), SerialError> {
        self.state.lock().poll = timeout;
        Ok(())
    }

    fn clear_input(&mut self) -> Result<(), SerialError> {
        self.state.lock().inbound.clear();
        Ok(())
    }
}

/// Mock 接收端
pub struct MockRx {
    state: Arc<Mutex<MockState>>,
}

impl RxTransport for MockRx {
    fn read_available(&mut self) -> Result<Bytes, SerialError> {
        mock_read(&self.state)
    }
}

/// Mock 发送端
pub struct MockTx {
    state: Arc<Mutex<MockState>>,
}

impl TxTransport for MockTx {
    fn write(&mut self, bytes: &[u8]) -> Result<(), SerialError> {
        mock_write(&self.state, bytes)
    }
}

impl SplittableTransport for MockTransport {
    type Rx = MockRx;
    type Tx = MockTx;

    fn split(self) -> Result<(Self::Rx, Self::Tx), SerialError> {
        Ok((
            MockRx {
                state: self.state.clone(),
            },
            MockTx { state: self.state },
        ))
    }
}
