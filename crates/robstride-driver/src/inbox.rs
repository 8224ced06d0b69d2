//! 入站字节缓冲区
//!
//! 监听线程只追加字节，控制线程在条件变量上带截止时间等待，
//! 由谓词决定何时消费、消费多少。

use crate::DriverError;
use bytes::{Bytes, BytesMut};
use parking_lot::{Condvar, Mutex};
use std::time::Instant;
use tracing::warn;

/// 缓冲区上限，超出时丢弃最旧的字节
pub const INBOX_CAPACITY: usize = 64 * 1024;

#[derive(Default)]
struct InboxState {
    buf: BytesMut,
    fault: Option<String>,
    closed: bool,
    interrupted: bool,
}

#[derive(Default)]
pub(crate) struct Inbox {
    state: Mutex<InboxState>,
    cond: Condvar,
}

impl Inbox {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// 追加入站字节并唤醒等待者
    pub(crate) fn push(&self, chunk: &[u8]) {
        let mut state = self.state.lock();
        state.buf.extend_from_slice(chunk);
        let len = state.buf.len();
        if len > INBOX_CAPACITY {
            let excess = len - INBOX_CAPACITY;
            let _ = state.buf.split_to(excess);
            warn!("Inbound buffer full, dropped {} oldest bytes", excess);
        }
        self.cond.notify_all();
    }

    /// 记录致命传输错误
    pub(crate) fn fail(&self, reason: String) {
        let mut state = self.state.lock();
        state.fault = Some(reason);
        state.closed = true;
        self.cond.notify_all();
    }

    pub(crate) fn close(&self) {
        self.state.lock().closed = true;
        self.cond.notify_all();
    }

    /// 中断当前（或下一次）等待
    pub(crate) fn interrupt(&self) {
        self.state.lock().interrupted = true;
        self.cond.notify_all();
    }

    /// 取走中断标志
    pub(crate) fn take_interrupt(&self) -> bool {
        std::mem::take(&mut self.state.lock().interrupted)
    }

    /// 链路已关闭时返回对应错误
    pub(crate) fn check_open(&self) -> Result<(), DriverError> {
        let state = self.state.lock();
        if let Some(reason) = &state.fault {
            return Err(DriverError::TransportFault(reason.clone()));
        }
        if state.closed {
            return Err(DriverError::LinkClosed);
        }
        Ok(())
    }

    /// 丢弃全部未消费字节，返回丢弃数量
    pub(crate) fn clear(&self) -> usize {
        let mut state = self.state.lock();
        let n = state.buf.len();
        state.buf.clear();
        n
    }

    /// 取走全部未消费字节
    pub(crate) fn take_all(&self) -> Bytes {
        self.state.lock().buf.split().freeze()
    }

    /// 等待谓词返回 `Some`，或到达截止时间（返回 `Ok(None)`）
    ///
    /// 谓词持锁调用，可以从缓冲区消费字节。超时后再检查一次。
    ///
    /// # 错误
    /// - `Interrupted`: 等待期间被中断（标志被消费）
    /// - `TransportFault` / `LinkClosed`: 链路已关闭且谓词未满足
    pub(crate) fn wait_until<T>(
        &self,
        deadline: Instant,
        mut ready: impl FnMut(&mut BytesMut) -> Option<T>,
    ) -> Result<Option<T>, DriverError> {
        let mut state = self.state.lock();
        loop {
            if state.interrupted {
                state.interrupted = false;
                return Err(DriverError::Interrupted);
            }
            if let Some(value) = ready(&mut state.buf) {
                return Ok(Some(value));
            }
            if let Some(reason) = &state.fault {
                return Err(DriverError::TransportFault(reason.clone()));
            }
            if state.closed {
                return Err(DriverError::LinkClosed);
            }
            if self.cond.wait_until(&mut state, deadline).timed_out() {
                if state.interrupted {
                    state.interrupted = false;
                    return Err(DriverError::Interrupted);
                }
                return Ok(ready(&mut state.buf));
            }
        }
    }
}

/// 从缓冲区头部取出一行（含 `\n`），不完整的行保留
pub(crate) fn take_line(buf: &mut BytesMut) -> Option<Bytes> {
    let pos = buf.iter().position(|&b| b == b'\n')?;
    Some(buf.split_to(pos + 1).freeze())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    fn soon(ms: u64) -> Instant {
        Instant::now() + Duration::from_millis(ms)
    }

    #[test]
    fn test_take_line_keeps_partial() {
        let mut buf = BytesMut::from(&b"ACK_J3_FWD\r\nACK_J"[..]);
        assert_eq!(&take_line(&mut buf).unwrap()[..], b"ACK_J3_FWD\r\n");
        assert!(take_line(&mut buf).is_none());
        assert_eq!(&buf[..], b"ACK_J");
    }

    #[test]
    fn test_wait_times_out() {
        let inbox = Inbox::new();
        let start = Instant::now();
        let result = inbox.wait_until(soon(20), |buf| (!buf.is_empty()).then_some(()));
        assert!(matches!(result, Ok(None)));
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn test_wait_wakes_on_push() {
        let inbox = Arc::new(Inbox::new());
        let pusher = inbox.clone();
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(10));
            pusher.push(b"hello\n");
        });
        let line = inbox.wait_until(soon(1000), take_line).unwrap();
        assert_eq!(&line.unwrap()[..], b"hello\n");
        handle.join().unwrap();
    }

    #[test]
    fn test_interrupt_unblocks_wait() {
        let inbox = Arc::new(Inbox::new());
        let other = inbox.clone();
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(10));
            other.interrupt();
        });
        let start = Instant::now();
        let result = inbox.wait_until(soon(5000), |_| None::<()>);
        assert!(matches!(result, Err(DriverError::Interrupted)));
        assert!(start.elapsed() < Duration::from_secs(5));
        // 中断标志已被消费
        assert!(!inbox.take_interrupt());
        handle.join().unwrap();
    }

    #[test]
    fn test_fault_surfaces() {
        let inbox = Inbox::new();
        inbox.fail("unplugged".to_string());
        let result = inbox.wait_until(soon(1000), |_| None::<()>);
        assert!(matches!(result, Err(DriverError::TransportFault(ref r)) if r == "unplugged"));
        assert!(inbox.check_open().is_err());
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let inbox = Inbox::new();
        inbox.push(&vec![0u8; INBOX_CAPACITY]);
        inbox.push(&[1, 2, 3]);
        let all = inbox.take_all();
        assert_eq!(all.len(), INBOX_CAPACITY);
        assert_eq!(&all[all.len() - 3..], &[1, 2, 3]);
    }
}
