//! 串口链路：发送端 + 后台监听线程
//!
//! 监听线程持有接收端，把读到的字节追加到入站缓冲区，不解释任何帧边界。
//! 控制线程持有发送端，按顺序写出指令，并在缓冲区上带超时等待确认或应答。
//!
//! 任何退出路径（正常 drop、致命传输错误）都会关闭串口：
//! 监听线程退出时释放接收端，`Link` drop 时释放发送端。

use crate::DriverError;
use crate::config::LinkConfig;
use crate::inbox::{Inbox, take_line};
use bytes::Bytes;
use parking_lot::Mutex;
use robstride_protocol::{FRAME_LEN, MotorFrame, format_hex};
use robstride_serial::{RxTransport, SerialPortTransport, SplittableTransport, TxTransport};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{JoinHandle, spawn};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, trace, warn};

/// 带超时的线程 join
trait JoinTimeout {
    fn join_timeout(self, timeout: Duration) -> std::thread::Result<()>;
}

impl<T: Send + 'static> JoinTimeout for JoinHandle<T> {
    fn join_timeout(self, timeout: Duration) -> std::thread::Result<()> {
        let (tx, rx) = crossbeam_channel::bounded(1);

        // 看门狗线程负责 join，调用方只等待到超时
        spawn(move || {
            let _ = tx.send(self.join().map(|_| ()));
        });

        match rx.recv_timeout(timeout) {
            Ok(result) => result,
            Err(_) => Err(Box::new(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "Thread join timeout",
            ))),
        }
    }
}

/// 监听线程主循环
///
/// 读超时返回空块，借此周期性检查运行标志。
fn rx_loop(mut rx: impl RxTransport, inbox: Arc<Inbox>, is_running: Arc<AtomicBool>) {
    loop {
        // Acquire: 看到 false 时也能看到 drop 之前的所有写入
        if !is_running.load(Ordering::Acquire) {
            trace!("Listener: is_running flag is false, exiting");
            break;
        }

        match rx.read_available() {
            Ok(chunk) if chunk.is_empty() => {},
            Ok(chunk) => {
                trace!("RX {} bytes: {}", chunk.len(), format_hex(&chunk));
                inbox.push(&chunk);
            },
            Err(e) if !e.is_fatal() => {},
            Err(e) => {
                error!("Listener transport fault: {}", e);
                inbox.fail(e.to_string());
                is_running.store(false, Ordering::Release);
                break;
            },
        }
    }
}

/// 可跨线程触发的中断句柄（用于 Ctrl-C）
#[derive(Clone)]
pub struct InterruptHandle {
    inbox: Arc<Inbox>,
}

impl InterruptHandle {
    /// 中断正在进行的等待；没有等待时作用于下一次等待
    pub fn interrupt(&self) {
        info!("Interrupt requested");
        self.inbox.interrupt();
    }
}

/// 串口链路
pub struct Link {
    name: String,
    tx: Mutex<Option<Box<dyn TxTransport + Send>>>,
    inbox: Arc<Inbox>,
    is_running: Arc<AtomicBool>,
    rx_thread: Option<JoinHandle<()>>,
}

impl Link {
    /// 在任意可分离传输上建立链路并启动监听线程
    pub fn new<T>(transport: T, name: impl Into<String>) -> Result<Self, DriverError>
    where
        T: SplittableTransport,
        T::Rx: Send + 'static,
        T::Tx: Send + 'static,
    {
        let name = name.into();
        let (rx, tx) = transport.split()?;

        let inbox = Arc::new(Inbox::new());
        let is_running = Arc::new(AtomicBool::new(true));

        let rx_inbox = inbox.clone();
        let rx_running = is_running.clone();
        let rx_thread = std::thread::Builder::new()
            .name(format!("robstride-rx:{}", name))
            .spawn(move || rx_loop(rx, rx_inbox, rx_running))
            .map_err(robstride_serial::SerialError::Io)?;

        info!("Link {} opened", name);
        Ok(Self {
            name,
            tx: Mutex::new(Some(Box::new(tx))),
            inbox,
            is_running,
            rx_thread: Some(rx_thread),
        })
    }

    /// 按配置打开串口
    pub fn open(config: &LinkConfig) -> Result<Self, DriverError> {
        let transport =
            SerialPortTransport::open(&config.port, config.baud_rate, config.read_timeout())?;
        Self::new(transport, config.port.clone())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 链路是否仍可用
    pub fn is_open(&self) -> bool {
        self.is_running.load(Ordering::Acquire) && self.tx.lock().is_some()
    }

    pub fn interrupt_handle(&self) -> InterruptHandle {
        InterruptHandle {
            inbox: self.inbox.clone(),
        }
    }

    /// 取走挂起的中断（序列在帧间检查）
    pub fn take_interrupt(&self) -> bool {
        self.inbox.take_interrupt()
    }

    /// 写出一帧
    pub fn write_frame(&self, frame: &MotorFrame) -> Result<(), DriverError> {
        debug!(
            "Sent: {} ({:?} -> motor {})",
            frame,
            frame.comm_type(),
            frame.motor_id()
        );
        self.write_raw(frame.as_bytes())
    }

    /// 原样写出字节（文本行协议、原始十六进制控制台）
    pub fn write_bytes(&self, bytes: &[u8]) -> Result<(), DriverError> {
        debug!("Sent: {}", format_hex(bytes));
        self.write_raw(bytes)
    }

    fn write_raw(&self, bytes: &[u8]) -> Result<(), DriverError> {
        let mut tx = self.tx.lock();
        if let Err(e) = self.inbox.check_open() {
            // 监听线程已因致命错误退出，释放发送端关闭串口
            tx.take();
            return Err(e);
        }
        let port = tx.as_mut().ok_or(DriverError::LinkClosed)?;
        if let Err(e) = port.write(bytes) {
            error!("Write to {} failed, closing link: {}", self.name, e);
            tx.take();
            self.shutdown();
            return Err(e.into());
        }
        Ok(())
    }

    /// 等待与 `token` 完全一致的文本行
    ///
    /// 不匹配的行被消费并记录为 "Received:"。
    ///
    /// # 错误
    /// - `AckTimeout`: 超时内没有匹配的行
    /// - `Interrupted` / `TransportFault` / `LinkClosed`
    pub fn wait_for_line(&self, token: &str, timeout: Duration) -> Result<(), DriverError> {
        let deadline = Instant::now() + timeout;
        let matched = self.inbox.wait_until(deadline, |buf| {
            while let Some(line) = take_line(buf) {
                let text = String::from_utf8_lossy(&line);
                let text = text.trim();
                debug!("Received: {}", text);
                if text == token {
                    return Some(());
                }
            }
            None
        })?;

        matched.ok_or_else(|| DriverError::AckTimeout {
            token: token.to_string(),
            timeout,
        })
    }

    /// 等待一帧完整的应答（固定 17 字节）
    ///
    /// 数据区可能包含 `0D 0A`，帧边界只按固定长度切分，多余字节留在缓冲区。
    /// 超时后缓冲区里若有残缺数据，原样返回交给解析器报告具体错误。
    ///
    /// # 错误
    /// - `ResponseTimeout`: 超时内没有任何入站字节
    pub fn wait_for_response(&self, timeout: Duration) -> Result<Bytes, DriverError> {
        let deadline = Instant::now() + timeout;
        let response = self.inbox.wait_until(deadline, |buf| {
            (buf.len() >= FRAME_LEN).then(|| buf.split_to(FRAME_LEN).freeze())
        })?;

        let bytes = match response {
            Some(bytes) => bytes,
            None => {
                let partial = self.inbox.take_all();
                if partial.is_empty() {
                    warn!("No response within {:?}", timeout);
                    return Err(DriverError::ResponseTimeout(timeout));
                }
                warn!("Incomplete response ({} bytes)", partial.len());
                partial
            },
        };
        debug!("Received: {}", format_hex(&bytes));
        Ok(bytes)
    }

    /// 等待任意入站字节（原始控制台回显）
    pub fn wait_for_any(&self, timeout: Duration) -> Result<Option<Bytes>, DriverError> {
        let deadline = Instant::now() + timeout;
        self.inbox
            .wait_until(deadline, |buf| (!buf.is_empty()).then(|| buf.split().freeze()))
    }

    /// 丢弃尚未消费的入站字节（发起读取前清掉过期应答）
    pub fn discard_inbound(&self) -> usize {
        let n = self.inbox.clear();
        if n > 0 {
            trace!("Discarded {} stale inbound bytes", n);
        }
        n
    }

    fn shutdown(&self) {
        self.is_running.store(false, Ordering::Release);
        self.inbox.close();
    }
}

impl Drop for Link {
    fn drop(&mut self) {
        self.shutdown();
        self.tx.lock().take();

        let join_timeout = Duration::from_secs(2);
        if let Some(handle) = self.rx_thread.take()
            && let Err(_e) = handle.join_timeout(join_timeout)
        {
            error!(
                "Listener thread panicked or failed to shut down within {:?}",
                join_timeout
            );
        }
        info!("Link {} closed", self.name);
    }
}
