//! 命令定义和实现

pub mod config;
pub mod console;
pub mod encoder;
pub mod intent;
pub mod ports;
pub mod raw;
pub mod velocity;

pub use config::ConfigCommand;
pub use encoder::EncoderCommand;
pub use velocity::VelocityCommand;

use anyhow::{Context, Result};
use robstride_driver::{Controller, DriverConfig, DriverError, TelemetrySink};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// 已打开的链路 + 停止标志
///
/// drop 时链路关闭（监听线程退出，串口释放）。
pub struct Connection {
    pub controller: Controller,
    stop: Arc<AtomicBool>,
}

impl Connection {
    /// 打开串口并安装 Ctrl+C 处理器
    pub fn open(config: &DriverConfig) -> Result<Self> {
        println!(
            "⏳ 打开 {} @ {} baud...",
            config.link.port, config.link.baud_rate
        );
        let controller = Controller::open(config)
            .with_context(|| format!("打开串口 {} 失败", config.link.port))?;
        println!("✅ 已打开 {}", config.link.port);

        let stop = Arc::new(AtomicBool::new(false));
        let flag = stop.clone();
        let interrupt = controller.interrupt_handle();
        ctrlc::set_handler(move || {
            eprintln!("\n🛑 收到 Ctrl+C，中断当前操作...");
            flag.store(true, Ordering::SeqCst);
            interrupt.interrupt();
        })
        .context("安装 Ctrl+C 处理器失败")?;

        Ok(Self { controller, stop })
    }

    /// 读取结果同时发布到遥测接收方
    pub fn with_telemetry(mut self, sink: Arc<dyn TelemetrySink>) -> Self {
        self.controller = self.controller.with_telemetry(sink);
        self
    }

    pub fn stopped(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    /// 交给输入线程的中断回调
    pub fn interrupter(&self) -> impl Fn() + Send + 'static {
        let flag = self.stop.clone();
        let interrupt = self.controller.interrupt_handle();
        move || {
            flag.store(true, Ordering::SeqCst);
            interrupt.interrupt();
        }
    }
}

/// 打印可恢复错误；致命错误（链路已关闭）向上返回
pub fn report(err: DriverError) -> Result<()> {
    if err.is_fatal() {
        return Err(err).context("串口链路已关闭");
    }
    if err.is_interrupted() {
        eprintln!("🛑 已中断: {}", err);
    } else {
        eprintln!("❌ Error: {}", err);
    }
    Ok(())
}
