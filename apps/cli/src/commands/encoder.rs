//! 编码器监视
//!
//! 周期性读取机械位置（0x1970）并打印，Ctrl+C 停止。
//! 可选先复位零点、以给定速度转动。

use super::{Connection, report};
use anyhow::Result;
use clap::Args;
use robstride_driver::{DriverConfig, DriverError, LatestTelemetry};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// 编码器监视参数
#[derive(Args, Debug)]
pub struct EncoderCommand {
    /// 电机 ID
    #[arg(long, default_value_t = 127)]
    pub motor: u8,

    /// 读取间隔（毫秒）
    #[arg(long, default_value_t = 100)]
    pub interval_ms: u64,

    /// 读取次数（默认一直读取）
    #[arg(long)]
    pub count: Option<u64>,

    /// 先复位零点
    #[arg(long)]
    pub reset: bool,

    /// 以该速度（rad/s）在速度模式下转动
    #[arg(long, allow_hyphen_values = true)]
    pub speed: Option<f32>,
}

impl EncoderCommand {
    pub fn execute(&self, config: &DriverConfig) -> Result<()> {
        let sink = Arc::new(LatestTelemetry::new());
        let conn = Connection::open(config)?.with_telemetry(sink.clone());
        let session = conn.controller.session();

        if self.reset {
            println!("⏳ 复位电机 {} 零点...", self.motor);
            session.reset(self.motor)?;
        }

        if let Some(speed) = self.speed {
            println!("⏳ 电机 {} 以 {:.2} rad/s 转动...", self.motor, speed);
            session.drive_velocity(
                self.motor,
                speed,
                config.session.acceleration,
                config.session.max_current,
            )?;
        }

        println!("📍 读取编码器（Ctrl+C 停止）...");
        let interval = Duration::from_millis(self.interval_ms);
        let start = Instant::now();
        let mut reads = 0u64;

        while !conn.stopped() && self.count.is_none_or(|n| reads < n) {
            reads += 1;
            match session.read_encoder(self.motor) {
                Ok(_) => {
                    if let Some(sample) = sink.latest(self.motor) {
                        println!(
                            "[{:>8.3}s] Encoder Position: {:.4}",
                            sample.received_at.duration_since(start).as_secs_f32(),
                            sample.value
                        );
                    }
                },
                Err(DriverError::ResponseTimeout(_)) => {
                    println!("⚠️  未收到数据，重试...");
                },
                Err(e) if e.is_interrupted() => break,
                Err(e) => report(e)?,
            }
            std::thread::sleep(interval);
        }

        if self.speed.is_some() {
            // 停止转动；中断标志可能仍挂起，先清除
            conn.controller.link().take_interrupt();
            if let Err(e) = session.set_speed(self.motor, 0.0) {
                report(e)?;
            }
        }

        println!("✅ 共读取 {} 次", reads);
        Ok(())
    }
}
