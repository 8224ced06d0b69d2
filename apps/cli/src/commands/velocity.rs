//! 速度控制台
//!
//! 所有已配置电机以速度模式初始化并设置最大电流，之后逐行读取 `CAN_ID,speed`。

use super::{Connection, report};
use crate::input::{ConsoleInput, InputEvent};
use crate::parse::parse_velocity_line;
use anyhow::Result;
use clap::Args;
use robstride_driver::DriverConfig;
use robstride_protocol::RunMode;

/// 速度控制台参数
#[derive(Args, Debug)]
pub struct VelocityCommand {
    /// 最大电流（A），默认取配置
    #[arg(long)]
    pub max_current: Option<f32>,
}

impl VelocityCommand {
    pub fn execute(&self, config: &DriverConfig) -> Result<()> {
        let conn = Connection::open(config)?;
        let session = conn.controller.session();
        let max_current = self.max_current.unwrap_or(config.session.max_current);

        for motor in session.builder().motors().iter() {
            println!("⏳ 初始化电机 {}（速度模式，最大电流 {} A）...", motor, max_current);
            let result = session
                .initialize(motor, RunMode::Velocity)
                .and_then(|()| session.set_max_current(motor, max_current));
            if let Err(e) = result {
                report(e)?;
            }
        }

        println!();
        println!(
            "输入 CAN_ID,speed（±{} rad/s）；exit 退出",
            config.session.speed_limit
        );
        let input = ConsoleInput::new("velocity> ", conn.interrupter());

        while !conn.stopped() {
            match input.recv() {
                InputEvent::Exit => break,
                InputEvent::Line(line) => {
                    let (motor, speed) = match parse_velocity_line(&line) {
                        Ok(v) => v,
                        Err(e) => {
                            eprintln!("❌ {}", e);
                            continue;
                        },
                    };
                    match session.set_speed(motor, speed) {
                        Ok(()) => println!("✅ 电机 {}: {:.2} rad/s", motor, speed),
                        Err(e) => report(e)?,
                    }
                },
            }
        }

        println!("👋 再见！");
        Ok(())
    }
}
