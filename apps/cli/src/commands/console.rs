//! 位置控制台
//!
//! 所有已配置电机先以位置模式初始化，之后逐行读取：
//! - `CAN_ID,position,speed`: 设置目标（先速度后位置）
//! - `CAN_ID,r`: 复位

use super::{Connection, report};
use crate::input::{ConsoleInput, InputEvent};
use crate::parse::{ConsoleLine, parse_console_line};
use anyhow::Result;
use robstride_driver::{CommandSession, DriverConfig, DriverError};
use robstride_protocol::RunMode;

fn execute(session: &CommandSession, line: ConsoleLine) -> Result<(), DriverError> {
    match line {
        ConsoleLine::Target {
            motor,
            position,
            speed,
        } => {
            session.set_target(motor, position, speed)?;
            println!("✅ 电机 {}: 目标 {:.4} rad @ {:.2} rad/s", motor, position, speed);
        },
        ConsoleLine::Reset { motor } => {
            session.reset(motor)?;
            println!("✅ 电机 {} 已复位", motor);
        },
    }
    Ok(())
}

pub fn run(config: &DriverConfig) -> Result<()> {
    let conn = Connection::open(config)?;
    let session = conn.controller.session();

    for motor in session.builder().motors().iter() {
        println!("⏳ 初始化电机 {}（位置模式）...", motor);
        if let Err(e) = session.initialize(motor, RunMode::Position) {
            report(e)?;
        }
    }

    println!();
    println!("输入 CAN_ID,position,speed 设置目标，CAN_ID,r 复位；exit 退出");
    let input = ConsoleInput::new("robstride> ", conn.interrupter());

    while !conn.stopped() {
        match input.recv() {
            InputEvent::Exit => break,
            InputEvent::Line(line) => match parse_console_line(&line) {
                Ok(parsed) => {
                    if let Err(e) = execute(session, parsed) {
                        report(e)?;
                    }
                },
                Err(e) => eprintln!("❌ {}", e),
            },
        }
    }

    println!("👋 再见！");
    Ok(())
}
