//! 意图控制台（键盘代替手柄）
//!
//! - `j<N> fwd|rev|stop`: 关节意图，经可靠投递发送 `J<N>_<SUFFIX>\n`，等待 `ACK_...`
//! - `stick <x> <y>`: 摇杆位置换算为目标角，发送 `"{:.4}\n"`（不等待确认）

use super::{Connection, report};
use crate::input::{ConsoleInput, InputEvent};
use crate::parse::{IntentLine, parse_intent_line};
use anyhow::Result;
use robstride_driver::{
    DeliveryError, DeliveryOutcome, DriverConfig, STICK_DEAD_ZONE, angle_line, stick_angle,
    stick_target,
};

fn print_help() {
    println!("可用命令:");
    println!("  j<N> fwd|rev|stop     关节 N 正转 / 反转 / 停止");
    println!("  stick <x> <y>         摇杆位置（-1.0 ~ 1.0）换算为目标角");
    println!("  help                  显示帮助");
    println!("  exit / quit           退出");
    println!();
}

pub fn run(config: &DriverConfig) -> Result<()> {
    let mut conn = Connection::open(config)?;
    println!(
        "📡 投递策略: {:?}，确认超时 {} ms，最多 {} 次",
        config.delivery.policy,
        config.delivery.ack_timeout_ms,
        config.delivery.attempts()
    );
    print_help();

    let input = ConsoleInput::new("intent> ", conn.interrupter());
    let mut current_angle = 0.0f32;

    while !conn.stopped() {
        let line = match input.recv() {
            InputEvent::Exit => break,
            InputEvent::Line(line) if line == "help" => {
                print_help();
                continue;
            },
            InputEvent::Line(line) => line,
        };

        match parse_intent_line(&line) {
            Ok(IntentLine::Move { joint, intent }) => {
                match conn.controller.apply_intent(joint, intent) {
                    Ok(DeliveryOutcome::Confirmed { attempts }) => {
                        println!("✅ {} {:?} 已确认（第 {} 次发送）", joint, intent, attempts)
                    },
                    Ok(DeliveryOutcome::Sent) => println!("📤 {} {:?} 已发送", joint, intent),
                    Ok(DeliveryOutcome::Unchanged) => {
                        println!("ℹ️  {} 已处于 {:?}，跳过", joint, intent)
                    },
                    Err(e @ DeliveryError::Exhausted { .. }) => eprintln!("❌ {}", e),
                    Err(DeliveryError::Driver(e)) => report(e)?,
                }
            },
            Ok(IntentLine::Stick { x, y }) => {
                let target = stick_angle(x, y, STICK_DEAD_ZONE);
                let next = stick_target(current_angle, target);
                match conn.controller.link().write_bytes(angle_line(next).as_bytes()) {
                    Ok(()) => {
                        println!(
                            "🎯 目标角 {:.4} rad ({:.1}°)，当前 {:.4} rad",
                            next,
                            next.to_degrees(),
                            current_angle
                        );
                        current_angle = next;
                    },
                    Err(e) => report(e)?,
                }
            },
            Err(e) => eprintln!("❌ {}", e),
        }
    }

    println!("👋 再见！");
    Ok(())
}
