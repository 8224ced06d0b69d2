//! 原始十六进制控制台
//!
//! 输入逗号分隔的十六进制串，每段原样写出；监听线程收到的字节以
//! "Received:" 回显。用于调试适配器与帧格式。

use super::{Connection, report};
use crate::input::{ConsoleInput, InputEvent};
use crate::parse::parse_hex_commands;
use anyhow::Result;
use robstride_driver::{DriverConfig, Settle, SpinSettle};
use robstride_protocol::format_hex;
use std::time::Duration;

/// 回显入站数据的轮询间隔
const ECHO_INTERVAL: Duration = Duration::from_millis(100);

pub fn run(config: &DriverConfig) -> Result<()> {
    let conn = Connection::open(config)?;
    let link = conn.controller.link();
    let settle = config.session.settle();

    println!("输入逗号分隔的十六进制串（如 41 54 18 07 e8 0c 08 ...）；exit 退出");
    let input = ConsoleInput::new("raw> ", conn.interrupter());

    while !conn.stopped() {
        match input.recv_timeout(ECHO_INTERVAL) {
            Some(InputEvent::Exit) => break,
            Some(InputEvent::Line(line)) => match parse_hex_commands(&line) {
                Ok(commands) => {
                    for bytes in commands {
                        if let Err(e) = link.write_bytes(&bytes) {
                            report(e)?;
                            break;
                        }
                        println!("Sent: {}", format_hex(&bytes));
                        SpinSettle.settle(settle);
                    }
                },
                Err(e) => eprintln!("❌ {}", e),
            },
            None => {},
        }

        match link.wait_for_any(Duration::ZERO) {
            Ok(Some(bytes)) => println!("Received: {}", format_hex(&bytes)),
            Ok(None) => {},
            Err(e) if e.is_interrupted() => break,
            Err(e) => report(e)?,
        }
    }

    println!("👋 再见！");
    Ok(())
}
