//! 列出可用串口

use anyhow::{Context, Result};

pub fn run() -> Result<()> {
    let ports = robstride_serial::available_ports().context("枚举串口失败")?;
    if ports.is_empty() {
        println!("⚠️  未发现串口设备");
        return Ok(());
    }
    println!("可用串口:");
    for port in ports {
        println!("  {}", port);
    }
    Ok(())
}
