//! 控制台输入行解析
//!
//! 电机 ID 与速度范围的检查交给会话层（`InvalidTarget` / `OutOfRange`），
//! 这里只负责格式。

use robstride_driver::{Intent, Joint};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum LineError {
    #[error("格式错误，应为 {0}")]
    Format(&'static str),

    #[error("无效数值: '{0}'")]
    Number(String),

    #[error("无效十六进制: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("{0}")]
    Intent(String),
}

/// 位置控制台的一行
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConsoleLine {
    /// `CAN_ID,position,speed`
    Target { motor: u8, position: f32, speed: f32 },
    /// `CAN_ID,r`
    Reset { motor: u8 },
}

const CONSOLE_FORMAT: &str = "CAN_ID,position,speed 或 CAN_ID,r";
const VELOCITY_FORMAT: &str = "CAN_ID,speed";
const INTENT_FORMAT: &str = "j<N> fwd|rev|stop 或 stick <x> <y>";

fn number<T: std::str::FromStr>(s: &str) -> Result<T, LineError> {
    s.trim()
        .parse()
        .map_err(|_| LineError::Number(s.trim().to_string()))
}

pub fn parse_console_line(line: &str) -> Result<ConsoleLine, LineError> {
    let parts: Vec<&str> = line.split(',').map(str::trim).collect();
    match parts.as_slice() {
        [motor, r] if r.eq_ignore_ascii_case("r") => Ok(ConsoleLine::Reset {
            motor: number(motor)?,
        }),
        [motor, position, speed] => Ok(ConsoleLine::Target {
            motor: number(motor)?,
            position: number(position)?,
            speed: number(speed)?,
        }),
        _ => Err(LineError::Format(CONSOLE_FORMAT)),
    }
}

pub fn parse_velocity_line(line: &str) -> Result<(u8, f32), LineError> {
    let parts: Vec<&str> = line.split(',').map(str::trim).collect();
    match parts.as_slice() {
        [motor, speed] => Ok((number(motor)?, number(speed)?)),
        _ => Err(LineError::Format(VELOCITY_FORMAT)),
    }
}

/// 逗号分隔的十六进制串，每段一条指令（段内空格忽略）
pub fn parse_hex_commands(line: &str) -> Result<Vec<Vec<u8>>, LineError> {
    line.split(',')
        .map(|segment| segment.split_whitespace().collect::<String>())
        .filter(|segment| !segment.is_empty())
        .map(|segment| hex::decode(segment).map_err(LineError::from))
        .collect()
}

/// 意图控制台的一行
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IntentLine {
    Move { joint: Joint, intent: Intent },
    Stick { x: f32, y: f32 },
}

pub fn parse_intent_line(line: &str) -> Result<IntentLine, LineError> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    match parts.as_slice() {
        ["stick", x, y] => Ok(IntentLine::Stick {
            x: number(x)?,
            y: number(y)?,
        }),
        [joint, intent] => Ok(IntentLine::Move {
            joint: joint.parse().map_err(LineError::Intent)?,
            intent: intent.parse().map_err(LineError::Intent)?,
        }),
        _ => Err(LineError::Format(INTENT_FORMAT)),
    }
}
