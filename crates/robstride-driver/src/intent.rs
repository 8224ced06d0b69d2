//! 输入意图与文本行协议
//!
//! 手柄/键盘产生的意图被映射为关节指令行，例如 `J3_FWD\n`，
//! 接收端回送确认行 `ACK_J3_FWD`。
//!
//! 摇杆角度适配器把 `(x, y)` 映射到 `[0, 2π)` 的目标角，以 `"{:.4}\n"` 发送。

use std::f32::consts::{PI, TAU};
use std::fmt;
use std::str::FromStr;

/// 关节编号（显示为 `J3`）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Joint(pub u8);

impl fmt::Display for Joint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "J{}", self.0)
    }
}

impl FromStr for Joint {
    type Err = String;

    /// 接受 `3`、`j3`、`J3`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix(['j', 'J']).unwrap_or(s);
        digits
            .parse::<u8>()
            .map(Joint)
            .map_err(|_| format!("invalid joint '{}'", s))
    }
}

/// 关节运动意图
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intent {
    Forward,
    Reverse,
    Stop,
}

impl Intent {
    /// 指令行中的后缀
    pub fn suffix(self) -> &'static str {
        match self {
            Intent::Forward => "FWD",
            Intent::Reverse => "REV",
            Intent::Stop => "STOP",
        }
    }
}

impl FromStr for Intent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fwd" | "forward" | "f" => Ok(Intent::Forward),
            "rev" | "reverse" | "r" => Ok(Intent::Reverse),
            "stop" | "s" => Ok(Intent::Stop),
            other => Err(format!("unknown intent '{}'", other)),
        }
    }
}

/// 关节指令（指令标识，例如 `J3_FWD`）
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JointCommand {
    id: String,
}

impl JointCommand {
    pub fn new(joint: Joint, intent: Intent) -> Self {
        Self {
            id: format!("{}_{}", joint, intent.suffix()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// 线上字节：标识 + 换行
    pub fn payload(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.id.len() + 1);
        bytes.extend_from_slice(self.id.as_bytes());
        bytes.push(b'\n');
        bytes
    }

    /// 期望的确认行
    pub fn ack(&self) -> AckToken {
        AckToken(format!("ACK_{}", self.id))
    }
}

impl fmt::Display for JointCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// 确认令牌（需要与入站行完全一致）
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AckToken(String);

impl AckToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AckToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 摇杆死区
pub const STICK_DEAD_ZONE: f32 = 0.1;

/// 摇杆位置映射为 `[0, 2π)` 的目标角
///
/// 两轴都落在死区内时视为回中（角度 0）。
pub fn stick_angle(x: f32, y: f32, dead_zone: f32) -> f32 {
    let (x, y) = if x.abs() < dead_zone && y.abs() < dead_zone {
        (0.0, 0.0)
    } else {
        (x, y)
    };
    let angle = y.atan2(x);
    let angle = if angle < 0.0 { angle + TAU } else { angle };
    // 极小的负角加 2π 后会舍入到 2π
    if angle >= TAU { 0.0 } else { angle }
}

/// 从当前角出发走最短路径到达目标角，结果归一化到 `[0, 2π)`
pub fn stick_target(current: f32, target: f32) -> f32 {
    let current = current.rem_euclid(TAU);
    let mut delta = target - current;
    if delta > PI {
        delta -= TAU;
    } else if delta < -PI {
        delta += TAU;
    }
    (current + delta).rem_euclid(TAU)
}

/// 角度指令行
pub fn angle_line(angle: f32) -> String {
    format!("{:.4}\n", angle)
}
