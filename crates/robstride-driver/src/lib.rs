//! # Robstride Driver
//!
//! 串口链路、指令会话与可靠投递。
//!
//! ## 线程模型
//!
//! - 控制线程：按顺序发送指令，在入站缓冲区上带超时等待
//! - 监听线程：持续读取串口，只追加字节，不解释帧边界
//!
//! 所有等待都有超时，所有重试都有上限；[`InterruptHandle`] 可以打断任何等待。
//!
//! ## 使用示例
//!
//! ```no_run
//! use robstride_driver::{Controller, DriverConfig, Intent, Joint};
//! use robstride_protocol::RunMode;
//!
//! let config = DriverConfig::default();
//! let mut controller = Controller::open(&config)?;
//! controller.session().initialize(127, RunMode::Position)?;
//! controller.session().set_target(127, 1.57, 5.0)?;
//! let position = controller.read_encoder(127)?;
//! println!("Encoder Position: {:.4}", position);
//!
//! controller.apply_intent(Joint(3), Intent::Forward)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod controller;
pub mod delivery;
pub mod error;
mod inbox;
pub mod intent;
pub mod link;
pub mod session;
pub mod telemetry;
pub mod timing;

pub use config::{
    DeliveryConfig, DeliveryPolicy, DriverConfig, LinkConfig, RETRY_LIMIT, SPEED_LIMIT,
    SessionConfig,
};
pub use controller::Controller;
pub use delivery::{Deliverable, DeliveryOutcome, DeliveryState, ReliableDelivery};
pub use error::{DeliveryError, DriverError};
pub use inbox::INBOX_CAPACITY;
pub use intent::{
    AckToken, Intent, Joint, JointCommand, STICK_DEAD_ZONE, angle_line, stick_angle, stick_target,
};
pub use link::{InterruptHandle, Link};
pub use session::{CommandSession, shortest_path_target};
pub use telemetry::{LatestTelemetry, TelemetrySample, TelemetrySink};
pub use timing::{NoSettle, Settle, SpinSettle};
