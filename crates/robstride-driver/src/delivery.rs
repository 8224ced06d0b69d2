//! 可靠投递：去抖 + 确认 + 有界重试
//!
//! 每个关节一个状态槽：
//!
//! ```text
//! Idle ──send──> AwaitingAck{attempt} ──ack──> Confirmed
//!                      │ timeout (attempt < limit): 重发
//!                      └ timeout (attempt == limit) ──> Exhausted
//! ```
//!
//! 与上一次确认的指令相同的请求直接忽略，不产生任何传输。
//! 重试用尽时关节的 "最后指令" 保持不变。
//!
//! 投递对象只需实现 [`Deliverable`]：文本行指令（[`JointCommand`]）
//! 与电机指令帧（[`MotorFrame`]）都可以走同一套去抖/确认/重试流程。
//!
//! 状态由投递实例持有，不存在进程级的全局状态。

use crate::config::{DeliveryConfig, DeliveryPolicy};
use crate::intent::{AckToken, Joint, JointCommand};
use crate::link::Link;
use crate::{DeliveryError, DriverError};
use robstride_protocol::MotorFrame;
use std::borrow::Cow;
use std::collections::HashMap;
use tracing::{debug, error, info, warn};

/// 关节投递状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeliveryState {
    #[default]
    Idle,
    /// 已发送第 `attempt` 次，等待确认
    AwaitingAck { attempt: u32 },
    Confirmed,
    Exhausted,
}

/// 一次 `send` 的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// 与最后指令相同，未发送
    Unchanged,
    /// 第 `attempts` 次发送后收到确认
    Confirmed { attempts: u32 },
    /// 乐观策略：已发送，未等待确认
    Sent,
}

/// 可投递的指令
pub trait Deliverable {
    /// 指令标识（去抖比较与日志使用）
    fn command_id(&self) -> Cow<'_, str>;

    /// 线上字节
    fn payload(&self) -> Cow<'_, [u8]>;
}

impl Deliverable for JointCommand {
    fn command_id(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.id())
    }

    fn payload(&self) -> Cow<'_, [u8]> {
        Cow::Owned(JointCommand::payload(self))
    }
}

impl Deliverable for MotorFrame {
    /// 完整帧字节决定标识：同一电机、同一参数、同一数值才视为相同指令
    fn command_id(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_hex())
    }

    fn payload(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(self.as_bytes())
    }
}

#[derive(Debug, Default)]
struct JointSlot {
    last_command: Option<String>,
    state: DeliveryState,
}

/// 可靠投递器
pub struct ReliableDelivery {
    config: DeliveryConfig,
    slots: HashMap<Joint, JointSlot>,
}

impl ReliableDelivery {
    pub fn new(config: DeliveryConfig) -> Self {
        Self {
            config,
            slots: HashMap::new(),
        }
    }

    pub fn config(&self) -> &DeliveryConfig {
        &self.config
    }

    /// 关节的最后指令（确认策略下为最后一次确认的指令）
    pub fn last_command(&self, joint: Joint) -> Option<&str> {
        self.slots.get(&joint)?.last_command.as_deref()
    }

    pub fn state(&self, joint: Joint) -> DeliveryState {
        self.slots.get(&joint).map(|s| s.state).unwrap_or_default()
    }

    /// 清除关节记录（下一次请求必定发送）
    pub fn forget(&mut self, joint: Joint) {
        self.slots.remove(&joint);
    }

    /// 发送指令并按策略等待 `ack`
    ///
    /// # 错误
    /// - `Exhausted`: 所有尝试都未收到 `ack`
    /// - `Driver`: 传输错误或用户中断（状态回到 `Idle`，最后指令不变）
    pub fn send<D>(
        &mut self,
        link: &Link,
        joint: Joint,
        command: &D,
        ack: &AckToken,
    ) -> Result<DeliveryOutcome, DeliveryError>
    where
        D: Deliverable + ?Sized,
    {
        let config = &self.config;
        let slot = self.slots.entry(joint).or_default();
        let payload = command.payload();
        let command_id = command.command_id();
        let command = command_id.as_ref();

        if slot.last_command.as_deref() == Some(command) {
            debug!("{} already at {}, skipping", joint, command);
            return Ok(DeliveryOutcome::Unchanged);
        }

        if config.policy == DeliveryPolicy::Optimistic {
            link.write_bytes(&payload)?;
            info!("Sent {} to {} (optimistic)", command, joint);
            slot.last_command = Some(command.to_string());
            slot.state = DeliveryState::Idle;
            return Ok(DeliveryOutcome::Sent);
        }

        let attempts = config.attempts();
        let timeout = config.ack_timeout();
        for attempt in 1..=attempts {
            slot.state = DeliveryState::AwaitingAck { attempt };
            info!(
                "Sending {} to {} (attempt {}/{})",
                command, joint, attempt, attempts
            );

            let result = link
                .write_bytes(&payload)
                .and_then(|()| link.wait_for_line(ack.as_str(), timeout));

            match result {
                Ok(()) => {
                    info!("{} acknowledged with {}", command, ack);
                    slot.state = DeliveryState::Confirmed;
                    slot.last_command = Some(command.to_string());
                    return Ok(DeliveryOutcome::Confirmed { attempts: attempt });
                },
                Err(DriverError::AckTimeout { .. }) => {
                    warn!(
                        "No {} for {} within {:?} (attempt {}/{})",
                        ack, command, timeout, attempt, attempts
                    );
                },
                Err(e) => {
                    slot.state = DeliveryState::Idle;
                    return Err(e.into());
                },
            }
        }

        error!(
            "{} to {} not acknowledged after {} attempts",
            command, joint, attempts
        );
        slot.state = DeliveryState::Exhausted;
        Err(DeliveryError::Exhausted {
            command: command.to_string(),
            attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::Intent;
    use robstride_serial::MockTransport;

    fn quick(policy: DeliveryPolicy) -> DeliveryConfig {
        DeliveryConfig {
            ack_timeout_ms: 20,
            policy,
            ..Default::default()
        }
    }

    #[test]
    fn test_state_starts_idle() {
        let delivery = ReliableDelivery::new(DeliveryConfig::default());
        assert_eq!(delivery.state(Joint(3)), DeliveryState::Idle);
        assert!(delivery.last_command(Joint(3)).is_none());
    }

    #[test]
    fn test_optimistic_updates_on_transmit() {
        let (transport, handle) = MockTransport::new();
        let link = Link::new(transport, "mock").unwrap();
        let mut delivery = ReliableDelivery::new(quick(DeliveryPolicy::Optimistic));
        let command = JointCommand::new(Joint(3), Intent::Reverse);

        let outcome = delivery
            .send(&link, Joint(3), &command, &command.ack())
            .unwrap();
        assert_eq!(outcome, DeliveryOutcome::Sent);
        assert_eq!(delivery.last_command(Joint(3)), Some(command.id()));

        let outcome = delivery
            .send(&link, Joint(3), &command, &command.ack())
            .unwrap();
        assert_eq!(outcome, DeliveryOutcome::Unchanged);
        assert_eq!(handle.write_count(), 1);
    }

    #[test]
    fn test_retry_then_ack() {
        let (transport, handle) = MockTransport::new();
        let mut calls = 0;
        handle.set_responder(move |_| {
            calls += 1;
            (calls == 2).then(|| b"ACK_J3_FWD\n".to_vec())
        });
        let link = Link::new(transport, "mock").unwrap();
        let mut delivery = ReliableDelivery::new(quick(DeliveryPolicy::Confirmed));
        let command = JointCommand::new(Joint(3), Intent::Forward);

        let outcome = delivery
            .send(&link, Joint(3), &command, &command.ack())
            .unwrap();
        assert_eq!(outcome, DeliveryOutcome::Confirmed { attempts: 2 });
        assert_eq!(delivery.state(Joint(3)), DeliveryState::Confirmed);
        assert_eq!(handle.write_count(), 2);
    }

    #[test]
    fn test_joints_are_independent() {
        let (transport, handle) = MockTransport::new();
        handle.set_responder(|bytes| {
            let line = String::from_utf8_lossy(bytes);
            Some(format!("ACK_{}", line).into_bytes())
        });
        let link = Link::new(transport, "mock").unwrap();
        let mut delivery = ReliableDelivery::new(quick(DeliveryPolicy::Confirmed));

        for joint in [Joint(1), Joint(3)] {
            let command = JointCommand::new(joint, Intent::Forward);
            delivery.send(&link, joint, &command, &command.ack()).unwrap();
        }
        assert_eq!(handle.write_count(), 2);
        assert_eq!(delivery.state(Joint(1)), DeliveryState::Confirmed);
        assert_eq!(delivery.state(Joint(3)), DeliveryState::Confirmed);
    }

    #[test]
    fn test_frame_confirmed_and_debounced() {
        use robstride_protocol::{FRAME_LEN, FrameBuilder, ParameterIndex};

        let (transport, handle) = MockTransport::new();
        let mut calls = 0;
        handle.set_responder(move |bytes| {
            calls += 1;
            (bytes.len() == FRAME_LEN && calls == 2).then(|| b"ACK_TARGET\r\n".to_vec())
        });
        let link = Link::new(transport, "mock").unwrap();
        let mut delivery = ReliableDelivery::new(quick(DeliveryPolicy::Confirmed));
        let builder = FrameBuilder::default();
        let frame = builder
            .write(127, ParameterIndex::TARGET_POSITION, 1.0)
            .unwrap();
        let ack = AckToken::new("ACK_TARGET");

        let outcome = delivery.send(&link, Joint(127), &frame, &ack).unwrap();
        assert_eq!(outcome, DeliveryOutcome::Confirmed { attempts: 2 });
        assert_eq!(handle.written(), vec![frame.as_bytes().to_vec(); 2]);
        assert_eq!(delivery.last_command(Joint(127)), Some(frame.to_hex().as_str()));

        let outcome = delivery.send(&link, Joint(127), &frame, &ack).unwrap();
        assert_eq!(outcome, DeliveryOutcome::Unchanged);

        // 数值不同即为新指令
        let moved = builder
            .write(127, ParameterIndex::TARGET_POSITION, 2.0)
            .unwrap();
        let result = delivery.send(&link, Joint(127), &moved, &ack);
        assert!(matches!(result, Err(DeliveryError::Exhausted { .. })));
        assert_eq!(delivery.last_command(Joint(127)), Some(frame.to_hex().as_str()));
    }

    #[test]
    fn test_interrupt_leaves_last_command() {
        let (transport, handle) = MockTransport::new();
        let link = Link::new(transport, "mock").unwrap();
        let mut delivery = ReliableDelivery::new(DeliveryConfig::default());
        let command = JointCommand::new(Joint(3), Intent::Forward);

        link.interrupt_handle().interrupt();
        let result = delivery.send(&link, Joint(3), &command, &command.ack());
        assert!(matches!(
            result,
            Err(DeliveryError::Driver(DriverError::Interrupted))
        ));
        assert_eq!(handle.write_count(), 1);
        assert_eq!(delivery.state(Joint(3)), DeliveryState::Idle);
        assert!(delivery.last_command(Joint(3)).is_none());
    }
}
