//! 控制器：链路 + 指令会话 + 可靠投递

use crate::config::DriverConfig;
use crate::delivery::{Deliverable, DeliveryOutcome, ReliableDelivery};
use crate::intent::{AckToken, Intent, Joint, JointCommand};
use crate::link::{InterruptHandle, Link};
use crate::session::CommandSession;
use crate::telemetry::TelemetrySink;
use crate::timing::Settle;
use crate::{DeliveryError, DriverError};
use robstride_protocol::FrameBuilder;
use std::sync::Arc;

/// 对外的控制入口
pub struct Controller {
    session: CommandSession,
    delivery: ReliableDelivery,
}

impl Controller {
    /// 在已建立的链路上创建控制器
    pub fn new(link: Link, config: &DriverConfig) -> Self {
        let builder =
            FrameBuilder::new(config.link.motor_set()).with_host_id(config.link.host_id);
        Self {
            session: CommandSession::new(Arc::new(link), builder, config.session.clone()),
            delivery: ReliableDelivery::new(config.delivery.clone()),
        }
    }

    /// 按配置打开串口并创建控制器
    pub fn open(config: &DriverConfig) -> Result<Self, DriverError> {
        Ok(Self::new(Link::open(&config.link)?, config))
    }

    pub fn with_settle(mut self, settle: impl Settle + 'static) -> Self {
        self.session = self.session.with_settle(settle);
        self
    }

    pub fn with_telemetry(mut self, sink: Arc<dyn TelemetrySink>) -> Self {
        self.session = self.session.with_telemetry(sink);
        self
    }

    pub fn session(&self) -> &CommandSession {
        &self.session
    }

    pub fn delivery(&self) -> &ReliableDelivery {
        &self.delivery
    }

    pub fn link(&self) -> &Link {
        self.session.link()
    }

    pub fn interrupt_handle(&self) -> InterruptHandle {
        self.session.link().interrupt_handle()
    }

    /// 可靠投递任意指令（文本行或指令帧）
    pub fn deliver<D>(
        &mut self,
        joint: Joint,
        command: &D,
        ack: &AckToken,
    ) -> Result<DeliveryOutcome, DeliveryError>
    where
        D: Deliverable + ?Sized,
    {
        self.delivery.send(self.session.link(), joint, command, ack)
    }

    /// 把输入意图投递到关节
    pub fn apply_intent(
        &mut self,
        joint: Joint,
        intent: Intent,
    ) -> Result<DeliveryOutcome, DeliveryError> {
        let command = JointCommand::new(joint, intent);
        let ack = command.ack();
        self.deliver(joint, &command, &ack)
    }

    /// 读取编码器位置（rad）
    pub fn read_encoder(&self, motor_id: u8) -> Result<f32, DriverError> {
        self.session.read_encoder(motor_id)
    }
}
