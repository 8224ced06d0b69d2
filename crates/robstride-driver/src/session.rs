//! 指令会话
//!
//! 把高层操作展开为按顺序发送的帧序列，帧之间插入固定的稳定延时。
//! 序列中任何一帧都先构造完成再开始发送（构造错误不会产生部分传输）；
//! 发送中途失败时返回 `PartialSequence`，说明已经发出了几帧。

use crate::config::SessionConfig;
use crate::link::Link;
use crate::telemetry::{TelemetrySample, TelemetrySink};
use crate::timing::{Settle, SpinSettle};
use crate::DriverError;
use robstride_protocol::{
    CommandType, FrameBuilder, MotorFrame, ParameterIndex, ParsedResponse, RunMode,
    parse_response,
};
use smallvec::{SmallVec, smallvec};
use std::f32::consts::{PI, TAU};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// 单个操作的帧序列（最长 6 帧，栈上分配）
type FrameSequence = SmallVec<[MotorFrame; 6]>;

/// 把目标角映射到离当前多圈位置最近的等价角
///
/// 先把差值折到 `[-π, π]`，再平移整数圈使目标与当前位置处于同一圈。
pub fn shortest_path_target(current: f32, target: f32) -> f32 {
    let mut target = target;
    let delta = target - current;
    if delta > PI {
        target -= TAU;
    } else if delta < -PI {
        target += TAU;
    }
    target + ((current - target) / TAU).round() * TAU
}

/// 指令会话
pub struct CommandSession {
    link: Arc<Link>,
    builder: FrameBuilder,
    config: SessionConfig,
    settle: Box<dyn Settle>,
    telemetry: Option<Arc<dyn TelemetrySink>>,
}

impl CommandSession {
    pub fn new(link: Arc<Link>, builder: FrameBuilder, config: SessionConfig) -> Self {
        Self {
            link,
            builder,
            config,
            settle: Box::new(SpinSettle),
            telemetry: None,
        }
    }

    /// 替换帧间延时策略
    pub fn with_settle(mut self, settle: impl Settle + 'static) -> Self {
        self.settle = Box::new(settle);
        self
    }

    /// 读取结果同时发布到遥测接收方
    pub fn with_telemetry(mut self, sink: Arc<dyn TelemetrySink>) -> Self {
        self.telemetry = Some(sink);
        self
    }

    pub fn link(&self) -> &Arc<Link> {
        &self.link
    }

    pub fn builder(&self) -> &FrameBuilder {
        &self.builder
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// 选择运行模式并使能
    pub fn initialize(&self, motor_id: u8, mode: RunMode) -> Result<(), DriverError> {
        info!("Initializing motor {} in {:?} mode", motor_id, mode);
        let frames: FrameSequence = smallvec![
            self.builder.select_mode(motor_id, mode)?,
            self.builder.enable(motor_id)?,
        ];
        self.run("initialize", frames)
    }

    /// 设置目标：先写速度（0x1770），再写位置（0x1670）
    pub fn set_target(&self, motor_id: u8, position: f32, velocity: f32) -> Result<(), DriverError> {
        self.check_speed("velocity", velocity)?;
        info!(
            "Motor {}: target position {} at velocity {}",
            motor_id, position, velocity
        );
        let frames: FrameSequence = smallvec![
            self.builder
                .write(motor_id, ParameterIndex::TARGET_VELOCITY, velocity)?,
            self.builder
                .write(motor_id, ParameterIndex::TARGET_POSITION, position)?,
        ];
        self.run("set_target", frames)
    }

    /// 速度、位置清零后执行零点复位
    pub fn reset(&self, motor_id: u8) -> Result<(), DriverError> {
        info!("Resetting motor {}", motor_id);
        let frames: FrameSequence = smallvec![
            self.builder
                .write(motor_id, ParameterIndex::TARGET_VELOCITY, 0.0)?,
            self.builder
                .write(motor_id, ParameterIndex::TARGET_POSITION, 0.0)?,
            self.builder.reset_position(motor_id)?,
        ];
        self.run("reset", frames)
    }

    pub fn disable(&self, motor_id: u8) -> Result<(), DriverError> {
        info!("Disabling motor {}", motor_id);
        let frames: FrameSequence = smallvec![self.builder.disable(motor_id)?];
        self.run("disable", frames)
    }

    /// 设置速度模式最大电流（A）
    pub fn set_max_current(&self, motor_id: u8, amps: f32) -> Result<(), DriverError> {
        let frames: FrameSequence = smallvec![
            self.builder
                .write(motor_id, ParameterIndex::MAX_CURRENT, amps)?
        ];
        self.run("set_max_current", frames)
    }

    /// 速度模式下设置目标转速（rad/s）
    pub fn set_speed(&self, motor_id: u8, speed: f32) -> Result<(), DriverError> {
        self.check_speed("speed", speed)?;
        let frames: FrameSequence = smallvec![
            self.builder
                .write(motor_id, ParameterIndex::SPEED_TARGET, speed)?
        ];
        self.run("set_speed", frames)
    }

    /// 速度模式完整设定：模式、使能、最大电流、加速度、目标转速
    pub fn drive_velocity(
        &self,
        motor_id: u8,
        velocity: f32,
        acceleration: f32,
        max_current: f32,
    ) -> Result<(), DriverError> {
        self.check_speed("velocity", velocity)?;
        let b = &self.builder;
        let frames: FrameSequence = smallvec![
            b.select_mode(motor_id, RunMode::Velocity)?,
            b.enable(motor_id)?,
            b.write(motor_id, ParameterIndex::MAX_CURRENT, max_current)?,
            b.write(motor_id, ParameterIndex::SPEED_ACCELERATION, acceleration)?,
            b.write(motor_id, ParameterIndex::SPEED_TARGET, velocity)?,
        ];
        self.run("drive_velocity", frames)
    }

    /// 位置模式完整设定，目标按最短路径映射到当前圈
    ///
    /// 返回实际写入的多圈目标位置。
    pub fn move_to(
        &self,
        motor_id: u8,
        angle: f32,
        speed: f32,
        acceleration: f32,
    ) -> Result<f32, DriverError> {
        self.check_speed("speed", speed)?;
        let current = self.read_encoder(motor_id)?;
        let target = shortest_path_target(current, angle);
        debug!(
            "Motor {}: current {:.4}, requested {:.4}, mapped {:.4}",
            motor_id, current, angle, target
        );

        let b = &self.builder;
        let frames: FrameSequence = smallvec![
            b.select_mode(motor_id, RunMode::Position)?,
            b.enable(motor_id)?,
            b.write(motor_id, ParameterIndex::TARGET_VELOCITY, speed)?,
            b.write(motor_id, ParameterIndex::POSITION_03_SPEED, speed)?,
            b.write(motor_id, ParameterIndex::POSITION_ACCELERATION, acceleration)?,
            b.write(motor_id, ParameterIndex::TARGET_POSITION, target)?,
        ];
        self.run("move_to", frames)?;
        Ok(target)
    }

    /// 读取编码器位置（rad）
    ///
    /// 发送前丢弃缓冲区中的过期字节；应答与请求之间没有关联 ID，
    /// 期间若有其他数据到达会被当作本次应答。
    pub fn read_encoder(&self, motor_id: u8) -> Result<f32, DriverError> {
        self.read_parameter(motor_id, ParameterIndex::ENCODER_POSITION)
    }

    /// 读取任意浮点参数
    pub fn read_parameter(&self, motor_id: u8, param: ParameterIndex) -> Result<f32, DriverError> {
        let frame = self.builder.read(motor_id, param)?;
        self.check_interrupt()?;

        self.link.discard_inbound();
        self.link.write_frame(&frame)?;
        let bytes = self.link.wait_for_response(self.config.response_timeout())?;

        let order = CommandType::ReadParameter.value_byte_order();
        let telemetry = parse_response(&bytes, order).inspect_err(|e| {
            warn!("Motor {}: bad response to {} read: {}", motor_id, param, e);
        })?;
        if let Ok(parsed) = ParsedResponse::parse_last(&bytes, order)
            && parsed.param != param
        {
            debug!(
                "Motor {}: response echoes {} while {} was requested",
                motor_id, parsed.param, param
            );
        }

        debug!("Motor {}: {} = {}", motor_id, param.name(), telemetry.value);
        if let Some(sink) = &self.telemetry {
            sink.publish(TelemetrySample {
                motor_id,
                param,
                value: telemetry.value,
                received_at: Instant::now(),
            });
        }
        Ok(telemetry.value)
    }

    fn check_speed(&self, what: &'static str, value: f32) -> Result<(), DriverError> {
        let limit = self.config.speed_limit;
        if !value.is_finite() || value.abs() > limit {
            return Err(DriverError::OutOfRange { what, value, limit });
        }
        Ok(())
    }

    fn check_interrupt(&self) -> Result<(), DriverError> {
        if self.link.take_interrupt() {
            return Err(DriverError::Interrupted);
        }
        Ok(())
    }

    /// 按顺序发送帧序列，每帧后等待稳定延时
    fn run(&self, label: &'static str, frames: FrameSequence) -> Result<(), DriverError> {
        let total = frames.len();
        for (completed, frame) in frames.iter().enumerate() {
            let sent = self
                .check_interrupt()
                .and_then(|()| self.link.write_frame(frame));
            if let Err(e) = sent {
                warn!("{} stopped after {}/{} frames: {}", label, completed, total, e);
                return Err(DriverError::PartialSequence {
                    completed,
                    total,
                    source: Box::new(e),
                });
            }
            self.settle.settle(self.config.settle());
        }
        debug!("{} complete ({} frames)", label, total);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shortest_path_same_turn() {
        assert!((shortest_path_target(0.0, 1.0) - 1.0).abs() < 1e-6);
        assert!((shortest_path_target(0.5, -0.5) + 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_shortest_path_wraps_backwards() {
        // 从 0 到 1.9π：反向走 0.1π 更近
        let target = shortest_path_target(0.0, 1.9 * PI);
        assert!((target + 0.1 * PI).abs() < 1e-5);
    }

    #[test]
    fn test_shortest_path_multi_turn() {
        let current = 2.0 * TAU + 0.1;
        let target = shortest_path_target(current, 0.2);
        assert!((target - (2.0 * TAU + 0.2)).abs() < 1e-4);
        assert!((target - current).abs() <= PI);
    }
}
