//! 帧间稳定延时
//!
//! 电机在两帧之间需要固定的处理时间。延时作为可注入的协作者，
//! 测试中替换为 [`NoSettle`]。

use std::time::Duration;

/// 帧间延时策略
pub trait Settle: Send + Sync {
    fn settle(&self, delay: Duration);
}

/// 精确延时（spin_sleep：先睡眠再自旋补足）
#[derive(Debug, Default, Clone, Copy)]
pub struct SpinSettle;

impl Settle for SpinSettle {
    fn settle(&self, delay: Duration) {
        if !delay.is_zero() {
            spin_sleep::sleep(delay);
        }
    }
}

/// 不等待
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSettle;

impl Settle for NoSettle {
    fn settle(&self, _delay: Duration) {}
}
