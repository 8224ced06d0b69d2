//! 遥测输出
//!
//! 读取到的参数值通过 [`TelemetrySink`] 发布。
//! [`LatestTelemetry`] 用 ArcSwap 保存每个电机的最新样本，读端无锁。

use arc_swap::ArcSwap;
use robstride_protocol::ParameterIndex;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

/// 单个遥测样本
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetrySample {
    pub motor_id: u8,
    pub param: ParameterIndex,
    pub value: f32,
    pub received_at: Instant,
}

/// 遥测接收方
pub trait TelemetrySink: Send + Sync {
    fn publish(&self, sample: TelemetrySample);
}

/// 每个电机最新样本的快照
#[derive(Default)]
pub struct LatestTelemetry {
    samples: ArcSwap<BTreeMap<u8, TelemetrySample>>,
}

impl LatestTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 指定电机的最新样本
    pub fn latest(&self, motor_id: u8) -> Option<TelemetrySample> {
        self.samples.load().get(&motor_id).copied()
    }

    /// 全部电机的快照
    pub fn snapshot(&self) -> Arc<BTreeMap<u8, TelemetrySample>> {
        self.samples.load_full()
    }
}

impl TelemetrySink for LatestTelemetry {
    fn publish(&self, sample: TelemetrySample) {
        self.samples.rcu(|current| {
            let mut next = BTreeMap::clone(current);
            next.insert(sample.motor_id, sample);
            next
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(motor_id: u8, value: f32) -> TelemetrySample {
        TelemetrySample {
            motor_id,
            param: ParameterIndex::ENCODER_POSITION,
            value,
            received_at: Instant::now(),
        }
    }

    #[test]
    fn test_latest_overwrites() {
        let sink = LatestTelemetry::new();
        assert!(sink.latest(127).is_none());

        sink.publish(sample(127, 1.0));
        sink.publish(sample(127, 2.0));
        sink.publish(sample(1, 0.5));

        assert_eq!(sink.latest(127).unwrap().value, 2.0);
        assert_eq!(sink.snapshot().len(), 2);
    }
}
