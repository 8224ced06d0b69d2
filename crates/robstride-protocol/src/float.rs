//! IEEE754 单精度浮点编解码
//!
//! 直接使用位模式转换，不经过任何中间数值表示，保证往返位精确。

/// 浮点值在数据区中的字节序
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ByteOrder {
    /// 小端（低字节在前）
    #[default]
    Little,
    /// 大端（高字节在前）
    Big,
}

/// 浮点数编码为 4 字节
#[inline]
pub fn encode_f32(value: f32, order: ByteOrder) -> [u8; 4] {
    match order {
        ByteOrder::Little => value.to_le_bytes(),
        ByteOrder::Big => value.to_be_bytes(),
    }
}

/// 4 字节解码为浮点数
#[inline]
pub fn decode_f32(bytes: [u8; 4], order: ByteOrder) -> f32 {
    match order {
        ByteOrder::Little => f32::from_le_bytes(bytes),
        ByteOrder::Big => f32::from_be_bytes(bytes),
    }
}
