//! 链路类型
//!
//! 定义网络链路及其传输时延计算。
//!
//! 一条**有向**链路 = 一个网络接口的出向路径：它持有该接口的出队列
//! （BoundedQueue），并以 `busy_until` 记录串行化占用，保证背靠背的
//! 两个 packet 不会出现重叠交付——这是瓶颈速率仿真正确性的关键。

use super::id::NodeId;
use crate::queue::{DropTailQueue, PacketQueue};
use crate::sim::SimTime;

/// 默认队列容量（包数）：近似无限，不丢包；瓶颈处由场景显式收紧。
pub const DEFAULT_QUEUE_PKTS: usize = usize::MAX;

/// 网络链路
#[derive(Debug)]
pub struct Link {
    pub from: NodeId,
    pub to: NodeId,
    /// 单向传播时延（固定）
    pub latency: SimTime,
    /// 数据速率（bit/s），构造期保证 > 0
    pub bandwidth_bps: u64,
    /// 链路忙到何时：下一次串行化发送不早于此时刻
    pub busy_until: SimTime,
    /// 出向接口的有界队列（默认 DropTail）
    pub queue: Box<dyn PacketQueue>,
}

impl Link {
    /// 创建新链路。速率为正由 `Network::connect` 在构造期校验。
    pub(crate) fn new(from: NodeId, to: NodeId, latency: SimTime, bandwidth_bps: u64) -> Self {
        Self {
            from,
            to,
            latency,
            bandwidth_bps,
            busy_until: SimTime::ZERO,
            queue: Box::new(DropTailQueue::new(DEFAULT_QUEUE_PKTS)),
        }
    }

    /// 计算传输指定字节数所需的时间（串行化时延）
    pub(crate) fn tx_time(&self, bytes: u32) -> SimTime {
        SimTime(tx_nanos(bytes, self.bandwidth_bps))
    }
}

/// ceil(bytes*8 / bps) 秒 -> 纳秒。应用层按速率发包的间隔计算共用此口径。
pub(crate) fn tx_nanos(bytes: u32, bps: u64) -> u64 {
    debug_assert!(bps > 0, "rate validated at construction");
    let bits = (bytes as u128).saturating_mul(8);
    let nanos = (bits.saturating_mul(1_000_000_000u128) + (bps as u128 - 1)) / bps as u128;
    nanos.min(u64::MAX as u128) as u64
}
