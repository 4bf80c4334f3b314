//! 队列策略（Queue disciplines）
//!
//! 提供按包计数的 DropTail（尾丢弃）队列，后续可以在此扩展 RED/CoDel 等策略。

use crate::net::Packet;

mod drop_tail;

pub use drop_tail::DropTailQueue;

/// Packet 队列抽象
pub trait PacketQueue: std::fmt::Debug {
    /// 入队：成功返回 Ok；若被丢弃则返回 Err(pkt)
    fn enqueue(&mut self, pkt: Packet) -> Result<(), Packet>;
    /// 出队：按队列策略返回下一个 packet
    fn dequeue(&mut self) -> Option<Packet>;

    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    /// 容量（最大可排队包数）
    fn capacity_pkts(&self) -> usize;
    /// 累计尾丢弃次数
    fn drops(&self) -> u64;
}
