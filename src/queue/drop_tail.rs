//! DropTail（尾丢弃）队列
//!
//! 队列占用按**包数**计（与原场景口径一致）。队列满时直接丢弃新到达的
//! packet 并递增丢弃计数，绝不阻塞等待。容量为 0 时每次入队都被丢弃。

use std::collections::VecDeque;

use crate::net::Packet;

use super::PacketQueue;

#[derive(Debug)]
pub struct DropTailQueue {
    max_pkts: usize,
    drops: u64,
    q: VecDeque<Packet>,
}

impl DropTailQueue {
    pub fn new(max_pkts: usize) -> Self {
        Self {
            max_pkts,
            drops: 0,
            q: VecDeque::new(),
        }
    }
}

impl PacketQueue for DropTailQueue {
    fn enqueue(&mut self, pkt: Packet) -> Result<(), Packet> {
        if self.q.len() >= self.max_pkts {
            self.drops = self.drops.saturating_add(1);
            return Err(pkt);
        }
        self.q.push_back(pkt);
        Ok(())
    }

    fn dequeue(&mut self) -> Option<Packet> {
        self.q.pop_front()
    }

    fn len(&self) -> usize {
        self.q.len()
    }

    fn capacity_pkts(&self) -> usize {
        self.max_pkts
    }

    fn drops(&self) -> u64 {
        self.drops
    }
}
