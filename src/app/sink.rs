//! Packet sink
//!
//! 按 (节点, 目的端口) 接收数据包的汇。活跃窗口覆盖整个仿真
//! （本场景约定 start=0、stop=仿真终点），保证不会漏掉迟到的包。

use crate::error::ConfigError;
use crate::net::{Network, NodeId};
use crate::sim::SimTime;

/// 数据包汇：记录到达的包数/字节与到达时刻。
#[derive(Debug)]
pub struct PacketSink {
    pub node: NodeId,
    pub port: u16,
    pub start: SimTime,
    pub stop: SimTime,
    pub rx_pkts: u64,
    pub rx_bytes: u64,
    pub first_rx_at: Option<SimTime>,
    pub last_rx_at: Option<SimTime>,
}

impl PacketSink {
    pub fn new(
        node: NodeId,
        port: u16,
        start: SimTime,
        stop: SimTime,
    ) -> Result<Self, ConfigError> {
        if start >= stop {
            return Err(ConfigError::EmptyActiveWindow { start, stop });
        }
        Ok(Self {
            node,
            port,
            start,
            stop,
            rx_pkts: 0,
            rx_bytes: 0,
            first_rx_at: None,
            last_rx_at: None,
        })
    }

    pub fn active_at(&self, now: SimTime) -> bool {
        self.start <= now && now < self.stop
    }

    pub(crate) fn on_rx(&mut self, bytes: u32, now: SimTime) {
        self.rx_pkts += 1;
        self.rx_bytes += bytes as u64;
        if self.first_rx_at.is_none() {
            self.first_rx_at = Some(now);
        }
        self.last_rx_at = Some(now);
    }
}

/// 在指定节点/端口安装一个 sink。
pub fn install_sink(
    net: &mut Network,
    node: NodeId,
    port: u16,
    start: SimTime,
    stop: SimTime,
) -> Result<(), ConfigError> {
    let sink = PacketSink::new(node, port, start, stop)?;
    net.apps.add_sink(sink);
    Ok(())
}
