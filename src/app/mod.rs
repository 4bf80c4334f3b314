//! 流量应用（源/汇）
//!
//! 应用挂在主机节点上，由调度器驱动：恒定速率（CBR）源按速率定时发包，
//! bulk 源把数据交给简化 TCP 栈；sink 在活跃窗口内记录到达并更新所属流
//! 的接收统计。应用只在 `[start, stop)` 内活跃。

mod bulk;
mod cbr;
mod sink;

pub use bulk::{BulkConfig, install_bulk};
pub use cbr::{CbrConfig, CbrSource, CbrStart, CbrStop, install_cbr};
pub use sink::{PacketSink, install_sink};

use crate::net::NodeId;

/// 应用标识符（CBR 源在注册表中的下标）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppId(pub usize);

/// 世界内所有应用的容器。
#[derive(Debug, Default)]
pub struct AppRegistry {
    pub cbr: Vec<CbrSource>,
    pub sinks: Vec<PacketSink>,
}

impl AppRegistry {
    pub fn add_cbr(&mut self, src: CbrSource) -> AppId {
        let id = AppId(self.cbr.len());
        self.cbr.push(src);
        id
    }

    pub fn add_sink(&mut self, sink: PacketSink) {
        self.sinks.push(sink);
    }

    /// 按 (节点, 端口) 查找 sink。
    pub fn sink_mut(&mut self, node: NodeId, port: u16) -> Option<&mut PacketSink> {
        self.sinks
            .iter_mut()
            .find(|s| s.node == node && s.port == port)
    }

    pub fn sink(&self, node: NodeId, port: u16) -> Option<&PacketSink> {
        self.sinks.iter().find(|s| s.node == node && s.port == port)
    }
}
