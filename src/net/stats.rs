//! 统计信息
//!
//! 定义网络仿真全局统计数据结构（逐流统计见 `crate::flow`）。

/// 网络统计信息
#[derive(Debug, Default)]
pub struct Stats {
    pub delivered_pkts: u64,
    pub delivered_bytes: u64,
    pub dropped_pkts: u64,
    pub dropped_bytes: u64,
}
