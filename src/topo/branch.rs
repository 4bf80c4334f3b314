//! Branch（汇聚）拓扑构建
//!
//! 拓扑结构：n0 ─┐
//!               n2 ── n3
//!          n1 ─┘
//!
//! 两条边链路汇聚到 n2，再经一条更窄的瓶颈链路到 n3；瓶颈出接口
//! 配有界队列，是整个场景唯一的拥塞点。

use crate::error::ConfigError;
use crate::net::{Addr, NetWorld, NodeId};
use crate::sim::SimTime;

/// Branch 拓扑配置选项
#[derive(Debug, Clone)]
pub struct BranchOpts {
    /// 边链路（n0–n2、n1–n2）速率
    pub edge_rate_bps: u64,
    /// 边链路单向传播时延
    pub edge_delay: SimTime,
    /// 瓶颈链路（n2–n3）速率
    pub bottleneck_rate_bps: u64,
    /// 瓶颈链路单向传播时延
    pub bottleneck_delay: SimTime,
    /// 瓶颈出接口队列容量（包数）
    pub bottleneck_queue_pkts: usize,
}

impl Default for BranchOpts {
    fn default() -> Self {
        Self {
            edge_rate_bps: 2_000_000,        // 2 Mbps
            edge_delay: SimTime::from_millis(10),
            bottleneck_rate_bps: 1_700_000,  // 1.7 Mbps
            bottleneck_delay: SimTime::from_millis(20),
            bottleneck_queue_pkts: 10,
        }
    }
}

/// 构建出的拓扑节点
#[derive(Debug, Clone, Copy)]
pub struct BranchTopo {
    pub n0: NodeId,
    pub n1: NodeId,
    pub n2: NodeId,
    pub n3: NodeId,
}

impl BranchTopo {
    /// 按脚本编号取节点（n0..n3）。
    pub fn node(&self, index: usize) -> Option<NodeId> {
        [self.n0, self.n1, self.n2, self.n3].get(index).copied()
    }
}

/// 构建 branch 拓扑并完成寻址：每个节点绑定一个不透明地址。
pub fn build_branch(world: &mut NetWorld, opts: &BranchOpts) -> Result<BranchTopo, ConfigError> {
    let n0 = world.net.add_host("n0");
    let n1 = world.net.add_host("n1");
    let n2 = world.net.add_router("n2");
    let n3 = world.net.add_host("n3");

    world
        .net
        .connect_duplex(n0, n2, opts.edge_delay, opts.edge_rate_bps)?;
    world
        .net
        .connect_duplex(n1, n2, opts.edge_delay, opts.edge_rate_bps)?;
    world
        .net
        .connect_duplex(n2, n3, opts.bottleneck_delay, opts.bottleneck_rate_bps)?;

    // 有界队列只收紧瓶颈两端，边链路保持默认（近似无限）。
    world
        .net
        .set_queue_capacity_pkts(n2, n3, opts.bottleneck_queue_pkts)?;
    world
        .net
        .set_queue_capacity_pkts(n3, n2, opts.bottleneck_queue_pkts)?;

    // 寻址服务：按链路子网习惯分配，核心只当不透明 token 用。
    world.net.bind_addr(n0, Addr::v4(10, 1, 1, 1))?;
    world.net.bind_addr(n1, Addr::v4(10, 1, 2, 1))?;
    world.net.bind_addr(n2, Addr::v4(10, 1, 3, 1))?;
    world.net.bind_addr(n3, Addr::v4(10, 1, 3, 2))?;

    Ok(BranchTopo { n0, n1, n2, n3 })
}
