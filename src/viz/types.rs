use serde::Serialize;

use crate::flow::{FlowColor, ProtoLabel};

/// 可视化事件类型
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VizEventKind {
    /// 仿真/拓扑元信息（建议作为 t=0 的第一条事件）
    Meta {
        nodes: Vec<VizNodeInfo>,
        links: Vec<VizLinkInfo>,
    },
    /// packet 入队（发生在某条单向链路的出接口队列上）
    Enqueue {
        link_from: usize,
        link_to: usize,
        q_len: usize,
        q_cap_pkts: Option<u64>,
    },
    /// packet 出队并开始发送（链路序列化开始）
    TxStart {
        link_from: usize,
        link_to: usize,
        depart_ns: u64,
        arrive_ns: u64,
    },
    /// DropTail 丢包
    Drop {
        link_from: usize,
        link_to: usize,
        q_len: usize,
        q_cap_pkts: Option<u64>,
    },
    /// packet 在目的节点被标记为 delivered（统计+上层处理）
    Delivered { node: usize },
    /// 报告期产出的流标签/颜色（流号在事件外层的 flow_id 字段）
    FlowLabel {
        label: ProtoLabel,
        color: FlowColor,
    },
}

/// 节点类型（用于可视化区分 host/router）
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VizNodeKind {
    Host,
    Router,
}

#[derive(Debug, Clone, Serialize)]
pub struct VizNodeInfo {
    pub id: usize,
    pub name: String,
    pub kind: VizNodeKind,
}

#[derive(Debug, Clone, Serialize)]
pub struct VizLinkInfo {
    pub from: usize,
    pub to: usize,
    /// 单向链路带宽（bps）
    pub bandwidth_bps: u64,
    /// 单向传播时延（ns）
    pub latency_ns: u64,
    /// 队列容量（包数）；None 表示近似无限
    pub q_cap_pkts: Option<u64>,
}

/// 一个可回放的事件（JSON）
#[derive(Debug, Clone, Serialize)]
pub struct VizEvent {
    /// 仿真时间（纳秒，和 `SimTime.0` 同口径）
    pub t_ns: u64,
    pub pkt_id: Option<u64>,
    pub flow_id: Option<u64>,
    pub pkt_bytes: Option<u32>,
    #[serde(flatten)]
    pub kind: VizEventKind,
}

/// 一个简单的事件收集器（存内存，仿真结束写 JSON 文件）
#[derive(Debug, Default)]
pub struct VizLogger {
    pub events: Vec<VizEvent>,
}

impl VizLogger {
    pub fn push(&mut self, ev: VizEvent) {
        self.events.push(ev);
    }
}
