//! 流报告
//!
//! `RunUntil` 返回后一次性生成：流号升序、带协议标签与颜色的
//! 逐流统计条目，可序列化为 JSON 交给外部报告 sink。

use serde::Serialize;

use crate::net::Addr;

use super::classify::{FlowColor, ProtoLabel};
use super::registry::{FlowId, FlowRegistry};

/// 单条流报告
#[derive(Debug, Clone, Serialize)]
pub struct FlowReportEntry {
    pub flow_id: FlowId,
    pub label: ProtoLabel,
    pub color: FlowColor,
    pub protocol: u8,
    pub src: Addr,
    pub dst: Addr,
    pub src_port: u16,
    pub dst_port: u16,
    pub tx_pkts: u64,
    pub tx_bytes: u64,
    pub rx_pkts: u64,
    pub rx_bytes: u64,
    pub drops: u64,
    pub mean_delay_ms: Option<f64>,
    pub mean_jitter_ms: Option<f64>,
}

/// 整次运行的流报告
#[derive(Debug, Clone, Serialize)]
pub struct FlowReport {
    pub flows: Vec<FlowReportEntry>,
}

impl FlowReport {
    /// 从注册表构建报告；纯只读，重复构建结果相同。
    pub fn build(reg: &FlowRegistry) -> FlowReport {
        let flows = reg
            .flow_stats()
            .map(|(id, tuple, st)| {
                let label = ProtoLabel::from_protocol(tuple.protocol);
                FlowReportEntry {
                    flow_id: id,
                    label,
                    color: label.color(),
                    protocol: tuple.protocol,
                    src: tuple.src,
                    dst: tuple.dst,
                    src_port: tuple.src_port,
                    dst_port: tuple.dst_port,
                    tx_pkts: st.tx_pkts,
                    tx_bytes: st.tx_bytes,
                    rx_pkts: st.rx_pkts,
                    rx_bytes: st.rx_bytes,
                    drops: st.drops,
                    mean_delay_ms: st.mean_delay_ns().map(|ns| ns as f64 / 1e6),
                    mean_jitter_ms: st.mean_jitter_ns().map(|ns| ns as f64 / 1e6),
                }
            })
            .collect();
        FlowReport { flows }
    }
}
