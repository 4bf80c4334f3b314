//! Visualization hooks for the network.

use crate::flow::ProtoLabel;
use crate::sim::SimTime;
use crate::viz::{VizEvent, VizEventKind, VizLinkInfo, VizNodeInfo};

use super::{FiveTuple, Network, NodeId, Packet};

fn cap_pkts(cap: usize) -> Option<u64> {
    (cap != usize::MAX).then_some(cap as u64)
}

impl Network {
    fn viz_push(&mut self, ev: VizEvent) {
        if let Some(v) = &mut self.viz {
            v.push(ev);
        }
    }

    /// 拓扑元信息：建议在构建完成后、仿真开始前发出。
    pub fn emit_viz_meta(&mut self) {
        if self.viz.is_none() {
            return;
        }
        let nodes = self
            .node_names
            .iter()
            .enumerate()
            .map(|(id, name)| VizNodeInfo {
                id,
                name: name.clone(),
                kind: self.node_kinds[id],
            })
            .collect::<Vec<_>>();
        let links = self
            .links
            .iter()
            .map(|l| VizLinkInfo {
                from: l.from.0,
                to: l.to.0,
                bandwidth_bps: l.bandwidth_bps,
                latency_ns: l.latency.0,
                q_cap_pkts: cap_pkts(l.queue.capacity_pkts()),
            })
            .collect::<Vec<_>>();
        self.viz_push(VizEvent {
            t_ns: 0,
            pkt_id: None,
            flow_id: None,
            pkt_bytes: None,
            kind: VizEventKind::Meta { nodes, links },
        });
    }

    /// 报告期产出 flow_id -> 标签/颜色（交给可视化 sink 的着色规则）。
    pub fn emit_viz_flow_labels(&mut self, t: SimTime) {
        if self.viz.is_none() {
            return;
        }
        let labels = self
            .flows
            .flow_stats()
            .map(|(id, tuple, _)| (id.0, ProtoLabel::from_protocol(tuple.protocol)))
            .collect::<Vec<_>>();
        for (flow_id, label) in labels {
            self.viz_push(VizEvent {
                t_ns: t.0,
                pkt_id: None,
                flow_id: Some(flow_id),
                pkt_bytes: None,
                kind: VizEventKind::FlowLabel {
                    label,
                    color: label.color(),
                },
            });
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn viz_enqueue(
        &mut self,
        t: SimTime,
        pkt_id: u64,
        tuple: &FiveTuple,
        pkt_bytes: u32,
        from: NodeId,
        to: NodeId,
        q_len: usize,
        q_cap: usize,
    ) {
        let flow_id = self.flows.flow_id_of(tuple).map(|f| f.0);
        self.viz_push(VizEvent {
            t_ns: t.0,
            pkt_id: Some(pkt_id),
            flow_id,
            pkt_bytes: Some(pkt_bytes),
            kind: VizEventKind::Enqueue {
                link_from: from.0,
                link_to: to.0,
                q_len,
                q_cap_pkts: cap_pkts(q_cap),
            },
        });
    }

    pub(crate) fn viz_drop(
        &mut self,
        t: SimTime,
        pkt: &Packet,
        from: NodeId,
        to: NodeId,
        q_len: usize,
        q_cap: usize,
    ) {
        let flow_id = self.flows.flow_id_of(&pkt.tuple).map(|f| f.0);
        self.viz_push(VizEvent {
            t_ns: t.0,
            pkt_id: Some(pkt.id),
            flow_id,
            pkt_bytes: Some(pkt.size_bytes),
            kind: VizEventKind::Drop {
                link_from: from.0,
                link_to: to.0,
                q_len,
                q_cap_pkts: cap_pkts(q_cap),
            },
        });
    }

    pub(crate) fn viz_tx_start(
        &mut self,
        t: SimTime,
        pkt: &Packet,
        from: NodeId,
        to: NodeId,
        depart: SimTime,
        arrive: SimTime,
    ) {
        let flow_id = self.flows.flow_id_of(&pkt.tuple).map(|f| f.0);
        self.viz_push(VizEvent {
            t_ns: t.0,
            pkt_id: Some(pkt.id),
            flow_id,
            pkt_bytes: Some(pkt.size_bytes),
            kind: VizEventKind::TxStart {
                link_from: from.0,
                link_to: to.0,
                depart_ns: depart.0,
                arrive_ns: arrive.0,
            },
        });
    }

    pub(crate) fn viz_delivered(&mut self, t: SimTime, pkt: &Packet, node: NodeId) {
        let flow_id = self.flows.flow_id_of(&pkt.tuple).map(|f| f.0);
        self.viz_push(VizEvent {
            t_ns: t.0,
            pkt_id: Some(pkt.id),
            flow_id,
            pkt_bytes: Some(pkt.size_bytes),
            kind: VizEventKind::Delivered { node: node.0 },
        });
    }
}
