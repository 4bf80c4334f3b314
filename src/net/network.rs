//! 网络拓扑管理
//!
//! 定义网络拓扑结构，包含节点、链路、寻址绑定、数据包转发与统计信息。
//! `Network` 持有流注册表、TCP 栈和应用注册表；所有状态都挂在显式
//! 构造的 world 对象上，没有任何进程级全局。

use std::collections::HashMap;

use super::addr::Addr;
use super::deliver_packet::DeliverPacket;
use super::id::{LinkId, NodeId};
use super::link::Link;
use super::link_ready::LinkReady;
use super::node::{Host, Node, Router};
use super::packet::{FiveTuple, Packet};
use super::routing::RoutingTable;
use super::stats::Stats;
use super::transport::{TcpSegment, Transport};
use crate::app::AppRegistry;
use crate::error::ConfigError;
use crate::flow::FlowRegistry;
use crate::proto::tcp::TcpStack;
use crate::queue::DropTailQueue;
use crate::sim::{SimTime, Simulator};
use crate::viz::{VizLogger, VizNodeKind};
use tracing::{debug, info, trace};

/// 网络拓扑
#[derive(Default)]
pub struct Network {
    nodes: Vec<Option<Box<dyn Node>>>,
    pub(crate) node_names: Vec<String>,
    pub(crate) node_kinds: Vec<VizNodeKind>,
    pub(crate) links: Vec<Link>,
    edges: HashMap<(NodeId, NodeId), LinkId>,
    adj: Vec<Vec<NodeId>>,
    rev_adj: Vec<Vec<NodeId>>,
    routing: RoutingTable,
    addrs: Vec<Option<Addr>>,
    addr_to_node: HashMap<Addr, NodeId>,
    next_pkt_id: u64,
    pub stats: Stats,
    pub flows: FlowRegistry,
    pub tcp: TcpStack,
    pub apps: AppRegistry,
    pub viz: Option<VizLogger>,
}

impl Network {
    fn push_node(&mut self, node: Box<dyn Node>, name: String, kind: VizNodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Some(node));
        self.node_names.push(name);
        self.node_kinds.push(kind);
        self.adj.push(Vec::new());
        self.rev_adj.push(Vec::new());
        self.addrs.push(None);
        id
    }

    /// 添加主机节点
    pub fn add_host(&mut self, name: impl Into<String>) -> NodeId {
        let name = name.into();
        let id = NodeId(self.nodes.len());
        self.push_node(Box::new(Host::new(id, name.clone())), name, VizNodeKind::Host)
    }

    /// 添加路由器节点
    pub fn add_router(&mut self, name: impl Into<String>) -> NodeId {
        let name = name.into();
        let id = NodeId(self.nodes.len());
        self.push_node(
            Box::new(Router::new(id, name.clone())),
            name,
            VizNodeKind::Router,
        )
    }

    fn check_node(&self, id: NodeId) -> Result<(), ConfigError> {
        if id.0 >= self.nodes.len() {
            return Err(ConfigError::NoSuchNode(id));
        }
        Ok(())
    }

    /// 连接两个节点（创建单向链路）。速率必须为正，传播时延允许为 0。
    pub fn connect(
        &mut self,
        from: NodeId,
        to: NodeId,
        latency: SimTime,
        bandwidth_bps: u64,
    ) -> Result<LinkId, ConfigError> {
        self.check_node(from)?;
        self.check_node(to)?;
        if bandwidth_bps == 0 {
            return Err(ConfigError::ZeroDataRate { from, to });
        }

        let id = LinkId(self.links.len());
        self.links.push(Link::new(from, to, latency, bandwidth_bps));
        self.edges.insert((from, to), id);
        self.adj[from.0].push(to);
        self.rev_adj[to.0].push(from);
        self.routing.mark_dirty();
        Ok(id)
    }

    /// 连接两个节点（两条方向相反的单向链路）
    pub fn connect_duplex(
        &mut self,
        a: NodeId,
        b: NodeId,
        latency: SimTime,
        bandwidth_bps: u64,
    ) -> Result<(LinkId, LinkId), ConfigError> {
        let ab = self.connect(a, b, latency, bandwidth_bps)?;
        let ba = self.connect(b, a, latency, bandwidth_bps)?;
        Ok((ab, ba))
    }

    /// 设置某条单向链路出接口队列的容量（包数）
    pub fn set_queue_capacity_pkts(
        &mut self,
        from: NodeId,
        to: NodeId,
        capacity_pkts: usize,
    ) -> Result<(), ConfigError> {
        let link_id = *self
            .edges
            .get(&(from, to))
            .ok_or(ConfigError::NoSuchLink { from, to })?;
        self.links[link_id.0].queue = Box::new(DropTailQueue::new(capacity_pkts));
        Ok(())
    }

    /// 绑定节点地址（寻址服务的产物；核心只做不透明映射）
    pub fn bind_addr(&mut self, node: NodeId, addr: Addr) -> Result<(), ConfigError> {
        self.check_node(node)?;
        if self.addr_to_node.contains_key(&addr) {
            return Err(ConfigError::AddrInUse(addr));
        }
        self.addrs[node.0] = Some(addr);
        self.addr_to_node.insert(addr, node);
        Ok(())
    }

    pub fn addr_of(&self, node: NodeId) -> Option<Addr> {
        self.addrs.get(node.0).copied().flatten()
    }

    pub fn node_of(&self, addr: Addr) -> Option<NodeId> {
        self.addr_to_node.get(&addr).copied()
    }

    pub fn node_name(&self, node: NodeId) -> &str {
        &self.node_names[node.0]
    }

    /// 创建数据包
    pub fn make_packet(
        &mut self,
        tuple: FiveTuple,
        size_bytes: u32,
        src_node: NodeId,
        dst_node: NodeId,
    ) -> Packet {
        let id = self.next_pkt_id;
        self.next_pkt_id = self.next_pkt_id.wrapping_add(1);
        Packet {
            id,
            size_bytes,
            tuple,
            src_node,
            dst_node,
            sent_at: SimTime::ZERO,
            transport: Transport::default(),
        }
    }

    /// 从源节点发出一个数据包：打上发出时间戳，向流注册表上报发送
    /// （控制包除外），再进入逐跳转发。
    pub fn send_from(&mut self, mut pkt: Packet, sim: &mut Simulator) {
        pkt.sent_at = sim.now();
        if !pkt.is_control() {
            self.flows.observe_sent(&pkt.tuple, pkt.size_bytes, sim.now());
        }
        self.forward_from(pkt.src_node, pkt, sim);
    }

    /// 从指定节点转发数据包：链路空闲且队列为空才立即开始串行化发送，
    /// 否则进出接口队列（满则尾丢弃）。
    #[tracing::instrument(skip(self, sim), fields(pkt_id = pkt.id, from = ?from))]
    pub fn forward_from(&mut self, from: NodeId, pkt: Packet, sim: &mut Simulator) {
        debug!("🚀 从指定节点转发数据包");

        self.routing.ensure_built(&self.adj, &self.rev_adj);
        let to = self
            .routing
            .next_hop(from, pkt.dst_node)
            .unwrap_or_else(|| panic!("no route from {:?} to {:?}", from, pkt.dst_node));
        let link_id = *self
            .edges
            .get(&(from, to))
            .unwrap_or_else(|| panic!("no link from {:?} to {:?}", from, to));

        let link = &self.links[link_id.0];
        trace!(
            link_id = ?link_id,
            latency = ?link.latency,
            bandwidth_bps = link.bandwidth_bps,
            busy_until = ?link.busy_until,
            "找到出链路"
        );

        // 队列非空时必然有同时刻待执行的 LinkReady；新包必须排队，
        // 否则会越过队首破坏 FIFO。
        if sim.now() >= link.busy_until && link.queue.is_empty() {
            self.start_tx(link_id, pkt, sim);
        } else {
            self.enqueue_on(link_id, pkt, sim);
        }
    }

    fn enqueue_on(&mut self, link_id: LinkId, pkt: Packet, sim: &mut Simulator) {
        let (pkt_id, tuple, bytes) = (pkt.id, pkt.tuple, pkt.size_bytes);
        let control = pkt.is_control();
        let link = &mut self.links[link_id.0];
        let (from, to) = (link.from, link.to);

        match link.queue.enqueue(pkt) {
            Ok(()) => {
                let (q_len, q_cap) = (link.queue.len(), link.queue.capacity_pkts());
                debug!(q_len, "📥 入队等待发送");
                self.viz_enqueue(sim.now(), pkt_id, &tuple, bytes, from, to, q_len, q_cap);
            }
            Err(dropped) => {
                // 尾丢弃：预期内的拥塞结果，计数后丢弃，不中断仿真。
                let (q_len, q_cap) = (link.queue.len(), link.queue.capacity_pkts());
                info!(
                    pkt_id = dropped.id,
                    q_len,
                    "📉 队列满，尾丢弃"
                );
                self.stats.dropped_pkts += 1;
                self.stats.dropped_bytes += bytes as u64;
                if !control {
                    self.flows.observe_drop(&tuple, bytes);
                }
                self.viz_drop(sim.now(), &dropped, from, to, q_len, q_cap);
            }
        }
    }

    /// 在指定链路上开始一次串行化发送。调用方保证链路空闲。
    fn start_tx(&mut self, link_id: LinkId, pkt: Packet, sim: &mut Simulator) {
        let now = sim.now();
        let link = &mut self.links[link_id.0];
        debug_assert!(now >= link.busy_until, "start_tx on busy link");

        let tx_time = link.tx_time(pkt.size_bytes);
        let depart = now.saturating_add(tx_time);
        link.busy_until = depart;
        let arrive = depart.saturating_add(link.latency);
        let (from, to) = (link.from, link.to);

        trace!(
            now = ?now,
            tx_time = ?tx_time,
            depart = ?depart,
            arrive = ?arrive,
            "计算传输时间"
        );

        self.viz_tx_start(now, &pkt, from, to, depart, arrive);

        // depart 时刻链路空闲：尝试发送队列中的下一个 packet。
        sim.schedule(depart, LinkReady { link_id });
        sim.schedule(arrive, DeliverPacket { to, pkt });
    }

    /// 链路完成一次串行化发送：弹出队首继续发送。
    pub(crate) fn on_link_ready(&mut self, link_id: LinkId, sim: &mut Simulator) {
        let link = &mut self.links[link_id.0];
        // 同一时刻到达的新包可能已经抢先占用链路。
        if link.busy_until > sim.now() {
            return;
        }
        let Some(pkt) = link.queue.dequeue() else {
            return;
        };
        trace!(link_id = ?link_id, pkt_id = pkt.id, "队首出队，继续发送");
        self.start_tx(link_id, pkt, sim);
    }

    /// 将数据包交付给节点处理
    #[tracing::instrument(skip(self, sim), fields(pkt_id = pkt.id, to = ?to))]
    pub fn deliver(&mut self, to: NodeId, pkt: Packet, sim: &mut Simulator) {
        debug!("📬 将数据包交付给节点处理");

        // 暂时把节点取出来，避免 &mut self 与 &mut node 的重叠借用。
        let mut node = self.nodes[to.0].take().expect("node exists");
        node.on_packet(pkt, sim, self);
        self.nodes[to.0] = Some(node);
    }

    /// 数据包送达目的地时的处理
    #[tracing::instrument(skip(self, sim), fields(pkt_id = pkt.id))]
    pub(crate) fn on_delivered(&mut self, at: NodeId, pkt: Packet, sim: &mut Simulator) {
        info!("✅ 数据包送达目的地");

        let now = sim.now();
        self.viz_delivered(now, &pkt, at);

        self.stats.delivered_pkts += 1;
        self.stats.delivered_bytes += pkt.size_bytes as u64;

        debug!(
            size_bytes = pkt.size_bytes,
            delivered_pkts = self.stats.delivered_pkts,
            delivered_bytes = self.stats.delivered_bytes,
            "更新统计信息"
        );

        // sink 处理：按 (节点, 目的端口) 匹配；sink 负责更新所属流的接收计数。
        if !pkt.is_control() {
            if let Some(sink) = self.apps.sink_mut(at, pkt.tuple.dst_port) {
                if sink.active_at(now) {
                    sink.on_rx(pkt.size_bytes, now);
                    self.flows
                        .observe_received(&pkt.tuple, pkt.size_bytes, pkt.sent_at, now);
                } else {
                    debug!("sink 不在活跃窗口，忽略该包");
                }
            }
        }

        // 传输层处理（TCP：目的端产生 ACK、源端处理 ACK 驱动继续发送）
        if let Transport::Tcp(seg) = pkt.transport.clone() {
            let conn_tuple = match seg {
                TcpSegment::Data { .. } => pkt.tuple,
                TcpSegment::Ack { .. } => pkt.tuple.reversed(),
            };
            // 规避同时借用 `self` 与 `self.tcp`
            let mut tcp = std::mem::take(&mut self.tcp);
            tcp.on_tcp_segment(&conn_tuple, at, seg, sim, self);
            self.tcp = tcp;
        }
    }
}
