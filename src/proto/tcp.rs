//! TCP（简化版）协议实现
//!
//! 目标：支持 bulk 发送实验所需的最小功能：
//! - 数据段/ACK 段
//! - Reno 风格的拥塞控制（慢启动 + AIMD，含 3 dupACK 快速重传）
//! - 超时重传（固定/指数退避的 RTO）
//!
//! 发送端按 MaxBytes=0 语义建模：数据无限，只受 cwnd 与活跃窗口
//! `[start, stop)` 约束；stop 之后不再发出任何新段或重传，在途包照常送达。
//!
//! 注意：这是仿真用途的“极简 TCP”，不实现握手/窗口通告/选择确认等。

use std::collections::{BTreeMap, HashMap};

use crate::net::{FiveTuple, Network, NodeId, TcpSegment, Transport, with_tcp_stack};
use crate::sim::{Event, EventHandle, SimTime, Simulator, World};
use tracing::{debug, trace};

#[derive(Debug, Clone)]
pub struct TcpConfig {
    /// MSS（数据段载荷大小，字节）
    pub mss: u32,
    /// ACK 包大小（字节）
    pub ack_bytes: u32,
    /// 初始 cwnd（字节）
    pub init_cwnd_bytes: u64,
    /// 初始 ssthresh（字节）
    pub init_ssthresh_bytes: u64,
    /// 初始 RTO
    pub init_rto: SimTime,
    /// 最大 RTO（用于退避上限）
    pub max_rto: SimTime,
}

impl Default for TcpConfig {
    fn default() -> Self {
        let mss = 1460;
        Self {
            mss,
            ack_bytes: 64,
            init_cwnd_bytes: (mss as u64).saturating_mul(10),
            init_ssthresh_bytes: (mss as u64).saturating_mul(1_000),
            // RTO 口径按广域 RTT（几十 ms 量级）放大，避免队列排队造成假超时。
            init_rto: SimTime::from_millis(500),
            max_rto: SimTime::from_secs(10),
        }
    }
}

#[derive(Debug, Clone)]
struct SentSeg {
    len: u32,
}

/// 一个 TCP 连接（已建立假设），由正向（数据方向）5 元组唯一标识。
#[derive(Debug, Clone)]
pub struct TcpConn {
    pub tuple: FiveTuple,
    pub src: NodeId,
    pub dst: NodeId,
    /// 不再发出新数据/重传的时刻
    pub stop: SimTime,
    pub cfg: TcpConfig,

    // sender
    next_seq: u64,
    last_acked: u64,
    cwnd_bytes: u64,
    ssthresh_bytes: u64,
    dup_acks: u32,
    rto: SimTime,
    /// 挂起的重传定时器（重新武装时取消旧定时器）
    rto_timer: Option<EventHandle>,
    inflight: BTreeMap<u64, SentSeg>, // seq -> segment

    // receiver
    rcv_nxt: u64,

    started_at: Option<SimTime>,
    stopped: bool,
}

impl TcpConn {
    pub fn new(
        tuple: FiveTuple,
        src: NodeId,
        dst: NodeId,
        stop: SimTime,
        cfg: TcpConfig,
    ) -> Self {
        let init_rto = cfg.init_rto;
        let cwnd = cfg.init_cwnd_bytes.max(cfg.mss as u64);
        let ssthresh = cfg.init_ssthresh_bytes.max(cfg.mss as u64);
        Self {
            tuple,
            src,
            dst,
            stop,
            cfg,
            next_seq: 0,
            last_acked: 0,
            cwnd_bytes: cwnd,
            ssthresh_bytes: ssthresh,
            dup_acks: 0,
            rto: init_rto,
            rto_timer: None,
            inflight: BTreeMap::new(),
            rcv_nxt: 0,
            started_at: None,
            stopped: false,
        }
    }

    pub fn bytes_acked(&self) -> u64 {
        self.last_acked
    }

    pub fn start_time(&self) -> Option<SimTime> {
        self.started_at
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    fn earliest_unacked_seq(&self) -> Option<u64> {
        self.inflight.keys().next().copied()
    }

    fn can_send(&self, now: SimTime) -> bool {
        !self.stopped && now < self.stop
    }
}

/// 所有 TCP 连接的容器，按正向 5 元组索引。
#[derive(Debug, Default)]
pub struct TcpStack {
    conns: HashMap<FiveTuple, TcpConn>,
}

impl TcpStack {
    pub fn insert(&mut self, conn: TcpConn) {
        self.conns.insert(conn.tuple, conn);
    }

    pub fn get(&self, tuple: &FiveTuple) -> Option<&TcpConn> {
        self.conns.get(tuple)
    }

    pub fn get_mut(&mut self, tuple: &FiveTuple) -> Option<&mut TcpConn> {
        self.conns.get_mut(tuple)
    }

    /// 在 cwnd 允许的范围内持续发出整 MSS 数据段（数据无限）。
    pub(crate) fn send_data_if_possible(
        &mut self,
        tuple: &FiveTuple,
        sim: &mut Simulator,
        net: &mut Network,
    ) {
        let Some(conn) = self.conns.get_mut(tuple) else {
            return;
        };
        if !conn.can_send(sim.now()) {
            return;
        }

        if conn.started_at.is_none() {
            conn.started_at = Some(sim.now());
        }

        // 发送窗口：inflight bytes < cwnd
        let inflight_bytes: u64 = conn.inflight.values().map(|s| s.len as u64).sum();
        let mut avail = conn.cwnd_bytes.saturating_sub(inflight_bytes);
        let mss = conn.cfg.mss as u64;

        while avail >= mss {
            let len = conn.cfg.mss;
            let seq = conn.next_seq;
            conn.next_seq = conn.next_seq.saturating_add(len as u64);
            avail -= len as u64;

            trace!(seq, len, cwnd = conn.cwnd_bytes, "发送数据段");

            let mut pkt = net.make_packet(conn.tuple, len, conn.src, conn.dst);
            pkt.transport = Transport::Tcp(TcpSegment::Data { seq, len });

            conn.inflight.insert(seq, SentSeg { len });

            net.send_from(pkt, sim);
        }

        Self::arm_rto(conn, sim);
    }

    /// 重新武装重传定时器：盯住当前最早未确认段；窗口清空则撤销。
    ///
    /// 丢在窗口尾部的段不会引来任何 dupACK，能把发送端救回来的只有
    /// 这个定时器，所以它必须始终覆盖最早未确认段。
    fn arm_rto(conn: &mut TcpConn, sim: &mut Simulator) {
        if let Some(handle) = conn.rto_timer.take() {
            sim.cancel(handle);
        }
        if let Some(seq) = conn.earliest_unacked_seq() {
            conn.rto_timer = Some(sim.schedule_in(
                conn.rto,
                TcpRto {
                    tuple: conn.tuple,
                    seq,
                },
            ));
        }
    }

    fn send_ack(&mut self, tuple: &FiveTuple, ack: u64, sim: &mut Simulator, net: &mut Network) {
        let Some(conn) = self.conns.get(tuple) else {
            return;
        };
        // ACK 走反向 5 元组，是纯控制包：占链路容量但不注册为流。
        let mut pkt = net.make_packet(conn.tuple.reversed(), conn.cfg.ack_bytes, conn.dst, conn.src);
        pkt.transport = Transport::Tcp(TcpSegment::Ack { ack });
        net.send_from(pkt, sim);
    }

    fn retransmit_earliest(
        tuple: &FiveTuple,
        conn: &mut TcpConn,
        seq: u64,
        sim: &mut Simulator,
        net: &mut Network,
    ) {
        let len = conn.inflight.get(&seq).map(|s| s.len).unwrap_or(conn.cfg.mss);
        debug!(seq, len, "重传最早未确认段");
        let mut pkt = net.make_packet(*tuple, len, conn.src, conn.dst);
        pkt.transport = Transport::Tcp(TcpSegment::Data { seq, len });
        net.send_from(pkt, sim);
    }

    /// 在目的/源主机处理一个送达的 TCP 段。
    pub fn on_tcp_segment(
        &mut self,
        conn_tuple: &FiveTuple,
        at: NodeId,
        seg: TcpSegment,
        sim: &mut Simulator,
        net: &mut Network,
    ) {
        match seg {
            TcpSegment::Data { seq, len } => {
                let Some(conn) = self.conns.get_mut(conn_tuple) else {
                    return;
                };
                if at != conn.dst {
                    // 不是目的 host：忽略（只在 delivered 回调中调用，理论上不会发生）
                    return;
                }

                if seq == conn.rcv_nxt {
                    conn.rcv_nxt = conn.rcv_nxt.saturating_add(len as u64);
                }
                // 无论是否乱序，都发累计 ACK（dupACK 体现为 ack 不前进）
                let ack = conn.rcv_nxt;
                self.send_ack(conn_tuple, ack, sim, net);
            }
            TcpSegment::Ack { ack } => {
                let Some(conn) = self.conns.get_mut(conn_tuple) else {
                    return;
                };
                if at != conn.src {
                    return;
                }

                if ack > conn.last_acked {
                    conn.dup_acks = 0;
                    let newly_acked = ack - conn.last_acked;
                    conn.last_acked = ack;

                    // 移除已确认段
                    let mut to_remove = Vec::new();
                    for (&s, sent) in conn.inflight.iter() {
                        let end = s.saturating_add(sent.len as u64);
                        if end <= ack {
                            to_remove.push(s);
                        } else {
                            break;
                        }
                    }
                    for s in to_remove {
                        conn.inflight.remove(&s);
                    }

                    // 拥塞控制：慢启动 / 拥塞避免（极简）
                    if conn.cwnd_bytes < conn.ssthresh_bytes {
                        conn.cwnd_bytes = conn.cwnd_bytes.saturating_add(newly_acked);
                    } else {
                        // AIMD：每个 ACK 让 cwnd 以 mss^2/cwnd 增长（至少 +1）
                        let mss = conn.cfg.mss as u64;
                        let inc = (mss.saturating_mul(mss) / conn.cwnd_bytes).max(1);
                        conn.cwnd_bytes = conn.cwnd_bytes.saturating_add(inc);
                    }

                    // 确认推进后定时器改盯新的最早未确认段
                    Self::arm_rto(conn, sim);

                    // 继续发送（内部检查活跃窗口）
                    self.send_data_if_possible(conn_tuple, sim, net);
                } else if ack == conn.last_acked {
                    // dupACK
                    conn.dup_acks = conn.dup_acks.saturating_add(1);
                    let dup = conn.dup_acks;
                    let mss = conn.cfg.mss as u64;
                    if !conn.can_send(sim.now()) {
                        return;
                    }
                    if dup == 3 {
                        // 快速重传：重传 earliest unacked
                        if let Some(seq0) = conn.earliest_unacked_seq() {
                            conn.ssthresh_bytes = (conn.cwnd_bytes / 2).max(2 * mss);
                            conn.cwnd_bytes = conn.ssthresh_bytes.saturating_add(3 * mss);
                            Self::retransmit_earliest(conn_tuple, conn, seq0, sim, net);
                            Self::arm_rto(conn, sim);
                        }
                    } else if dup > 3 {
                        // 快速恢复：每个额外 dupACK 增加 cwnd 一个 MSS
                        conn.cwnd_bytes = conn.cwnd_bytes.saturating_add(mss);
                        self.send_data_if_possible(conn_tuple, sim, net);
                    }
                }
            }
        }
    }

    /// RTO 到期：若该 seq 仍是最早未确认段则超时重传并回到慢启动。
    pub(crate) fn on_rto(
        &mut self,
        tuple: &FiveTuple,
        seq: u64,
        sim: &mut Simulator,
        net: &mut Network,
    ) {
        let Some(conn) = self.conns.get_mut(tuple) else {
            return;
        };
        if !conn.can_send(sim.now()) {
            return;
        }
        // 仅当该 seq 仍是 earliest unacked 且仍未被确认时才处理
        if conn.earliest_unacked_seq() != Some(seq) {
            return;
        }
        if !conn.inflight.contains_key(&seq) {
            return;
        }

        debug!(seq, rto = ?conn.rto, "⏰ RTO 超时");

        // 超时：回到慢启动
        let mss = conn.cfg.mss as u64;
        conn.ssthresh_bytes = (conn.cwnd_bytes / 2).max(2 * mss);
        conn.cwnd_bytes = mss;
        conn.dup_acks = 0;
        conn.rto = SimTime((conn.rto.0.saturating_mul(2)).min(conn.cfg.max_rto.0));

        Self::retransmit_earliest(tuple, conn, seq, sim, net);
        Self::arm_rto(conn, sim);
    }
}

/// 启动一个 bulk TCP 流（连接已建立假设）
#[derive(Debug)]
pub struct TcpStart {
    pub conn: TcpConn,
}

impl Event for TcpStart {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let TcpStart { conn } = *self;
        let tuple = conn.tuple;
        with_tcp_stack(world, |net, tcp| {
            tcp.insert(conn);
            tcp.send_data_if_possible(&tuple, sim, net);
        });
    }
}

/// 停止一个 bulk TCP 流：不再发出新数据与重传，在途包照常送达。
#[derive(Debug)]
pub struct TcpStop {
    pub tuple: FiveTuple,
}

impl Event for TcpStop {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let TcpStop { tuple } = *self;
        with_tcp_stack(world, |_net, tcp| {
            if let Some(conn) = tcp.get_mut(&tuple) {
                debug!(now = ?sim.now(), "🛑 bulk 流停止");
                conn.stopped = true;
                if let Some(handle) = conn.rto_timer.take() {
                    sim.cancel(handle);
                }
            }
        });
    }
}

/// TCP RTO 事件：若该 seq 仍是最早未确认段，则触发超时重传
#[derive(Debug)]
pub struct TcpRto {
    pub tuple: FiveTuple,
    pub seq: u64,
}

impl Event for TcpRto {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let TcpRto { tuple, seq } = *self;
        with_tcp_stack(world, |net, tcp| {
            tcp.on_rto(&tuple, seq, sim, net);
        });
    }
}
