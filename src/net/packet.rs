//! 数据包类型
//!
//! 定义网络数据包、5 元组头部及其相关操作。

use serde::Serialize;

use super::addr::Addr;
use super::id::NodeId;
use super::transport::{TcpSegment, Transport};
use crate::sim::SimTime;

/// IP 协议号：TCP
pub const IP_PROTO_TCP: u8 = 6;
/// IP 协议号：UDP
pub const IP_PROTO_UDP: u8 = 17;

/// 流 5 元组：(协议号, 源地址, 目的地址, 源端口, 目的端口)。
///
/// 流身份完全由 5 元组决定；核心不解析地址内部结构。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct FiveTuple {
    pub protocol: u8,
    pub src: Addr,
    pub dst: Addr,
    pub src_port: u16,
    pub dst_port: u16,
}

impl FiveTuple {
    /// 反向 5 元组（ACK 等反向流量归属到正向连接时使用）。
    pub fn reversed(&self) -> FiveTuple {
        FiveTuple {
            protocol: self.protocol,
            src: self.dst,
            dst: self.src,
            src_port: self.dst_port,
            dst_port: self.src_port,
        }
    }
}

/// 网络数据包
#[derive(Debug, Clone)]
pub struct Packet {
    pub id: u64,
    pub size_bytes: u32,
    /// 头部 5 元组（流分类依据）
    pub tuple: FiveTuple,
    /// 源/目的节点（发包时由寻址服务解析一次）
    pub src_node: NodeId,
    pub dst_node: NodeId,
    /// 源端发出时刻（用于端到端时延采样）
    pub sent_at: SimTime,
    pub transport: Transport,
}

impl Packet {
    /// 是否为纯控制包（TCP ACK 段）。控制包占用链路容量，
    /// 但不注册为流、不进入 sink 统计。
    pub fn is_control(&self) -> bool {
        matches!(self.transport, Transport::Tcp(TcpSegment::Ack { .. }))
    }
}
