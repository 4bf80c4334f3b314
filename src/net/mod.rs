//! 网络模拟模块
//!
//! 此模块包含网络模拟的核心组件，如节点、链路、数据包和网络拓扑。

// 子模块声明
mod addr;
mod bridge;
mod deliver_packet;
mod id;
mod link;
mod link_ready;
mod net_world;
mod network;
mod network_viz;
mod node;
mod packet;
mod routing;
mod stats;
mod transport;

// 重新导出公共接口
pub use addr::Addr;
pub(crate) use bridge::{with_apps, with_tcp_stack};
pub use deliver_packet::DeliverPacket;
pub use id::{LinkId, NodeId};
pub use link::Link;
pub(crate) use link::tx_nanos;
pub use link_ready::LinkReady;
pub use net_world::NetWorld;
pub use network::Network;
pub use node::{Host, Node, Router};
pub use packet::{FiveTuple, IP_PROTO_TCP, IP_PROTO_UDP, Packet};
pub use routing::RoutingTable;
pub use stats::Stats;
pub use transport::{TcpSegment, Transport};
