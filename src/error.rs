//! 配置错误
//!
//! 所有参数校验在构造期完成：配置错误在任何虚拟时间流逝之前报告并终止，
//! 不存在运行期恢复路径。运行期的拥塞丢包不是错误（只计数）。

use crate::net::{Addr, NodeId};
use crate::sim::SimTime;
use thiserror::Error;

/// 构造期配置错误。
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("link data rate must be positive ({from:?} -> {to:?})")]
    ZeroDataRate { from: NodeId, to: NodeId },

    #[error("no such node: {0:?}")]
    NoSuchNode(NodeId),

    #[error("no link between {from:?} and {to:?}")]
    NoSuchLink { from: NodeId, to: NodeId },

    #[error("address {0} already bound")]
    AddrInUse(Addr),

    #[error("node {0:?} has no bound address")]
    NodeWithoutAddr(NodeId),

    #[error("application packet size must be positive")]
    ZeroPacketSize,

    #[error("application rate must be positive")]
    ZeroAppRate,

    #[error("application active window is empty: start={start:?} stop={stop:?}")]
    EmptyActiveWindow { start: SimTime, stop: SimTime },

    #[error("scenario host index {0} out of range")]
    HostIndexOutOfRange(usize),

    #[error("read scenario file: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse scenario json: {0}")]
    Json(#[from] serde_json::Error),
}
