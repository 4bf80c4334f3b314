//! Bulk（无限字节）TCP 源
//!
//! MaxBytes=0 语义：数据无限，发送节奏由简化 TCP 的拥塞控制与
//! 链路可用性决定。`[start, stop)` 外不产生任何新包。

use crate::error::ConfigError;
use crate::net::FiveTuple;
use crate::net::NodeId;
use crate::proto::tcp::{TcpConfig, TcpConn, TcpStart, TcpStop};
use crate::sim::{SimTime, Simulator};

/// bulk 源配置（构造期校验）
#[derive(Debug, Clone)]
pub struct BulkConfig {
    pub tuple: FiveTuple,
    pub src_node: NodeId,
    pub dst_node: NodeId,
    pub start: SimTime,
    pub stop: SimTime,
    pub tcp: TcpConfig,
}

/// 安装一个 bulk TCP 源：在 start 建立连接并开始发送，在 stop 停止。
pub fn install_bulk(sim: &mut Simulator, cfg: BulkConfig) -> Result<(), ConfigError> {
    if cfg.start >= cfg.stop {
        return Err(ConfigError::EmptyActiveWindow {
            start: cfg.start,
            stop: cfg.stop,
        });
    }
    let conn = TcpConn::new(cfg.tuple, cfg.src_node, cfg.dst_node, cfg.stop, cfg.tcp);
    sim.schedule(cfg.start, TcpStart { conn });
    sim.schedule(cfg.stop, TcpStop { tuple: cfg.tuple });
    Ok(())
}
