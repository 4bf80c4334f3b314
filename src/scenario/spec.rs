//! 场景描述（JSON schema）

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// 一次仿真运行的完整场景描述。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioSpec {
    pub schema_version: u32,
    pub topology: TopologySpec,
    #[serde(default)]
    pub apps: Vec<AppSpec>,
    /// 全局仿真终点（毫秒）；sink 活跃窗口为 [0, stop_ms)
    pub stop_ms: u64,
}

impl ScenarioSpec {
    /// 从 JSON 文件加载场景。
    pub fn from_file(path: impl AsRef<Path>) -> Result<ScenarioSpec, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// 拓扑描述。字段缺省取 `BranchOpts::default()` 的原场景参数。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TopologySpec {
    Branch {
        #[serde(default)]
        edge_rate_bps: Option<u64>,
        #[serde(default)]
        edge_delay_ms: Option<u64>,
        #[serde(default)]
        bottleneck_rate_bps: Option<u64>,
        #[serde(default)]
        bottleneck_delay_ms: Option<u64>,
        #[serde(default)]
        bottleneck_queue_pkts: Option<u64>,
    },
}

/// 应用描述。协议由应用类型封闭决定：bulk -> TCP，constant_rate -> UDP。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AppSpec {
    /// 无限字节 bulk 发送（TCP）
    Bulk {
        src: usize,
        dst: usize,
        dst_port: u16,
        start_ms: u64,
        stop_ms: u64,
        #[serde(default)]
        mss: Option<u32>,
    },
    /// 恒定速率发送（UDP）
    ConstantRate {
        src: usize,
        dst: usize,
        dst_port: u16,
        packet_bytes: u32,
        rate_bps: u64,
        start_ms: u64,
        stop_ms: u64,
    },
}
