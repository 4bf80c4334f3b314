//! 流注册与分类
//!
//! 观察在拓扑中穿行的数据包头部，按 5 元组把包归并为流，
//! 累积逐流统计；报告期把每个流按协议号判定为终态标签
//! （6=TCP，17=UDP，其余 UNKNOWN，绝不失败）。

mod classify;
mod registry;
mod report;

pub use classify::{FlowColor, ProtoLabel};
pub use registry::{FlowId, FlowRegistry, FlowStats};
pub use report::{FlowReport, FlowReportEntry};
