//! 可视化事件记录（用于离线回放/报告 sink）
//!
//! 设计目标：
//! - **结构化**：用 JSON 事件而不是解析文本日志
//! - **轻量**：不引入复杂依赖/运行时服务
//! - **边界清晰**：核心只产出 flow_id -> 标签/颜色 与包级事件，渲染在外部

mod types;

pub use types::{VizEvent, VizEventKind, VizLinkInfo, VizLogger, VizNodeInfo, VizNodeKind};
