//! 场景配置与装配
//!
//! 用静态类型的配置结构（JSON/serde）替代字符串键属性设置：
//! 每个字段在构造期校验，任何配置错误都在虚拟时间流逝之前报告。

mod build;
mod spec;

pub use build::{Scenario, build_scenario, default_branch_spec, run_scenario};
pub use spec::{AppSpec, ScenarioSpec, TopologySpec};
