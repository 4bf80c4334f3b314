//! 场景装配
//!
//! 把 `ScenarioSpec` 装配成可运行的 (Simulator, NetWorld)：建拓扑、
//! 绑地址、装应用与 sink、调度 start/stop 事件。

use crate::app::{BulkConfig, CbrConfig, install_bulk, install_cbr, install_sink};
use crate::error::ConfigError;
use crate::net::{FiveTuple, IP_PROTO_TCP, IP_PROTO_UDP, NetWorld, NodeId};
use crate::proto::tcp::TcpConfig;
use crate::sim::{SimTime, Simulator};
use crate::topo::branch::{BranchOpts, BranchTopo, build_branch};
use crate::viz::VizLogger;
use tracing::info;

/// 本场景约定的临时端口基准（源端口按应用序号递增分配）。
const EPHEMERAL_PORT_BASE: u16 = 49152;

/// 一个装配完成、待运行的场景。
pub struct Scenario {
    pub sim: Simulator,
    pub world: NetWorld,
    pub topo: BranchTopo,
    pub stop: SimTime,
}

/// 原脚本的默认场景：bulk TCP n1->n3:9 @ [0.5s,4.0s)，
/// CBR UDP n0->n3:10（1024B @ 100 kbps）@ [0.1s,4.5s)，仿真到 10s。
pub fn default_branch_spec() -> super::ScenarioSpec {
    super::ScenarioSpec {
        schema_version: 1,
        topology: super::TopologySpec::Branch {
            edge_rate_bps: None,
            edge_delay_ms: None,
            bottleneck_rate_bps: None,
            bottleneck_delay_ms: None,
            bottleneck_queue_pkts: None,
        },
        apps: vec![
            super::AppSpec::Bulk {
                src: 1,
                dst: 3,
                dst_port: 9,
                start_ms: 500,
                stop_ms: 4_000,
                mss: None,
            },
            super::AppSpec::ConstantRate {
                src: 0,
                dst: 3,
                dst_port: 10,
                packet_bytes: 1024,
                rate_bps: 100_000,
                start_ms: 100,
                stop_ms: 4_500,
            },
        ],
        stop_ms: 10_000,
    }
}

fn resolve(topo: &BranchTopo, index: usize) -> Result<NodeId, ConfigError> {
    topo.node(index)
        .ok_or(ConfigError::HostIndexOutOfRange(index))
}

fn addr_of(world: &NetWorld, node: NodeId) -> Result<crate::net::Addr, ConfigError> {
    world
        .net
        .addr_of(node)
        .ok_or(ConfigError::NodeWithoutAddr(node))
}

/// 装配场景。`enable_viz` 打开结构化事件记录（含 t=0 的 Meta 事件）。
pub fn build_scenario(
    spec: &super::ScenarioSpec,
    enable_viz: bool,
) -> Result<Scenario, ConfigError> {
    let mut sim = Simulator::default();
    let mut world = NetWorld::default();

    let defaults = BranchOpts::default();
    let &super::TopologySpec::Branch {
        edge_rate_bps,
        edge_delay_ms,
        bottleneck_rate_bps,
        bottleneck_delay_ms,
        bottleneck_queue_pkts,
    } = &spec.topology;
    let opts = BranchOpts {
        edge_rate_bps: edge_rate_bps.unwrap_or(defaults.edge_rate_bps),
        edge_delay: edge_delay_ms
            .map(SimTime::from_millis)
            .unwrap_or(defaults.edge_delay),
        bottleneck_rate_bps: bottleneck_rate_bps.unwrap_or(defaults.bottleneck_rate_bps),
        bottleneck_delay: bottleneck_delay_ms
            .map(SimTime::from_millis)
            .unwrap_or(defaults.bottleneck_delay),
        bottleneck_queue_pkts: bottleneck_queue_pkts
            .map(|c| c as usize)
            .unwrap_or(defaults.bottleneck_queue_pkts),
    };

    let topo = build_branch(&mut world, &opts)?;
    let stop = SimTime::from_millis(spec.stop_ms);

    if enable_viz {
        world.net.viz = Some(VizLogger::default());
        world.net.emit_viz_meta();
    }

    for (idx, app) in spec.apps.iter().enumerate() {
        let src_port = EPHEMERAL_PORT_BASE + idx as u16;
        match *app {
            super::AppSpec::Bulk {
                src,
                dst,
                dst_port,
                start_ms,
                stop_ms,
                mss,
            } => {
                let src_node = resolve(&topo, src)?;
                let dst_node = resolve(&topo, dst)?;
                let tuple = FiveTuple {
                    protocol: IP_PROTO_TCP,
                    src: addr_of(&world, src_node)?,
                    dst: addr_of(&world, dst_node)?,
                    src_port,
                    dst_port,
                };
                let mut tcp = TcpConfig::default();
                if let Some(mss) = mss {
                    tcp.mss = mss;
                    tcp.init_cwnd_bytes = (mss as u64).saturating_mul(10);
                }
                info!(src = src, dst = dst, dst_port, "安装 bulk TCP 源");
                install_bulk(
                    &mut sim,
                    BulkConfig {
                        tuple,
                        src_node,
                        dst_node,
                        start: SimTime::from_millis(start_ms),
                        stop: SimTime::from_millis(stop_ms),
                        tcp,
                    },
                )?;
                install_sink(&mut world.net, dst_node, dst_port, SimTime::ZERO, stop)?;
            }
            super::AppSpec::ConstantRate {
                src,
                dst,
                dst_port,
                packet_bytes,
                rate_bps,
                start_ms,
                stop_ms,
            } => {
                let src_node = resolve(&topo, src)?;
                let dst_node = resolve(&topo, dst)?;
                let tuple = FiveTuple {
                    protocol: IP_PROTO_UDP,
                    src: addr_of(&world, src_node)?,
                    dst: addr_of(&world, dst_node)?,
                    src_port,
                    dst_port,
                };
                info!(src = src, dst = dst, dst_port, rate_bps, "安装 CBR UDP 源");
                install_cbr(
                    &mut world.net,
                    &mut sim,
                    CbrConfig {
                        tuple,
                        src_node,
                        dst_node,
                        packet_bytes,
                        rate_bps,
                        start: SimTime::from_millis(start_ms),
                        stop: SimTime::from_millis(stop_ms),
                    },
                )?;
                install_sink(&mut world.net, dst_node, dst_port, SimTime::ZERO, stop)?;
            }
        }
    }

    Ok(Scenario {
        sim,
        world,
        topo,
        stop,
    })
}

/// 运行场景到终点；之后把 flow_id -> 标签/颜色交给可视化 sink。
pub fn run_scenario(scenario: &mut Scenario) {
    let stop = scenario.stop;
    scenario.sim.run_until(stop, &mut scenario.world);
    scenario.world.net.emit_viz_flow_labels(stop);
}
