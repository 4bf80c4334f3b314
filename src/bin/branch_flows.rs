//! Branch 拓扑双流实验
//!
//! 复刻经典入门场景：n0/n1 汇聚到 n2，经 1.7 Mbps 瓶颈到 n3；
//! bulk TCP（n1->n3:9）与 CBR UDP（n0->n3:10）在瓶颈处竞争。

use clap::Parser;
use flowsim_rs::flow::FlowReport;
use flowsim_rs::scenario::{
    AppSpec, ScenarioSpec, TopologySpec, build_scenario, run_scenario,
};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "branch-flows",
    about = "Branch 拓扑仿真：bulk TCP 与 CBR UDP 共享 1.7 Mbps 瓶颈"
)]
struct Args {
    /// 边链路（n0-n2、n1-n2）速率（bps）
    #[arg(long, default_value_t = 2_000_000)]
    edge_rate_bps: u64,

    /// 边链路单向传播时延（毫秒）
    #[arg(long, default_value_t = 10)]
    edge_delay_ms: u64,

    /// 瓶颈链路（n2-n3）速率（bps）
    #[arg(long, default_value_t = 1_700_000)]
    bottleneck_rate_bps: u64,

    /// 瓶颈链路单向传播时延（毫秒）
    #[arg(long, default_value_t = 20)]
    bottleneck_delay_ms: u64,

    /// 瓶颈出接口队列容量（包数）
    #[arg(long, default_value_t = 10)]
    queue_pkts: u64,

    /// bulk TCP 源活跃窗口（毫秒）
    #[arg(long, default_value_t = 500)]
    tcp_start_ms: u64,
    #[arg(long, default_value_t = 4_000)]
    tcp_stop_ms: u64,

    /// CBR UDP 源活跃窗口（毫秒）
    #[arg(long, default_value_t = 100)]
    udp_start_ms: u64,
    #[arg(long, default_value_t = 4_500)]
    udp_stop_ms: u64,

    /// CBR 包长（字节）与速率（bps）
    #[arg(long, default_value_t = 1024)]
    udp_packet_bytes: u32,
    #[arg(long, default_value_t = 100_000)]
    udp_rate_bps: u64,

    /// 仿真运行到多少毫秒（之后剩余事件丢弃）
    #[arg(long, default_value_t = 10_000)]
    until_ms: u64,

    /// 输出逐流报告 JSON；不填则只打印摘要
    #[arg(long)]
    report_json: Option<PathBuf>,

    /// 输出可视化 JSON 事件文件；不填则不记录
    #[arg(long)]
    viz_json: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .init();

    let args = Args::parse();

    let spec = ScenarioSpec {
        schema_version: 1,
        topology: TopologySpec::Branch {
            edge_rate_bps: Some(args.edge_rate_bps),
            edge_delay_ms: Some(args.edge_delay_ms),
            bottleneck_rate_bps: Some(args.bottleneck_rate_bps),
            bottleneck_delay_ms: Some(args.bottleneck_delay_ms),
            bottleneck_queue_pkts: Some(args.queue_pkts),
        },
        apps: vec![
            AppSpec::Bulk {
                src: 1,
                dst: 3,
                dst_port: 9,
                start_ms: args.tcp_start_ms,
                stop_ms: args.tcp_stop_ms,
                mss: None,
            },
            AppSpec::ConstantRate {
                src: 0,
                dst: 3,
                dst_port: 10,
                packet_bytes: args.udp_packet_bytes,
                rate_bps: args.udp_rate_bps,
                start_ms: args.udp_start_ms,
                stop_ms: args.udp_stop_ms,
            },
        ],
        stop_ms: args.until_ms,
    };

    let mut scenario = match build_scenario(&spec, args.viz_json.is_some()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("scenario config error: {e}");
            std::process::exit(1);
        }
    };
    run_scenario(&mut scenario);

    if let Some(path) = args.viz_json {
        if let Some(v) = scenario.world.net.viz.take() {
            let json = serde_json::to_string_pretty(&v.events).expect("serialize viz events");
            fs::write(&path, json).expect("write viz json");
            eprintln!("wrote viz events to {}", path.display());
        }
    }

    let report = FlowReport::build(&scenario.world.net.flows);
    if let Some(path) = args.report_json {
        let json = serde_json::to_string_pretty(&report).expect("serialize flow report");
        fs::write(&path, json).expect("write report json");
        eprintln!("wrote flow report to {}", path.display());
    }

    println!("done @ {:?}", scenario.sim.now());
    for f in &report.flows {
        println!(
            "Flow {} ({}): color {}  {}:{} -> {}:{}  tx={} pkts/{} B  rx={} pkts/{} B  drops={}  mean_delay_ms={:?}  mean_jitter_ms={:?}",
            f.flow_id.0,
            f.label,
            f.color,
            f.src,
            f.src_port,
            f.dst,
            f.dst_port,
            f.tx_pkts,
            f.tx_bytes,
            f.rx_pkts,
            f.rx_bytes,
            f.drops,
            f.mean_delay_ms,
            f.mean_jitter_ms
        );
    }
    println!(
        "net: delivered_pkts={}, delivered_bytes={}, dropped_pkts={}, dropped_bytes={}",
        scenario.world.net.stats.delivered_pkts,
        scenario.world.net.stats.delivered_bytes,
        scenario.world.net.stats.dropped_pkts,
        scenario.world.net.stats.dropped_bytes
    );
}
