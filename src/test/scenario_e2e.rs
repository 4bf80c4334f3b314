use crate::flow::{FlowColor, FlowId, FlowReport, ProtoLabel};
use crate::scenario::{AppSpec, build_scenario, default_branch_spec, run_scenario};
use crate::sim::SimTime;
use crate::viz::VizEventKind;

#[test]
fn default_branch_scenario_yields_two_labelled_flows() {
    let spec = default_branch_spec();
    let mut scenario = build_scenario(&spec, false).expect("build scenario");
    run_scenario(&mut scenario);

    assert_eq!(scenario.sim.now(), SimTime::from_secs(10));

    // Exactly two flows: ACKs are control packets and never register.
    let report = FlowReport::build(&scenario.world.net.flows);
    assert_eq!(report.flows.len(), 2);

    // The CBR source starts first (0.1s vs 0.5s), so it owns flow 1.
    let udp = &report.flows[0];
    assert_eq!(udp.flow_id, FlowId(1));
    assert_eq!(udp.label, ProtoLabel::Udp);
    assert_eq!(udp.color, FlowColor::Red);
    assert_eq!(udp.dst_port, 10);

    let tcp = &report.flows[1];
    assert_eq!(tcp.flow_id, FlowId(2));
    assert_eq!(tcp.label, ProtoLabel::Tcp);
    assert_eq!(tcp.color, FlowColor::Blue);
    assert_eq!(tcp.dst_port, 9);
}

#[test]
fn default_branch_scenario_traffic_volumes_are_plausible() {
    let spec = default_branch_spec();
    let mut scenario = build_scenario(&spec, false).expect("build scenario");
    run_scenario(&mut scenario);

    let report = FlowReport::build(&scenario.world.net.flows);
    let udp = &report.flows[0];
    let tcp = &report.flows[1];

    // 1024B at 100kbps is one packet every 81.92ms; active [0.1s, 4.5s).
    assert_eq!(udp.tx_pkts, 54);
    assert_eq!(udp.tx_bytes, 54 * 1024);
    assert!(udp.rx_pkts >= 1 && udp.rx_pkts <= 54);
    assert_eq!(udp.rx_bytes, udp.rx_pkts * 1024);

    // TCP is bounded by 3.5s of the 1.7Mbps bottleneck, and should make
    // real progress despite losses.
    assert!(tcp.rx_bytes > 50_000, "tcp rx_bytes = {}", tcp.rx_bytes);
    assert!(tcp.rx_bytes <= 743_750, "tcp rx_bytes = {}", tcp.rx_bytes);
    assert_eq!(tcp.tx_bytes % 1460, 0);

    // Slow start must overflow the 10-packet bottleneck queue at least once.
    assert!(scenario.world.net.stats.dropped_pkts > 0);
    assert!(tcp.drops > 0);

    // End-to-end delay includes 30ms propagation plus serialization.
    let udp_delay = udp.mean_delay_ms.expect("udp delay samples");
    assert!(udp_delay > 30.0, "udp mean delay = {udp_delay}");
    assert!(udp.mean_jitter_ms.is_some());

    // Sinks agree with the per-flow view.
    let n3 = scenario.topo.n3;
    let udp_sink = scenario.world.net.apps.sink(n3, 10).expect("udp sink");
    assert_eq!(udp_sink.rx_pkts, udp.rx_pkts);
    let tcp_sink = scenario.world.net.apps.sink(n3, 9).expect("tcp sink");
    assert_eq!(tcp_sink.rx_bytes, tcp.rx_bytes);
}

#[test]
fn scenario_with_viz_opens_with_meta_and_closes_with_flow_labels() {
    let spec = default_branch_spec();
    let mut scenario = build_scenario(&spec, true).expect("build scenario");
    run_scenario(&mut scenario);

    let viz = scenario.world.net.viz.as_ref().expect("viz enabled");
    assert!(!viz.events.is_empty());

    match &viz.events[0].kind {
        VizEventKind::Meta { nodes, links } => {
            assert_eq!(nodes.len(), 4);
            assert_eq!(links.len(), 6);
            // Bottleneck links carry the bounded queue.
            let bounded = links
                .iter()
                .filter(|l| l.q_cap_pkts == Some(10))
                .count();
            assert_eq!(bounded, 2);
        }
        other => panic!("first viz event should be meta, got {other:?}"),
    }

    let labels: Vec<_> = viz
        .events
        .iter()
        .filter_map(|ev| match &ev.kind {
            VizEventKind::FlowLabel { label, color } => Some((ev.flow_id?, *label, *color)),
            _ => None,
        })
        .collect();
    assert_eq!(
        labels,
        vec![
            (1, ProtoLabel::Udp, FlowColor::Red),
            (2, ProtoLabel::Tcp, FlowColor::Blue),
        ]
    );

    // Congestion shows up as drop events on the bottleneck link.
    let n2 = scenario.topo.n2.0;
    let n3 = scenario.topo.n3.0;
    assert!(viz.events.iter().any(|ev| matches!(
        &ev.kind,
        VizEventKind::Drop { link_from, link_to, .. } if *link_from == n2 && *link_to == n3
    )));
}

#[test]
fn scenario_rejects_out_of_range_host_indices() {
    let mut spec = default_branch_spec();
    spec.apps.push(AppSpec::ConstantRate {
        src: 7,
        dst: 3,
        dst_port: 11,
        packet_bytes: 512,
        rate_bps: 10_000,
        start_ms: 0,
        stop_ms: 1_000,
    });
    assert!(build_scenario(&spec, false).is_err());
}

#[test]
fn scenario_topology_overrides_take_effect() {
    let mut spec = default_branch_spec();
    let crate::scenario::TopologySpec::Branch {
        bottleneck_queue_pkts,
        ..
    } = &mut spec.topology;
    *bottleneck_queue_pkts = Some(3);

    let mut scenario = build_scenario(&spec, true).expect("build scenario");
    run_scenario(&mut scenario);

    let viz = scenario.world.net.viz.as_ref().expect("viz enabled");
    match &viz.events[0].kind {
        VizEventKind::Meta { links, .. } => {
            let bounded = links.iter().filter(|l| l.q_cap_pkts == Some(3)).count();
            assert_eq!(bounded, 2);
        }
        other => panic!("first viz event should be meta, got {other:?}"),
    }
}
