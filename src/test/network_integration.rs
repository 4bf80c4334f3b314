use crate::net::{
    Addr, DeliverPacket, FiveTuple, IP_PROTO_UDP, NetWorld, NodeId, Packet, Transport, tx_nanos,
};
use crate::sim::{Event, SimTime, Simulator, World};
use crate::topo::branch::{BranchOpts, build_branch};
use crate::viz::{VizEventKind, VizLogger};

fn udp_pkt(id: u64, size_bytes: u32, from: NodeId, to: NodeId) -> Packet {
    Packet {
        id,
        size_bytes,
        tuple: FiveTuple {
            protocol: IP_PROTO_UDP,
            src: Addr::v4(10, 0, 0, 1),
            dst: Addr::v4(10, 0, 0, 2),
            src_port: 1000,
            dst_port: 2000,
        },
        src_node: from,
        dst_node: to,
        sent_at: SimTime::ZERO,
        transport: Transport::Udp,
    }
}

fn tx_start_events(world: &NetWorld, from: NodeId, to: NodeId) -> Vec<(u64, u64, u64, u64)> {
    let Some(v) = &world.net.viz else {
        return Vec::new();
    };
    v.events
        .iter()
        .filter_map(|ev| match &ev.kind {
            VizEventKind::TxStart {
                link_from,
                link_to,
                depart_ns,
                arrive_ns,
            } if *link_from == from.0 && *link_to == to.0 => {
                Some((ev.t_ns, ev.pkt_id?, *depart_ns, *arrive_ns))
            }
            _ => None,
        })
        .collect()
}

fn drop_events(world: &NetWorld, from: NodeId, to: NodeId) -> Vec<(u64, u64, Option<u64>)> {
    let Some(v) = &world.net.viz else {
        return Vec::new();
    };
    v.events
        .iter()
        .filter_map(|ev| match &ev.kind {
            VizEventKind::Drop {
                link_from,
                link_to,
                q_cap_pkts,
                ..
            } if *link_from == from.0 && *link_to == to.0 => {
                Some((ev.t_ns, ev.pkt_id?, *q_cap_pkts))
            }
            _ => None,
        })
        .collect()
}

struct ScheduleDeliver {
    at: SimTime,
    to: NodeId,
    pkt: Packet,
}

impl Event for ScheduleDeliver {
    fn execute(self: Box<Self>, sim: &mut Simulator, _world: &mut dyn World) {
        sim.schedule(
            self.at,
            DeliverPacket {
                to: self.to,
                pkt: self.pkt,
            },
        );
    }
}

fn build_two_host_link(latency: SimTime, bandwidth_bps: u64) -> (NetWorld, NodeId, NodeId) {
    let mut world = NetWorld::default();
    let h0 = world.net.add_host("h0");
    let h1 = world.net.add_host("h1");
    world
        .net
        .connect(h0, h1, latency, bandwidth_bps)
        .expect("connect");
    world.net.viz = Some(VizLogger::default());
    (world, h0, h1)
}

#[test]
fn link_serializes_packets_and_spaces_tx_starts() {
    let latency = SimTime(1000); // 1us
    let bw = 1_000_000_000; // 1Gbps
    let bytes = 1000_u32;
    let tx_ns = tx_nanos(bytes, bw);

    let mut sim = Simulator::default();
    let (mut world, h0, h1) = build_two_host_link(latency, bw);

    let pkt0 = udp_pkt(10, bytes, h0, h1);
    let pkt1 = udp_pkt(11, bytes, h0, h1);
    sim.schedule(SimTime::ZERO, DeliverPacket { to: h0, pkt: pkt0 });
    sim.schedule(SimTime::ZERO, DeliverPacket { to: h0, pkt: pkt1 });
    sim.run(&mut world);

    assert_eq!(world.net.stats.dropped_pkts, 0);
    assert_eq!(world.net.stats.delivered_pkts, 2);
    assert_eq!(world.net.stats.delivered_bytes, (bytes as u64) * 2);

    let mut starts = tx_start_events(&world, h0, h1);
    starts.sort_by_key(|(t_ns, _, _, _)| *t_ns);
    assert_eq!(starts.len(), 2);

    // First packet starts at 0, finishes tx at tx_ns, arrives after latency.
    assert_eq!(starts[0].0, 0);
    assert_eq!(starts[0].1, 10);
    assert_eq!(starts[0].2, tx_ns);
    assert_eq!(starts[0].3, tx_ns.saturating_add(latency.0));

    // Second packet starts when the link becomes free (depart of first).
    assert_eq!(starts[1].0, tx_ns);
    assert_eq!(starts[1].1, 11);
    assert_eq!(starts[1].2, tx_ns.saturating_mul(2));
    assert_eq!(
        starts[1].3,
        tx_ns.saturating_mul(2).saturating_add(latency.0)
    );
}

#[test]
fn bounded_queue_drop_updates_stats_flow_counters_and_viz() {
    let latency = SimTime(1000);
    let bw = 1_000_000_000;
    let (mut world, h0, h1) = build_two_host_link(latency, bw);
    world
        .net
        .set_queue_capacity_pkts(h0, h1, 1)
        .expect("queue cap");

    // Three packets at t=0: the first grabs the link, the second fills the
    // queue, the third is tail-dropped.
    let mut sim = Simulator::default();
    for id in 1..=3 {
        let pkt = udp_pkt(id, 1000, h0, h1);
        sim.schedule(SimTime::ZERO, DeliverPacket { to: h0, pkt });
    }
    sim.run(&mut world);

    assert_eq!(world.net.stats.dropped_pkts, 1);
    assert_eq!(world.net.stats.dropped_bytes, 1000);
    assert_eq!(world.net.stats.delivered_pkts, 2);

    let drops = drop_events(&world, h0, h1);
    assert_eq!(drops.len(), 1);
    assert_eq!(drops[0].0, 0);
    assert_eq!(drops[0].1, 3);
    assert_eq!(drops[0].2, Some(1));

    // The dropped packet still registers its flow and bumps the drop counter.
    let (_, _, st) = world.net.flows.flow_stats().next().expect("one flow");
    assert_eq!(st.drops, 1);
}

#[test]
fn unknown_link_queue_capacity_is_a_config_error() {
    let (mut world, h0, _h1) = build_two_host_link(SimTime(1000), 1_000_000_000);
    let bogus = NodeId(7);
    assert!(world.net.set_queue_capacity_pkts(h0, bogus, 5).is_err());
}

#[test]
fn link_ready_and_forward_from_same_time_transmits_once_regardless_of_order() {
    let latency = SimTime(1000);
    let bw = 1_000_000_000;
    let bytes = 1000_u32;
    let tx_ns = tx_nanos(bytes, bw);
    let depart1 = SimTime(tx_ns);

    // Case A: packet arrival at depart1 is scheduled before LinkReady.
    {
        let mut sim = Simulator::default();
        let (mut world, h0, h1) = build_two_host_link(latency, bw);
        let pkt0 = udp_pkt(1, bytes, h0, h1);
        let pkt1 = udp_pkt(2, bytes, h0, h1);
        sim.schedule(SimTime::ZERO, DeliverPacket { to: h0, pkt: pkt0 });
        sim.schedule(depart1, DeliverPacket { to: h0, pkt: pkt1 });
        sim.run(&mut world);

        assert_eq!(world.net.stats.delivered_pkts, 2);
        let mut starts = tx_start_events(&world, h0, h1);
        starts.sort_by_key(|(t_ns, pkt_id, _, _)| (*t_ns, *pkt_id));
        assert_eq!(starts.len(), 2);
        assert_eq!(starts[0].1, 1);
        assert_eq!(starts[1].1, 2);
        assert_eq!(starts[1].0, tx_ns);
    }

    // Case B: LinkReady at depart1 runs before the packet arrival at depart1.
    {
        let mut sim = Simulator::default();
        let (mut world, h0, h1) = build_two_host_link(latency, bw);
        let pkt0 = udp_pkt(1, bytes, h0, h1);
        let pkt1 = udp_pkt(2, bytes, h0, h1);
        sim.schedule(SimTime::ZERO, DeliverPacket { to: h0, pkt: pkt0 });
        sim.schedule(
            SimTime::ZERO,
            ScheduleDeliver {
                at: depart1,
                to: h0,
                pkt: pkt1,
            },
        );
        sim.run(&mut world);

        assert_eq!(world.net.stats.delivered_pkts, 2);
        let mut starts = tx_start_events(&world, h0, h1);
        starts.sort_by_key(|(t_ns, pkt_id, _, _)| (*t_ns, *pkt_id));
        assert_eq!(starts.len(), 2);
        assert_eq!(starts[0].1, 1);
        assert_eq!(starts[1].1, 2);
        assert_eq!(starts[1].0, tx_ns);
    }
}

#[test]
fn arrival_at_depart_instant_never_overtakes_queued_packets() {
    let latency = SimTime(1000);
    let bw = 1_000_000_000;
    let bytes = 1000_u32;
    let tx_ns = tx_nanos(bytes, bw);
    let depart1 = SimTime(tx_ns);

    // pkt1 and pkt2 at t=0: pkt1 grabs the link, pkt2 waits in the queue.
    // pkt3 arrives at exactly pkt1's depart instant and must line up behind
    // pkt2, whichever of {arrival, LinkReady} executes first at that instant.

    // Case A: pkt3's arrival is scheduled before the pending LinkReady.
    {
        let mut sim = Simulator::default();
        let (mut world, h0, h1) = build_two_host_link(latency, bw);
        for id in 1..=2 {
            let pkt = udp_pkt(id, bytes, h0, h1);
            sim.schedule(SimTime::ZERO, DeliverPacket { to: h0, pkt });
        }
        let pkt3 = udp_pkt(3, bytes, h0, h1);
        sim.schedule(depart1, DeliverPacket { to: h0, pkt: pkt3 });
        sim.run(&mut world);

        assert_eq!(world.net.stats.delivered_pkts, 3);
        let mut starts = tx_start_events(&world, h0, h1);
        starts.sort_by_key(|(t_ns, _, _, _)| *t_ns);
        let order: Vec<u64> = starts.iter().map(|(_, pkt_id, _, _)| *pkt_id).collect();
        assert_eq!(order, vec![1, 2, 3], "tx order was {:?}", order);
        assert_eq!(starts[1].0, tx_ns);
        assert_eq!(starts[2].0, tx_ns.saturating_mul(2));
    }

    // Case B: LinkReady executes first, then pkt3 arrives at the same instant.
    {
        let mut sim = Simulator::default();
        let (mut world, h0, h1) = build_two_host_link(latency, bw);
        for id in 1..=2 {
            let pkt = udp_pkt(id, bytes, h0, h1);
            sim.schedule(SimTime::ZERO, DeliverPacket { to: h0, pkt });
        }
        let pkt3 = udp_pkt(3, bytes, h0, h1);
        sim.schedule(
            SimTime::ZERO,
            ScheduleDeliver {
                at: depart1,
                to: h0,
                pkt: pkt3,
            },
        );
        sim.run(&mut world);

        assert_eq!(world.net.stats.delivered_pkts, 3);
        let mut starts = tx_start_events(&world, h0, h1);
        starts.sort_by_key(|(t_ns, _, _, _)| *t_ns);
        let order: Vec<u64> = starts.iter().map(|(_, pkt_id, _, _)| *pkt_id).collect();
        assert_eq!(order, vec![1, 2, 3], "tx order was {:?}", order);
        assert_eq!(starts[1].0, tx_ns);
        assert_eq!(starts[2].0, tx_ns.saturating_mul(2));
    }
}

#[test]
fn branch_topology_routes_edge_traffic_through_the_router() {
    let mut world = NetWorld::default();
    let topo = build_branch(&mut world, &BranchOpts::default()).expect("build branch");
    world.net.viz = Some(VizLogger::default());

    let mut sim = Simulator::default();
    let pkt = udp_pkt(1, 1024, topo.n0, topo.n3);
    sim.schedule(SimTime::ZERO, DeliverPacket { to: topo.n0, pkt });
    sim.run(&mut world);

    assert_eq!(world.net.stats.delivered_pkts, 1);
    assert_eq!(tx_start_events(&world, topo.n0, topo.n2).len(), 1);
    assert_eq!(tx_start_events(&world, topo.n2, topo.n3).len(), 1);
    // Never the reverse direction, never a direct hop.
    assert!(tx_start_events(&world, topo.n2, topo.n0).is_empty());
    assert!(tx_start_events(&world, topo.n0, topo.n3).is_empty());
}

#[test]
fn zero_bandwidth_link_is_rejected() {
    let mut world = NetWorld::default();
    let h0 = world.net.add_host("h0");
    let h1 = world.net.add_host("h1");
    assert!(world.net.connect(h0, h1, SimTime(1000), 0).is_err());
}

#[test]
fn duplicate_addr_binding_is_rejected() {
    let mut world = NetWorld::default();
    let h0 = world.net.add_host("h0");
    let h1 = world.net.add_host("h1");
    let addr = Addr::v4(10, 0, 0, 1);
    world.net.bind_addr(h0, addr).expect("first bind");
    assert!(world.net.bind_addr(h1, addr).is_err());
    assert_eq!(world.net.node_of(addr), Some(h0));
    assert_eq!(world.net.addr_of(h1), None);
}
