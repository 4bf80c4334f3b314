use crate::net::{Addr, FiveTuple, IP_PROTO_UDP, NodeId, Packet, Transport};
use crate::queue::{DropTailQueue, PacketQueue};
use crate::sim::SimTime;

fn pkt(id: u64, size_bytes: u32) -> Packet {
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
        src_node: NodeId(0),
        dst_node: NodeId(1),
        sent_at: SimTime::ZERO,
        transport: Transport::Udp,
    }
}

#[test]
fn droptail_queue_enforces_packet_capacity_and_preserves_order() {
    let mut q = DropTailQueue::new(2);
    assert_eq!(q.capacity_pkts(), 2);
    assert_eq!(q.len(), 0);
    assert!(q.is_empty());

    assert!(q.enqueue(pkt(1, 1000)).is_ok());
    assert!(q.enqueue(pkt(2, 1000)).is_ok());
    assert_eq!(q.len(), 2);

    let dropped = q.enqueue(pkt(3, 1000)).expect_err("should drop");
    assert_eq!(dropped.id, 3);
    assert_eq!(q.len(), 2);
    assert_eq!(q.drops(), 1);

    assert_eq!(q.dequeue().expect("pkt").id, 1);
    assert_eq!(q.dequeue().expect("pkt").id, 2);
    assert!(q.dequeue().is_none());
    assert_eq!(q.drops(), 1);
}

#[test]
fn droptail_queue_counts_packets_not_bytes() {
    // A tiny packet is dropped just the same once the packet budget is used up.
    let mut q = DropTailQueue::new(1);
    assert!(q.enqueue(pkt(1, 10_000)).is_ok());
    let dropped = q.enqueue(pkt(2, 1)).expect_err("should drop");
    assert_eq!(dropped.id, 2);
}

#[test]
fn droptail_queue_with_zero_capacity_drops_everything() {
    let mut q = DropTailQueue::new(0);
    assert!(q.enqueue(pkt(1, 100)).is_err());
    assert!(q.enqueue(pkt(2, 100)).is_err());
    assert_eq!(q.len(), 0);
    assert_eq!(q.drops(), 2);
    assert!(q.dequeue().is_none());
}

#[test]
fn droptail_queue_drop_counter_accumulates() {
    let mut q = DropTailQueue::new(1);
    assert!(q.enqueue(pkt(1, 100)).is_ok());
    for id in 2..=5 {
        assert!(q.enqueue(pkt(id, 100)).is_err());
    }
    assert_eq!(q.drops(), 4);

    // Draining frees capacity; the counter keeps its history.
    assert_eq!(q.dequeue().expect("pkt").id, 1);
    assert!(q.enqueue(pkt(6, 100)).is_ok());
    assert_eq!(q.drops(), 4);
}
