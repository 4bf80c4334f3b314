//! 仿真器
//!
//! 定义事件驱动仿真器，维护当前时间与事件队列。
//! 仿真器是显式构造、显式持有的对象：所有组件通过 `&mut Simulator`
//! 访问时钟与事件队列，不存在进程级的隐式单例。

use super::event::Event;
use super::scheduled_event::{EventHandle, ScheduledEvent};
use super::time::SimTime;
use super::world::World;
use std::collections::{BinaryHeap, HashSet};
use tracing::{debug, info, trace};

/// 事件驱动仿真器：维护当前时间与事件队列。
#[derive(Default)]
pub struct Simulator {
    now: SimTime,
    next_seq: u64,
    q: BinaryHeap<ScheduledEvent>,
    cancelled: HashSet<u64>,
}

impl Simulator {
    /// 获取当前仿真时间
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// 调度事件在指定时间执行；返回可用于取消的句柄。
    ///
    /// 把事件调度到过去（`at < now()`）是编程错误，直接 panic 终止仿真。
    #[tracing::instrument(skip(self, ev), fields(event_type = std::any::type_name::<E>(), schedule_at = ?at))]
    pub fn schedule<E: Event>(&mut self, at: SimTime, ev: E) -> EventHandle {
        assert!(
            at >= self.now,
            "事件调度到过去: at={:?} now={:?}",
            at,
            self.now
        );

        let seq = self.next_seq;
        trace!(now = ?self.now, seq, "调度事件");

        self.next_seq = self.next_seq.wrapping_add(1);
        self.q.push(ScheduledEvent {
            at,
            seq,
            ev: Box::new(ev),
        });

        debug!(queue_size = self.q.len(), "事件已加入队列");
        EventHandle(seq)
    }

    /// 调度事件在 `now + delay` 执行。
    pub fn schedule_in<E: Event>(&mut self, delay: SimTime, ev: E) -> EventHandle {
        self.schedule(self.now.saturating_add(delay), ev)
    }

    /// 取消一个尚未执行的事件；已执行（或已取消）的事件句柄是 no-op。
    pub fn cancel(&mut self, handle: EventHandle) {
        // 单线程非抢占模型：执行中的事件不可能被取消。
        if handle.0 < self.next_seq {
            trace!(seq = handle.0, "取消事件");
            self.cancelled.insert(handle.0);
        }
    }

    fn take_cancelled(&mut self, seq: u64) -> bool {
        !self.cancelled.is_empty() && self.cancelled.remove(&seq)
    }

    /// 运行直到 `until`（含）。
    ///
    /// 按 (时间, 序列号) 非降序执行事件；执行前把时钟推进到事件时间。
    /// 下一个事件时间一旦超过 `until` 立即停止，剩余事件全部**丢弃**
    /// （仿真终止契约），时钟停在 `max(now, until)`。
    pub fn run_until(&mut self, until: SimTime, world: &mut dyn World) {
        while let Some(top) = self.q.peek() {
            if top.at > until {
                break;
            }
            let item = self.q.pop().expect("peek then pop");
            if self.take_cancelled(item.seq) {
                continue;
            }
            self.now = item.at;
            item.ev.execute(self, world);
            world.on_tick(self);
        }

        let discarded = self.q.len();
        if discarded > 0 {
            debug!(discarded, until = ?until, "丢弃 stop 之后的剩余事件");
        }
        self.q.clear();
        self.cancelled.clear();
        self.now = self.now.max(until);
    }

    /// 运行所有事件直到队列为空。
    #[tracing::instrument(skip(self, world))]
    pub fn run(&mut self, world: &mut dyn World) {
        info!("▶️  开始运行仿真");
        debug!(now = ?self.now, queue_size = self.q.len(), "初始状态");

        let mut event_count = 0;
        while let Some(item) = self.q.pop() {
            if self.take_cancelled(item.seq) {
                continue;
            }
            event_count += 1;
            self.now = item.at;

            debug!(
                event_num = event_count,
                now = ?self.now,
                scheduled_at = ?item.at,
                seq = item.seq,
                remaining_queue = self.q.len(),
                "执行事件"
            );

            item.ev.execute(self, world);
            world.on_tick(self);
        }

        info!(
            total_events = event_count,
            final_time = ?self.now,
            "✅ 仿真完成"
        );
    }
}
