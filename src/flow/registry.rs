//! 流注册表
//!
//! 流在首次观察到某个 5 元组的包时惰性创建，流号 1 起单调递增、
//! 永不复用、运行期间永不删除；迭代顺序 = 分配顺序，整个 run 稳定。

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, trace};

use crate::net::FiveTuple;
use crate::sim::SimTime;

/// 流标识符（1 起，按首见顺序分配）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct FlowId(pub u64);

/// 逐流统计计数器。
///
/// 包级累加满足交换/结合律：不同流之间的 `observe_*` 先后不影响终值；
/// 时延/抖动这类派生量依赖**到达时间戳**（而非处理顺序）。
#[derive(Debug, Default, Clone)]
pub struct FlowStats {
    pub tx_pkts: u64,
    pub tx_bytes: u64,
    pub rx_pkts: u64,
    pub rx_bytes: u64,
    pub drops: u64,
    pub delay_sum_ns: u64,
    pub jitter_sum_ns: u64,
    last_delay_ns: Option<u64>,
    pub first_tx_at: Option<SimTime>,
    pub last_rx_at: Option<SimTime>,
}

impl FlowStats {
    /// 平均端到端时延（纳秒）；无接收样本时为 None。
    pub fn mean_delay_ns(&self) -> Option<u64> {
        (self.rx_pkts > 0).then(|| self.delay_sum_ns / self.rx_pkts)
    }

    /// 平均抖动（相邻时延样本差的绝对值，纳秒）。
    pub fn mean_jitter_ns(&self) -> Option<u64> {
        (self.rx_pkts > 1).then(|| self.jitter_sum_ns / (self.rx_pkts - 1))
    }
}

/// 流注册表：5 元组 -> 流号 -> 统计。
#[derive(Debug, Default)]
pub struct FlowRegistry {
    by_tuple: HashMap<FiveTuple, FlowId>,
    entries: Vec<(FiveTuple, FlowStats)>,
}

impl FlowRegistry {
    /// 已注册流数
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 查询 5 元组对应的流号（不创建）。
    pub fn flow_id_of(&self, tuple: &FiveTuple) -> Option<FlowId> {
        self.by_tuple.get(tuple).copied()
    }

    fn get_or_create(&mut self, tuple: &FiveTuple) -> FlowId {
        if let Some(id) = self.by_tuple.get(tuple) {
            return *id;
        }
        let id = FlowId(self.entries.len() as u64 + 1);
        debug!(flow_id = id.0, protocol = tuple.protocol, "🆕 注册新流");
        self.by_tuple.insert(*tuple, id);
        self.entries.push((*tuple, FlowStats::default()));
        id
    }

    fn stats_mut(&mut self, id: FlowId) -> &mut FlowStats {
        &mut self.entries[(id.0 - 1) as usize].1
    }

    /// 观察一次发送。
    pub fn observe_sent(&mut self, tuple: &FiveTuple, bytes: u32, at: SimTime) -> FlowId {
        let id = self.get_or_create(tuple);
        let st = self.stats_mut(id);
        st.tx_pkts += 1;
        st.tx_bytes += bytes as u64;
        if st.first_tx_at.is_none() {
            st.first_tx_at = Some(at);
        }
        trace!(flow_id = id.0, tx_pkts = st.tx_pkts, "流发送计数");
        id
    }

    /// 观察一次到达；`sent_at` 为该包在源端的发出时刻。
    pub fn observe_received(
        &mut self,
        tuple: &FiveTuple,
        bytes: u32,
        sent_at: SimTime,
        at: SimTime,
    ) -> FlowId {
        let id = self.get_or_create(tuple);
        let st = self.stats_mut(id);
        st.rx_pkts += 1;
        st.rx_bytes += bytes as u64;
        st.last_rx_at = Some(at);

        let delay = at.0.saturating_sub(sent_at.0);
        st.delay_sum_ns = st.delay_sum_ns.saturating_add(delay);
        if let Some(prev) = st.last_delay_ns {
            st.jitter_sum_ns = st.jitter_sum_ns.saturating_add(prev.abs_diff(delay));
        }
        st.last_delay_ns = Some(delay);
        trace!(flow_id = id.0, rx_pkts = st.rx_pkts, delay_ns = delay, "流接收计数");
        id
    }

    /// 观察一次队列丢弃（预期内的拥塞结果，只计数不报错）。
    pub fn observe_drop(&mut self, tuple: &FiveTuple, _bytes: u32) -> FlowId {
        let id = self.get_or_create(tuple);
        let st = self.stats_mut(id);
        st.drops += 1;
        trace!(flow_id = id.0, drops = st.drops, "流丢包计数");
        id
    }

    /// 按流号查 5 元组。
    pub fn find_flow(&self, id: FlowId) -> Option<&FiveTuple> {
        self.entries.get((id.0.checked_sub(1)?) as usize).map(|(t, _)| t)
    }

    /// 按流号升序（= 分配顺序）迭代统计；只读，重复调用结果一致。
    pub fn flow_stats(&self) -> impl Iterator<Item = (FlowId, &FiveTuple, &FlowStats)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, (t, s))| (FlowId(i as u64 + 1), t, s))
    }
}
