//! 恒定速率（CBR/OnOff）源
//!
//! 固定包长，包间隔 = packet_bytes*8 / rate_bps；首包在 start 发出，
//! 此后每个间隔发一个，直到 stop。stop 事件**取消**挂起的下一次发包
//! 事件（已调度事件的取消路径），在途包照常送达。

use crate::error::ConfigError;
use crate::net::{FiveTuple, IP_PROTO_UDP, Network, NodeId, Transport, tx_nanos, with_apps};
use crate::sim::{Event, EventHandle, SimTime, Simulator, World};
use tracing::{debug, trace};

use super::{AppId, AppRegistry};

/// CBR 源配置（构造期校验，替代字符串键属性设置）
#[derive(Debug, Clone)]
pub struct CbrConfig {
    pub tuple: FiveTuple,
    pub src_node: NodeId,
    pub dst_node: NodeId,
    pub packet_bytes: u32,
    pub rate_bps: u64,
    pub start: SimTime,
    pub stop: SimTime,
}

/// CBR 源的运行期状态。
#[derive(Debug)]
pub struct CbrSource {
    pub cfg: CbrConfig,
    /// 挂起的下一次发包事件（stop 时取消）
    next_emit: Option<EventHandle>,
    pub sent_pkts: u64,
}

impl CbrSource {
    pub fn new(cfg: CbrConfig) -> Result<Self, ConfigError> {
        if cfg.packet_bytes == 0 {
            return Err(ConfigError::ZeroPacketSize);
        }
        if cfg.rate_bps == 0 {
            return Err(ConfigError::ZeroAppRate);
        }
        if cfg.start >= cfg.stop {
            return Err(ConfigError::EmptyActiveWindow {
                start: cfg.start,
                stop: cfg.stop,
            });
        }
        Ok(Self {
            cfg,
            next_emit: None,
            sent_pkts: 0,
        })
    }

    /// 包间隔（与链路串行化时延同口径的 ceil 计算）
    pub fn interval(&self) -> SimTime {
        SimTime(tx_nanos(self.cfg.packet_bytes, self.cfg.rate_bps))
    }
}

fn emit(app: AppId, sim: &mut Simulator, net: &mut Network, apps: &mut AppRegistry) {
    let src = &mut apps.cbr[app.0];
    if sim.now() >= src.cfg.stop {
        return;
    }

    let mut pkt = net.make_packet(
        src.cfg.tuple,
        src.cfg.packet_bytes,
        src.cfg.src_node,
        src.cfg.dst_node,
    );
    if src.cfg.tuple.protocol == IP_PROTO_UDP {
        pkt.transport = Transport::Udp;
    }
    src.sent_pkts += 1;
    trace!(app = app.0, sent_pkts = src.sent_pkts, "CBR 发包");

    let gap = src.interval();
    let handle = sim.schedule_in(gap, CbrEmit { app });
    apps.cbr[app.0].next_emit = Some(handle);

    net.send_from(pkt, sim);
}

/// 事件：CBR 源启动（发出首包）
#[derive(Debug)]
pub struct CbrStart {
    pub app: AppId,
}

impl Event for CbrStart {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let CbrStart { app } = *self;
        debug!(app = app.0, now = ?sim.now(), "▶️  CBR 源启动");
        with_apps(world, |net, apps| emit(app, sim, net, apps));
    }
}

/// 事件：CBR 源周期发包
#[derive(Debug)]
pub struct CbrEmit {
    pub app: AppId,
}

impl Event for CbrEmit {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let CbrEmit { app } = *self;
        with_apps(world, |net, apps| emit(app, sim, net, apps));
    }
}

/// 事件：CBR 源停止，取消挂起的发包事件。
#[derive(Debug)]
pub struct CbrStop {
    pub app: AppId,
}

impl Event for CbrStop {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let CbrStop { app } = *self;
        with_apps(world, |_net, apps| {
            if let Some(handle) = apps.cbr[app.0].next_emit.take() {
                debug!(app = app.0, now = ?sim.now(), "🛑 CBR 源停止，取消挂起发包");
                sim.cancel(handle);
            }
        });
    }
}

/// 安装一个 CBR 源：注册状态并调度 start/stop 事件。
pub fn install_cbr(
    net: &mut Network,
    sim: &mut Simulator,
    cfg: CbrConfig,
) -> Result<AppId, ConfigError> {
    let src = CbrSource::new(cfg)?;
    let (start, stop) = (src.cfg.start, src.cfg.stop);
    let app = net.apps.add_cbr(src);
    sim.schedule(start, CbrStart { app });
    sim.schedule(stop, CbrStop { app });
    Ok(app)
}
