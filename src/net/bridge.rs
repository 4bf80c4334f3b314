//! Helpers for accessing protocol stacks and app registries from the simulation world.

use crate::app::AppRegistry;
use crate::proto::tcp::TcpStack;
use crate::sim::World;

use super::network::Network;
use super::net_world::NetWorld;

pub(crate) fn with_tcp_stack<F, R>(world: &mut dyn World, f: F) -> R
where
    F: FnOnce(&mut Network, &mut TcpStack) -> R,
{
    let w = world
        .as_any_mut()
        .downcast_mut::<NetWorld>()
        .expect("world must be NetWorld");
    let mut tcp = std::mem::take(&mut w.net.tcp);
    let result = f(&mut w.net, &mut tcp);
    w.net.tcp = tcp;
    result
}

pub(crate) fn with_apps<F, R>(world: &mut dyn World, f: F) -> R
where
    F: FnOnce(&mut Network, &mut AppRegistry) -> R,
{
    let w = world
        .as_any_mut()
        .downcast_mut::<NetWorld>()
        .expect("world must be NetWorld");
    let mut apps = std::mem::take(&mut w.net.apps);
    let result = f(&mut w.net, &mut apps);
    w.net.apps = apps;
    result
}
