//! 协议分类
//!
//! 分类规则是终态的，在报告期应用一次：协议号 6 -> TCP，17 -> UDP，
//! 其余一律 UNKNOWN——未知协议是可扩展点，不是错误。

use serde::Serializer;
use std::fmt;

use crate::net::{IP_PROTO_TCP, IP_PROTO_UDP};

/// 流的协议标签
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtoLabel {
    Tcp,
    Udp,
    Unknown,
}

impl ProtoLabel {
    pub fn from_protocol(protocol: u8) -> ProtoLabel {
        match protocol {
            IP_PROTO_TCP => ProtoLabel::Tcp,
            IP_PROTO_UDP => ProtoLabel::Udp,
            _ => ProtoLabel::Unknown,
        }
    }

    /// 可视化着色约定：TCP 蓝、UDP 红、未知灰。
    pub fn color(&self) -> FlowColor {
        match self {
            ProtoLabel::Tcp => FlowColor::Blue,
            ProtoLabel::Udp => FlowColor::Red,
            ProtoLabel::Unknown => FlowColor::Gray,
        }
    }
}

impl fmt::Display for ProtoLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtoLabel::Tcp => write!(f, "TCP"),
            ProtoLabel::Udp => write!(f, "UDP"),
            ProtoLabel::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

impl serde::Serialize for ProtoLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// 流颜色（交给可视化 sink 的 flow_id -> color 标签）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowColor {
    Blue,
    Red,
    Gray,
}

impl fmt::Display for FlowColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlowColor::Blue => write!(f, "BLUE"),
            FlowColor::Red => write!(f, "RED"),
            FlowColor::Gray => write!(f, "GRAY"),
        }
    }
}

impl serde::Serialize for FlowColor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
