//! 协议实现（仿真用简化传输层）

pub mod tcp;
