//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! CPU 热插拔事件
//!
//! 对应 Linux 的 cpuhp_setup_state_nocalls() 注册的上线/下线回调。
//! 热插拔回调和周期 tick 都只是触发一次监控，是否真正采样由限流门决定。

use log::info;

use super::monitor::{LoadMonitor, PassOutcome};

/// 驱动负载监控的外部事件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuEvent {
    /// CPU 上线
    Online(usize),
    /// CPU 下线
    Offline(usize),
    /// 周期 tick
    Tick,
}

impl CpuEvent {
    /// 事件涉及的 CPU，tick 返回 None
    pub fn cpu(self) -> Option<usize> {
        match self {
            CpuEvent::Online(cpu) | CpuEvent::Offline(cpu) => Some(cpu),
            CpuEvent::Tick => None,
        }
    }
}

/// 分发事件到负载监控
pub fn notify(monitor: &LoadMonitor, event: CpuEvent) -> PassOutcome {
    match event {
        CpuEvent::Online(cpu) => info!("policy: CPU {} online, optimizing performance", cpu),
        CpuEvent::Offline(cpu) => info!("policy: CPU {} offline, rebalancing load", cpu),
        CpuEvent::Tick => {}
    }
    monitor.on_event(event)
}
