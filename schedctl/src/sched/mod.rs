//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 调度策略模块
//!
//! 控制面里和调度器打交道的部分：
//! - 运行队列数据源 (rq): 由调度器实现的只读计数器
//! - 负载采样 (load): 在线 CPU 计数器的时间点快照
//! - 自适应监控 (monitor): 限流、过载检测、重新调度广播、阈值调整
//! - 热插拔 (hotplug) 与策略定时器 (timer): 驱动监控的事件源
//! - IPI (ipi): 重新调度通知

pub mod cpumask;
pub mod hotplug;
pub mod ipi;
pub mod load;
pub mod monitor;
pub mod rq;
pub mod timer;

pub use cpumask::CpuMask;
pub use hotplug::CpuEvent;
pub use ipi::{IpiSender, IpiType};
pub use load::{CpuLoad, LoadSample};
pub use monitor::{LoadMonitor, PassOutcome, PassReport, SizingTier};
pub use rq::{RqSource, SchedClock, NSEC_PER_MSEC};
pub use timer::PolicyTimer;
