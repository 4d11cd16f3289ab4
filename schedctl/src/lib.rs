//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! schedctl - 可在运行时调节的调度控制面
//!
//! 三部分组成：
//! - 参数注册表 (tunable): 外部可读写的整数参数，通过 procfs 风格的命名空间暴露
//! - 自适应负载监控 (sched::monitor): 由 CPU 热插拔和 tick 事件驱动，
//!   限流采样、过载时广播重新调度、自适应调整性能阈值
//! - 统计快照 (stats): 只读的负载报告
//!
//! 运行队列、调度时钟、IPI、cpufreq 都由宿主内核通过 trait 提供。

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod config;
pub mod cpufreq;
pub mod errno;
pub mod init;
pub mod kstrtox;
pub mod procfs;
pub mod sched;
pub mod stats;
pub mod tunable;

#[cfg(test)]
mod testing;

pub use errno::Errno;
pub use init::{InitError, SchedCtl};
pub use procfs::{ControlError, ProcFs};
pub use sched::{CpuEvent, PassOutcome, PassReport};
pub use tunable::{TunableId, TunableRegistry};
