//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 负载采样
//!
//! 一次采样就是对在线 CPU 运行队列计数器的时间点快照，不缓存、不持久化。
//! 自适应监控和统计输出使用同一份聚合逻辑。

use super::{CpuMask, RqSource};
use crate::config::{MAX_CPUS, OVERLOAD_FACTOR};

/// 单个 CPU 的计数器
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuLoad {
    pub nr_running: u64,
    pub nr_switches: u64,
}

/// 负载快照
#[derive(Debug, Clone)]
pub struct LoadSample {
    /// 采样时间（sched_clock 纳秒）
    pub timestamp: u64,
    /// 采样时的在线 CPU
    pub online: CpuMask,
    cpus: [CpuLoad; MAX_CPUS],
}

impl LoadSample {
    /// 采集所有在线 CPU 的计数器
    pub fn collect(rq: &dyn RqSource, now: u64) -> Self {
        let online = rq.online_mask();
        let mut cpus = [CpuLoad::default(); MAX_CPUS];
        for cpu in online.iter() {
            cpus[cpu] = CpuLoad {
                nr_running: rq.nr_running(cpu),
                nr_switches: rq.nr_switches(cpu),
            };
        }
        Self { timestamp: now, online, cpus }
    }

    /// 在线 CPU 数量（num_online_cpus）
    #[inline]
    pub fn online_cpus(&self) -> u64 {
        self.online.weight() as u64
    }

    /// 指定 CPU 的计数器，离线或越界的 CPU 返回全 0
    pub fn cpu(&self, cpu: usize) -> CpuLoad {
        if self.online.test(cpu) {
            self.cpus[cpu]
        } else {
            CpuLoad::default()
        }
    }

    /// 所有在线 CPU 的 nr_running 之和
    pub fn total_running(&self) -> u64 {
        self.online.iter().map(|cpu| self.cpus[cpu].nr_running).sum()
    }

    /// 所有在线 CPU 的 nr_switches 之和
    pub fn total_switches(&self) -> u64 {
        self.online
            .iter()
            .fold(0u64, |acc, cpu| acc.wrapping_add(self.cpus[cpu].nr_switches))
    }

    /// 平均每 CPU 运行任务数（整数除法）
    pub fn avg_load_per_cpu(&self) -> u64 {
        match self.online_cpus() {
            0 => 0,
            n => self.total_running() / n,
        }
    }

    /// 过载的 CPU：nr_running > online_cpus * OVERLOAD_FACTOR
    pub fn overloaded(&self) -> CpuMask {
        let limit = self.online_cpus() * OVERLOAD_FACTOR;
        let mut mask = CpuMask::empty();
        for cpu in self.online.iter() {
            if self.cpus[cpu].nr_running > limit {
                mask.set(cpu);
            }
        }
        mask
    }
}
