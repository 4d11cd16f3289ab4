//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 测试用的外部协作者
//!
//! 运行队列、时钟、IPI、cpufreq 都由内核提供，这里用内存里的假实现代替

use alloc::string::String;
use alloc::vec::Vec;
use core::array;
use core::sync::atomic::{AtomicI32, AtomicI64, AtomicU64, Ordering};

use spin::Mutex;

use crate::config::MAX_CPUS;
use crate::cpufreq::CpufreqSource;
use crate::sched::{CpuMask, IpiSender, IpiType, RqSource, SchedClock};

/// 可编程的运行队列
pub struct FakeRq {
    online: AtomicU64,
    running: [AtomicU64; MAX_CPUS],
    switches: [AtomicU64; MAX_CPUS],
    pub exit_type: AtomicI32,
    pub nr_rejected: AtomicI64,
}

impl FakeRq {
    /// 前 `online` 个 CPU 在线，计数器全 0
    pub fn new(online: usize) -> Self {
        Self {
            online: AtomicU64::new(CpuMask::first(online).bits()),
            running: array::from_fn(|_| AtomicU64::new(0)),
            switches: array::from_fn(|_| AtomicU64::new(0)),
            exit_type: AtomicI32::new(0),
            nr_rejected: AtomicI64::new(0),
        }
    }

    pub fn set_online(&self, cpu: usize, online: bool) {
        let mut mask = CpuMask::from_bits(self.online.load(Ordering::SeqCst));
        if online {
            mask.set(cpu);
        } else {
            mask.clear(cpu);
        }
        self.online.store(mask.bits(), Ordering::SeqCst);
    }

    /// 从 CPU 0 开始依次设置 nr_running
    pub fn set_running(&self, values: &[u64]) {
        for (cpu, v) in values.iter().enumerate() {
            self.running[cpu].store(*v, Ordering::SeqCst);
        }
    }

    /// 所有 CPU 设为同一个 nr_running
    pub fn fill_running(&self, value: u64) {
        for slot in self.running.iter() {
            slot.store(value, Ordering::SeqCst);
        }
    }

    pub fn set_switches(&self, values: &[u64]) {
        for (cpu, v) in values.iter().enumerate() {
            self.switches[cpu].store(*v, Ordering::SeqCst);
        }
    }
}

impl RqSource for FakeRq {
    fn online_mask(&self) -> CpuMask {
        CpuMask::from_bits(self.online.load(Ordering::SeqCst))
    }

    fn nr_running(&self, cpu: usize) -> u64 {
        self.running[cpu].load(Ordering::SeqCst)
    }

    fn nr_switches(&self, cpu: usize) -> u64 {
        self.switches[cpu].load(Ordering::SeqCst)
    }

    fn scx_exit_type(&self) -> i32 {
        self.exit_type.load(Ordering::SeqCst)
    }

    fn scx_nr_rejected(&self) -> i64 {
        self.nr_rejected.load(Ordering::SeqCst)
    }
}

/// 手动推进的时钟
pub struct FakeClock(AtomicU64);

impl FakeClock {
    pub fn new(now: u64) -> Self {
        Self(AtomicU64::new(now))
    }

    pub fn set(&self, now: u64) {
        self.0.store(now, Ordering::SeqCst);
    }

    pub fn advance_ms(&self, ms: u64) {
        self.0.fetch_add(ms * crate::sched::NSEC_PER_MSEC, Ordering::SeqCst);
    }
}

impl SchedClock for FakeClock {
    fn sched_clock(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

/// 记录所有发出的 IPI
pub struct FakeIpi {
    me: usize,
    sent: Mutex<Vec<(usize, IpiType)>>,
}

impl FakeIpi {
    pub fn new(this_cpu: usize) -> Self {
        Self { me: this_cpu, sent: Mutex::new(Vec::new()) }
    }

    pub fn sent(&self) -> Vec<(usize, IpiType)> {
        self.sent.lock().clone()
    }

    pub fn count_for(&self, cpu: usize) -> usize {
        self.sent.lock().iter().filter(|(c, _)| *c == cpu).count()
    }

    pub fn clear(&self) {
        self.sent.lock().clear();
    }
}

impl IpiSender for FakeIpi {
    fn this_cpu(&self) -> usize {
        self.me
    }

    fn send_ipi(&self, target_cpu: usize, ipi_type: IpiType) {
        self.sent.lock().push((target_cpu, ipi_type));
    }
}

/// 每 `cluster` 个 CPU 一个调频策略，策略首 CPU 为 policy->cpu
pub struct FakeCpufreq {
    pub present: CpuMask,
    pub cluster: usize,
    pub governor: Mutex<String>,
}

impl FakeCpufreq {
    pub fn new(present: usize, cluster: usize, governor: &str) -> Self {
        Self {
            present: CpuMask::first(present),
            cluster,
            governor: Mutex::new(String::from(governor)),
        }
    }
}

impl CpufreqSource for FakeCpufreq {
    fn present_mask(&self) -> CpuMask {
        self.present
    }

    fn policy_cpu(&self, cpu: usize) -> Option<usize> {
        if self.present.test(cpu) {
            Some(cpu - cpu % self.cluster)
        } else {
            None
        }
    }

    fn governor(&self, _policy_cpu: usize) -> Option<String> {
        Some(self.governor.lock().clone())
    }
}
