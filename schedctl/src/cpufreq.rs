//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 调速器保存
//!
//! 写 `slim_freq_gov/save_gov` 时，把每个调频策略当前使用的调速器名记下来，
//! 供之后切换回原调速器时使用。每个策略只记录在它的首 CPU (policy->cpu) 上。

use alloc::string::String;
use core::str;

use log::{debug, warn};
use spin::Mutex;

use crate::config::{GOVERNOR_NAME_LEN, MAX_CPUS};
use crate::sched::CpuMask;

/// cpufreq 子系统提供的只读信息
///
/// 对应 Linux 的 cpufreq_cpu_get() / policy->governor->name
pub trait CpufreqSource: Send + Sync {
    /// 存在的 CPU 集合（for_each_present_cpu）
    fn present_mask(&self) -> CpuMask;

    /// `cpu` 所属策略的首 CPU，没有策略返回 None
    fn policy_cpu(&self, cpu: usize) -> Option<usize>;

    /// 策略当前的调速器名
    fn governor(&self, policy_cpu: usize) -> Option<String>;
}

type GovName = [u8; GOVERNOR_NAME_LEN];

/// 按 CPU 保存的调速器名
pub struct SavedGovernors {
    table: Mutex<[GovName; MAX_CPUS]>,
}

impl SavedGovernors {
    pub const fn new() -> Self {
        Self {
            table: Mutex::new([[0; GOVERNOR_NAME_LEN]; MAX_CPUS]),
        }
    }

    /// 记录所有策略当前的调速器
    ///
    /// 名字超过 GOVERNOR_NAME_LEN - 1 字节时截断
    ///
    /// # 返回
    /// 记录的策略数量
    pub fn save_all(&self, src: &dyn CpufreqSource) -> usize {
        let mut table = self.table.lock();
        let mut saved = 0;
        for cpu in src.present_mask().iter() {
            let Some(policy_cpu) = src.policy_cpu(cpu) else {
                continue;
            };
            if policy_cpu != cpu {
                continue;
            }
            let Some(name) = src.governor(policy_cpu) else {
                warn!("cpufreq: policy{} has no governor", policy_cpu);
                continue;
            };

            let slot = &mut table[cpu];
            *slot = [0; GOVERNOR_NAME_LEN];
            let len = truncated_len(&name);
            slot[..len].copy_from_slice(&name.as_bytes()[..len]);
            debug!("cpufreq: saved governor '{}' for policy{}", &name[..len], cpu);
            saved += 1;
        }
        saved
    }

    /// 读取保存的调速器名
    pub fn get(&self, cpu: usize) -> Option<String> {
        if cpu >= MAX_CPUS {
            return None;
        }
        let table = self.table.lock();
        let slot = &table[cpu];
        let len = slot.iter().position(|&b| b == 0).unwrap_or(GOVERNOR_NAME_LEN);
        if len == 0 {
            return None;
        }
        str::from_utf8(&slot[..len]).ok().map(String::from)
    }

    pub fn clear(&self) {
        *self.table.lock() = [[0; GOVERNOR_NAME_LEN]; MAX_CPUS];
    }
}

impl Default for SavedGovernors {
    fn default() -> Self {
        Self::new()
    }
}

/// 截断到 GOVERNOR_NAME_LEN - 1 字节，不切断 UTF-8 字符
fn truncated_len(name: &str) -> usize {
    let mut len = name.len().min(GOVERNOR_NAME_LEN - 1);
    while !name.is_char_boundary(len) {
        len -= 1;
    }
    len
}
