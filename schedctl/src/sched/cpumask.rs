//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! CPU 掩码
//!
//! 对应 Linux 的 struct cpumask (include/linux/cpumask.h)，
//! 用一个 u64 表示，MAX_CPUS 不能超过 64

use core::fmt;

use crate::config::MAX_CPUS;

const _: () = assert!(MAX_CPUS <= 64, "CpuMask 只支持 64 个 CPU");

/// CPU 集合
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuMask(u64);

impl CpuMask {
    /// 空集合
    pub const fn empty() -> Self {
        Self(0)
    }

    /// 前 `n` 个 CPU（0..n）
    pub const fn first(n: usize) -> Self {
        let n = if n > MAX_CPUS { MAX_CPUS } else { n };
        if n >= 64 {
            Self(u64::MAX)
        } else {
            Self((1u64 << n) - 1)
        }
    }

    /// 从原始位图创建，超出 MAX_CPUS 的位被丢弃
    pub const fn from_bits(bits: u64) -> Self {
        Self(bits & Self::first(MAX_CPUS).0)
    }

    #[inline]
    pub const fn bits(self) -> u64 {
        self.0
    }

    /// 对应 cpumask_set_cpu()
    #[inline]
    pub fn set(&mut self, cpu: usize) {
        if cpu < MAX_CPUS {
            self.0 |= 1 << cpu;
        }
    }

    /// 对应 cpumask_clear_cpu()
    #[inline]
    pub fn clear(&mut self, cpu: usize) {
        if cpu < MAX_CPUS {
            self.0 &= !(1 << cpu);
        }
    }

    /// 对应 cpumask_test_cpu()
    #[inline]
    pub const fn test(self, cpu: usize) -> bool {
        cpu < MAX_CPUS && self.0 & (1 << cpu) != 0
    }

    /// 对应 cpumask_weight()
    #[inline]
    pub const fn weight(self) -> usize {
        self.0.count_ones() as usize
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// 按 CPU 编号从小到大遍历（for_each_cpu）
    pub fn iter(self) -> impl Iterator<Item = usize> {
        let mut bits = self.0;
        core::iter::from_fn(move || {
            if bits == 0 {
                return None;
            }
            let cpu = bits.trailing_zeros() as usize;
            bits &= bits - 1;
            Some(cpu)
        })
    }
}

impl fmt::Debug for CpuMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CpuMask({:#x})", self.0)
    }
}
