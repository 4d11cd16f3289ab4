//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 策略定时器
//!
//! 硬件时钟中断比策略周期频繁得多，这里把每次 scheduler_tick 折算成
//! 每 `policy_tick_ms` 毫秒一次的 `CpuEvent::Tick`。
//! 多个 CPU 同时 tick 时只有一个能拿到本周期。

use core::sync::atomic::{AtomicU64, Ordering};

use super::rq::NSEC_PER_MSEC;

pub struct PolicyTimer {
    /// 下一次到期时间（纳秒），0 表示尚未启动
    next_deadline: AtomicU64,
}

impl PolicyTimer {
    pub const fn new() -> Self {
        Self {
            next_deadline: AtomicU64::new(0),
        }
    }

    /// 检查本周期是否到期，到期时原子地推进下一次到期时间
    pub fn expired(&self, now: u64, period_ms: i32) -> bool {
        let period = (period_ms.max(1) as u64).saturating_mul(NSEC_PER_MSEC);
        let deadline = self.next_deadline.load(Ordering::Acquire);
        if deadline != 0 && now < deadline {
            return false;
        }
        self.next_deadline
            .compare_exchange(
                deadline,
                now.saturating_add(period),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    pub fn next_deadline(&self) -> Option<u64> {
        match self.next_deadline.load(Ordering::Acquire) {
            0 => None,
            t => Some(t),
        }
    }
}

impl Default for PolicyTimer {
    fn default() -> Self {
        Self::new()
    }
}
