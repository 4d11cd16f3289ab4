//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 自适应负载监控
//!
//! 由外部事件（CPU 上线、CPU 下线、周期 tick）驱动，没有自己的线程。
//! 每次事件执行一轮：
//!
//! 1. 限流：距上一轮不足 `load_balance_interval` 毫秒直接返回
//! 2. 采样：汇总在线 CPU 的 nr_running / nr_switches
//! 3. 过载检测：nr_running > online_cpus * 2 的 CPU 视为过载，
//!    若开启优化则向其他所有在线 CPU 发送重新调度 IPI
//! 4. 阈值调整：总负载 > online_cpus * 3 时阈值 +5（上限 95），
//!    总负载 < online_cpus 时阈值 -5（下限 50），每轮最多一步
//!
//! 限流的"检查 + 更新时间戳"是一次 CAS：并发调用时只有一个调用者能进入采样，
//! 其余调用者视为被限流。

use alloc::sync::Arc;
use core::sync::atomic::{AtomicU64, Ordering};

use log::{debug, info};

use super::hotplug::CpuEvent;
use super::ipi::{self, IpiSender};
use super::load::LoadSample;
use super::rq::{RqSource, SchedClock, NSEC_PER_MSEC};
use super::CpuMask;
use crate::config::{HIGH_LOAD_FACTOR, THRESHOLD_MAX, THRESHOLD_MIN, THRESHOLD_STEP};
use crate::tunable::{TunableId, TunableRegistry};

/// `last_optimization_time` 的"从未执行"标记
const NEVER: u64 = u64::MAX;

/// 按 CPU 数量选择初始参数的一档
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizingTier {
    /// 在线 CPU 数量下限（含）
    pub min_cpus: u64,
    pub threshold: i32,
    /// 毫秒
    pub interval_ms: i32,
}

/// 初始参数表，从大到小匹配
pub const SIZING_TIERS: [SizingTier; 3] = [
    SizingTier { min_cpus: 8, threshold: 85, interval_ms: 50 },
    SizingTier { min_cpus: 4, threshold: 75, interval_ms: 75 },
    SizingTier { min_cpus: 0, threshold: 70, interval_ms: 100 },
];

/// 选择在线 CPU 数量对应的一档
pub fn sizing_for(online_cpus: u64) -> &'static SizingTier {
    SIZING_TIERS
        .iter()
        .find(|tier| online_cpus >= tier.min_cpus)
        .unwrap_or(&SIZING_TIERS[SIZING_TIERS.len() - 1])
}

/// 单步阈值调整
///
/// 不带迟滞，每轮最多移动一个步长，结果始终在 [THRESHOLD_MIN, THRESHOLD_MAX] 内
pub fn adapt_threshold(current: i32, total_load: u64, online_cpus: u64) -> i32 {
    let next = if total_load > online_cpus.saturating_mul(HIGH_LOAD_FACTOR) {
        current.saturating_add(THRESHOLD_STEP).min(THRESHOLD_MAX)
    } else if total_load < online_cpus {
        current.saturating_sub(THRESHOLD_STEP).max(THRESHOLD_MIN)
    } else {
        current
    };
    next.clamp(THRESHOLD_MIN, THRESHOLD_MAX)
}

/// 一轮采样的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassReport {
    pub timestamp: u64,
    pub online_cpus: u64,
    pub total_load: u64,
    pub overloaded: CpuMask,
    /// 发送的重新调度 IPI 数量
    pub kicked: usize,
    pub threshold_before: i32,
    pub threshold_after: i32,
}

/// 事件处理结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassOutcome {
    /// 被限流，什么也没做
    Throttled,
    Completed(PassReport),
}

impl PassOutcome {
    pub fn is_throttled(&self) -> bool {
        matches!(self, PassOutcome::Throttled)
    }

    pub fn report(&self) -> Option<&PassReport> {
        match self {
            PassOutcome::Throttled => None,
            PassOutcome::Completed(report) => Some(report),
        }
    }
}

/// 自适应负载监控
///
/// 阈值、间隔、开关都存放在参数注册表的 `policy` 组中，
/// 外部写入立即对下一轮生效；本结构只持有限流时间戳。
pub struct LoadMonitor {
    registry: Arc<TunableRegistry>,
    rq: Arc<dyn RqSource>,
    clock: Arc<dyn SchedClock>,
    ipi: Arc<dyn IpiSender>,
    last_optimization_time: AtomicU64,
}

impl LoadMonitor {
    pub fn new(
        registry: Arc<TunableRegistry>,
        rq: Arc<dyn RqSource>,
        clock: Arc<dyn SchedClock>,
        ipi: Arc<dyn IpiSender>,
    ) -> Self {
        Self {
            registry,
            rq,
            clock,
            ipi,
            last_optimization_time: AtomicU64::new(NEVER),
        }
    }

    /// 上一轮采样的时间，从未执行过返回 None
    pub fn last_optimization_time(&self) -> Option<u64> {
        match self.last_optimization_time.load(Ordering::Acquire) {
            NEVER => None,
            t => Some(t),
        }
    }

    #[inline]
    pub fn performance_threshold(&self) -> i32 {
        self.registry.get(TunableId::PerformanceThreshold)
    }

    #[inline]
    pub fn rebalance_interval_ms(&self) -> i32 {
        self.registry.get(TunableId::LoadBalanceInterval)
    }

    #[inline]
    pub fn optimization_enabled(&self) -> bool {
        self.registry.get(TunableId::OptimizationEnabled) != 0
    }

    pub fn set_optimization_enabled(&self, enabled: bool) {
        self.registry.store(TunableId::OptimizationEnabled, enabled as i32);
    }

    /// 按当前在线 CPU 数量设置初始阈值和间隔
    pub fn apply_sizing(&self) -> &'static SizingTier {
        let online = self.rq.online_mask().weight() as u64;
        let tier = sizing_for(online);
        self.registry.store(TunableId::PerformanceThreshold, tier.threshold);
        self.registry.store(TunableId::LoadBalanceInterval, tier.interval_ms);
        info!(
            "policy: {} online CPUs, threshold={}%, interval={}ms",
            online, tier.threshold, tier.interval_ms
        );
        tier
    }

    /// 处理一个外部事件
    pub fn on_event(&self, event: CpuEvent) -> PassOutcome {
        let now = self.clock.sched_clock();
        if !self.try_enter(now) {
            debug!("policy: {:?} throttled", event);
            return PassOutcome::Throttled;
        }
        PassOutcome::Completed(self.run_pass(now))
    }

    /// 跳过限流强制执行一轮（卸载时使用）
    pub fn force_pass(&self) -> PassReport {
        let now = self.clock.sched_clock();
        self.last_optimization_time.store(now, Ordering::Release);
        self.run_pass(now)
    }

    /// 限流门：检查间隔并原子地占用本轮
    fn try_enter(&self, now: u64) -> bool {
        let interval_ns = self.rebalance_interval_ms().max(0) as u64 * NSEC_PER_MSEC;
        let last = self.last_optimization_time.load(Ordering::Acquire);
        if last != NEVER && now.saturating_sub(last) < interval_ns {
            return false;
        }
        self.last_optimization_time
            .compare_exchange(last, now, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn run_pass(&self, now: u64) -> PassReport {
        let sample = LoadSample::collect(&*self.rq, now);
        let online_cpus = sample.online_cpus();
        let total_load = sample.total_running();
        let overloaded = sample.overloaded();

        for cpu in overloaded.iter() {
            debug!(
                "policy: CPU {} overloaded: {} tasks",
                cpu,
                sample.cpu(cpu).nr_running
            );
        }

        let mut kicked = 0;
        if !overloaded.is_empty() && self.optimization_enabled() {
            info!("policy: Triggering system-wide load rebalancing");
            kicked = ipi::kick_others(&*self.ipi, sample.online);
            self.registry.increment(TunableId::NrRebalance);
        }

        let threshold_before = self.performance_threshold();
        let threshold_after = adapt_threshold(threshold_before, total_load, online_cpus);
        if threshold_after != threshold_before {
            self.registry
                .store(TunableId::PerformanceThreshold, threshold_after);
            debug!(
                "policy: threshold {}% -> {}% (load {} on {} CPUs)",
                threshold_before, threshold_after, total_load, online_cpus
            );
        }

        self.registry.store(
            TunableId::LastTotalLoad,
            total_load.min(i32::MAX as u64) as i32,
        );

        PassReport {
            timestamp: now,
            online_cpus,
            total_load,
            overloaded,
            kicked,
            threshold_before,
            threshold_after,
        }
    }
}
