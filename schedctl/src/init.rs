//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 控制面的加载与卸载
//!
//! `SchedCtl` 持有控制面的全部状态：参数注册表、负载监控、保存的调速器、
//! 以及它在命名空间中创建的目录树。一个实例对应一次加载，测试中可以同时存在多个。
//!
//! 加载顺序：
//! 1. 创建参数注册表和负载监控
//! 2. 创建 `hmbird_sched/` 目录树，任何一步失败都删除已创建的部分
//! 3. 按在线 CPU 数量设置初始阈值和间隔
//! 4. 立即执行一轮监控
//!
//! 卸载：关闭优化开关，强制执行最后一轮，删除目录树。

use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use log::{error, info, warn};

use crate::config::{PROC_ROOT_DIR, SCHEDCTL_NAME, SCHEDCTL_VERSION};
use crate::cpufreq::{CpufreqSource, SavedGovernors};
use crate::errno::Errno;
use crate::procfs::{ProcFs, ProcNode, ProcOps, ProcPerm, SaveGovOps, StatsOps, TunableOps};
use crate::sched::{
    hotplug, CpuEvent, IpiSender, LoadMonitor, PassOutcome, PassReport, PolicyTimer, RqSource,
    SchedClock,
};
use crate::stats;
use crate::tunable::{AccessMode, TunableGroup, TunableId, TunableRegistry};

/// 统计文件名
pub const STATS_FILE: &str = "hmbird_stats";

/// 加载失败
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitError {
    /// 目录或文件创建失败
    DirectoryCreateFailed { name: &'static str },
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitError::DirectoryCreateFailed { name } => {
                write!(f, "failed to create proc entry '{}'", name)
            }
        }
    }
}

impl From<InitError> for Errno {
    fn from(_: InitError) -> Self {
        Errno::OutOfMemory
    }
}

/// 控制面实例
pub struct SchedCtl {
    procfs: Arc<ProcFs>,
    registry: Arc<TunableRegistry>,
    monitor: Arc<LoadMonitor>,
    rq: Arc<dyn RqSource>,
    clock: Arc<dyn SchedClock>,
    saved_governors: Arc<SavedGovernors>,
    timer: PolicyTimer,
}

impl SchedCtl {
    /// 加载控制面
    pub fn init(
        procfs: Arc<ProcFs>,
        rq: Arc<dyn RqSource>,
        clock: Arc<dyn SchedClock>,
        ipi: Arc<dyn IpiSender>,
        cpufreq: Arc<dyn CpufreqSource>,
    ) -> Result<Self, InitError> {
        let registry = Arc::new(TunableRegistry::new());
        let monitor = Arc::new(LoadMonitor::new(
            registry.clone(),
            rq.clone(),
            clock.clone(),
            ipi,
        ));
        let saved_governors = Arc::new(SavedGovernors::new());

        let ctl = Self {
            procfs,
            registry,
            monitor,
            rq,
            clock,
            saved_governors,
            timer: PolicyTimer::new(),
        };

        if let Err(err) = ctl.register(cpufreq) {
            error!("{}: {}", SCHEDCTL_NAME, err);
            return Err(err);
        }

        ctl.monitor.apply_sizing();
        ctl.monitor.on_event(CpuEvent::Tick);

        info!(
            "{} {}: loaded, {} tunables under /proc/{}",
            SCHEDCTL_NAME,
            SCHEDCTL_VERSION,
            ctl.registry.defs().len(),
            PROC_ROOT_DIR
        );
        Ok(ctl)
    }

    /// 创建目录树
    fn register(&self, cpufreq: Arc<dyn CpufreqSource>) -> Result<(), InitError> {
        // 根目录已存在说明不是我们创建的，不能删除
        let root = self
            .procfs
            .proc_mkdir(PROC_ROOT_DIR, None)
            .ok_or(InitError::DirectoryCreateFailed { name: PROC_ROOT_DIR })?;

        let result = self.populate(&root, cpufreq);
        if result.is_err() {
            let _ = self.procfs.remove_subtree(PROC_ROOT_DIR, None);
        }
        result
    }

    fn populate(
        &self,
        root: &Arc<ProcNode>,
        cpufreq: Arc<dyn CpufreqSource>,
    ) -> Result<(), InitError> {
        let mut dirs = Vec::new();
        for group in TunableGroup::ALL {
            let dir = match group.dir_name() {
                None => root.clone(),
                Some(name) => self
                    .procfs
                    .proc_mkdir(name, Some(root))
                    .ok_or(InitError::DirectoryCreateFailed { name })?,
            };
            dirs.push((group, dir));
        }

        for def in self.registry.defs() {
            let Some((_, dir)) = dirs.iter().find(|(group, _)| *group == def.group) else {
                return Err(InitError::DirectoryCreateFailed { name: def.path });
            };
            let perm = match def.mode {
                AccessMode::ReadWrite => ProcPerm::RW,
                AccessMode::ReadOnly => ProcPerm::RO,
            };
            let ops: Arc<dyn ProcOps> = match def.id {
                TunableId::SaveGov => Arc::new(SaveGovOps::new(
                    self.registry.clone(),
                    self.saved_governors.clone(),
                    cpufreq.clone(),
                )),
                id => Arc::new(TunableOps::new(self.registry.clone(), id)),
            };
            self.procfs
                .proc_create(def.name(), perm, Some(dir), ops)
                .ok_or(InitError::DirectoryCreateFailed { name: def.path })?;
        }

        let stats_ops = Arc::new(StatsOps::new(
            self.registry.clone(),
            self.monitor.clone(),
            self.rq.clone(),
            self.clock.clone(),
        ));
        self.procfs
            .proc_create(STATS_FILE, ProcPerm::RO, Some(root), stats_ops)
            .ok_or(InitError::DirectoryCreateFailed { name: STATS_FILE })?;
        Ok(())
    }

    /// CPU 上线/下线/tick 事件入口
    pub fn on_event(&self, event: CpuEvent) -> PassOutcome {
        hotplug::notify(&self.monitor, event)
    }

    /// 由时钟中断调用，每 `policy_tick_ms` 毫秒产生一次 tick 事件
    pub fn scheduler_tick(&self) -> Option<PassOutcome> {
        let now = self.clock.sched_clock();
        let period = self.registry.get(TunableId::PolicyTickMs);
        if self.timer.expired(now, period) {
            Some(self.on_event(CpuEvent::Tick))
        } else {
            None
        }
    }

    pub fn registry(&self) -> &Arc<TunableRegistry> {
        &self.registry
    }

    pub fn monitor(&self) -> &Arc<LoadMonitor> {
        &self.monitor
    }

    pub fn saved_governors(&self) -> &Arc<SavedGovernors> {
        &self.saved_governors
    }

    /// 当前统计报告
    pub fn stats(&self) -> String {
        stats::render(
            &self.registry,
            &self.monitor,
            &*self.rq,
            self.clock.sched_clock(),
        )
    }

    /// 卸载控制面
    ///
    /// 返回最后一轮监控的结果
    pub fn exit(self) -> PassReport {
        self.monitor.set_optimization_enabled(false);
        let report = self.monitor.force_pass();
        if let Err(err) = self.procfs.remove_subtree(PROC_ROOT_DIR, None) {
            warn!("{}: remove /proc/{}: {}", SCHEDCTL_NAME, PROC_ROOT_DIR, err);
        }
        info!(
            "{}: unloaded, {} rebalances",
            SCHEDCTL_NAME,
            self.registry.get(TunableId::NrRebalance)
        );
        report
    }
}
