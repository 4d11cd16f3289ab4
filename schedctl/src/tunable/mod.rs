//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 可调参数 (tunables)
//!
//! 调度器在运行时可被外部读写的一组整数参数。
//! 参数集合是静态的：在这里以表的形式定义，`TunableRegistry` 为每一项分配存储。
//!
//! 目录分组（与控制面目录一一对应）：
//! - 顶层：调度类开关、CPU 控制比例等
//! - `slim_walt`：负载跟踪
//! - `slim_freq_gov`：调频
//! - `policy`：自适应负载监控的参数与派生统计

pub mod registry;

pub use registry::{SetError, TunableRegistry};

/// 参数所在的目录分组
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TunableGroup {
    /// 根目录
    Root,
    /// 负载跟踪
    LoadTrack,
    /// 调频
    FreqGov,
    /// 自适应策略
    Policy,
}

impl TunableGroup {
    /// 所有分组，按控制面创建顺序
    pub const ALL: [TunableGroup; 4] = [
        TunableGroup::Root,
        TunableGroup::LoadTrack,
        TunableGroup::FreqGov,
        TunableGroup::Policy,
    ];

    /// 分组对应的子目录名，根目录返回 None
    pub const fn dir_name(self) -> Option<&'static str> {
        match self {
            TunableGroup::Root => None,
            TunableGroup::LoadTrack => Some("slim_walt"),
            TunableGroup::FreqGov => Some("slim_freq_gov"),
            TunableGroup::Policy => Some("policy"),
        }
    }
}

/// 访问模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    ReadWrite,
    /// 只能由内部逻辑更新（派生统计）
    ReadOnly,
}

/// 参数标识
///
/// 判别值就是在 [`TUNABLES`] 中的下标
#[repr(usize)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TunableId {
    ScxEnable,
    PartialCtrl,
    CpuctrlHigh,
    CpuctrlLow,
    SlimStats,
    CoreDebug,
    SlimForApp,
    MisfitDs,
    ShadowTickEnable,
    HighresTickCtrlDbg,
    Cpu7Tl,
    CpuClusterMasks,
    SaveGov,
    Heartbeat,
    HeartbeatEnable,
    WatchdogEnable,
    IsolateCtrl,
    ParctrlHighRatio,
    ParctrlLowRatio,
    IsoctrlHighRatio,
    IsoctrlLowRatio,
    IsoFreeRescue,
    ParctrlHighRatioL,
    ParctrlLowRatioL,
    SlimWaltCtrl,
    SlimWaltDump,
    SlimWaltPolicy,
    FramePerSec,
    SlimGovDebug,
    GovCtrl,
    OptimizationEnabled,
    PerformanceThreshold,
    LoadBalanceInterval,
    PolicyTickMs,
    NrRebalance,
    LastTotalLoad,
}

impl TunableId {
    /// 对应的静态定义
    #[inline]
    pub fn def(self) -> &'static TunableDef {
        &TUNABLES[self as usize]
    }
}

/// 参数的静态定义
#[derive(Debug)]
pub struct TunableDef {
    pub id: TunableId,
    /// 控制面中的相对路径，例如 `slim_walt/frame_per_sec`
    pub path: &'static str,
    pub group: TunableGroup,
    /// 编译期默认值，每个实例都从这里开始
    pub default: i32,
    pub mode: AccessMode,
    /// 闭区间取值范围
    pub range: Option<(i32, i32)>,
}

impl TunableDef {
    /// 不带目录的文件名
    pub fn name(&self) -> &'static str {
        match self.path.rfind('/') {
            Some(idx) => &self.path[idx + 1..],
            None => self.path,
        }
    }

    /// 值是否在声明的范围内
    pub fn accepts(&self, value: i32) -> bool {
        match self.range {
            Some((min, max)) => value >= min && value <= max,
            None => true,
        }
    }

    /// 把值夹到声明的范围内
    pub fn clamp(&self, value: i32) -> i32 {
        match self.range {
            Some((min, max)) => value.clamp(min, max),
            None => value,
        }
    }
}

/// 参数数量
pub const TUNABLE_COUNT: usize = 36;

const fn rw(id: TunableId, path: &'static str, group: TunableGroup, default: i32) -> TunableDef {
    TunableDef { id, path, group, default, mode: AccessMode::ReadWrite, range: None }
}

const fn ranged(
    id: TunableId,
    path: &'static str,
    default: i32,
    min: i32,
    max: i32,
) -> TunableDef {
    TunableDef {
        id,
        path,
        group: TunableGroup::Policy,
        default,
        mode: AccessMode::ReadWrite,
        range: Some((min, max)),
    }
}

const fn derived(id: TunableId, path: &'static str) -> TunableDef {
    TunableDef {
        id,
        path,
        group: TunableGroup::Policy,
        default: 0,
        mode: AccessMode::ReadOnly,
        range: None,
    }
}

use TunableGroup::{FreqGov, LoadTrack, Root};

/// 参数表
///
/// 顺序即控制面的创建顺序，也是 `snapshot_all()` 的输出顺序
pub static TUNABLES: [TunableDef; TUNABLE_COUNT] = [
    rw(TunableId::ScxEnable, "scx_enable", Root, 0),
    rw(TunableId::PartialCtrl, "partial_ctrl", Root, 0),
    rw(TunableId::CpuctrlHigh, "cpuctrl_high", Root, 55),
    rw(TunableId::CpuctrlLow, "cpuctrl_low", Root, 40),
    rw(TunableId::SlimStats, "slim_stats", Root, 0),
    rw(TunableId::CoreDebug, "hmbirdcore_debug", Root, 0),
    rw(TunableId::SlimForApp, "slim_for_app", Root, 0),
    rw(TunableId::MisfitDs, "misfit_ds", Root, 90),
    rw(TunableId::ShadowTickEnable, "scx_shadow_tick_enable", Root, 0),
    rw(TunableId::HighresTickCtrlDbg, "highres_tick_ctrl_dbg", Root, 0),
    rw(TunableId::Cpu7Tl, "cpu7_tl", Root, 70),
    rw(TunableId::CpuClusterMasks, "cpu_cluster_masks", Root, 0),
    rw(TunableId::SaveGov, "save_gov", Root, 0),
    rw(TunableId::Heartbeat, "heartbeat", Root, 0),
    rw(TunableId::HeartbeatEnable, "heartbeat_enable", Root, 0),
    rw(TunableId::WatchdogEnable, "watchdog_enable", Root, 0),
    rw(TunableId::IsolateCtrl, "isolate_ctrl", Root, 0),
    rw(TunableId::ParctrlHighRatio, "parctrl_high_ratio", Root, 55),
    rw(TunableId::ParctrlLowRatio, "parctrl_low_ratio", Root, 40),
    rw(TunableId::IsoctrlHighRatio, "isoctrl_high_ratio", Root, 75),
    rw(TunableId::IsoctrlLowRatio, "isoctrl_low_ratio", Root, 60),
    rw(TunableId::IsoFreeRescue, "iso_free_rescue", Root, 0),
    rw(TunableId::ParctrlHighRatioL, "parctrl_high_ratio_l", Root, 65),
    rw(TunableId::ParctrlLowRatioL, "parctrl_low_ratio_l", Root, 50),
    rw(TunableId::SlimWaltCtrl, "slim_walt/slim_walt_ctrl", LoadTrack, 0),
    rw(TunableId::SlimWaltDump, "slim_walt/slim_walt_dump", LoadTrack, 0),
    rw(TunableId::SlimWaltPolicy, "slim_walt/slim_walt_policy", LoadTrack, 0),
    rw(TunableId::FramePerSec, "slim_walt/frame_per_sec", LoadTrack, 125),
    rw(TunableId::SlimGovDebug, "slim_freq_gov/slim_gov_debug", FreqGov, 0),
    rw(TunableId::GovCtrl, "slim_freq_gov/scx_gov_ctrl", FreqGov, 1),
    ranged(TunableId::OptimizationEnabled, "policy/policy_optimization_enabled", 1, 0, 1),
    ranged(
        TunableId::PerformanceThreshold,
        "policy/cpu_performance_threshold",
        80,
        crate::config::THRESHOLD_MIN,
        crate::config::THRESHOLD_MAX,
    ),
    ranged(TunableId::LoadBalanceInterval, "policy/load_balance_interval", 100, 0, 60_000),
    ranged(TunableId::PolicyTickMs, "policy/policy_tick_ms", 20, 1, 60_000),
    derived(TunableId::NrRebalance, "policy/nr_rebalance"),
    derived(TunableId::LastTotalLoad, "policy/last_total_load"),
];
