//! schedctl 配置（自动生成）
//!
//! 此文件由 build.rs 根据 Sched.toml 自动生成，请勿手动修改

// ============================================================
// 基本信息
// ============================================================

/// 子系统名称
pub const SCHEDCTL_NAME: &str = "schedctl";

/// 子系统版本
pub const SCHEDCTL_VERSION: &str = "0.1.0";

// ============================================================
// 控制面配置
// ============================================================

/// 控制面根目录名
pub const PROC_ROOT_DIR: &str = "hmbird_sched";

/// 单次写入允许的最大字节数
pub const MAX_WRITE_LEN: usize = 16;

// ============================================================
// SMP 配置
// ============================================================

/// 最大CPU数量
pub const MAX_CPUS: usize = 32;

// ============================================================
// 统计输出配置
// ============================================================

/// gdsq_cnt 数组槽位数
pub const STATS_GDSQ_SLOTS: usize = 10;

/// pcp_* 数组槽位数
pub const STATS_PCP_SLOTS: usize = 8;

/// CPU[i] 负载行数
pub const STATS_CPU_LINES: usize = 8;

// ============================================================
// 自适应策略配置
// ============================================================

/// 性能阈值下限
pub const THRESHOLD_MIN: i32 = 50;

/// 性能阈值上限
pub const THRESHOLD_MAX: i32 = 95;

/// 性能阈值单次调整步长
pub const THRESHOLD_STEP: i32 = 5;

/// 过载判定倍数（nr_running > online_cpus * OVERLOAD_FACTOR）
pub const OVERLOAD_FACTOR: u64 = 2;

/// 高负载判定倍数（total_load > online_cpus * HIGH_LOAD_FACTOR）
pub const HIGH_LOAD_FACTOR: u64 = 3;

// ============================================================
// cpufreq 配置
// ============================================================

/// 保存的调速器名长度（含结尾 NUL）
pub const GOVERNOR_NAME_LEN: usize = 16;
