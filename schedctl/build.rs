//! schedctl 构建脚本
//!
//! 这个脚本在编译前运行，负责：
//! 1. 解析 Sched.toml 配置文件
//! 2. 生成 src/config.rs
//!
//! Sched.toml 缺失或某项缺失时使用内置默认值

use std::env;
use std::fs;
use std::path::PathBuf;

/// 读取 `[section] key` 整数项
fn get_int(config: &toml::Value, section: &str, key: &str, default: i64) -> i64 {
    config.get(section)
        .and_then(|s| s.get(key))
        .and_then(|v| v.as_integer())
        .unwrap_or(default)
}

/// 读取 `[section] key` 字符串项
fn get_str<'a>(config: &'a toml::Value, section: &str, key: &str, default: &'a str) -> &'a str {
    config.get(section)
        .and_then(|s| s.get(key))
        .and_then(|v| v.as_str())
        .unwrap_or(default)
}

fn main() {
    println!("cargo:rerun-if-changed=../Sched.toml");
    println!("cargo:rerun-if-changed=build.rs");

    let config = match fs::read_to_string("../Sched.toml") {
        Ok(content) => match toml::from_str::<toml::Value>(&content) {
            Ok(value) => value,
            Err(e) => {
                println!("cargo:warning=Sched.toml 解析失败 ({}), 使用默认配置", e);
                toml::Value::Table(toml::map::Map::new())
            }
        },
        Err(_) => {
            println!("cargo:warning=未找到 Sched.toml, 使用默认配置");
            toml::Value::Table(toml::map::Map::new())
        }
    };

    generate_config_code(&config);
}

fn generate_config_code(config: &toml::Value) {
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());

    let config_code = format!(
        r#"//! schedctl 配置（自动生成）
//!
//! 此文件由 build.rs 根据 Sched.toml 自动生成，请勿手动修改

// ============================================================
// 基本信息
// ============================================================

/// 子系统名称
pub const SCHEDCTL_NAME: &str = "{}";

/// 子系统版本
pub const SCHEDCTL_VERSION: &str = "{}";

// ============================================================
// 控制面配置
// ============================================================

/// 控制面根目录名
pub const PROC_ROOT_DIR: &str = "{}";

/// 单次写入允许的最大字节数
pub const MAX_WRITE_LEN: usize = {};

// ============================================================
// SMP 配置
// ============================================================

/// 最大CPU数量
pub const MAX_CPUS: usize = {};

// ============================================================
// 统计输出配置
// ============================================================

/// gdsq_cnt 数组槽位数
pub const STATS_GDSQ_SLOTS: usize = {};

/// pcp_* 数组槽位数
pub const STATS_PCP_SLOTS: usize = {};

/// CPU[i] 负载行数
pub const STATS_CPU_LINES: usize = {};

// ============================================================
// 自适应策略配置
// ============================================================

/// 性能阈值下限
pub const THRESHOLD_MIN: i32 = {};

/// 性能阈值上限
pub const THRESHOLD_MAX: i32 = {};

/// 性能阈值单次调整步长
pub const THRESHOLD_STEP: i32 = {};

/// 过载判定倍数（nr_running > online_cpus * OVERLOAD_FACTOR）
pub const OVERLOAD_FACTOR: u64 = {};

/// 高负载判定倍数（total_load > online_cpus * HIGH_LOAD_FACTOR）
pub const HIGH_LOAD_FACTOR: u64 = {};

// ============================================================
// cpufreq 配置
// ============================================================

/// 保存的调速器名长度（含结尾 NUL）
pub const GOVERNOR_NAME_LEN: usize = {};
"#,
        get_str(config, "general", "name", "schedctl"),
        get_str(config, "general", "version", "0.1.0"),
        get_str(config, "procfs", "root_dir", "hmbird_sched"),
        get_int(config, "procfs", "max_write_len", 16),
        get_int(config, "smp", "max_cpus", 32),
        get_int(config, "stats", "gdsq_slots", 10),
        get_int(config, "stats", "pcp_slots", 8),
        get_int(config, "stats", "cpu_lines", 8),
        get_int(config, "policy", "threshold_min", 50),
        get_int(config, "policy", "threshold_max", 95),
        get_int(config, "policy", "threshold_step", 5),
        get_int(config, "policy", "overload_factor", 2),
        get_int(config, "policy", "high_load_factor", 3),
        get_int(config, "cpufreq", "governor_name_len", 16),
    );

    let config_file = manifest_dir.join("src").join("config.rs");

    // 内容未变化时不重写，避免触发无意义的重新编译
    let unchanged = fs::read_to_string(&config_file)
        .map(|old| old == config_code)
        .unwrap_or(false);
    if !unchanged {
        fs::write(&config_file, &config_code).expect("无法写入 src/config.rs");
    }
}
