//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 统计快照 (`hmbird_stats`)
//!
//! 每次读取都重新采样运行队列并生成完整报告，不修改任何状态。
//! 前半部分的行格式和顺序保持不变，已有的解析脚本依赖它；
//! 固定长度的数组块对离线或越界的 CPU 补 0，行数始终一致。

use alloc::string::String;
use core::fmt::{self, Write};

use crate::config::{STATS_CPU_LINES, STATS_GDSQ_SLOTS, STATS_PCP_SLOTS};
use crate::sched::{LoadMonitor, LoadSample, RqSource};
use crate::tunable::{TunableId, TunableRegistry};

/// 生成统计报告
pub fn render(
    registry: &TunableRegistry,
    monitor: &LoadMonitor,
    rq: &dyn RqSource,
    now: u64,
) -> String {
    let mut out = String::new();
    write_report(&mut out, registry, monitor, rq, now).ok();
    out
}

fn write_report(
    m: &mut impl Write,
    registry: &TunableRegistry,
    monitor: &LoadMonitor,
    rq: &dyn RqSource,
    now: u64,
) -> fmt::Result {
    let sample = LoadSample::collect(rq, now);
    let online_cpus = sample.online_cpus();
    let total_running = sample.total_running();
    let total_switches = sample.total_switches();
    let avg_load = sample.avg_load_per_cpu();

    writeln!(m, "global stat:{}, {}", total_running, now)?;
    writeln!(m, "cpu_allow_fail:0, {}", online_cpus)?;
    writeln!(m, "rt_cnt:{}, {}", total_switches, avg_load)?;
    for name in [
        "key_task_cnt",
        "switch_idx",
        "timeout_cnt",
        "total_dsp_cnt",
        "move_rq_cnt",
        "select_cpu",
    ] {
        writeln!(m, "{}:0, 0", name)?;
    }

    for i in 0..STATS_GDSQ_SLOTS {
        let cpu = sample.cpu(i);
        writeln!(m, "gdsq_cnt[{}]:{}, {}", i, cpu.nr_running, cpu.nr_switches & 0xFFFF)?;
    }

    writeln!(m, "err_idx:0, 0, 0, 0, 0")?;

    for i in 0..STATS_PCP_SLOTS {
        let util = if sample.cpu(i).nr_running > 0 { now % 1000 } else { 0 };
        writeln!(m, "pcp_timeout_cnt[{}]:{}", i, util)?;
    }
    for i in 0..STATS_PCP_SLOTS {
        let (load, ratio) = if sample.online.test(i) {
            (sample.cpu(i).nr_running, (now >> 10) % 100)
        } else {
            (0, 0)
        };
        writeln!(m, "pcp_ldsq_cnt[{}]:{}, {}", i, load, ratio)?;
    }
    for i in 0..STATS_PCP_SLOTS {
        writeln!(m, "pcp_enql_cnt[{}]:{}", i, (sample.cpu(i).nr_switches >> 8) & 0xFF)?;
    }

    let get = |id| registry.get(id);
    writeln!(m, "SCX Enabled: {}", get(TunableId::ScxEnable))?;
    writeln!(m, "Partial Enable: {}", get(TunableId::PartialCtrl))?;
    writeln!(m, "Slim Stats: {}", get(TunableId::SlimStats))?;
    writeln!(m, "Heartbeat: {}", get(TunableId::Heartbeat))?;
    writeln!(m, "Misfit DS: {}", get(TunableId::MisfitDs))?;
    writeln!(m, "Highres Tick Ctrl: {}", get(TunableId::ShadowTickEnable) as u32)?;
    writeln!(m, "Watchdog Enable: {}", get(TunableId::WatchdogEnable))?;

    writeln!(m, "SCX Exit Type: {}", rq.scx_exit_type())?;
    writeln!(m, "SCX Rejected Tasks: {}", rq.scx_nr_rejected())?;

    writeln!(m, "Sched Ravg Window Frame Per Sec: {}", get(TunableId::FramePerSec))?;

    writeln!(m, "Total Online CPUs: {}", online_cpus)?;
    writeln!(m, "Total Running Tasks: {}", total_running)?;
    writeln!(m, "Average Load Per CPU: {}", avg_load)?;
    writeln!(m, "Total Context Switches: {}", total_switches)?;
    writeln!(m, "System Uptime Ticks: {}", now >> 20)?;

    for i in 0..STATS_CPU_LINES {
        let cpu = sample.cpu(i);
        writeln!(
            m,
            "CPU[{}] Load: {}, Switches: {}",
            i,
            cpu.nr_running,
            cpu.nr_switches & 0xFF_FFFF
        )?;
    }

    writeln!(m, "CPU Control High Ratio: {}", get(TunableId::CpuctrlHigh))?;
    writeln!(m, "CPU Control Low Ratio: {}", get(TunableId::CpuctrlLow))?;
    writeln!(m, "Isolation Control: {}", get(TunableId::IsolateCtrl))?;
    writeln!(m, "Governor Control: {}", get(TunableId::GovCtrl))?;

    // 自适应状态
    writeln!(m, "Performance Threshold: {}", monitor.performance_threshold())?;
    writeln!(m, "Load Balance Interval: {}", monitor.rebalance_interval_ms())?;
    writeln!(m, "Policy Optimization: {}", monitor.optimization_enabled() as i32)?;
    writeln!(
        m,
        "Last Optimization Time: {}",
        monitor.last_optimization_time().unwrap_or(0)
    )?;
    writeln!(m, "Rebalance Count: {}", get(TunableId::NrRebalance))?;

    for (path, value) in registry.snapshot_all() {
        writeln!(m, "{}:{}", path, value)?;
    }
    Ok(())
}
