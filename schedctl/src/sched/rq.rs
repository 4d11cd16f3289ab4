//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 运行队列数据源
//!
//! 控制面只读运行队列的计数器，计数器本身归调度器所有。
//! 读取时不与调度器的并发更新做同步：得到的是尽力而为的快照，
//! 在 CPU 正在下线时可能略有偏差，这与内核直接读 cpu_rq(cpu)->nr_running 的语义一致。

/// 调度器提供的运行队列统计
///
/// 对应 Linux 的 cpu_rq(cpu) / num_online_cpus() / for_each_online_cpu()
pub trait RqSource: Send + Sync {
    /// 当前在线 CPU 集合
    fn online_mask(&self) -> super::CpuMask;

    /// `rq->nr_running`
    fn nr_running(&self, cpu: usize) -> u64;

    /// `rq->nr_switches`
    fn nr_switches(&self, cpu: usize) -> u64;

    /// sched_ext 退出类型 (`scx_exit_type`)
    fn scx_exit_type(&self) -> i32 {
        0
    }

    /// sched_ext 拒绝的任务数 (`scx_nr_rejected`)
    fn scx_nr_rejected(&self) -> i64 {
        0
    }
}

/// 调度时钟
///
/// 对应 Linux 的 sched_clock()，单调递增，单位纳秒
pub trait SchedClock: Send + Sync {
    fn sched_clock(&self) -> u64;
}

/// 每毫秒的纳秒数
pub const NSEC_PER_MSEC: u64 = 1_000_000;
