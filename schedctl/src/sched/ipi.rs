//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 跨 CPU 通知 (IPI)
//!
//! 对应 Linux 的 smp_call_function_single(cpu, func, NULL, 0)：
//! - 不带负载
//! - 不等待目标 CPU 执行（wait = 0）
//! - 不确认送达
//!
//! 控制面只用它做一件事：负载失衡时踢一下其他 CPU，让它们重新调度。

use super::CpuMask;

/// IPI 类型
///
/// 对应 Linux 的 enum ipi_msg_type
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum IpiType {
    /// 重新调度
    Reschedule = 0,
}

/// 体系结构提供的 IPI 发送能力
pub trait IpiSender: Send + Sync {
    /// 当前 CPU 编号（smp_processor_id）
    fn this_cpu(&self) -> usize;

    /// 发送 IPI 到指定 CPU
    ///
    /// 必须立即返回，不能阻塞
    fn send_ipi(&self, target_cpu: usize, ipi_type: IpiType);
}

/// 向 `targets` 中除当前 CPU 以外的所有 CPU 发送重新调度 IPI
///
/// # 返回
/// 实际发送的 IPI 数量
pub fn kick_others(sender: &dyn IpiSender, targets: CpuMask) -> usize {
    let me = sender.this_cpu();
    let mut sent = 0;
    for cpu in targets.iter().filter(|&cpu| cpu != me) {
        sender.send_ipi(cpu, IpiType::Reschedule);
        sent += 1;
    }
    sent
}
