//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 参数存储
//!
//! 每个参数一个 `AtomicI32`，读写对并发读者都是原子的（不会读到撕裂的值）；
//! 不同参数之间没有任何原子性保证。

use alloc::vec::Vec;
use core::array;
use core::fmt;
use core::sync::atomic::{AtomicI32, Ordering};

use super::{AccessMode, TunableDef, TunableId, TUNABLES, TUNABLE_COUNT};
use crate::errno::Errno;
use crate::kstrtox::{kstrtoint, ParseError};

/// 外部写入被拒绝的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetError {
    /// 写入内容不合法
    Parse(ParseError),
    /// 只读参数，只能由内部逻辑更新
    ReadOnly,
}

impl fmt::Display for SetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetError::Parse(err) => write!(f, "{}", err),
            SetError::ReadOnly => write!(f, "read-only tunable"),
        }
    }
}

impl From<ParseError> for SetError {
    fn from(err: ParseError) -> Self {
        SetError::Parse(err)
    }
}

impl From<SetError> for Errno {
    fn from(err: SetError) -> Self {
        match err {
            SetError::Parse(err) => err.into(),
            SetError::ReadOnly => Errno::PermissionDenied,
        }
    }
}

/// 参数注册表，独占所有参数的存储
pub struct TunableRegistry {
    cells: [AtomicI32; TUNABLE_COUNT],
}

impl TunableRegistry {
    /// 创建注册表，所有参数取编译期默认值
    pub fn new() -> Self {
        Self {
            cells: array::from_fn(|idx| AtomicI32::new(TUNABLES[idx].default)),
        }
    }

    /// 所有参数定义
    pub fn defs(&self) -> &'static [TunableDef] {
        &TUNABLES
    }

    /// 按名字查找参数
    ///
    /// 接受文件名 (`frame_per_sec`) 或带目录的路径 (`slim_walt/frame_per_sec`)
    pub fn lookup(&self, name: &str) -> Option<TunableId> {
        TUNABLES
            .iter()
            .find(|def| def.path == name || def.name() == name)
            .map(|def| def.id)
    }

    /// 读取当前值
    #[inline]
    pub fn get(&self, id: TunableId) -> i32 {
        self.cells[id as usize].load(Ordering::SeqCst)
    }

    /// 按名字读取当前值
    pub fn get_by_name(&self, name: &str) -> Option<i32> {
        self.lookup(name).map(|id| self.get(id))
    }

    /// 解析外部写入并更新参数
    ///
    /// 失败时原值保持不变
    pub fn set(&self, id: TunableId, raw: &[u8]) -> Result<(), SetError> {
        if id.def().mode == AccessMode::ReadOnly {
            return Err(SetError::ReadOnly);
        }
        let value = kstrtoint(raw)?;
        self.set_value(id, value)
    }

    /// 写入已解析的值，检查访问模式和取值范围
    pub fn set_value(&self, id: TunableId, value: i32) -> Result<(), SetError> {
        let def = id.def();
        if def.mode == AccessMode::ReadOnly {
            return Err(SetError::ReadOnly);
        }
        if let Some((min, max)) = def.range {
            if !def.accepts(value) {
                return Err(ParseError::OutOfRange { min, max }.into());
            }
        }
        self.cells[id as usize].store(value, Ordering::SeqCst);
        Ok(())
    }

    /// 内部更新（自适应逻辑、派生统计使用）
    ///
    /// 不区分访问模式，超出范围的值被夹到范围内
    pub fn store(&self, id: TunableId, value: i32) {
        self.cells[id as usize].store(id.def().clamp(value), Ordering::SeqCst);
    }

    /// 内部计数器自增，返回新值（溢出回绕）
    pub fn increment(&self, id: TunableId) -> i32 {
        self.cells[id as usize]
            .fetch_add(1, Ordering::SeqCst)
            .wrapping_add(1)
    }

    /// 所有参数的 (路径, 值)，顺序与参数表一致
    pub fn snapshot_all(&self) -> Vec<(&'static str, i32)> {
        TUNABLES
            .iter()
            .map(|def| (def.path, self.get(def.id)))
            .collect()
    }

    /// 把所有参数恢复为默认值
    pub fn reset(&self) {
        for def in TUNABLES.iter() {
            self.cells[def.id as usize].store(def.default, Ordering::SeqCst);
        }
    }
}

impl Default for TunableRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tunable::AccessMode;
    use alloc::format;
    use alloc::sync::Arc;
    use proptest::prelude::*;

    fn unranged_rw() -> impl Strategy<Value = TunableId> {
        let ids: Vec<TunableId> = TUNABLES
            .iter()
            .filter(|d| d.mode == AccessMode::ReadWrite && d.range.is_none())
            .map(|d| d.id)
            .collect();
        proptest::sample::select(ids)
    }

    #[test]
    fn test_defaults() {
        let reg = TunableRegistry::new();
        assert_eq!(reg.get(TunableId::CpuctrlHigh), 55);
        assert_eq!(reg.get(TunableId::MisfitDs), 90);
        assert_eq!(reg.get(TunableId::FramePerSec), 125);
        assert_eq!(reg.get(TunableId::GovCtrl), 1);
        assert_eq!(reg.get(TunableId::PerformanceThreshold), 80);
        assert_eq!(reg.get(TunableId::LoadBalanceInterval), 100);
    }

    #[test]
    fn test_set_then_get() {
        let reg = TunableRegistry::new();
        reg.set(TunableId::ScxEnable, b"1\n").unwrap();
        assert_eq!(reg.get(TunableId::ScxEnable), 1);
        reg.set(TunableId::CpuClusterMasks, b"0xf0").unwrap();
        assert_eq!(reg.get(TunableId::CpuClusterMasks), 0xf0);
    }

    #[test]
    fn test_malformed_keeps_value() {
        let reg = TunableRegistry::new();
        reg.set(TunableId::CpuctrlLow, b"33").unwrap();
        for bad in [&b""[..], b"x", b"3 3", b"123456789012345678"] {
            assert_eq!(
                reg.set(TunableId::CpuctrlLow, bad),
                Err(SetError::Parse(ParseError::Malformed))
            );
            assert_eq!(reg.get(TunableId::CpuctrlLow), 33);
        }
    }

    #[test]
    fn test_out_of_range_keeps_value() {
        let reg = TunableRegistry::new();
        assert_eq!(
            reg.set(TunableId::PerformanceThreshold, b"96"),
            Err(SetError::Parse(ParseError::OutOfRange { min: 50, max: 95 }))
        );
        assert_eq!(reg.get(TunableId::PerformanceThreshold), 80);
        reg.set(TunableId::PerformanceThreshold, b"95").unwrap();
        assert_eq!(reg.get(TunableId::PerformanceThreshold), 95);
    }

    #[test]
    fn test_read_only_rejects_external_writes() {
        let reg = TunableRegistry::new();
        reg.increment(TunableId::NrRebalance);
        for id in [TunableId::NrRebalance, TunableId::LastTotalLoad] {
            let before = reg.get(id);
            assert_eq!(reg.set(id, b"42"), Err(SetError::ReadOnly));
            assert_eq!(reg.set(id, b"junk"), Err(SetError::ReadOnly));
            assert_eq!(reg.set_value(id, 42), Err(SetError::ReadOnly));
            assert_eq!(reg.get(id), before);
        }
        assert_eq!(Errno::from(SetError::ReadOnly), Errno::PermissionDenied);
        assert_eq!(
            Errno::from(SetError::Parse(ParseError::Malformed)),
            Errno::BadAddress
        );

        // 内部更新不受影响
        reg.store(TunableId::LastTotalLoad, 9);
        assert_eq!(reg.get(TunableId::LastTotalLoad), 9);
    }

    #[test]
    fn test_store_clamps() {
        let reg = TunableRegistry::new();
        reg.store(TunableId::PerformanceThreshold, 200);
        assert_eq!(reg.get(TunableId::PerformanceThreshold), 95);
        reg.store(TunableId::NrRebalance, 7);
        assert_eq!(reg.get(TunableId::NrRebalance), 7);
    }

    #[test]
    fn test_increment_wraps() {
        let reg = TunableRegistry::new();
        assert_eq!(reg.increment(TunableId::NrRebalance), 1);
        reg.store(TunableId::NrRebalance, i32::MAX);
        assert_eq!(reg.increment(TunableId::NrRebalance), i32::MIN);
    }

    #[test]
    fn test_lookup() {
        let reg = TunableRegistry::new();
        assert_eq!(reg.lookup("frame_per_sec"), Some(TunableId::FramePerSec));
        assert_eq!(reg.lookup("slim_walt/frame_per_sec"), Some(TunableId::FramePerSec));
        assert_eq!(reg.lookup("scx_gov_ctrl"), Some(TunableId::GovCtrl));
        assert_eq!(reg.lookup("nope"), None);
        assert_eq!(reg.get_by_name("misfit_ds"), Some(90));
    }

    #[test]
    fn test_snapshot_order_stable() {
        let reg = TunableRegistry::new();
        let first = reg.snapshot_all();
        reg.set(TunableId::Heartbeat, b"4").unwrap();
        let second = reg.snapshot_all();
        assert_eq!(first.len(), TUNABLE_COUNT);
        let names: Vec<_> = first.iter().map(|(n, _)| *n).collect();
        let names2: Vec<_> = second.iter().map(|(n, _)| *n).collect();
        assert_eq!(names, names2);
        assert_eq!(second[TunableId::Heartbeat as usize], ("heartbeat", 4));
    }

    #[test]
    fn test_reset() {
        let reg = TunableRegistry::new();
        reg.set(TunableId::Cpu7Tl, b"1").unwrap();
        reg.reset();
        assert_eq!(reg.get(TunableId::Cpu7Tl), 70);
    }

    #[test]
    fn test_instances_independent() {
        let a = TunableRegistry::new();
        let b = TunableRegistry::new();
        a.set(TunableId::SlimStats, b"9").unwrap();
        assert_eq!(b.get(TunableId::SlimStats), 0);
    }

    #[test]
    fn test_concurrent_writers_never_tear() {
        let reg = Arc::new(TunableRegistry::new());
        let writers: Vec<_> = [-1i32, 0x0f0f_0f0f]
            .into_iter()
            .map(|v| {
                let reg = Arc::clone(&reg);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        reg.set_value(TunableId::CpuClusterMasks, v).unwrap();
                    }
                })
            })
            .collect();
        for _ in 0..1000 {
            let seen = reg.get(TunableId::CpuClusterMasks);
            assert!(seen == 0 || seen == -1 || seen == 0x0f0f_0f0f);
        }
        for w in writers {
            w.join().unwrap();
        }
    }

    proptest! {
        #[test]
        fn set_get_roundtrip(id in unranged_rw(), v in any::<i32>()) {
            let reg = TunableRegistry::new();
            reg.set(id, format!("{}", v).as_bytes()).unwrap();
            prop_assert_eq!(reg.get(id), v);
        }

        #[test]
        fn ranged_roundtrip(v in 50i32..=95) {
            let reg = TunableRegistry::new();
            reg.set(TunableId::PerformanceThreshold, format!("{}\n", v).as_bytes()).unwrap();
            prop_assert_eq!(reg.get(TunableId::PerformanceThreshold), v);
        }

        #[test]
        fn malformed_never_writes(id in unranged_rw(), junk in "[a-z ]{0,6}|[0-9]{16,24}") {
            let reg = TunableRegistry::new();
            let before = reg.get(id);
            prop_assert_eq!(
                reg.set(id, junk.as_bytes()),
                Err(SetError::Parse(ParseError::Malformed))
            );
            prop_assert_eq!(reg.get(id), before);
        }
    }
}
