//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 控制面命名空间
//!
//! 仿照 /proc 的层次结构，每个参数是一个可读写的文件：
//! - 读：返回 `"<十进制值>\n"`
//! - 写：按 kstrtoint 解析，成功返回写入长度
//!
//! 目录结构：
//! ```text
//! hmbird_sched/
//! ├── scx_enable ... parctrl_low_ratio_l
//! ├── hmbird_stats
//! ├── slim_walt/
//! ├── slim_freq_gov/
//! └── policy/
//! ```
//!
//! 只模拟命名空间本身，不涉及真正的 VFS 注册。

use alloc::format;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};

use bitflags::bitflags;
use log::{debug, warn};
use spin::Mutex;

use crate::cpufreq::{CpufreqSource, SavedGovernors};
use crate::errno::Errno;
use crate::kstrtox::ParseError;
use crate::sched::{LoadMonitor, RqSource, SchedClock};
use crate::stats;
use crate::tunable::{SetError, TunableId, TunableRegistry};

bitflags! {
    /// 文件权限位
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ProcPerm: u16 {
        const S_IRUSR = 0o400;
        const S_IWUSR = 0o200;
        const S_IRGRP = 0o040;
        const S_IWGRP = 0o020;
        const S_IROTH = 0o004;
        const S_IWOTH = 0o002;

        /// 可读写参数
        const RW = 0o666;
        /// 只读参数和统计
        const RO = 0o444;
    }
}

impl ProcPerm {
    #[inline]
    pub fn readable(self) -> bool {
        self.contains(ProcPerm::S_IRUSR)
    }

    #[inline]
    pub fn writable(self) -> bool {
        self.contains(ProcPerm::S_IWUSR)
    }
}

/// 控制面读写错误
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlError {
    /// 路径不存在
    NoEntry,
    /// 对目录读写
    IsDirectory,
    /// 写只读文件或读不可读文件
    PermissionDenied,
    /// 写入内容不合法
    Parse(ParseError),
}

impl fmt::Display for ControlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlError::NoEntry => write!(f, "no such entry"),
            ControlError::IsDirectory => write!(f, "is a directory"),
            ControlError::PermissionDenied => write!(f, "permission denied"),
            ControlError::Parse(err) => write!(f, "{}", err),
        }
    }
}

impl From<ParseError> for ControlError {
    fn from(err: ParseError) -> Self {
        ControlError::Parse(err)
    }
}

impl From<SetError> for ControlError {
    fn from(err: SetError) -> Self {
        match err {
            SetError::Parse(err) => ControlError::Parse(err),
            SetError::ReadOnly => ControlError::PermissionDenied,
        }
    }
}

impl From<ControlError> for Errno {
    fn from(err: ControlError) -> Self {
        match err {
            ControlError::NoEntry => Errno::NoSuchFileOrDirectory,
            ControlError::IsDirectory => Errno::IsADirectory,
            ControlError::PermissionDenied => Errno::PermissionDenied,
            ControlError::Parse(err) => err.into(),
        }
    }
}

/// 文件操作
///
/// 对应 Linux 的 struct proc_ops 中的 show / write
pub trait ProcOps: Send + Sync {
    /// 生成文件内容
    fn show(&self) -> Vec<u8>;

    /// 处理写入，返回消耗的字节数
    fn write(&self, _buf: &[u8]) -> Result<usize, ControlError> {
        Err(ControlError::PermissionDenied)
    }
}

/// 节点类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcNodeType {
    Directory,
    RegularFile,
}

/// 命名空间节点
pub struct ProcNode {
    pub name: String,
    pub node_type: ProcNodeType,
    pub perm: ProcPerm,
    ops: Option<Arc<dyn ProcOps>>,
    children: Mutex<Vec<Arc<ProcNode>>>,
    pub ino: u64,
}

impl ProcNode {
    fn new_dir(name: &str, ino: u64) -> Self {
        Self {
            name: String::from(name),
            node_type: ProcNodeType::Directory,
            perm: ProcPerm::from_bits_truncate(0o555),
            ops: None,
            children: Mutex::new(Vec::new()),
            ino,
        }
    }

    fn new_file(name: &str, perm: ProcPerm, ops: Arc<dyn ProcOps>, ino: u64) -> Self {
        Self {
            name: String::from(name),
            node_type: ProcNodeType::RegularFile,
            perm,
            ops: Some(ops),
            children: Mutex::new(Vec::new()),
            ino,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.node_type == ProcNodeType::Directory
    }

    pub fn find_child(&self, name: &str) -> Option<Arc<ProcNode>> {
        self.children
            .lock()
            .iter()
            .find(|child| child.name == name)
            .cloned()
    }

    /// 添加子节点，同名节点已存在时失败
    fn add_child(&self, child: Arc<ProcNode>) -> bool {
        let mut children = self.children.lock();
        if children.iter().any(|c| c.name == child.name) {
            return false;
        }
        children.push(child);
        true
    }

    fn remove_child(&self, name: &str) -> Option<Arc<ProcNode>> {
        let mut children = self.children.lock();
        let idx = children.iter().position(|c| c.name == name)?;
        Some(children.remove(idx))
    }

    pub fn list_children(&self) -> Vec<(String, ProcNodeType, u64)> {
        self.children
            .lock()
            .iter()
            .map(|c| (c.name.clone(), c.node_type, c.ino))
            .collect()
    }
}

/// 控制面命名空间
pub struct ProcFs {
    root_node: Arc<ProcNode>,
    next_ino: AtomicU64,
}

impl ProcFs {
    pub fn new() -> Self {
        Self {
            root_node: Arc::new(ProcNode::new_dir("/", 1)),
            next_ino: AtomicU64::new(2),
        }
    }

    fn alloc_ino(&self) -> u64 {
        self.next_ino.fetch_add(1, Ordering::Relaxed)
    }

    pub fn root(&self) -> &Arc<ProcNode> {
        &self.root_node
    }

    /// 创建目录，`parent` 为 None 时创建在根下
    ///
    /// 名字非法或已存在时返回 None
    pub fn proc_mkdir(&self, name: &str, parent: Option<&Arc<ProcNode>>) -> Option<Arc<ProcNode>> {
        let parent = parent.unwrap_or(&self.root_node);
        if !valid_name(name) || !parent.is_dir() {
            return None;
        }
        let dir = Arc::new(ProcNode::new_dir(name, self.alloc_ino()));
        parent.add_child(dir.clone()).then_some(dir)
    }

    /// 创建文件
    pub fn proc_create(
        &self,
        name: &str,
        perm: ProcPerm,
        parent: Option<&Arc<ProcNode>>,
        ops: Arc<dyn ProcOps>,
    ) -> Option<Arc<ProcNode>> {
        let parent = parent.unwrap_or(&self.root_node);
        if !valid_name(name) || !parent.is_dir() {
            return None;
        }
        let file = Arc::new(ProcNode::new_file(name, perm, ops, self.alloc_ino()));
        parent.add_child(file.clone()).then_some(file)
    }

    /// 按路径查找，路径相对于根，多余的 `/` 被忽略
    pub fn lookup(&self, path: &str) -> Option<Arc<ProcNode>> {
        let mut current = self.root_node.clone();
        for component in path.split('/').filter(|s| !s.is_empty()) {
            current = current.find_child(component)?;
        }
        Some(current)
    }

    /// 读取文件
    pub fn read(&self, path: &str) -> Result<Vec<u8>, ControlError> {
        let node = self.lookup(path).ok_or(ControlError::NoEntry)?;
        if node.is_dir() {
            return Err(ControlError::IsDirectory);
        }
        if !node.perm.readable() {
            return Err(ControlError::PermissionDenied);
        }
        Ok(node.ops.as_ref().map(|ops| ops.show()).unwrap_or_default())
    }

    /// 写入文件
    pub fn write(&self, path: &str, buf: &[u8]) -> Result<usize, ControlError> {
        let node = self.lookup(path).ok_or(ControlError::NoEntry)?;
        if node.is_dir() {
            return Err(ControlError::IsDirectory);
        }
        if !node.perm.writable() {
            return Err(ControlError::PermissionDenied);
        }
        match node.ops.as_ref() {
            Some(ops) => ops.write(buf),
            None => Err(ControlError::PermissionDenied),
        }
    }

    /// 列出目录
    pub fn list_dir(&self, path: &str) -> Option<Vec<(String, ProcNodeType, u64)>> {
        let node = self.lookup(path)?;
        node.is_dir().then(|| node.list_children())
    }

    /// 删除 `parent` 下名为 `name` 的节点及其所有子节点
    ///
    /// 对应 Linux 的 remove_proc_subtree()
    pub fn remove_subtree(&self, name: &str, parent: Option<&Arc<ProcNode>>) -> Result<(), ControlError> {
        let parent = parent.unwrap_or(&self.root_node);
        let node = parent.remove_child(name).ok_or(ControlError::NoEntry)?;
        // 断开子节点，外部持有的 Arc 不再能遍历到整棵树
        node.children.lock().clear();
        debug!("procfs: removed {}", name);
        Ok(())
    }
}

impl Default for ProcFs {
    fn default() -> Self {
        Self::new()
    }
}

fn valid_name(name: &str) -> bool {
    !name.is_empty() && !name.contains('/') && name != "." && name != ".."
}

// ==================== 控制面端点 ====================

/// 单个参数
pub struct TunableOps {
    registry: Arc<TunableRegistry>,
    id: TunableId,
}

impl TunableOps {
    pub fn new(registry: Arc<TunableRegistry>, id: TunableId) -> Self {
        Self { registry, id }
    }
}

impl ProcOps for TunableOps {
    fn show(&self) -> Vec<u8> {
        format!("{}\n", self.registry.get(self.id)).into_bytes()
    }

    fn write(&self, buf: &[u8]) -> Result<usize, ControlError> {
        if let Err(err) = self.registry.set(self.id, buf) {
            warn!("procfs: rejected write to {}: {}", self.id.def().path, err);
            return Err(err.into());
        }
        Ok(buf.len())
    }
}

/// `save_gov`：写入后记录所有调频策略当前的调速器
pub struct SaveGovOps {
    tunable: TunableOps,
    saved: Arc<SavedGovernors>,
    cpufreq: Arc<dyn CpufreqSource>,
}

impl SaveGovOps {
    pub fn new(
        registry: Arc<TunableRegistry>,
        saved: Arc<SavedGovernors>,
        cpufreq: Arc<dyn CpufreqSource>,
    ) -> Self {
        Self {
            tunable: TunableOps::new(registry, TunableId::SaveGov),
            saved,
            cpufreq,
        }
    }
}

impl ProcOps for SaveGovOps {
    fn show(&self) -> Vec<u8> {
        self.tunable.show()
    }

    fn write(&self, buf: &[u8]) -> Result<usize, ControlError> {
        let len = self.tunable.write(buf)?;
        let count = self.saved.save_all(&*self.cpufreq);
        debug!("procfs: save_gov recorded {} policies", count);
        Ok(len)
    }
}

/// `hmbird_stats`
pub struct StatsOps {
    registry: Arc<TunableRegistry>,
    monitor: Arc<LoadMonitor>,
    rq: Arc<dyn RqSource>,
    clock: Arc<dyn SchedClock>,
}

impl StatsOps {
    pub fn new(
        registry: Arc<TunableRegistry>,
        monitor: Arc<LoadMonitor>,
        rq: Arc<dyn RqSource>,
        clock: Arc<dyn SchedClock>,
    ) -> Self {
        Self { registry, monitor, rq, clock }
    }
}

impl ProcOps for StatsOps {
    fn show(&self) -> Vec<u8> {
        let now = self.clock.sched_clock();
        stats::render(&self.registry, &self.monitor, &*self.rq, now).into_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeCpufreq;

    struct Fixed(&'static str);

    impl ProcOps for Fixed {
        fn show(&self) -> Vec<u8> {
            self.0.as_bytes().to_vec()
        }
    }

    fn tunable_fs() -> (ProcFs, Arc<TunableRegistry>) {
        let fs = ProcFs::new();
        let registry = Arc::new(TunableRegistry::new());
        let dir = fs.proc_mkdir("ctl", None).unwrap();
        fs.proc_create(
            "frame_per_sec",
            ProcPerm::RW,
            Some(&dir),
            Arc::new(TunableOps::new(registry.clone(), TunableId::FramePerSec)),
        )
        .unwrap();
        fs.proc_create(
            "nr_rebalance",
            ProcPerm::RO,
            Some(&dir),
            Arc::new(TunableOps::new(registry.clone(), TunableId::NrRebalance)),
        )
        .unwrap();
        (fs, registry)
    }

    #[test]
    fn test_perm_bits() {
        assert_eq!(ProcPerm::RW.bits(), 0o666);
        assert_eq!(ProcPerm::RO.bits(), 0o444);
        assert!(ProcPerm::RO.readable());
        assert!(!ProcPerm::RO.writable());
        assert!(ProcPerm::RW.writable());
    }

    #[test]
    fn test_mkdir_and_lookup() {
        let fs = ProcFs::new();
        let a = fs.proc_mkdir("a", None).unwrap();
        let b = fs.proc_mkdir("b", Some(&a)).unwrap();
        assert!(fs.lookup("a/b").unwrap().is_dir());
        assert_eq!(fs.lookup("/a//b/").unwrap().ino, b.ino);
        assert!(fs.lookup("a/c").is_none());
        assert_eq!(fs.lookup("").unwrap().ino, 1);
    }

    #[test]
    fn test_mkdir_rejects_duplicates_and_bad_names() {
        let fs = ProcFs::new();
        assert!(fs.proc_mkdir("a", None).is_some());
        assert!(fs.proc_mkdir("a", None).is_none());
        assert!(fs.proc_mkdir("", None).is_none());
        assert!(fs.proc_mkdir("x/y", None).is_none());
        assert!(fs.proc_mkdir("..", None).is_none());
    }

    #[test]
    fn test_create_under_file_fails() {
        let fs = ProcFs::new();
        let file = fs.proc_create("f", ProcPerm::RO, None, Arc::new(Fixed("x"))).unwrap();
        assert!(fs.proc_mkdir("d", Some(&file)).is_none());
    }

    #[test]
    fn test_read_write_tunable() {
        let (fs, registry) = tunable_fs();
        assert_eq!(fs.read("ctl/frame_per_sec").unwrap(), b"125\n");
        assert_eq!(fs.write("ctl/frame_per_sec", b"60\n"), Ok(3));
        assert_eq!(fs.read("ctl/frame_per_sec").unwrap(), b"60\n");
        assert_eq!(registry.get(TunableId::FramePerSec), 60);
    }

    #[test]
    fn test_write_malformed() {
        let (fs, registry) = tunable_fs();
        let err = fs.write("ctl/frame_per_sec", b"abc").unwrap_err();
        assert_eq!(err, ControlError::Parse(ParseError::Malformed));
        assert_eq!(Errno::from(err).as_neg_i32(), -14);
        assert_eq!(registry.get(TunableId::FramePerSec), 125);
    }

    #[test]
    fn test_write_read_only() {
        let (fs, registry) = tunable_fs();
        assert_eq!(fs.write("ctl/nr_rebalance", b"5"), Err(ControlError::PermissionDenied));
        assert_eq!(registry.get(TunableId::NrRebalance), 0);
        assert_eq!(fs.read("ctl/nr_rebalance").unwrap(), b"0\n");
    }

    #[test]
    fn test_read_only_ops_reject_even_with_writable_perm() {
        let fs = ProcFs::new();
        let registry = Arc::new(TunableRegistry::new());
        fs.proc_create(
            "last_total_load",
            ProcPerm::RW,
            None,
            Arc::new(TunableOps::new(registry.clone(), TunableId::LastTotalLoad)),
        )
        .unwrap();
        assert_eq!(fs.write("last_total_load", b"3"), Err(ControlError::PermissionDenied));
        assert_eq!(registry.get(TunableId::LastTotalLoad), 0);
    }

    #[test]
    fn test_errors() {
        let (fs, _) = tunable_fs();
        assert_eq!(fs.read("ctl/missing"), Err(ControlError::NoEntry));
        assert_eq!(fs.read("ctl"), Err(ControlError::IsDirectory));
        assert_eq!(fs.write("ctl", b"1"), Err(ControlError::IsDirectory));
        assert_eq!(Errno::from(ControlError::NoEntry), Errno::NoSuchFileOrDirectory);
        assert_eq!(Errno::from(ControlError::IsDirectory), Errno::IsADirectory);
        assert_eq!(Errno::from(ControlError::PermissionDenied), Errno::PermissionDenied);
    }

    #[test]
    fn test_list_dir() {
        let (fs, _) = tunable_fs();
        let names: Vec<String> = fs
            .list_dir("ctl")
            .unwrap()
            .into_iter()
            .map(|(name, _, _)| name)
            .collect();
        assert_eq!(names, ["frame_per_sec", "nr_rebalance"]);
        assert!(fs.list_dir("ctl/frame_per_sec").is_none());
    }

    #[test]
    fn test_remove_subtree() {
        let (fs, _) = tunable_fs();
        let held = fs.lookup("ctl").unwrap();
        assert_eq!(fs.remove_subtree("ctl", None), Ok(()));
        assert!(fs.lookup("ctl").is_none());
        assert!(held.list_children().is_empty());
        assert_eq!(fs.remove_subtree("ctl", None), Err(ControlError::NoEntry));
    }

    #[test]
    fn test_save_gov_records_governors() {
        let fs = ProcFs::new();
        let registry = Arc::new(TunableRegistry::new());
        let saved = Arc::new(SavedGovernors::new());
        let cpufreq = Arc::new(FakeCpufreq::new(8, 4, "schedutil"));
        fs.proc_create(
            "save_gov",
            ProcPerm::RW,
            None,
            Arc::new(SaveGovOps::new(registry.clone(), saved.clone(), cpufreq)),
        )
        .unwrap();

        assert!(fs.write("save_gov", b"x").is_err());
        assert_eq!(saved.get(0), None);

        assert_eq!(fs.write("save_gov", b"1"), Ok(1));
        assert_eq!(registry.get(TunableId::SaveGov), 1);
        assert_eq!(saved.get(4).as_deref(), Some("schedutil"));
        assert_eq!(fs.read("save_gov").unwrap(), b"1\n");
    }

    #[test]
    fn test_default_ops_write_denied() {
        let fs = ProcFs::new();
        fs.proc_create("f", ProcPerm::RW, None, Arc::new(Fixed("hello"))).unwrap();
        assert_eq!(fs.read("f").unwrap(), b"hello");
        assert_eq!(fs.write("f", b"1"), Err(ControlError::PermissionDenied));
    }
}
