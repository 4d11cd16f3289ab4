//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!
//! 控制面使用的错误代码
//!
//! 取自 include/uapi/asm-generic/errno-base.h，只保留控制面会返回的几项

/// 标准错误代码
///
/// 使用方法：
/// ```rust
/// use schedctl::errno::Errno;
///
/// // 系统调用风格，返回负数
/// let ret = Errno::BadAddress.as_neg_i32();
/// assert_eq!(ret, -14);
/// ```
#[repr(i32)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Errno {
    /// No such file or directory (ENOENT, 2)
    NoSuchFileOrDirectory = 2,

    /// Out of memory (ENOMEM, 12)
    OutOfMemory = 12,

    /// Permission denied (EACCES, 13)
    PermissionDenied = 13,

    /// Bad address (EFAULT, 14)
    BadAddress = 14,

    /// Is a directory (EISDIR, 21)
    IsADirectory = 21,
}

impl Errno {
    /// 获取错误代码的正数值（用于比较）
    #[inline]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    /// 获取错误代码的负数值（用于系统调用返回）
    #[inline]
    pub const fn as_neg_i32(self) -> i32 {
        -(self as i32)
    }

    /// 获取错误代码的负数值（isize，用于 read/write 返回）
    #[inline]
    pub const fn as_neg_isize(self) -> isize {
        -(self as i32) as isize
    }
}
