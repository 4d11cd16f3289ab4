//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 整数解析
//!
//! 对应 Linux 的 kstrtoint() (lib/kstrtox.c)，控制面写入都经过这里：
//! - 写入长度超过 MAX_WRITE_LEN 直接拒绝，不扫描内容
//! - 遇到 NUL 截断（与内核把用户缓冲区当 C 字符串处理一致）
//! - 去掉首尾空白（strstrip）
//! - base 0：`0x`/`0X` 十六进制，前导 `0` 八进制，否则十进制
//! - 可选的 `+`/`-` 符号

use core::fmt;

use crate::config::MAX_WRITE_LEN;
use crate::errno::Errno;

/// 写入被拒绝的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    /// 写入过长、为空或不是合法的有符号整数
    Malformed,
    /// 合法整数，但超出该参数声明的取值范围
    OutOfRange { min: i32, max: i32 },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Malformed => write!(f, "malformed integer"),
            ParseError::OutOfRange { min, max } => {
                write!(f, "value out of range [{}, {}]", min, max)
            }
        }
    }
}

impl From<ParseError> for Errno {
    /// 写入失败一律返回 -EFAULT
    fn from(_: ParseError) -> Self {
        Errno::BadAddress
    }
}

/// 解析基数前缀，返回 (基数, 去掉前缀后的数字部分)
fn split_radix(s: &str) -> (u32, &str) {
    if let Some(rest) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        (16, rest)
    } else if s.len() > 1 && s.starts_with('0') {
        (8, &s[1..])
    } else {
        (10, s)
    }
}

/// 把用户写入的字节解析为 i32
///
/// # 参数
/// - `buf`: 写入的原始字节
///
/// # 返回
/// - `Ok(value)`: 解析成功
/// - `Err(ParseError::Malformed)`: 过长、空、非数字或溢出
pub fn kstrtoint(buf: &[u8]) -> Result<i32, ParseError> {
    // 与内核 kbuf[MAX_WRITE_LEN] 一致：要给结尾 NUL 留一个字节
    if buf.len() >= MAX_WRITE_LEN {
        return Err(ParseError::Malformed);
    }

    let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    let s = core::str::from_utf8(&buf[..end]).map_err(|_| ParseError::Malformed)?;
    let s = s.trim();

    let (negative, unsigned) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let (radix, digits) = split_radix(unsigned);
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return Err(ParseError::Malformed);
    }

    let magnitude = u64::from_str_radix(digits, radix).map_err(|_| ParseError::Malformed)?;
    let value = if negative {
        -(magnitude as i64)
    } else {
        magnitude as i64
    };

    i32::try_from(value).map_err(|_| ParseError::Malformed)
}
