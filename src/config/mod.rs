//! 端口编译期配置
//!
//! 所有取值在编译期确定。tick 宽度由 cargo feature 选择：
//! - `tick-16`：`TickType = u16`
//! - `tick-32`（默认）：`TickType = u32`
//!
//! 两者同时启用时 `tick-16` 优先。

use crate::error::{PortError, Result};

#[cfg(not(any(feature = "tick-16", feature = "tick-32")))]
compile_error!("enable one of the `tick-16` / `tick-32` features to select the tick type width");

// 端口基本类型
pub type BaseType = i16;
pub type UBaseType = u16;

/// 栈单元类型，随数据模型变化
#[cfg(feature = "large-data-model")]
pub type StackType = u32;
#[cfg(not(feature = "large-data-model"))]
pub type StackType = u16;

/// 栈对齐字节数
pub const BYTE_ALIGNMENT: usize = 2;
/// 栈生长方向（向低地址生长）
pub const STACK_GROWTH: isize = -1;

/// 周期 tick 计数类型
#[cfg(feature = "tick-16")]
pub type TickType = u16;
#[cfg(not(feature = "tick-16"))]
pub type TickType = u32;

/// 当前构建选择的 tick 宽度
#[cfg(feature = "tick-16")]
pub const TICK_TYPE_WIDTH: TickWidth = TickWidth::Bits16;
#[cfg(not(feature = "tick-16"))]
pub const TICK_TYPE_WIDTH: TickWidth = TickWidth::Bits32;

/// 无限等待
pub const MAX_DELAY: TickType = TickType::MAX;

/// tick 频率（Hz）
pub const TICK_RATE_HZ: u32 = 1000;

/// 每个 tick 的毫秒数
pub const TICK_PERIOD_MS: TickType = (1000 / TICK_RATE_HZ) as TickType;

/// tick 计数宽度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum TickWidth {
    /// 16 位 tick
    Bits16 = 16,
    /// 32 位 tick
    Bits32 = 32,
}

impl TickWidth {
    /// 位数
    pub fn bits(self) -> u8 {
        self as u8
    }

    /// 从位数构造
    ///
    /// # 返回值
    /// - `Ok(TickWidth)`: 16 或 32
    /// - `Err(PortError::UnsupportedTickWidth)`: 其他位数
    pub fn from_bits(bits: u8) -> Result<Self> {
        match bits {
            16 => Ok(TickWidth::Bits16),
            32 => Ok(TickWidth::Bits32),
            other => Err(PortError::UnsupportedTickWidth(other)),
        }
    }

    /// 该宽度下的最大延时值
    pub fn max_delay(self) -> u32 {
        match self {
            TickWidth::Bits16 => 0xffff,
            TickWidth::Bits32 => 0xffff_ffff,
        }
    }
}

/// tick 计数的整数类型
///
/// 为 `u16` 与 `u32` 实现，泛型代码可以借此同时支持两种宽度。
pub trait TickCount: Copy + Eq + Ord + core::fmt::Debug {
    const WIDTH: TickWidth;
    const MAX_DELAY: Self;
    const ZERO: Self;

    /// 自增，溢出时回绕
    fn wrapping_increment(self) -> Self;

    /// 从宽整数转换，超出范围返回 `PortError::TickOverflow`
    fn from_u64(value: u64) -> Result<Self>;
}

impl TickCount for u16 {
    const WIDTH: TickWidth = TickWidth::Bits16;
    const MAX_DELAY: Self = 0xffff;
    const ZERO: Self = 0;

    #[inline]
    fn wrapping_increment(self) -> Self {
        self.wrapping_add(1)
    }

    fn from_u64(value: u64) -> Result<Self> {
        u16::try_from(value).map_err(|_| PortError::TickOverflow)
    }
}

impl TickCount for u32 {
    const WIDTH: TickWidth = TickWidth::Bits32;
    const MAX_DELAY: Self = 0xffff_ffff;
    const ZERO: Self = 0;

    #[inline]
    fn wrapping_increment(self) -> Self {
        self.wrapping_add(1)
    }

    fn from_u64(value: u64) -> Result<Self> {
        u32::try_from(value).map_err(|_| PortError::TickOverflow)
    }
}

/// 毫秒转 tick
///
/// 结果超出当前 `TickType` 范围时返回 `PortError::TickOverflow`。
pub fn ms_to_ticks(ms: u32) -> Result<TickType> {
    let ticks = (ms as u64 * TICK_RATE_HZ as u64) / 1000;
    <TickType as TickCount>::from_u64(ticks)
}
