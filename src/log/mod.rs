//! 日志模块，支持在不同环境下的日志打印
//! - Cortex-M3 (QEMU)：使用 cortex-m-semihosting 的 hprint
//! - MSP430X 真实设备：写入用户通过 [`set_log_sink`] 安装的输出函数（通常是串口）
//! - 测试环境：使用标准库的 print
//!
//! 日志路径本身不进入临界区，可以在中断已被屏蔽时安全调用。

use core::fmt::{self, Write};
use core::sync::atomic::{AtomicPtr, AtomicU8, Ordering};

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    /// 错误级别
    Error = 0,
    /// 警告级别
    Warn = 1,
    /// 信息级别
    Info = 2,
    /// 调试级别
    Debug = 3,
    /// 跟踪级别
    Trace = 4,
}

impl LogLevel {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => LogLevel::Error,
            1 => LogLevel::Warn,
            2 => LogLevel::Info,
            3 => LogLevel::Debug,
            _ => LogLevel::Trace,
        }
    }
}

/// 全局日志级别，默认为 Info
static GLOBAL_LOG_LEVEL: AtomicU8 = AtomicU8::new(LogLevel::Info as u8);

/// 用户安装的日志输出函数
static LOG_SINK: AtomicPtr<()> = AtomicPtr::new(core::ptr::null_mut());

/// 设置全局日志级别
pub fn set_log_level(level: LogLevel) {
    GLOBAL_LOG_LEVEL.store(level as u8, Ordering::Relaxed);
}

/// 获取全局日志级别
pub fn get_log_level() -> LogLevel {
    LogLevel::from_u8(GLOBAL_LOG_LEVEL.load(Ordering::Relaxed))
}

/// 安装日志输出函数
///
/// 输出函数可能在中断上下文或中断屏蔽期间被调用，不能阻塞，
/// 也不能进入本端口的临界区或打开中断：它可能在 `exit_critical` 内部被调用。
pub fn set_log_sink(sink: fn(&str)) {
    LOG_SINK.store(sink as *mut (), Ordering::Release);
}

/// 移除日志输出函数
pub fn clear_log_sink() {
    LOG_SINK.store(core::ptr::null_mut(), Ordering::Release);
}

fn write_to_sink(s: &str) {
    let raw = LOG_SINK.load(Ordering::Acquire);
    if raw.is_null() {
        return;
    }
    // SAFETY: 非空值只可能来自 `set_log_sink` 存入的 `fn(&str)`
    let sink = unsafe { core::mem::transmute::<*mut (), fn(&str)>(raw) };
    sink(s);
}

/// QEMU 环境下打印日志
#[cfg(all(feature = "cortex_m3", not(test), target_arch = "arm"))]
#[inline(always)]
pub fn log_write(s: &str) -> fmt::Result {
    cortex_m_semihosting::hprint!("{}", s);
    write_to_sink(s);
    Ok(())
}

/// 其他环境下打印日志（包括单元测试）
#[cfg(not(all(feature = "cortex_m3", not(test), target_arch = "arm")))]
#[inline(always)]
pub fn log_write(s: &str) -> fmt::Result {
    #[cfg(test)]
    print!("{}", s);
    write_to_sink(s);
    Ok(())
}

/// 打印日志的宏，根据日志级别打印
#[macro_export]
macro_rules! log {
    ($level:expr, $($arg:tt)*) => {
        {
            if $level as u8 <= $crate::log::get_log_level() as u8 {
                use core::fmt::Write;
                let mut writer = $crate::log::LogWriter;
                let _ = write!(writer, $($arg)*);
            }
        }
    };
}

/// 日志写入器
pub struct LogWriter;

impl Write for LogWriter {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        log_write(s)
    }
}

/// 错误级别日志
#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {
        $crate::log!($crate::log::LogLevel::Error, "[ERROR] ");
        $crate::log!($crate::log::LogLevel::Error, $($arg)*);
        $crate::log!($crate::log::LogLevel::Error, "\n");
    };
}

/// 警告级别日志
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {
        $crate::log!($crate::log::LogLevel::Warn, "[WARN] ");
        $crate::log!($crate::log::LogLevel::Warn, $($arg)*);
        $crate::log!($crate::log::LogLevel::Warn, "\n");
    };
}

/// 信息级别日志
#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {
        $crate::log!($crate::log::LogLevel::Info, "[INFO] ");
        $crate::log!($crate::log::LogLevel::Info, $($arg)*);
        $crate::log!($crate::log::LogLevel::Info, "\n");
    };
}

/// 调试级别日志
#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => {
        $crate::log!($crate::log::LogLevel::Debug, "[DEBUG] ");
        $crate::log!($crate::log::LogLevel::Debug, $($arg)*);
        $crate::log!($crate::log::LogLevel::Debug, "\n");
    };
}

/// 跟踪级别日志
#[macro_export]
macro_rules! trace {
    ($($arg:tt)*) => {
        $crate::log!($crate::log::LogLevel::Trace, "[TRACE] ");
        $crate::log!($crate::log::LogLevel::Trace, $($arg)*);
        $crate::log!($crate::log::LogLevel::Trace, "\n");
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::AtomicUsize;
    use serial_test::serial;

    static SINK_BYTES: AtomicUsize = AtomicUsize::new(0);

    fn counting_sink(s: &str) {
        SINK_BYTES.fetch_add(s.len(), Ordering::SeqCst);
    }

    #[test]
    #[serial]
    fn test_log_level_setting() {
        set_log_level(LogLevel::Debug);
        assert_eq!(get_log_level(), LogLevel::Debug);

        set_log_level(LogLevel::Error);
        assert_eq!(get_log_level(), LogLevel::Error);

        set_log_level(LogLevel::Info);
    }

    #[test]
    fn test_log_level_comparison() {
        assert!(LogLevel::Error < LogLevel::Warn);
        assert!(LogLevel::Warn < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Debug);
        assert!(LogLevel::Debug < LogLevel::Trace);
    }

    #[test]
    #[serial]
    fn test_sink_receives_filtered_output() {
        set_log_level(LogLevel::Warn);
        SINK_BYTES.store(0, Ordering::SeqCst);
        set_log_sink(counting_sink);

        debug!("filtered out");
        assert_eq!(SINK_BYTES.load(Ordering::SeqCst), 0);

        warn!("nesting {}", 3);
        // "[WARN] " + "nesting 3" + "\n"
        assert_eq!(SINK_BYTES.load(Ordering::SeqCst), 7 + 9 + 1);

        clear_log_sink();
        error!("no sink");
        assert_eq!(SINK_BYTES.load(Ordering::SeqCst), 17);
        set_log_level(LogLevel::Info);
    }
}
