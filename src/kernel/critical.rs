//! 临界区嵌套计数
//!
//! 进程内唯一的嵌套计数记录当前打开的临界区数量。
//! 计数只在中断被屏蔽时读改写，中断屏蔽本身就是保护它的锁。
//!
//! 不变式：中断已启用 ⇔ 嵌套计数为 0（中断门自身的窗口与启动代码除外）。
//!
//! ```rust,ignore
//! enter_critical();              // 关中断，计数 1
//! enter_critical();              // 计数 2
//! unsafe { exit_critical() };    // 计数 1，中断仍关闭
//! unsafe { exit_critical() };    // 计数 0，开中断
//! ```
//!
//! 能让中断重新打开的操作（[`enable_interrupts`]、[`exit_critical`]、
//! [`port_restore_critical_nesting`]）都是 `unsafe fn`：[`Masked`] 令牌的有效性依赖于
//! 令牌存活期间中断不会被打开。安全代码应使用 [`CriticalGuard`] 或 [`with_critical`]。

use crate::hal::{InterruptControl, Port};
use crate::warn;
use core::cell::UnsafeCell;
use core::marker::PhantomData;
use core::sync::atomic::{AtomicU16, Ordering, compiler_fence};

/// 没有打开任何临界区时的嵌套计数
pub const NO_CRITICAL_SECTION_NESTING: u16 = 0;

static CRITICAL_NESTING: AtomicU16 = AtomicU16::new(NO_CRITICAL_SECTION_NESTING);

/// 全局禁用中断
///
/// 原始中断门，通常只在 [`enter_critical`] 内部或启动阶段使用。
#[inline(always)]
pub fn disable_interrupts() {
    Port::disable_interrupts();
}

/// 全局启用中断，随后执行一个空操作周期
///
/// 原始中断门，通常只在 [`exit_critical`] 内部或启动阶段使用。
///
/// # Safety
///
/// 调用时不能有仍在使用的 [`Masked`] 令牌，嵌套计数也应为 0。
///
/// ```rust,compile_fail
/// neon_port::enable_interrupts();
/// ```
#[inline(always)]
pub unsafe fn enable_interrupts() {
    // SAFETY: 由调用者保证
    unsafe { Port::enable_interrupts() };
}

/// 进入临界区
///
/// 先关中断，再增加嵌套计数。中断已经关闭时也可以调用。
pub fn enter_critical() {
    Port::disable_interrupts();
    compiler_fence(Ordering::SeqCst);

    // 中断已屏蔽，计数可以直接读改写。饱和而不回绕：回绕到 0 会在区域仍打开时开中断
    let depth = CRITICAL_NESTING.load(Ordering::Relaxed);
    debug_assert!(depth < u16::MAX, "critical section nesting overflow");
    CRITICAL_NESTING.store(depth.saturating_add(1), Ordering::Relaxed);

    debug_assert!(!Port::interrupts_enabled(), "interrupts enabled inside a critical section");
}

/// 退出临界区
///
/// 计数大于 0 时减 1，减到 0 时重新开中断。
/// 计数已经为 0 时什么也不做：不匹配的退出不能让计数下溢，也不能误开中断。
/// 不匹配的退出只在 debug 构建中记录一条 `warn!`。
///
/// # Safety
///
/// - 必须与同一上下文中先前的一次 [`enter_critical`] 配对
/// - 计数降到 0 时中断会被打开，此后不能再使用该临界区内得到的 [`Masked`] 令牌
///
/// ```rust,compile_fail
/// neon_port::enter_critical();
/// neon_port::exit_critical();
/// ```
pub unsafe fn exit_critical() {
    let depth = CRITICAL_NESTING.load(Ordering::Relaxed);
    if depth == NO_CRITICAL_SECTION_NESTING {
        if cfg!(debug_assertions) {
            warn!("exit_critical called with no open critical section");
        }
        return;
    }

    debug_assert!(!Port::interrupts_enabled(), "interrupts enabled inside a critical section");

    let depth = depth - 1;
    CRITICAL_NESTING.store(depth, Ordering::Relaxed);

    if depth == NO_CRITICAL_SECTION_NESTING {
        compiler_fence(Ordering::SeqCst);
        // SAFETY: 计数已回到 0，由调用者保证不再使用临界区内的令牌
        unsafe { Port::enable_interrupts() };
    }
}

/// 当前嵌套深度
#[inline]
pub fn nesting_depth() -> u16 {
    CRITICAL_NESTING.load(Ordering::Relaxed)
}

/// 系统启动时把嵌套计数清零
pub(crate) fn reset_nesting() {
    CRITICAL_NESTING.store(NO_CRITICAL_SECTION_NESTING, Ordering::Relaxed);
}

/// 读取嵌套计数，供上下文保存代码存入任务栈帧
///
/// 只能在中断屏蔽期间调用。
#[unsafe(no_mangle)]
pub extern "C" fn port_save_critical_nesting() -> u16 {
    CRITICAL_NESTING.load(Ordering::Relaxed)
}

/// 从任务栈帧恢复嵌套计数
///
/// # Safety
///
/// 只能在切换序列中、中断屏蔽期间调用，且随后恢复的状态寄存器必须与该计数一致。
#[unsafe(no_mangle)]
pub unsafe extern "C" fn port_restore_critical_nesting(depth: u16) {
    CRITICAL_NESTING.store(depth, Ordering::Relaxed);
}

/// 中断已被屏蔽的证明
///
/// 零大小，不能跨线程传递。只能从 [`CriticalGuard`]、[`with_critical`]
/// 或 [`Masked::new_unchecked`] 得到。
#[derive(Clone, Copy)]
pub struct Masked<'a> {
    _marker: PhantomData<&'a *mut ()>,
}

impl<'a> Masked<'a> {
    /// 在中断已经由硬件屏蔽的上下文中（例如中断入口）构造令牌
    ///
    /// # Safety
    ///
    /// 调用者必须保证在 `'a` 期间中断一直处于屏蔽状态。
    #[inline(always)]
    pub unsafe fn new_unchecked() -> Self {
        Self { _marker: PhantomData }
    }
}

/// RAII 临界区守卫
///
/// 创建时调用 [`enter_critical`]，drop 时调用 [`exit_critical`]，
/// 嵌套守卫按栈的顺序释放。
pub struct CriticalGuard {
    _not_send: PhantomData<*mut ()>,
}

impl CriticalGuard {
    pub fn new() -> Self {
        enter_critical();
        Self { _not_send: PhantomData }
    }

    /// 守卫存活期间有效的屏蔽令牌
    pub fn masked(&self) -> Masked<'_> {
        Masked { _marker: PhantomData }
    }
}

impl Default for CriticalGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for CriticalGuard {
    fn drop(&mut self) {
        // SAFETY: 与 `new` 中的 enter_critical 配对；令牌借用守卫，不会比守卫活得更久
        unsafe { exit_critical() };
    }
}

/// 在临界区内执行闭包
pub fn with_critical<R>(f: impl FnOnce(Masked<'_>) -> R) -> R {
    let guard = CriticalGuard::new();
    f(guard.masked())
}

/// 关中断执行闭包，结束后恢复进入前的屏蔽状态
///
/// 不修改嵌套计数。用于启动阶段和中断上下文：这些地方中断可能在没有任何临界区的情况下
/// 已经关闭，用 [`with_critical`] 会在退出时错误地开中断。
/// 无论闭包内部对屏蔽位做了什么，返回时屏蔽位都与进入时一致。
pub fn with_interrupts_masked<R>(f: impl FnOnce(Masked<'_>) -> R) -> R {
    let was_enabled = Port::interrupts_enabled();
    Port::disable_interrupts();
    compiler_fence(Ordering::SeqCst);

    let result = f(Masked { _marker: PhantomData });

    compiler_fence(Ordering::SeqCst);
    if was_enabled {
        // SAFETY: 进入时中断是打开的，令牌随闭包一起结束
        unsafe { Port::enable_interrupts() };
    } else {
        Port::disable_interrupts();
    }
    result
}

/// 只能在中断屏蔽期间访问的单元
///
/// 单核系统上屏蔽中断即可获得独占访问。用于宽度超过原子指令支持范围的共享数据，
/// 例如 16 位处理器上的 32 位 tick 计数。
///
/// 值只能整体读出或写入，不提供内部引用：持有令牌时仍可以 [`yield_now`](crate::yield_now)，
/// 其他任务会在此期间访问同一个单元。
pub struct MaskedCell<T> {
    value: UnsafeCell<T>,
}

// SAFETY: 所有访问都要求 `Masked` 令牌，单核上中断屏蔽期间不存在并发访问
unsafe impl<T: Send> Sync for MaskedCell<T> {}

impl<T> MaskedCell<T> {
    pub const fn new(value: T) -> Self {
        Self {
            value: UnsafeCell::new(value),
        }
    }
}

impl<T: Copy> MaskedCell<T> {
    pub fn get(&self, _masked: Masked<'_>) -> T {
        // SAFETY: 令牌证明中断已屏蔽，这次复制期间没有其他访问
        unsafe { *self.value.get() }
    }

    pub fn set(&self, _masked: Masked<'_>, value: T) {
        // SAFETY: 同 `get`，写入不留下任何引用
        unsafe { *self.value.get() = value }
    }
}

#[cfg(all(feature = "critical-section-impl", not(test)))]
mod cs_impl {
    use critical_section::RawRestoreState;

    struct PortCriticalSection;
    critical_section::set_impl!(PortCriticalSection);

    unsafe impl critical_section::Impl for PortCriticalSection {
        unsafe fn acquire() -> RawRestoreState {
            super::enter_critical();
        }

        unsafe fn release(_: RawRestoreState) {
            // SAFETY: critical-section 保证 release 与 acquire 配对
            unsafe { super::exit_critical() };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::sim;
    use crate::log::{LogLevel, clear_log_sink, set_log_level, set_log_sink};
    use crate::utils::port_init;
    use core::sync::atomic::AtomicUsize;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_guard_drops_in_stack_order() {
        port_init();
        {
            let _outer = CriticalGuard::new();
            {
                let _inner = CriticalGuard::new();
                assert_eq!(nesting_depth(), 2);
            }
            assert_eq!(nesting_depth(), 1);
            assert!(!Port::interrupts_enabled());
        }
        assert_eq!(nesting_depth(), 0);
        assert!(Port::interrupts_enabled());
        assert_eq!(sim::stats().enables, 1);
    }

    #[test]
    #[serial]
    fn test_with_critical_returns_value() {
        port_init();
        let value = with_critical(|_| {
            assert_eq!(nesting_depth(), 1);
            42
        });
        assert_eq!(value, 42);
        assert_eq!(nesting_depth(), 0);
        assert!(Port::interrupts_enabled());
    }

    #[test]
    #[serial]
    fn test_masked_cell() {
        port_init();
        static CELL: MaskedCell<u32> = MaskedCell::new(0x0001_ffff);

        with_critical(|m| {
            CELL.set(m, CELL.get(m) + 1);
            CELL.set(m, CELL.get(m) + 1);
            assert_eq!(CELL.get(m), 0x0002_0001);
        });
    }

    #[test]
    #[serial]
    fn test_masked_cell_survives_yield_while_token_is_held() {
        port_init();
        static CELL: MaskedCell<u16> = MaskedCell::new(0);

        with_critical(|m| {
            CELL.set(m, 7);
            // 切换期间其他任务可能访问同一单元，返回后令牌仍然有效
            crate::yield_now();
            assert!(!Port::interrupts_enabled());
            assert_eq!(CELL.get(m), 7);
        });
        assert!(Port::interrupts_enabled());
    }

    #[test]
    #[serial]
    fn test_nesting_glue_round_trip() {
        port_init();
        enter_critical();
        enter_critical();
        let saved = port_save_critical_nesting();
        assert_eq!(saved, 2);

        // SAFETY: 中断已屏蔽，模拟切换到一个没有临界区的任务再切回来
        unsafe {
            port_restore_critical_nesting(0);
            assert_eq!(nesting_depth(), 0);
            port_restore_critical_nesting(saved);
        }

        // SAFETY: 与上面的两次 enter_critical 配对
        unsafe {
            exit_critical();
            exit_critical();
        }
        assert_eq!(nesting_depth(), 0);
        assert!(Port::interrupts_enabled());
    }

    #[test]
    #[serial]
    fn test_masked_section_restores_prior_state() {
        port_init();
        with_interrupts_masked(|_| assert!(!Port::interrupts_enabled()));
        assert!(Port::interrupts_enabled());

        disable_interrupts();
        with_interrupts_masked(|_| {});
        assert!(!Port::interrupts_enabled());
        assert_eq!(nesting_depth(), 0);
    }

    #[test]
    #[serial]
    fn test_masked_section_stays_masked_when_closure_unmasks() {
        port_init();
        // 中断入口：硬件已关中断，计数为 0
        disable_interrupts();

        with_interrupts_masked(|_| {
            // 计数为 0 时的临界区在退出时会开中断
            with_critical(|_| {});
            assert!(Port::interrupts_enabled());
        });

        assert!(!Port::interrupts_enabled());
        assert_eq!(nesting_depth(), 0);
    }

    #[test]
    #[serial]
    fn test_raw_gate_does_not_touch_nesting() {
        port_init();
        disable_interrupts();
        assert!(!Port::interrupts_enabled());
        // SAFETY: 没有打开的临界区，也没有存活的令牌
        unsafe { enable_interrupts() };
        assert!(Port::interrupts_enabled());
        assert_eq!(nesting_depth(), 0);
    }

    #[test]
    #[serial]
    fn test_nesting_at_limit_keeps_interrupts_masked() {
        port_init();
        enter_critical();
        // SAFETY: 中断已屏蔽
        unsafe { port_restore_critical_nesting(u16::MAX - 1) };

        enter_critical();
        assert_eq!(nesting_depth(), u16::MAX);

        // SAFETY: 与上面的 enter_critical 配对
        unsafe { exit_critical() };
        assert_eq!(nesting_depth(), u16::MAX - 1);
        assert!(!Port::interrupts_enabled());
    }

    #[test]
    #[serial]
    #[cfg_attr(debug_assertions, should_panic(expected = "critical section nesting overflow"))]
    fn test_nesting_overflow_never_wraps_to_zero() {
        port_init();
        enter_critical();
        // SAFETY: 中断已屏蔽
        unsafe { port_restore_critical_nesting(u16::MAX) };

        // debug 构建在这里断言失败；release 构建计数饱和
        enter_critical();
        assert_eq!(nesting_depth(), u16::MAX);

        // SAFETY: 与上面的 enter_critical 配对
        unsafe { exit_critical() };
        assert_ne!(nesting_depth(), 0);
        assert!(!Port::interrupts_enabled());
    }

    static SINK_CALLS: AtomicUsize = AtomicUsize::new(0);

    fn counting_sink(_: &str) {
        SINK_CALLS.fetch_add(1, Ordering::SeqCst);
    }

    #[test]
    #[serial]
    fn test_unmatched_exit_logs_only_in_debug_builds() {
        port_init();
        set_log_level(LogLevel::Warn);
        SINK_CALLS.store(0, Ordering::SeqCst);
        set_log_sink(counting_sink);

        // SAFETY: 计数为 0，调用不会开中断
        unsafe { exit_critical() };

        clear_log_sink();
        set_log_level(LogLevel::Info);

        assert_eq!(SINK_CALLS.load(Ordering::SeqCst) > 0, cfg!(debug_assertions));
        assert_eq!(nesting_depth(), 0);
        assert_eq!(sim::stats().enables, 0);
    }
}
