//! 调度器接口
//!
//! 就绪队列与优先级选择不在本层实现。调度器通过 [`SchedulerHooks`]
//! 把自己接入端口层：切换原语调用 `select_next_task`，tick 中断调用
//! `increment_tick` 并根据其结果决定是否切换。

use crate::error::{PortError, Result};
use crate::hal::{ArchInfo, ContextSwitch, InterruptControl, Port};
use crate::kernel::critical::{Masked, MaskedCell, reset_nesting, with_interrupts_masked};
use crate::{info, trace};
use core::sync::atomic::{AtomicBool, Ordering};

/// 调度器提供给端口层的回调
#[derive(Debug, Clone, Copy)]
pub struct SchedulerHooks {
    /// 选择下一个运行的任务
    ///
    /// 在切换原语内部、中断屏蔽期间调用。
    pub select_next_task: fn(),
    /// 推进调度器的 tick
    ///
    /// 在 tick 中断中调用，返回 `true` 表示需要切换。
    pub increment_tick: fn() -> bool,
    /// 配置周期 tick 定时器
    ///
    /// 调度器启动时调用一次。
    pub setup_timer_interrupt: fn(),
}

static HOOKS: MaskedCell<Option<SchedulerHooks>> = MaskedCell::new(None);
static SCHEDULER_RUNNING: AtomicBool = AtomicBool::new(false);

pub struct Scheduler;

impl Scheduler {
    /// 清除回调并标记为未运行
    pub(crate) fn init() {
        with_interrupts_masked(|m| HOOKS.set(m, None));
        SCHEDULER_RUNNING.store(false, Ordering::Release);
    }

    /// 安装调度器回调，替换已有的回调
    pub fn install(hooks: SchedulerHooks) {
        with_interrupts_masked(|m| HOOKS.set(m, Some(hooks)));
    }

    /// 已安装的回调
    pub fn hooks() -> Option<SchedulerHooks> {
        with_interrupts_masked(|m| HOOKS.get(m))
    }

    pub(crate) fn hooks_masked(masked: Masked<'_>) -> Option<SchedulerHooks> {
        HOOKS.get(masked)
    }

    /// 检查调度器是否正在运行
    pub fn is_running() -> bool {
        SCHEDULER_RUNNING.load(Ordering::Acquire)
    }

    /// 启动调度器
    ///
    /// 关中断，嵌套计数清零，配置 tick 定时器，然后启动第一个任务。
    /// 中断在第一个任务的上下文恢复时才打开；在真实硬件上本函数不返回。
    ///
    /// # 返回值
    /// - `Err(PortError::AlreadyRunning)`: 调度器已经启动
    /// - `Err(PortError::HooksNotInstalled)`: 尚未调用 [`Scheduler::install`]，此时中断保持关闭
    pub fn start() -> Result<()> {
        if Self::is_running() {
            return Err(PortError::AlreadyRunning);
        }

        Port::disable_interrupts();
        // SAFETY: 中断刚刚关闭，直到第一个任务启动前不会再打开
        let masked = unsafe { Masked::new_unchecked() };
        let hooks = HOOKS.get(masked).ok_or(PortError::HooksNotInstalled)?;

        reset_nesting();
        (hooks.setup_timer_interrupt)();
        SCHEDULER_RUNNING.store(true, Ordering::Release);

        info!("scheduler starting on {}", Port::arch_name());
        // SAFETY: 中断已屏蔽，计数已清零，令牌 `masked` 之后不再使用
        unsafe { Port::start_first_task() };
        Ok(())
    }

    /// 停止调度器
    ///
    /// 之后的 tick 只推进端口 tick 计数，不再调用调度器回调。
    pub fn stop() {
        SCHEDULER_RUNNING.store(false, Ordering::Release);
    }
}

/// 切换原语的调度入口
///
/// 由后端的上下文切换代码在保存完当前上下文之后、恢复新上下文之前调用，
/// 调用时中断已屏蔽。没有安装回调时直接返回，当前任务继续运行。
#[unsafe(no_mangle)]
pub extern "C" fn port_select_next_task() {
    // SAFETY: 只在切换序列内调用，此时中断已屏蔽
    let masked = unsafe { Masked::new_unchecked() };
    if let Some(hooks) = Scheduler::hooks_masked(masked) {
        trace!("selecting next task");
        (hooks.select_next_task)();
    }
}
