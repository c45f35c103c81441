//! 任务切换触发
//!
//! 两个入口共用同一个底层切换原语：
//! - [`yield_now`]：任务主动让出处理器，无条件切换
//! - [`yield_from_isr`]：中断处理程序按调用者给出的判断有条件地切换
//!
//! 是否需要切换由调度器决定（例如 tick 处理唤醒了更高优先级任务），这里只负责执行。

use crate::hal::{ContextSwitch, Port};
use crate::kernel::critical::nesting_depth;
use crate::trace;

/// 底层切换原语
///
/// 保存调用者上下文，调用调度器选择下一个任务，恢复被选中任务的上下文。
/// 调用者在再次被调度之前不会返回。
#[inline]
fn switch_context() {
    Port::switch_context();
}

/// 任务主动让出处理器
///
/// 挂起调用任务，直到调度器再次选中它。只能在任务上下文中调用；
/// 在中断处理程序中调用属于误用，本层不做检测。
pub fn yield_now() {
    trace!("yield from task, nesting {}", nesting_depth());
    switch_context();
}

/// 从中断处理程序请求切换
///
/// `should_switch` 为 `true` 时执行一次与 [`yield_now`] 相同的切换，为 `false` 时什么也不做。
#[inline]
pub fn yield_from_isr(should_switch: bool) {
    if should_switch {
        trace!("yield from isr");
        switch_context();
    }
}
