//! # MSP430X 端口
//!
//! 16 位 MSP430X 处理器的硬件相关代码。
//!
//! ## 中断门
//!
//! 全局中断由状态寄存器 SR 的 GIE 位控制：
//! - `dint` 清除 GIE
//! - `eint` 置位 GIE，但要到下一条指令之后才生效，因此启用之后必须跟一条 `nop`
//!
//! ## 上下文切换
//!
//! 寄存器保存/恢复序列与栈帧布局由链接进来的汇编提供：
//!
//! | 符号 | 作用 |
//! |------|------|
//! | `port_yield_context` | 压入 SR、关中断、保存 R4-R15 与嵌套计数，调用 `port_select_next_task`，恢复新任务并 `reti` |
//! | `port_start_first_task` | 恢复第一个任务的上下文并 `reti` |
//!
//! 汇编通过 `port_save_critical_nesting` / `port_restore_critical_nesting`
//! 把嵌套计数存入任务栈帧。

use crate::hal::traits::*;

unsafe extern "C" {
    fn port_yield_context();
    fn port_start_first_task() -> !;
}

/// MSP430X 处理器
pub struct Port;

impl Port {
    /// 硬件复位已经给出初始状态，无需额外处理
    pub(crate) fn reset_state() {}
}

impl InterruptControl for Port {
    #[inline(always)]
    fn disable_interrupts() {
        msp430::interrupt::disable();
    }

    #[inline(always)]
    unsafe fn enable_interrupts() {
        // SAFETY: 由调用者保证没有存活的屏蔽令牌
        unsafe {
            msp430::interrupt::enable();
        }
        Self::nop();
    }

    #[inline(always)]
    fn nop() {
        msp430::asm::nop();
    }

    #[inline(always)]
    fn interrupts_enabled() -> bool {
        msp430::register::sr::read().gie()
    }
}

impl ContextSwitch for Port {
    #[inline(always)]
    fn switch_context() {
        unsafe {
            port_yield_context();
        }
    }

    unsafe fn start_first_task() {
        // SAFETY: 汇编恢复第一个任务的栈帧并 `reti`，调用者保证此时状态一致
        unsafe { port_start_first_task() }
    }
}

impl ArchInfo for Port {
    fn arch_name() -> &'static str {
        "MSP430X"
    }

    fn word_size() -> usize {
        16
    }

    fn stack_alignment() -> usize {
        crate::config::BYTE_ALIGNMENT
    }
}
