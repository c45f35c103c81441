//! Cortex-M3 端口
//!
//! 切换不是立即执行的：`switch_context` 只挂起 PendSV，
//! PendSV 以最低优先级运行，由链接进来的汇编保存 R4-R11 与嵌套计数，
//! 调用 `port_select_next_task` 后恢复新任务。

use crate::hal::traits::*;
use crate::kernel::time::systick::Systick;
use cortex_m::peripheral::SCB;
use cortex_m_rt::ExceptionFrame;
use cortex_m_rt::exception;

/// Cortex-M3 处理器
pub struct Port;

impl Port {
    /// 硬件复位已经给出初始状态，无需额外处理
    pub(crate) fn reset_state() {}
}

fn trigger_schedule() {
    cortex_m::asm::dsb();
    cortex_m::asm::isb();
    SCB::set_pendsv();
}

impl InterruptControl for Port {
    #[inline(always)]
    fn disable_interrupts() {
        cortex_m::interrupt::disable();
    }

    #[inline(always)]
    unsafe fn enable_interrupts() {
        // SAFETY: 由调用者保证没有存活的屏蔽令牌
        unsafe {
            cortex_m::interrupt::enable();
        }
        Self::nop();
    }

    #[inline(always)]
    fn nop() {
        cortex_m::asm::nop();
    }

    #[inline(always)]
    fn interrupts_enabled() -> bool {
        cortex_m::register::primask::read().is_active()
    }
}

impl ContextSwitch for Port {
    fn switch_context() {
        trigger_schedule();
    }

    unsafe fn start_first_task() {
        trigger_schedule();
        // SAFETY: 调度器启动代码保证计数为 0，开中断后 PendSV 完成第一次切换
        unsafe {
            cortex_m::interrupt::enable();
        }
    }
}

impl ArchInfo for Port {
    fn arch_name() -> &'static str {
        "Cortex-M3"
    }

    fn word_size() -> usize {
        32
    }

    fn stack_alignment() -> usize {
        8
    }
}

#[exception]
fn SysTick() {
    Systick::tick_isr();
}

#[exception]
unsafe fn HardFault(_ef: &ExceptionFrame) -> ! {
    loop {}
}
