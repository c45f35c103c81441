use crate::config::{TickCount, TickType};
use crate::kernel::critical::{MaskedCell, with_interrupts_masked};
use crate::kernel::scheduler::Scheduler;
use crate::kernel::switch::yield_from_isr;

/// 端口 tick 计数
///
/// 32 位 tick 在 16 位处理器上不是原子的，只在中断屏蔽期间访问。
static CURRENT_TIME: MaskedCell<TickType> = MaskedCell::new(<TickType as TickCount>::ZERO);

pub struct Systick;

impl Systick {
    pub(crate) fn init() {
        with_interrupts_masked(|m| CURRENT_TIME.set(m, <TickType as TickCount>::ZERO));
    }

    /// 周期定时器中断入口
    ///
    /// 推进 tick 计数（按配置宽度回绕）。调度器运行时调用 `increment_tick`，
    /// 并把结果交给 [`yield_from_isr`]。
    /// `increment_tick` 在屏蔽期间运行，即使它打开又关闭了临界区，
    /// 返回时的屏蔽位也与进入中断时一致。
    pub fn tick_isr() {
        let should_switch = with_interrupts_masked(|m| {
            CURRENT_TIME.set(m, CURRENT_TIME.get(m).wrapping_increment());
            if !Scheduler::is_running() {
                return false;
            }
            match Scheduler::hooks_masked(m) {
                Some(hooks) => (hooks.increment_tick)(),
                None => false,
            }
        });
        yield_from_isr(should_switch);
    }

    pub fn get_current_time() -> TickType {
        with_interrupts_masked(|m| CURRENT_TIME.get(m))
    }

    #[cfg(test)]
    pub(crate) fn set_current_time(ticks: TickType) {
        with_interrupts_masked(|m| CURRENT_TIME.set(m, ticks));
    }
}
