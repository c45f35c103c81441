use crate::hal::Port;
use crate::kernel::critical::reset_nesting;
use crate::kernel::scheduler::Scheduler;
use crate::kernel::time::systick::Systick;

/// 端口初始化
///
/// 相当于一次系统复位后的状态：
/// - 嵌套计数清零
/// - 调度器回调清除，调度器未运行
/// - tick 计数清零
/// - 仿真后端恢复为中断启用、计数与事件日志清空
///
/// # 注意
///
/// 此函数会完全重置所有全局状态，只应在系统启动时调用，也适合在测试开始时调用。
pub fn port_init() {
    Scheduler::init();
    Systick::init();
    reset_nesting();
    Port::reset_state();
}
