//! 硬件抽象层 Trait 定义
//!
//! 这些 trait 定义了端口层与底层硬件交互的接口，
//! 不同架构（MSP430X, Cortex-M3, 主机仿真）需要实现这些 trait。

/// 中断门 trait
///
/// 全局中断屏蔽位的唯一修改入口。影响本处理器上运行的全部代码。
pub trait InterruptControl {
    /// 全局禁用中断
    ///
    /// 无条件执行，已禁用时再次调用没有额外效果。
    fn disable_interrupts();

    /// 全局启用中断
    ///
    /// 实现必须在设置屏蔽位之后执行一次 [`InterruptControl::nop`]，
    /// 以满足启用延迟一条指令生效的硬件要求。
    ///
    /// # Safety
    ///
    /// 调用后所有仍存活的 [`Masked`](crate::kernel::critical::Masked) 令牌都不再成立，
    /// 调用者必须保证此时没有正在使用的令牌。
    unsafe fn enable_interrupts();

    /// 空操作周期
    fn nop();

    /// 读取中断屏蔽位
    ///
    /// # 返回值
    /// `true` 如果中断已启用
    fn interrupts_enabled() -> bool;
}

/// 上下文切换 trait
pub trait ContextSwitch {
    /// 执行一次上下文切换
    ///
    /// 保存当前任务上下文，调用 [`crate::kernel::scheduler::port_select_next_task`]，
    /// 再恢复被选中任务的上下文。调用者直到再次被调度才返回。
    fn switch_context();

    /// 启动第一个任务
    ///
    /// 在真实硬件上不返回。
    ///
    /// # Safety
    ///
    /// 第一个任务的上下文恢复时会打开中断。只能由调度器启动代码在中断屏蔽、
    /// 嵌套计数为 0 且没有存活令牌时调用一次。
    unsafe fn start_first_task();
}

/// 架构信息 trait
pub trait ArchInfo {
    /// 获取架构名称
    fn arch_name() -> &'static str;

    /// 获取字长（位数）
    fn word_size() -> usize;

    /// 获取栈对齐要求（字节）
    fn stack_alignment() -> usize;
}
