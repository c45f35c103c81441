/// 定义任务入口函数
///
/// 生成 `fn $name($param: usize)` 以及类型为 [`TaskFunction`](crate::kernel::TaskFunction)
/// 的常量 `<NAME>_ENTRY`，调度器创建任务时直接使用该常量。
///
/// # 示例
///
/// ```rust
/// neon_port::task_function!(blink, period, {
///     let _ = period;
/// });
///
/// let entry: neon_port::kernel::TaskFunction = BLINK_ENTRY;
/// entry(100);
/// ```
#[macro_export]
macro_rules! task_function {
    ($name:ident, $param:ident, $body:block) => {
        $crate::paste::paste! {
            pub fn $name($param: usize) $body

            #[allow(dead_code)]
            pub const [<$name:upper _ENTRY>]: $crate::kernel::TaskFunction = $name;
        }
    };
}

#[cfg(test)]
mod tests {
    use core::sync::atomic::{AtomicUsize, Ordering};

    static LAST_ARG: AtomicUsize = AtomicUsize::new(0);

    crate::task_function!(record_arg, arg, {
        LAST_ARG.store(arg, Ordering::SeqCst);
    });

    #[test]
    fn test_task_function_entry() {
        RECORD_ARG_ENTRY(7);
        assert_eq!(LAST_ARG.load(Ordering::SeqCst), 7);
    }
}
