pub mod critical;
pub mod scheduler;
pub mod switch;
pub mod time;

/// 任务入口函数类型，参数为创建任务时传入的值
pub type TaskFunction = fn(usize);
