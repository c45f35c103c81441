//! 主机仿真后端
//!
//! 在没有目标硬件时使用（单元测试、集成测试、主机构建）。
//! 中断屏蔽位用一个原子布尔量模拟，所有门操作都会被计数并记入事件日志，
//! 测试可以据此检查启用后是否紧跟空操作、切换是否恰好发生一次等性质。

#[cfg(not(feature = "sim"))]
compile_error!("no hardware backend selected and the `sim` feature is disabled");

use crate::hal::traits::*;
use crate::kernel::critical::{port_restore_critical_nesting, port_save_critical_nesting};
use crate::kernel::scheduler::port_select_next_task;
use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use spin::Mutex;

/// 事件日志容量，超出后丢弃新事件
pub const EVENT_LOG_CAPACITY: usize = 64;

/// 仿真中断屏蔽位，true 表示已启用
static INTERRUPTS_ENABLED: AtomicBool = AtomicBool::new(true);

static DISABLE_COUNT: AtomicUsize = AtomicUsize::new(0);
static ENABLE_COUNT: AtomicUsize = AtomicUsize::new(0);
static NOP_COUNT: AtomicUsize = AtomicUsize::new(0);
static SWITCH_COUNT: AtomicUsize = AtomicUsize::new(0);

static EVENT_LOG: Mutex<EventLog> = Mutex::new(EventLog::new());

/// 门操作事件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateEvent {
    Disable,
    Enable,
    Nop,
    Switch,
    StartFirstTask,
}

/// 固定容量的门操作事件日志
#[derive(Debug, Clone, Copy)]
pub struct EventLog {
    events: [GateEvent; EVENT_LOG_CAPACITY],
    len: usize,
}

impl EventLog {
    const fn new() -> Self {
        Self {
            events: [GateEvent::Nop; EVENT_LOG_CAPACITY],
            len: 0,
        }
    }

    fn push(&mut self, event: GateEvent) {
        if self.len < EVENT_LOG_CAPACITY {
            self.events[self.len] = event;
            self.len += 1;
        }
    }

    pub fn as_slice(&self) -> &[GateEvent] {
        &self.events[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// 门操作计数快照
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SimStats {
    pub disables: usize,
    pub enables: usize,
    pub nops: usize,
    pub switches: usize,
}

fn record(event: GateEvent) {
    EVENT_LOG.lock().push(event);
}

/// 获取计数快照
pub fn stats() -> SimStats {
    SimStats {
        disables: DISABLE_COUNT.load(Ordering::SeqCst),
        enables: ENABLE_COUNT.load(Ordering::SeqCst),
        nops: NOP_COUNT.load(Ordering::SeqCst),
        switches: SWITCH_COUNT.load(Ordering::SeqCst),
    }
}

/// 获取事件日志副本
pub fn event_log() -> EventLog {
    *EVENT_LOG.lock()
}

/// 清空计数与事件日志，不改变屏蔽位
pub fn clear_trace() {
    DISABLE_COUNT.store(0, Ordering::SeqCst);
    ENABLE_COUNT.store(0, Ordering::SeqCst);
    NOP_COUNT.store(0, Ordering::SeqCst);
    SWITCH_COUNT.store(0, Ordering::SeqCst);
    *EVENT_LOG.lock() = EventLog::new();
}

/// 仿真处理器
pub struct Port;

impl Port {
    /// 复位仿真状态：中断启用，计数与日志清空
    pub(crate) fn reset_state() {
        INTERRUPTS_ENABLED.store(true, Ordering::SeqCst);
        clear_trace();
    }
}

impl InterruptControl for Port {
    fn disable_interrupts() {
        INTERRUPTS_ENABLED.store(false, Ordering::SeqCst);
        DISABLE_COUNT.fetch_add(1, Ordering::SeqCst);
        record(GateEvent::Disable);
    }

    unsafe fn enable_interrupts() {
        INTERRUPTS_ENABLED.store(true, Ordering::SeqCst);
        ENABLE_COUNT.fetch_add(1, Ordering::SeqCst);
        record(GateEvent::Enable);
        Self::nop();
    }

    fn nop() {
        NOP_COUNT.fetch_add(1, Ordering::SeqCst);
        record(GateEvent::Nop);
    }

    fn interrupts_enabled() -> bool {
        INTERRUPTS_ENABLED.load(Ordering::SeqCst)
    }
}

impl ContextSwitch for Port {
    /// 同步完成一次切换
    ///
    /// 与硬件上的切换序列一致：保存状态寄存器（含屏蔽位），关中断，
    /// 保存嵌套计数，选择下一任务，再按相反顺序恢复。
    fn switch_context() {
        let was_enabled = INTERRUPTS_ENABLED.swap(false, Ordering::SeqCst);
        SWITCH_COUNT.fetch_add(1, Ordering::SeqCst);
        record(GateEvent::Switch);

        let nesting = port_save_critical_nesting();
        port_select_next_task();
        // SAFETY: 中断已屏蔽，恢复的是同一任务刚保存的计数，屏蔽位随后一并恢复
        unsafe { port_restore_critical_nesting(nesting) };

        INTERRUPTS_ENABLED.store(was_enabled, Ordering::SeqCst);
    }

    unsafe fn start_first_task() {
        record(GateEvent::StartFirstTask);
        INTERRUPTS_ENABLED.store(true, Ordering::SeqCst);
    }
}

impl ArchInfo for Port {
    fn arch_name() -> &'static str {
        "sim"
    }

    fn word_size() -> usize {
        16
    }

    fn stack_alignment() -> usize {
        crate::config::BYTE_ALIGNMENT
    }
}
