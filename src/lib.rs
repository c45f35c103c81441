#![cfg_attr(not(test), no_std)]
#[cfg(test)]
extern crate std;

pub mod config;
pub mod error;
pub mod hal;
pub mod kernel;
pub mod log;
pub mod macros;
pub mod utils;

pub use kernel::critical::{
    CriticalGuard, disable_interrupts, enable_interrupts, enter_critical, exit_critical,
    with_critical,
};
pub use kernel::switch::{yield_from_isr, yield_now};
pub use paste;
