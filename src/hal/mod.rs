//! 硬件抽象层 (HAL)
//!
//! 提供与底层硬件交互的抽象接口，支持多种架构。
//! 每个后端导出一个实现了全部 trait 的 `Port` 类型。

pub mod traits;

#[cfg(all(target_arch = "msp430", not(feature = "msp430x")))]
compile_error!("enable the `msp430x` feature when building for MSP430");

#[cfg(all(feature = "msp430x", target_arch = "msp430"))]
pub mod msp430x;
#[cfg(all(feature = "cortex_m3", not(test), target_arch = "arm"))]
pub mod cortex_m3;
#[cfg(not(any(
    all(feature = "msp430x", target_arch = "msp430"),
    all(feature = "cortex_m3", not(test), target_arch = "arm")
)))]
pub mod sim;

// 重新导出 traits
pub use traits::*;

// 架构特定实现导出
#[cfg(all(feature = "msp430x", target_arch = "msp430"))]
pub use msp430x::Port;

#[cfg(all(feature = "cortex_m3", not(test), target_arch = "arm"))]
pub use cortex_m3::Port;

#[cfg(not(any(
    all(feature = "msp430x", target_arch = "msp430"),
    all(feature = "cortex_m3", not(test), target_arch = "arm")
)))]
pub use sim::Port;
