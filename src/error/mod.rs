//! 错误类型

pub mod types;

pub use types::{PortError, Result};
