#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortError {
    // 配置相关
    UnsupportedTickWidth(u8),
    TickOverflow,

    // 调度器启动相关
    HooksNotInstalled,
    AlreadyRunning,
}

impl core::fmt::Display for PortError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            // 配置
            PortError::UnsupportedTickWidth(bits) => {
                write!(f, "Unsupported tick type width: {} bits", bits)
            }
            PortError::TickOverflow => write!(f, "Tick count overflows the configured tick width"),

            // 调度器
            PortError::HooksNotInstalled => write!(f, "Scheduler hooks not installed"),
            PortError::AlreadyRunning => write!(f, "Scheduler already running"),
        }
    }
}

pub type Result<T> = core::result::Result<T, PortError>;
