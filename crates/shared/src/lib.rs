//! 共享库
//!
//! 包含命令行与各入口共用的配置、错误处理与日志初始化。

pub mod config;
pub mod error;
pub mod observability;
