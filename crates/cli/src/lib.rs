//! # CertWatch Webhook CLI
//!
//! 证书透明度事件流中继的命令行层。
//!
//! 提供：
//! - 参数解析与配置合并
//! - 运行管道编排与生命周期管理
//! - 终端输出、签名预览与校验

pub mod cli;
pub mod commands;
pub mod error;
pub mod output;
pub mod pipeline;

pub use cli::{Cli, Commands};
pub use error::{CliError, Result};
pub use pipeline::ExitStatus;
