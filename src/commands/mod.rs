//! # 命令执行模块
//!
//! 实现各子命令的业务逻辑。
//!
//! ## 依赖关系
//! - 被 `main.rs` 调用
//! - 使用 `cli/`, `parsers/`, `spectra/`, `batch/`, `utils/`
//! - 子模块: tas, das, spectrum（共享逻辑）

pub mod das;
pub mod spectrum;
pub mod tas;

use crate::cli::Commands;
use crate::error::Result;

/// 执行命令
pub fn run(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Tas(args) => tas::execute(args),
        Commands::Das(args) => das::execute(args),
    }
}
