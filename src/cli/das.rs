//! # das 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/das.rs`

use crate::cli::spectrum::{OutputFormat, PlotArgs, SpectrumArgs};

use clap::Args;
use std::path::PathBuf;

/// das 子命令参数
#[derive(Args, Debug)]
pub struct DasArgs {
    /// Calculation directory of the new system (e.g., defect, strained, doped)
    pub new_dir: PathBuf,

    /// Calculation directory of the reference system
    pub ref_dir: PathBuf,

    /// Output file path
    #[arg(short, long, default_value = "das.png")]
    pub output: PathBuf,

    /// Output format (auto-detected from extension if not specified)
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Scissor-correct the band gap of the new system (eV)
    #[arg(long)]
    pub bandgap: Option<f64>,

    /// Scissor-correct the band gap of the reference system (eV)
    #[arg(long)]
    pub bandgap_ref: Option<f64>,

    /// Also write the per-transition decomposition as CSV to this path
    #[arg(long)]
    pub decomposition: Option<PathBuf>,

    #[command(flatten)]
    pub spectrum: SpectrumArgs,

    #[command(flatten)]
    pub plot: PlotArgs,
}
