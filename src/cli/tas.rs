//! # tas 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/tas.rs`

use crate::cli::spectrum::{OutputFormat, PlotArgs, SpectrumArgs};

use clap::Args;
use std::path::PathBuf;

/// tas 子命令参数
#[derive(Args, Debug)]
pub struct TasArgs {
    /// VASP calculation directory (EIGENVAL + DOSCAR), or a directory of calculations (batch mode)
    pub input: PathBuf,

    /// Output: file path (single mode) or directory (batch mode)
    #[arg(short, long, default_value = "tas.png")]
    pub output: PathBuf,

    /// Output format (auto-detected from extension if not specified)
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Photo-excited carrier concentration in cm^-3 (electrons = holes)
    #[arg(short, long, default_value_t = 1e18)]
    pub concentration: f64,

    /// Scissor-correct the band gap to this value in eV (e.g., experimental gap)
    #[arg(long)]
    pub bandgap: Option<f64>,

    /// Also write the per-transition decomposition as CSV to this path
    #[arg(long)]
    pub decomposition: Option<PathBuf>,

    #[command(flatten)]
    pub spectrum: SpectrumArgs,

    #[command(flatten)]
    pub plot: PlotArgs,

    // ─────────────────────────────────────────────────────────────
    // 批量处理参数
    // ─────────────────────────────────────────────────────────────
    /// Glob pattern(s) for calculation directory names (batch mode, e.g., "*_hse,CdTe*")
    #[arg(long, default_value = "*")]
    pub pattern: String,

    /// Recurse into subdirectories (batch mode)
    #[arg(long, default_value_t = false)]
    pub recursive: bool,

    /// Overwrite existing output files (batch mode)
    #[arg(long, default_value_t = false)]
    pub overwrite: bool,
}
