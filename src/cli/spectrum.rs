//! # 光谱子命令共享参数
//!
//! `tas` 与 `das` 共用的能量网格、展宽、绘图与输出格式参数。
//!
//! ## 依赖关系
//! - 被 `cli/tas.rs`, `cli/das.rs` 通过 `#[command(flatten)]` 使用
//! - 使用 `spectra/plot.rs` 的坐标轴枚举

use crate::spectra::plot::{XAxis, YAxis};
use crate::spectra::TransitionKey;

use clap::{Args, ValueEnum};

/// 输出格式
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    /// PNG image
    Png,
    /// SVG vector image
    Svg,
    /// CSV data file (energy, wavelength, spectrum, both JDOS)
    Csv,
    /// XY data file (energy, spectrum)
    Xy,
}

impl OutputFormat {
    /// 对应的文件扩展名
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Svg => "svg",
            OutputFormat::Csv => "csv",
            OutputFormat::Xy => "xy",
        }
    }
}

/// 解析能带跃迁，如 "(-1,6)"、"0:2" 或 "(0,2,down)"
pub fn parse_transition(input: &str) -> Result<TransitionKey, String> {
    input.parse::<TransitionKey>().map_err(|e| e.to_string())
}

/// 能量网格与展宽参数
#[derive(Args, Debug, Clone)]
pub struct SpectrumArgs {
    /// Temperature in K
    #[arg(short, long, default_value_t = 300.0)]
    pub temperature: f64,

    /// Photon energy range in eV (e.g., "0-5")
    #[arg(short, long, default_value = "0-5")]
    pub range: String,

    /// Energy mesh step in eV
    #[arg(long, default_value_t = 0.01)]
    pub step: f64,

    /// Gaussian broadening width (standard deviation) in eV
    #[arg(long, default_value_t = 0.1)]
    pub width: f64,

    /// Number of parallel jobs (0 = auto)
    #[arg(short, long, default_value_t = 0, env = "TASPEC_JOBS")]
    pub jobs: usize,
}

/// 绘图参数
#[derive(Args, Debug, Clone)]
pub struct PlotArgs {
    /// X axis of the plot
    #[arg(long, value_enum, default_value = "wavelength")]
    pub xaxis: XAxis,

    /// Quantity on the Y axis
    #[arg(long, value_enum)]
    pub yaxis: Option<YAxis>,

    /// Band transition to plot, relative to the VBM (repeatable, e.g., "(0,1)" or "-1:2:up")
    #[arg(long = "transition", value_parser = parse_transition, allow_hyphen_values = true)]
    pub transitions: Vec<TransitionKey>,

    /// Plot transitions whose peak exceeds this fraction of the strongest one
    #[arg(long, default_value_t = 0.03)]
    pub cutoff: f64,

    /// Lower X limit (same unit as --xaxis)
    #[arg(long, allow_negative_numbers = true)]
    pub xmin: Option<f64>,

    /// Upper X limit (same unit as --xaxis)
    #[arg(long, allow_negative_numbers = true)]
    pub xmax: Option<f64>,

    /// Lower Y limit
    #[arg(long, allow_negative_numbers = true)]
    pub ymin: Option<f64>,

    /// Upper Y limit
    #[arg(long, allow_negative_numbers = true)]
    pub ymax: Option<f64>,

    /// Material name used in the title (default: formula from POSCAR)
    #[arg(long)]
    pub material: Option<String>,

    /// Title for the plot
    #[arg(long)]
    pub title: Option<String>,

    /// Figure width in pixels (for PNG) or points (for SVG)
    #[arg(long, default_value_t = 1200)]
    pub fig_width: u32,

    /// Figure height in pixels (for PNG) or points (for SVG)
    #[arg(long, default_value_t = 800)]
    pub fig_height: u32,

    /// Number of strongest transitions to list in the summary table
    #[arg(long, default_value_t = 8)]
    pub top: usize,
}
