//! # 统一错误处理模块
//!
//! 定义 taspec 的所有错误类型，使用 `thiserror` 派生。
//!
//! ## 依赖关系
//! - 被所有其他模块使用
//! - 无外部模块依赖

use thiserror::Error;

/// taspec 统一错误类型
#[derive(Error, Debug)]
pub enum TaspecError {
    // ─────────────────────────────────────────────────────────────
    // I/O 错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to read file: {path}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}")]
    FileWriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: String },

    #[error("Calculation directory {dir} has no {file}")]
    MissingInput { file: String, dir: String },

    // ─────────────────────────────────────────────────────────────
    // 解析错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to parse {format} file: {path}\nReason: {reason}")]
    ParseError {
        format: String,
        path: String,
        reason: String,
    },

    #[error("Invalid transition '{0}' (expected e.g. '-1:6' or '(-1,6,up)')")]
    InvalidTransition(String),

    // ─────────────────────────────────────────────────────────────
    // 参数错误
    // ─────────────────────────────────────────────────────────────
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid range format: {0}")]
    InvalidRange(String),

    #[error("Occupancies do not match the band structure: {0}")]
    OccupancyShape(String),

    // ─────────────────────────────────────────────────────────────
    // 物理计算错误
    // ─────────────────────────────────────────────────────────────
    #[error("System is metallic, cannot set a band gap")]
    MetallicSystem,

    #[error("Could not find a Fermi level for n = {concentration:e} cm^-3 at T = {temperature} K")]
    FermiLevelNotFound {
        concentration: f64,
        temperature: f64,
    },

    // ─────────────────────────────────────────────────────────────
    // 绘图错误
    // ─────────────────────────────────────────────────────────────
    #[error("Plotting region {0}")]
    PlotRange(String),

    #[error("Transition {0} not present in the spectrum decomposition")]
    UnknownTransition(String),

    #[error("Plot rendering failed: {0}")]
    PlotError(String),

    // ─────────────────────────────────────────────────────────────
    // CSV 错误
    // ─────────────────────────────────────────────────────────────
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    // ─────────────────────────────────────────────────────────────
    // 其他
    // ─────────────────────────────────────────────────────────────
    #[error("No calculation directories found under: {path}")]
    NoCalculationsFound { path: String },

    #[error("{0}")]
    Other(String),
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, TaspecError>;
