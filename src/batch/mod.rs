//! # 批量处理模块
//!
//! 对一个根目录下的多个 VASP 计算目录批量生成光谱。
//!
//! ## 功能
//! - 收集包含 EIGENVAL 的计算目录
//! - 并行处理
//! - 进度反馈与统计
//!
//! ## 依赖关系
//! - 被 `commands/tas.rs` 使用
//! - 使用 `rayon` 进行并行处理
//! - 使用 `indicatif` 显示进度

pub mod collector;
pub mod runner;

pub use collector::CalcDirCollector;
pub use runner::{BatchResult, BatchRunner, ProcessResult};
