//! # 光谱计算模块
//!
//! 由能带结构计算瞬态吸收谱 (TAS) 与差分吸收谱 (DAS)。
//!
//! ## 子模块
//! - `units`: 物理常数与能量/波长换算
//! - `occupancy`: 暗态与光照态占据数
//! - `jdos`: 能量网格、高斯展宽与按跃迁分解的 JDOS
//! - `generator`: TAS/DAS 生成器
//! - `plot`: 图表生成
//! - `export`: 数据导出
//!
//! ## 依赖关系
//! - 被 `commands/tas.rs`, `commands/das.rs` 使用
//! - 使用 `models/` 的 BandStructure, Dos, FermiDos

pub mod export;
pub mod generator;
pub mod jdos;
pub mod occupancy;
pub mod plot;
pub mod units;

pub use generator::{AbsorptionSystem, Das, DasGenerator, SpectrumConfig, Tas, TasGenerator};
pub use jdos::TransitionKey;
