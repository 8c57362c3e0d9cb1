//! # 数据模型模块
//!
//! 定义能带结构、态密度、晶体结构与计算目录数据模型。
//!
//! ## 依赖关系
//! - 被 `parsers/`、`spectra/` 和 `commands/` 使用
//! - 子模块: band_structure, calculation, dos, structure

pub mod band_structure;
pub mod calculation;
pub mod dos;
pub mod structure;

pub use band_structure::{BandStructure, ScissorShift, Spin};
pub use calculation::Calculation;
pub use dos::{Dos, FermiDos};
pub use structure::{Atom, Crystal, Lattice};
