//! # DFT 计算数据模型
//!
//! 一个计算目录读取后的结果：能带结构 + 总态密度。
//!
//! ## 依赖关系
//! - 被 `parsers/mod.rs` 构造
//! - 被 `commands/tas.rs`, `commands/das.rs` 使用

use crate::models::{BandStructure, Dos};

/// 单个计算目录
#[derive(Debug, Clone)]
pub struct Calculation {
    /// 计算名称（目录名）
    pub name: String,

    /// 能带结构（EIGENVAL）
    pub band_structure: BandStructure,

    /// 总态密度（DOSCAR）
    pub dos: Dos,
}

impl Calculation {
    pub fn new(name: impl Into<String>, band_structure: BandStructure, dos: Dos) -> Self {
        Calculation {
            name: name.into(),
            band_structure,
            dos,
        }
    }

    /// 材料名称：优先使用结构的化学式，否则用目录名
    pub fn material(&self) -> String {
        self.band_structure
            .structure
            .as_ref()
            .map(|s| s.formula())
            .filter(|f| !f.is_empty())
            .unwrap_or_else(|| self.name.clone())
    }
}
