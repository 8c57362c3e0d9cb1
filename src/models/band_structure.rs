//! # 能带结构数据模型
//!
//! 表示均匀 k 点网格上的本征值（VASP EIGENVAL），提供带边、带隙
//! 以及剪刀算符修正。
//!
//! ## 依赖关系
//! - 被 `parsers/` 构造，被 `spectra/` 使用
//! - 使用 `models/structure.rs`

use crate::error::{Result, TaspecError};
use crate::models::Crystal;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// 判断能量位于费米能级上下时使用的容差 (eV)
const METAL_TOLERANCE: f64 = 1e-4;

/// 自旋通道
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Spin {
    Up,
    Down,
}

impl fmt::Display for Spin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Spin::Up => write!(f, "up"),
            Spin::Down => write!(f, "down"),
        }
    }
}

/// 剪刀算符：带隙中心以上的能量整体平移 `shift`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScissorShift {
    pub centre: f64,
    pub shift: f64,
}

impl ScissorShift {
    /// 对单个能量应用平移
    pub fn apply(&self, energy: f64) -> f64 {
        if energy > self.centre {
            energy + self.shift
        } else {
            energy
        }
    }
}

/// 能带结构
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BandStructure {
    /// 费米能级 (eV)
    pub efermi: f64,

    /// k 点（倒格子分数坐标）
    pub kpoints: Vec<[f64; 3]>,

    /// k 点权重（归一化到 1）
    pub kpoint_weights: Vec<f64>,

    /// 本征值 `bands[spin][band][kpoint]` (eV)
    pub bands: BTreeMap<Spin, Vec<Vec<f64>>>,

    /// 价电子数
    pub nelect: Option<f64>,

    /// 对应的晶体结构
    pub structure: Option<Crystal>,
}

impl BandStructure {
    /// 创建能带结构并检查各数组形状
    pub fn new(
        efermi: f64,
        kpoints: Vec<[f64; 3]>,
        kpoint_weights: Vec<f64>,
        bands: BTreeMap<Spin, Vec<Vec<f64>>>,
    ) -> Result<Self> {
        if kpoints.len() != kpoint_weights.len() {
            return Err(TaspecError::InvalidArgument(format!(
                "{} k-points but {} k-point weights",
                kpoints.len(),
                kpoint_weights.len()
            )));
        }
        if !bands.contains_key(&Spin::Up) {
            return Err(TaspecError::InvalidArgument(
                "band structure has no spin-up channel".to_string(),
            ));
        }

        let nbands = bands[&Spin::Up].len();
        for (spin, spin_bands) in &bands {
            if spin_bands.len() != nbands {
                return Err(TaspecError::InvalidArgument(format!(
                    "spin {} has {} bands, expected {}",
                    spin,
                    spin_bands.len(),
                    nbands
                )));
            }
            if let Some(idx) = spin_bands.iter().position(|b| b.len() != kpoints.len()) {
                return Err(TaspecError::InvalidArgument(format!(
                    "band {} (spin {}) has {} energies for {} k-points",
                    idx,
                    spin,
                    spin_bands[idx].len(),
                    kpoints.len()
                )));
            }
        }

        Ok(BandStructure {
            efermi,
            kpoints,
            kpoint_weights,
            bands,
            nelect: None,
            structure: None,
        })
    }

    /// 能带数
    pub fn nbands(&self) -> usize {
        self.bands.values().next().map(|b| b.len()).unwrap_or(0)
    }

    /// k 点数
    pub fn nkpoints(&self) -> usize {
        self.kpoints.len()
    }

    /// 是否为自旋极化计算
    pub fn is_spin_polarized(&self) -> bool {
        self.bands.contains_key(&Spin::Down)
    }

    /// 是否为金属：存在一条能带同时跨越费米能级上下
    pub fn is_metal(&self) -> bool {
        self.bands.values().flatten().any(|band| {
            band.iter().any(|&e| e < self.efermi - METAL_TOLERANCE)
                && band.iter().any(|&e| e > self.efermi + METAL_TOLERANCE)
        })
    }

    fn energies(&self) -> impl Iterator<Item = f64> + '_ {
        self.bands.values().flatten().flatten().copied()
    }

    /// 价带顶能量
    pub fn vbm(&self) -> Option<f64> {
        self.energies()
            .filter(|&e| e <= self.efermi)
            .fold(None, |acc: Option<f64>, e| Some(acc.map_or(e, |a| a.max(e))))
    }

    /// 导带底能量
    pub fn cbm(&self) -> Option<f64> {
        self.energies()
            .filter(|&e| e > self.efermi)
            .fold(None, |acc: Option<f64>, e| Some(acc.map_or(e, |a| a.min(e))))
    }

    /// 带隙 (eV)，金属为 0
    pub fn band_gap(&self) -> f64 {
        if self.is_metal() {
            return 0.0;
        }
        match (self.vbm(), self.cbm()) {
            (Some(v), Some(c)) => c - v,
            _ => 0.0,
        }
    }

    /// 带隙中心；金属取费米能级
    pub fn bandgap_centre(&self) -> f64 {
        if self.is_metal() {
            return self.efermi;
        }
        match (self.vbm(), self.cbm()) {
            (Some(v), Some(c)) => (v + c) / 2.0,
            _ => self.efermi,
        }
    }

    /// 各自旋通道价带顶所在能带的序号
    ///
    /// 即第一条在任意 k 点高于费米能级的能带之下的那条；全部能带都被占据时
    /// 为 `nbands - 1`，没有占据带时为 -1。
    pub fn vbm_band_indices(&self) -> BTreeMap<Spin, i64> {
        self.bands
            .iter()
            .map(|(&spin, spin_bands)| {
                let first_empty = spin_bands
                    .iter()
                    .position(|band| band.iter().any(|&e| e > self.efermi))
                    .unwrap_or(spin_bands.len()) as i64;
                (spin, first_empty - 1)
            })
            .collect()
    }

    /// 计算把带隙修正为 `bandgap` 所需的剪刀平移
    pub fn scissor_shift(&self, bandgap: f64) -> Result<ScissorShift> {
        if self.is_metal() {
            return Err(TaspecError::MetallicSystem);
        }
        if bandgap < 0.0 {
            return Err(TaspecError::InvalidArgument(format!(
                "band gap must be non-negative, got {}",
                bandgap
            )));
        }
        Ok(ScissorShift {
            centre: self.bandgap_centre(),
            shift: bandgap - self.band_gap(),
        })
    }

    /// 应用剪刀平移，返回新的能带结构
    pub fn apply_scissor(&self, scissor: &ScissorShift) -> BandStructure {
        let bands = self
            .bands
            .iter()
            .map(|(&spin, spin_bands)| {
                let shifted = spin_bands
                    .iter()
                    .map(|band| band.iter().map(|&e| scissor.apply(e)).collect())
                    .collect();
                (spin, shifted)
            })
            .collect();

        BandStructure {
            bands,
            ..self.clone()
        }
    }
}
