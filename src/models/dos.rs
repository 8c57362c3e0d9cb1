//! # 态密度数据模型
//!
//! `Dos` 保存 DOSCAR 中的总态密度；`FermiDos` 在其上实现载流子统计，
//! 用于由载流子浓度反求（准）费米能级。
//!
//! ## 算法概述
//! 1. 计算能量间隔 `de[i] = e[i+1] - e[i]`（最后一点为 0）
//! 2. 可选地按价电子数归一化 0 K 下费米能级以下的积分
//! 3. 从态密度中识别带隙（态密度低于 `0.001 × 平均值`）
//! 4. 掺杂浓度 = (价带空穴 - 导带电子) / V
//! 5. 对单调递减的掺杂曲线二分求费米能级
//!
//! ## 依赖关系
//! - 被 `parsers/doscar.rs` 构造
//! - 被 `spectra/occupancy.rs` 使用
//! - 使用 `spectra/occupancy.rs` 的 Fermi-Dirac 分布

use crate::error::{Result, TaspecError};
use crate::models::{ScissorShift, Spin};
use crate::spectra::occupancy::fermi_dirac;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Å³ → cm³
const ANGSTROM3_TO_CM3: f64 = 1e-24;

/// 带隙识别的相对容差
const GAP_TOLERANCE: f64 = 0.001;

/// 二分求解的迭代次数上限
const MAX_BISECTION_STEPS: usize = 200;

/// 二分求解的能量收敛阈值 (eV)
const FERMI_PRECISION: f64 = 1e-9;

/// 总态密度
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dos {
    /// 费米能级 (eV)
    pub efermi: f64,

    /// 能量网格 (eV)，升序
    pub energies: Vec<f64>,

    /// 各自旋通道的态密度 (states/eV/cell)
    pub densities: BTreeMap<Spin, Vec<f64>>,

    /// 晶胞体积 (Å³)
    pub volume: f64,
}

impl Dos {
    /// 各自旋通道求和后的总态密度
    pub fn total_densities(&self) -> Vec<f64> {
        let mut total = vec![0.0; self.energies.len()];
        for spin_dos in self.densities.values() {
            for (t, d) in total.iter_mut().zip(spin_dos) {
                *t += d;
            }
        }
        total
    }

    /// 应用剪刀平移
    pub fn apply_scissor(&self, scissor: &ScissorShift) -> Dos {
        Dos {
            energies: self.energies.iter().map(|&e| scissor.apply(e)).collect(),
            ..self.clone()
        }
    }
}

/// 用于载流子统计的总态密度
#[derive(Debug, Clone)]
pub struct FermiDos {
    energies: Vec<f64>,
    tdos: Vec<f64>,
    de: Vec<f64>,
    volume: f64,
    idx_vbm: usize,
    idx_cbm: usize,
}

impl FermiDos {
    /// 从总态密度构造；给出 `nelect` 时把 0 K 积分归一化到价电子数
    pub fn new(dos: &Dos, nelect: Option<f64>) -> Result<Self> {
        let n = dos.energies.len();
        if n < 2 {
            return Err(TaspecError::InvalidArgument(
                "density of states needs at least two energy points".to_string(),
            ));
        }
        if dos.volume <= 0.0 {
            return Err(TaspecError::InvalidArgument(format!(
                "cell volume must be positive, got {}",
                dos.volume
            )));
        }

        let energies = dos.energies.clone();
        let mut de: Vec<f64> = energies.windows(2).map(|w| w[1] - w[0]).collect();
        de.push(0.0);

        let mut tdos = dos.total_densities();
        if let Some(nelect) = nelect {
            let integral: f64 = (0..n)
                .filter(|&i| energies[i] <= dos.efermi)
                .map(|i| tdos[i] * de[i])
                .sum();
            if integral > 0.0 {
                let factor = nelect / integral;
                tdos.iter_mut().for_each(|d| *d *= factor);
            }
        }

        let (idx_vbm, idx_cbm) = gap_indices(&energies, &tdos, dos.efermi);

        Ok(FermiDos {
            energies,
            tdos,
            de,
            volume: dos.volume,
            idx_vbm,
            idx_cbm,
        })
    }

    /// 给定费米能级与温度下的掺杂浓度 (cm⁻³)，正值为 p 型
    pub fn doping(&self, fermi_level: f64, temperature: f64) -> f64 {
        let cb: f64 = (self.idx_cbm..self.energies.len())
            .map(|i| self.tdos[i] * fermi_dirac(self.energies[i], fermi_level, temperature) * self.de[i])
            .sum();
        let vb: f64 = (0..=self.idx_vbm)
            .map(|i| {
                self.tdos[i] * fermi_dirac(-self.energies[i], -fermi_level, temperature) * self.de[i]
            })
            .sum();

        (vb - cb) / (self.volume * ANGSTROM3_TO_CM3)
    }

    /// 求使掺杂浓度等于 `concentration` (cm⁻³) 的费米能级
    ///
    /// 负浓度表示电子（n 型），正浓度表示空穴（p 型）。
    pub fn fermi_level(&self, concentration: f64, temperature: f64) -> Result<f64> {
        let not_found = || TaspecError::FermiLevelNotFound {
            concentration,
            temperature,
        };

        let first = self.energies[0];
        let last = self.energies[self.energies.len() - 1];
        let margin = 1.0 + 50.0 * crate::spectra::units::BOLTZMANN_EV * temperature;
        let mut lo = first - margin;
        let mut hi = last + margin;

        let d_lo = self.doping(lo, temperature);
        let d_hi = self.doping(hi, temperature);
        if !(d_hi <= concentration && concentration <= d_lo) {
            return Err(not_found());
        }

        for _ in 0..MAX_BISECTION_STEPS {
            let mid = 0.5 * (lo + hi);
            if self.doping(mid, temperature) > concentration {
                lo = mid;
            } else {
                hi = mid;
            }
            if hi - lo < FERMI_PRECISION {
                break;
            }
        }

        let level = 0.5 * (lo + hi);
        if level.is_finite() {
            Ok(level)
        } else {
            Err(not_found())
        }
    }
}

/// 识别带隙两端的网格序号 (idx_vbm, idx_cbm)
///
/// 从费米能级以上第一点出发，向下找到带隙起点、向上找到带隙终点。
/// 没有带隙时两者分别取费米能级两侧的相邻点。
fn gap_indices(energies: &[f64], tdos: &[f64], efermi: f64) -> (usize, usize) {
    let n = energies.len();
    let mean = tdos.iter().sum::<f64>() / n as f64;
    let tol = GAP_TOLERANCE * mean;

    let i_fermi = energies
        .iter()
        .position(|&e| e > efermi)
        .unwrap_or(n - 1)
        .max(1);

    let mut gap_start = i_fermi;
    while gap_start > 0 && tdos[gap_start - 1] <= tol {
        gap_start -= 1;
    }

    let mut gap_end = gap_start;
    while gap_end < n && tdos[gap_end] <= tol {
        gap_end += 1;
    }

    if gap_end == gap_start {
        // 费米能级附近没有带隙
        return (i_fermi - 1, i_fermi);
    }

    (gap_start, (gap_end - 1).min(n - 1))
}
