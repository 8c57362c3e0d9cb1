//! # 联合态密度 (JDOS)
//!
//! 对每一对能带跃迁 i → f (f > i, 同一自旋通道) 计算占据数加权、
//! Gaussian 展宽的联合态密度：
//!
//! ```text
//! JDOS_if(E) = Σ_k w_k · [o_i(1 - o_f) - o_f(1 - o_i)] · G(E - (ε_f,k - ε_i,k))
//! ```
//!
//! 第二项为受激发射；光照下导带电子与价带空穴同时存在时该项不为零。
//!
//! ## 依赖关系
//! - 被 `spectra/generator.rs` 调用
//! - 使用 `models/band_structure.rs`, `spectra/occupancy.rs`
//! - 使用 `rayon` 并行遍历能带对

use crate::error::{Result, TaspecError};
use crate::models::{BandStructure, Spin};
use crate::spectra::occupancy::Occupancies;

use rayon::prelude::*;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

/// Gaussian 截断半宽（以 σ 计）
const GAUSSIAN_CUTOFF_SIGMAS: f64 = 8.0;

/// 归一化 Gaussian
pub fn gaussian(x: f64, width: f64, centre: f64) -> f64 {
    let height = 1.0 / (width * (2.0 * PI).sqrt());
    height * (-(x - centre).powi(2) / (2.0 * width * width)).exp()
}

/// 均匀能量网格 (eV)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyMesh {
    pub start: f64,
    pub step: f64,
    pub points: Vec<f64>,
}

impl EnergyMesh {
    /// `start, start + step, ...`，严格小于 `stop`
    pub fn new(start: f64, stop: f64, step: f64) -> Result<Self> {
        if step <= 0.0 || !step.is_finite() {
            return Err(TaspecError::InvalidArgument(format!(
                "energy step must be positive, got {}",
                step
            )));
        }
        if stop <= start {
            return Err(TaspecError::InvalidRange(format!(
                "energy_max ({}) must be larger than energy_min ({})",
                stop, start
            )));
        }

        let n = ((stop - start) / step).ceil() as usize;
        let points = (0..n).map(|i| start + i as f64 * step).collect();
        Ok(EnergyMesh {
            start,
            step,
            points,
        })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// 与 `[lo, hi]` 相交的网格序号区间（左闭右开）
    fn index_window(&self, lo: f64, hi: f64) -> (usize, usize) {
        let n = self.points.len() as f64;
        let first = ((lo - self.start) / self.step).ceil().clamp(0.0, n) as usize;
        let last = (((hi - self.start) / self.step).floor() + 1.0).clamp(0.0, n) as usize;
        (first, last.max(first))
    }
}

/// 能带跃迁标识，能带序号相对于该自旋通道的价带顶
///
/// `(0, 1)` 表示价带顶 → 导带底；只有自旋极化体系才带自旋。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TransitionKey {
    pub initial: i64,
    pub final_band: i64,
    pub spin: Option<Spin>,
}

impl TransitionKey {
    pub fn new(initial: i64, final_band: i64, spin: Option<Spin>) -> Self {
        TransitionKey {
            initial,
            final_band,
            spin,
        }
    }
}

impl fmt::Display for TransitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.spin {
            Some(spin) => write!(f, "({}, {}, {})", self.initial, self.final_band, spin),
            None => write!(f, "({}, {})", self.initial, self.final_band),
        }
    }
}

impl FromStr for TransitionKey {
    type Err = TaspecError;

    /// 接受 `-1:6`, `-1,6,up`, `(-1, 6, down)` 等写法
    fn from_str(s: &str) -> Result<Self> {
        let pattern = Regex::new(
            r"^\(?\s*(-?\d+)\s*[,:]\s*(-?\d+)\s*(?:[,:]\s*(up|down)\s*)?\)?$",
        )
        .map_err(|e| TaspecError::Other(e.to_string()))?;

        let caps = pattern
            .captures(s.trim())
            .ok_or_else(|| TaspecError::InvalidTransition(s.to_string()))?;

        let parse = |m: &str| {
            m.parse::<i64>()
                .map_err(|_| TaspecError::InvalidTransition(s.to_string()))
        };
        let initial = parse(&caps[1])?;
        let final_band = parse(&caps[2])?;
        let spin = caps.get(3).map(|m| match m.as_str() {
            "down" => Spin::Down,
            _ => Spin::Up,
        });

        Ok(TransitionKey::new(initial, final_band, spin))
    }
}

/// 一组占据数下的 JDOS：总谱与按跃迁分解的谱
#[derive(Debug, Clone, Default)]
pub struct Decomposition {
    pub total: Vec<f64>,
    pub per_transition: BTreeMap<TransitionKey, Vec<f64>>,
}

/// 单个跃迁 i → f 的 JDOS
#[allow(clippy::too_many_arguments)]
pub fn transition_jdos(
    initial: &[f64],
    final_: &[f64],
    occ_initial: &[f64],
    occ_final: &[f64],
    weights: &[f64],
    mesh: &EnergyMesh,
    width: f64,
) -> Vec<f64> {
    let mut jdos = vec![0.0; mesh.len()];

    for k in 0..weights.len() {
        let factor = occupation_factor(occ_initial[k], occ_final[k]);
        if factor == 0.0 {
            continue;
        }

        let centre = final_[k] - initial[k];
        let reach = GAUSSIAN_CUTOFF_SIGMAS * width;
        let (lo, hi) = mesh.index_window(centre - reach, centre + reach);

        let scale = weights[k] * factor;
        for idx in lo..hi {
            jdos[idx] += scale * gaussian(mesh.points[idx], width, centre);
        }
    }

    jdos
}

/// 吸收减去受激发射的占据数因子
fn occupation_factor(occ_i: f64, occ_f: f64) -> f64 {
    occ_i * (1.0 - occ_f) - occ_f * (1.0 - occ_i)
}

/// 对所有能带对计算 JDOS 分解
///
/// 每组占据数得到一个 `Decomposition`。同一自旋通道内每个 `f > i` 的能带对
/// 都有一个键，占据数因子处处为零的跃迁对应全零曲线。
pub fn decompose(
    bs: &BandStructure,
    occ_sets: &[&Occupancies],
    mesh: &EnergyMesh,
    width: f64,
    jobs: usize,
) -> Result<Vec<Decomposition>> {
    let vbm_indices = bs.vbm_band_indices();
    let polarized = bs.is_spin_polarized();

    let mut pairs: Vec<(Spin, usize, usize)> = Vec::new();
    for (&spin, spin_bands) in &bs.bands {
        let nbands = spin_bands.len();
        for i in 0..nbands {
            for f in (i + 1)..nbands {
                pairs.push((spin, i, f));
            }
        }
    }

    let jobs = if jobs == 0 { num_cpus::get() } else { jobs };
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs)
        .build()
        .map_err(|e| TaspecError::Other(format!("Failed to build thread pool: {}", e)))?;

    let contributions: Vec<(TransitionKey, Vec<Vec<f64>>)> = pool.install(|| {
        pairs
            .par_iter()
            .map(|&(spin, i, f)| {
                let bands = &bs.bands[&spin];
                let curves = occ_sets
                    .iter()
                    .map(|occs| {
                        let o = &occs[&spin];
                        transition_jdos(
                            &bands[i],
                            &bands[f],
                            &o[i],
                            &o[f],
                            &bs.kpoint_weights,
                            mesh,
                            width,
                        )
                    })
                    .collect();

                let vbm = vbm_indices[&spin];
                let key = TransitionKey::new(
                    i as i64 - vbm,
                    f as i64 - vbm,
                    if polarized { Some(spin) } else { None },
                );
                (key, curves)
            })
            .collect()
    });

    let mut result: Vec<Decomposition> = occ_sets
        .iter()
        .map(|_| Decomposition {
            total: vec![0.0; mesh.len()],
            per_transition: BTreeMap::new(),
        })
        .collect();

    for (key, curves) in contributions {
        for (decomp, curve) in result.iter_mut().zip(curves) {
            for (t, v) in decomp.total.iter_mut().zip(&curve) {
                *t += v;
            }
            decomp.per_transition.insert(key, curve);
        }
    }

    Ok(result)
}

/// 两条曲线逐点相减
pub fn subtract(a: &[f64], b: &[f64]) -> Vec<f64> {
    a.iter().zip(b).map(|(x, y)| x - y).collect()
}
