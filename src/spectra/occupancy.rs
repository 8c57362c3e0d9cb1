//! # 能带占据数
//!
//! 计算暗态（基态）与光照态（光激发载流子）下每条能带、每个 k 点的占据数。
//!
//! ## 占据规则
//! - 暗态半导体：带隙中心以下占据 1，以上占据 0
//! - 暗态金属：以费米能级为中心的 Fermi-Dirac 分布
//! - 光照态：带隙中心以下按空穴准费米能级 `E_F(+n)`，以上按电子准费米能级
//!   `E_F(-n)` 的 Fermi-Dirac 分布
//!
//! ## 依赖关系
//! - 被 `spectra/generator.rs` 调用
//! - 使用 `models/` 的 BandStructure, FermiDos

use crate::error::{Result, TaspecError};
use crate::models::{BandStructure, FermiDos, Spin};
use crate::spectra::units::BOLTZMANN_EV;

use std::collections::BTreeMap;

/// 占据数 `occs[spin][band][kpoint]`
pub type Occupancies = BTreeMap<Spin, Vec<Vec<f64>>>;

/// Fermi-Dirac 分布；`T = 0` 时退化为阶跃函数
pub fn fermi_dirac(energy: f64, fermi_level: f64, temperature: f64) -> f64 {
    if temperature <= 0.0 {
        return if energy < fermi_level {
            1.0
        } else if energy > fermi_level {
            0.0
        } else {
            0.5
        };
    }

    let x = (energy - fermi_level) / (BOLTZMANN_EV * temperature);
    if x > 700.0 {
        0.0
    } else if x < -700.0 {
        1.0
    } else {
        1.0 / (1.0 + x.exp())
    }
}

/// 暗态占据数
pub fn dark_occupancies(bs: &BandStructure, temperature: f64) -> Occupancies {
    let centre = bs.bandgap_centre();
    let metal = bs.is_metal();

    map_bands(bs, |e| {
        if metal {
            fermi_dirac(e, centre, temperature)
        } else if e < centre {
            1.0
        } else {
            0.0
        }
    })
}

/// 光照态占据数，`concentration` 为光生载流子浓度 (cm⁻³, 电子数 = 空穴数)
pub fn light_occupancies(
    bs: &BandStructure,
    fermi_dos: &FermiDos,
    temperature: f64,
    concentration: f64,
) -> Result<Occupancies> {
    let hole_fermi = fermi_dos.fermi_level(concentration, temperature)?;
    let electron_fermi = fermi_dos.fermi_level(-concentration, temperature)?;
    let centre = bs.bandgap_centre();

    Ok(map_bands(bs, |e| {
        if e < centre {
            fermi_dirac(e, hole_fermi, temperature)
        } else {
            fermi_dirac(e, electron_fermi, temperature)
        }
    }))
}

/// 检查外部给定的占据数与能带结构形状一致
pub fn validate_occupancies(bs: &BandStructure, occs: &Occupancies) -> Result<()> {
    for (spin, spin_bands) in &bs.bands {
        let spin_occs = occs
            .get(spin)
            .ok_or_else(|| TaspecError::OccupancyShape(format!("missing spin {}", spin)))?;
        if spin_occs.len() != spin_bands.len() {
            return Err(TaspecError::OccupancyShape(format!(
                "spin {}: {} bands of occupancies for {} bands",
                spin,
                spin_occs.len(),
                spin_bands.len()
            )));
        }
        if spin_occs.iter().any(|b| b.len() != bs.nkpoints()) {
            return Err(TaspecError::OccupancyShape(format!(
                "spin {}: occupancies must have {} k-points per band",
                spin,
                bs.nkpoints()
            )));
        }
    }
    Ok(())
}

fn map_bands<F>(bs: &BandStructure, f: F) -> Occupancies
where
    F: Fn(f64) -> f64,
{
    bs.bands
        .iter()
        .map(|(&spin, spin_bands)| {
            let occs = spin_bands
                .iter()
                .map(|band| band.iter().map(|&e| f(e)).collect())
                .collect();
            (spin, occs)
        })
        .collect()
}
