//! # TAS / DAS 谱生成器
//!
//! - TAS: 同一材料光照态与暗态的 JDOS 之差，`ΔT = JDOS(light) - JDOS(dark)`
//! - DAS: 新体系与参考体系暗态 JDOS 之差，`ΔA = JDOS(new) - JDOS(ref)`
//!
//! 两者都在 `[energy_min, energy_max)` 的均匀网格上给出总谱和按能带跃迁分解的谱。
//!
//! ## 依赖关系
//! - 被 `commands/tas.rs`, `commands/das.rs` 调用
//! - 使用 `models/` 的 BandStructure, Dos, FermiDos
//! - 使用 `spectra/occupancy.rs`, `spectra/jdos.rs`

use crate::error::{Result, TaspecError};
use crate::models::{BandStructure, Dos, FermiDos};
use crate::spectra::jdos::{self, EnergyMesh, TransitionKey};
use crate::spectra::occupancy::{self, Occupancies};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 谱计算参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectrumConfig {
    /// 温度 (K)
    pub temperature: f64,
    /// 能量网格下限 (eV)
    pub energy_min: f64,
    /// 能量网格上限 (eV，不含)
    pub energy_max: f64,
    /// Gaussian 展宽 σ (eV)
    pub gaussian_width: f64,
    /// 网格步长 (eV)
    pub step: f64,
    /// 并行线程数（0 = 自动）
    pub jobs: usize,
}

impl Default for SpectrumConfig {
    fn default() -> Self {
        SpectrumConfig {
            temperature: 300.0,
            energy_min: 0.0,
            energy_max: 5.0,
            gaussian_width: 0.1,
            step: 0.01,
            jobs: 0,
        }
    }
}

impl SpectrumConfig {
    /// 检查参数并生成能量网格
    pub fn energy_mesh(&self) -> Result<EnergyMesh> {
        if !(self.temperature >= 0.0) {
            return Err(TaspecError::InvalidArgument(format!(
                "temperature must be non-negative, got {}",
                self.temperature
            )));
        }
        if !(self.gaussian_width > 0.0) {
            return Err(TaspecError::InvalidArgument(format!(
                "gaussian width must be positive, got {}",
                self.gaussian_width
            )));
        }
        EnergyMesh::new(self.energy_min, self.energy_max, self.step)
    }
}

/// 带隙保留两位小数
fn round_gap(gap: f64) -> f64 {
    (gap * 100.0).round() / 100.0
}

// ─────────────────────────────────────────────────────────────
// TAS
// ─────────────────────────────────────────────────────────────

/// TAS 计算结果
#[derive(Debug, Clone)]
pub struct Tas {
    pub total_tas: Vec<f64>,
    pub tas_decomp: BTreeMap<TransitionKey, Vec<f64>>,
    pub jdos_light_total: Vec<f64>,
    pub jdos_light_decomp: BTreeMap<TransitionKey, Vec<f64>>,
    pub jdos_dark_total: Vec<f64>,
    pub jdos_dark_decomp: BTreeMap<TransitionKey, Vec<f64>>,
    pub energy_mesh_ev: Vec<f64>,
    /// 带隙 (eV, 两位小数)
    pub bandgap: f64,
    /// 温度 (K)
    pub temperature: f64,
    /// 光生载流子浓度 (cm⁻³)
    pub concentration: f64,
}

/// TAS 生成器
pub struct TasGenerator {
    bs: BandStructure,
    fermi_dos: FermiDos,
}

impl TasGenerator {
    /// 由能带结构与态密度创建
    pub fn new(bs: BandStructure, dos: &Dos) -> Result<Self> {
        let fermi_dos = FermiDos::new(dos, bs.nelect)?;
        Ok(TasGenerator { bs, fermi_dos })
    }

    /// 先用剪刀算符把带隙修正为 `bandgap` (eV)
    pub fn with_bandgap(bs: BandStructure, dos: &Dos, bandgap: f64) -> Result<Self> {
        let scissor = bs.scissor_shift(bandgap)?;
        let shifted_bs = bs.apply_scissor(&scissor);
        let shifted_dos = dos.apply_scissor(&scissor);
        Self::new(shifted_bs, &shifted_dos)
    }

    pub fn band_structure(&self) -> &BandStructure {
        &self.bs
    }

    /// 暗态或光照态占据数
    pub fn band_occupancies(
        &self,
        temperature: f64,
        concentration: f64,
        dark: bool,
    ) -> Result<Occupancies> {
        if dark {
            Ok(occupancy::dark_occupancies(&self.bs, temperature))
        } else {
            occupancy::light_occupancies(&self.bs, &self.fermi_dos, temperature, concentration)
        }
    }

    /// 生成 TAS；未给出的占据数按温度与浓度自动计算
    pub fn generate(
        &self,
        config: &SpectrumConfig,
        concentration: f64,
        light_occs: Option<&Occupancies>,
        dark_occs: Option<&Occupancies>,
    ) -> Result<Tas> {
        let mesh = config.energy_mesh()?;
        if concentration < 0.0 {
            return Err(TaspecError::InvalidArgument(format!(
                "carrier concentration must be non-negative, got {:e}",
                concentration
            )));
        }

        let light = match light_occs {
            Some(occs) => {
                occupancy::validate_occupancies(&self.bs, occs)?;
                occs.clone()
            }
            None => self.band_occupancies(config.temperature, concentration, false)?,
        };
        let dark = match dark_occs {
            Some(occs) => {
                occupancy::validate_occupancies(&self.bs, occs)?;
                occs.clone()
            }
            None => self.band_occupancies(config.temperature, concentration, true)?,
        };

        let mut decomps = jdos::decompose(
            &self.bs,
            &[&light, &dark],
            &mesh,
            config.gaussian_width,
            config.jobs,
        )?
        .into_iter();
        let light = decomps.next().unwrap_or_default();
        let dark = decomps.next().unwrap_or_default();

        let total_tas = jdos::subtract(&light.total, &dark.total);
        let tas_decomp = light
            .per_transition
            .iter()
            .map(|(key, l)| {
                let d = &dark.per_transition[key];
                (*key, jdos::subtract(l, d))
            })
            .collect();

        Ok(Tas {
            total_tas,
            tas_decomp,
            jdos_light_total: light.total,
            jdos_light_decomp: light.per_transition,
            jdos_dark_total: dark.total,
            jdos_dark_decomp: dark.per_transition,
            energy_mesh_ev: mesh.points,
            bandgap: round_gap(self.bs.band_gap()),
            temperature: config.temperature,
            concentration,
        })
    }
}

// ─────────────────────────────────────────────────────────────
// DAS
// ─────────────────────────────────────────────────────────────

/// 单一体系的（暗态）吸收 JDOS
#[derive(Debug, Clone)]
pub struct Absorption {
    pub jdos_total: Vec<f64>,
    pub jdos_decomp: BTreeMap<TransitionKey, Vec<f64>>,
    pub energy_mesh_ev: Vec<f64>,
    pub bandgap: f64,
}

/// DAS 中的一个体系
pub struct AbsorptionSystem {
    bs: BandStructure,
}

impl AbsorptionSystem {
    pub fn new(bs: BandStructure) -> Self {
        AbsorptionSystem { bs }
    }

    /// 先用剪刀算符把带隙修正为 `bandgap` (eV)
    pub fn with_bandgap(bs: BandStructure, bandgap: f64) -> Result<Self> {
        let scissor = bs.scissor_shift(bandgap)?;
        Ok(AbsorptionSystem {
            bs: bs.apply_scissor(&scissor),
        })
    }

    pub fn band_structure(&self) -> &BandStructure {
        &self.bs
    }

    /// 暗态占据数
    pub fn band_occupancies(&self, temperature: f64) -> Occupancies {
        occupancy::dark_occupancies(&self.bs, temperature)
    }

    /// 计算吸收 JDOS
    pub fn generate(&self, config: &SpectrumConfig, occs: Option<&Occupancies>) -> Result<Absorption> {
        let mesh = config.energy_mesh()?;
        let occs = match occs {
            Some(occs) => {
                occupancy::validate_occupancies(&self.bs, occs)?;
                occs.clone()
            }
            None => self.band_occupancies(config.temperature),
        };

        let decomp = jdos::decompose(&self.bs, &[&occs], &mesh, config.gaussian_width, config.jobs)?
            .into_iter()
            .next()
            .unwrap_or_default();

        Ok(Absorption {
            jdos_total: decomp.total,
            jdos_decomp: decomp.per_transition,
            energy_mesh_ev: mesh.points,
            bandgap: round_gap(self.bs.band_gap()),
        })
    }
}

/// DAS 计算结果
#[derive(Debug, Clone)]
pub struct Das {
    pub das_total: Vec<f64>,
    pub das_decomp: BTreeMap<TransitionKey, Vec<f64>>,
    pub jdos_new_total: Vec<f64>,
    pub jdos_new_decomp: BTreeMap<TransitionKey, Vec<f64>>,
    pub jdos_ref_total: Vec<f64>,
    pub jdos_ref_decomp: BTreeMap<TransitionKey, Vec<f64>>,
    pub energy_mesh_ev: Vec<f64>,
    pub bandgap_new: f64,
    pub bandgap_ref: f64,
    pub temperature: f64,
}

/// DAS 生成器：新体系相对参考体系
pub struct DasGenerator {
    new_system: AbsorptionSystem,
    reference: AbsorptionSystem,
}

impl DasGenerator {
    pub fn new(new_system: AbsorptionSystem, reference: AbsorptionSystem) -> Self {
        DasGenerator {
            new_system,
            reference,
        }
    }

    /// 生成 DAS
    pub fn generate(
        &self,
        config: &SpectrumConfig,
        new_occs: Option<&Occupancies>,
        ref_occs: Option<&Occupancies>,
    ) -> Result<Das> {
        let reference = self.reference.generate(config, ref_occs)?;
        let new = self.new_system.generate(config, new_occs)?;

        let zeros = vec![0.0; new.energy_mesh_ev.len()];
        let mut das_decomp = BTreeMap::new();
        for key in new.jdos_decomp.keys().chain(reference.jdos_decomp.keys()) {
            if das_decomp.contains_key(key) {
                continue;
            }
            let n = new.jdos_decomp.get(key).unwrap_or(&zeros);
            let r = reference.jdos_decomp.get(key).unwrap_or(&zeros);
            das_decomp.insert(*key, jdos::subtract(n, r));
        }

        Ok(Das {
            das_total: jdos::subtract(&new.jdos_total, &reference.jdos_total),
            das_decomp,
            jdos_new_total: new.jdos_total,
            jdos_new_decomp: new.jdos_decomp,
            jdos_ref_total: reference.jdos_total,
            jdos_ref_decomp: reference.jdos_decomp,
            energy_mesh_ev: new.energy_mesh_ev,
            bandgap_new: new.bandgap,
            bandgap_ref: reference.bandgap,
            temperature: config.temperature,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::band_structure::tests::{two_band_metal, two_band_semiconductor};
    use crate::models::dos::tests::box_dos;
    use crate::models::Spin;

    fn config() -> SpectrumConfig {
        SpectrumConfig {
            jobs: 2,
            ..SpectrumConfig::default()
        }
    }

    fn argmax(values: &[f64]) -> usize {
        values
            .iter()
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |acc, (i, &v)| {
                if v > acc.1 {
                    (i, v)
                } else {
                    acc
                }
            })
            .0
    }

    #[test]
    fn test_generator_tas_is_light_minus_dark() {
        let generator = TasGenerator::new(two_band_semiconductor(), &box_dos()).unwrap();
        let tas = generator.generate(&config(), 1e21, None, None).unwrap();

        assert_eq!(tas.energy_mesh_ev.len(), 500);
        assert_eq!(tas.bandgap, 1.5);
        for i in 0..tas.total_tas.len() {
            let expected = tas.jdos_light_total[i] - tas.jdos_dark_total[i];
            assert!((tas.total_tas[i] - expected).abs() < 1e-12);
        }

        // 总谱等于分解之和
        for i in 0..tas.total_tas.len() {
            let sum: f64 = tas.tas_decomp.values().map(|c| c[i]).sum();
            assert!((tas.total_tas[i] - sum).abs() < 1e-9);
        }

        // 载流子占据带边后吸收减弱（光漂白）
        let bleach = tas.total_tas.iter().cloned().fold(f64::INFINITY, f64::min);
        assert!(bleach < 0.0);
    }

    #[test]
    fn test_generator_zero_concentration_gives_no_signal() {
        let generator = TasGenerator::new(two_band_semiconductor(), &box_dos()).unwrap();
        let tas = generator.generate(&config(), 0.0, None, None).unwrap();
        let max = tas.total_tas.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
        assert!(max < 1e-6, "max |TAS| = {}", max);
    }

    #[test]
    fn test_generator_user_occupancies_override() {
        let generator = TasGenerator::new(two_band_semiconductor(), &box_dos()).unwrap();
        let dark = generator.band_occupancies(300.0, 0.0, true).unwrap();
        let tas = generator
            .generate(&config(), 1e21, Some(&dark), Some(&dark))
            .unwrap();
        assert!(tas.total_tas.iter().all(|v| v.abs() < 1e-15));

        let mut bad = dark.clone();
        bad.remove(&Spin::Up);
        assert!(generator.generate(&config(), 1e21, Some(&bad), None).is_err());
    }

    #[test]
    fn test_generator_rejects_negative_concentration() {
        let generator = TasGenerator::new(two_band_semiconductor(), &box_dos()).unwrap();
        assert!(generator.generate(&config(), -1e20, None, None).is_err());
    }

    #[test]
    fn test_generator_scissor_moves_peak() {
        let generator =
            TasGenerator::with_bandgap(two_band_semiconductor(), &box_dos(), 2.0).unwrap();
        let tas = generator.generate(&config(), 1e21, None, None).unwrap();
        assert_eq!(tas.bandgap, 2.0);

        // 两个 k 点的跃迁能均为 2.0 eV，修正后为 2.5 eV
        let peak = argmax(&tas.jdos_dark_total);
        assert!((tas.energy_mesh_ev[peak] - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_generator_das_against_itself_is_zero() {
        let das = DasGenerator::new(
            AbsorptionSystem::new(two_band_semiconductor()),
            AbsorptionSystem::new(two_band_semiconductor()),
        )
        .generate(&config(), None, None)
        .unwrap();

        assert!(das.das_total.iter().all(|v| v.abs() < 1e-15));
        assert_eq!(das.bandgap_new, das.bandgap_ref);
    }

    #[test]
    fn test_generator_absorption_of_metal() {
        let system = AbsorptionSystem::new(two_band_metal());
        let absorption = system.generate(&config(), None).unwrap();

        assert_eq!(absorption.bandgap, 0.0);
        let keys: Vec<_> = absorption.jdos_decomp.keys().copied().collect();
        assert_eq!(keys, vec![TransitionKey::new(0, 1, None)]);

        // 末态在 k1 (0.02 eV) 的占据更少，1.52 eV 处的吸收强于 1.98 eV 处
        let peak = argmax(&absorption.jdos_total);
        assert!((absorption.energy_mesh_ev[peak] - 1.52).abs() < 1e-9);
        let idx_198 = absorption
            .energy_mesh_ev
            .iter()
            .position(|&e| (e - 1.98).abs() < 1e-9)
            .unwrap();
        assert!(absorption.jdos_total[idx_198] > 0.0);
        assert!(absorption.jdos_total[idx_198] < absorption.jdos_total[peak]);

        // 金属不能做剪刀修正
        assert!(AbsorptionSystem::with_bandgap(two_band_metal(), 1.0).is_err());
    }

    #[test]
    fn test_generator_das_with_scissor() {
        let new_system = AbsorptionSystem::with_bandgap(two_band_semiconductor(), 1.0).unwrap();
        let das = DasGenerator::new(new_system, AbsorptionSystem::new(two_band_semiconductor()))
            .generate(&config(), None, None)
            .unwrap();

        assert_eq!(das.bandgap_new, 1.0);
        assert_eq!(das.bandgap_ref, 1.5);

        // 新体系吸收红移到 1.5 eV，参考体系在 2.0 eV
        let gain = argmax(&das.das_total);
        let loss = argmax(&das.das_total.iter().map(|v| -v).collect::<Vec<_>>());
        assert!((das.energy_mesh_ev[gain] - 1.5).abs() < 1e-9);
        assert!((das.energy_mesh_ev[loss] - 2.0).abs() < 1e-9);

        let key = TransitionKey::new(0, 1, None);
        assert!(das.das_decomp.contains_key(&key));
    }
}
