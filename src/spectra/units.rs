//! # 物理常数与单位换算
//!
//! ## 依赖关系
//! - 被 `spectra/` 与 `models/dos.rs` 使用
//! - 无外部模块依赖

/// Boltzmann 常数 (eV/K)
pub const BOLTZMANN_EV: f64 = 8.617_333_262e-5;

/// h·c / e (eV·nm)
pub const HC_EV_NM: f64 = 1_239.841_984;

/// 光子能量 (eV) → 波长 (nm)；非正能量返回无穷大
pub fn ev_to_nm(ev: f64) -> f64 {
    if ev <= 0.0 {
        f64::INFINITY
    } else {
        HC_EV_NM / ev
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ev_to_nm() {
        // 1.55 eV ≈ 800 nm (Ti:sapphire)
        assert!((ev_to_nm(1.55) - 799.9).abs() < 0.1);
        assert!((HC_EV_NM / ev_to_nm(2.3) - 2.3).abs() < 1e-12);
    }

    #[test]
    fn test_non_positive_energy_is_infinite_wavelength() {
        assert!(ev_to_nm(0.0).is_infinite());
        assert!(ev_to_nm(-1.0).is_infinite());
    }
}
