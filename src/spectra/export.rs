//! # 光谱数据导出
//!
//! 导出 TAS/DAS 结果到 CSV 和 XY 格式。
//!
//! ## 支持格式
//! - CSV: 能量、波长、差分谱与两条 JDOS 总谱
//! - CSV（分解）: 能量 + 每个能带跃迁一列
//! - XY: 两列文本（能量, 数值），`#` 开头为注释
//!
//! ## 依赖关系
//! - 被 `commands/tas.rs`, `commands/das.rs` 调用
//! - 使用 `spectra/generator.rs` 的 Tas, Das 结构
//! - 使用 `csv` + `serde` 写入 CSV 文件

use crate::error::{Result, TaspecError};
use crate::spectra::generator::{Das, Tas};
use crate::spectra::jdos::TransitionKey;
use crate::spectra::units::ev_to_nm;

use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

#[derive(Debug, Serialize)]
struct TasRow {
    energy_ev: f64,
    wavelength_nm: f64,
    tas: f64,
    jdos_light: f64,
    jdos_dark: f64,
}

#[derive(Debug, Serialize)]
struct DasRow {
    energy_ev: f64,
    wavelength_nm: f64,
    das: f64,
    jdos_new: f64,
    jdos_ref: f64,
}

fn write_error(path: &Path, source: std::io::Error) -> TaspecError {
    TaspecError::FileWriteError {
        path: path.display().to_string(),
        source,
    }
}

/// 导出 TAS 总谱为 CSV 格式
pub fn tas_to_csv(tas: &Tas, output_path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(output_path)?;

    for (i, &energy) in tas.energy_mesh_ev.iter().enumerate() {
        wtr.serialize(TasRow {
            energy_ev: energy,
            wavelength_nm: ev_to_nm(energy),
            tas: tas.total_tas[i],
            jdos_light: tas.jdos_light_total[i],
            jdos_dark: tas.jdos_dark_total[i],
        })?;
    }

    wtr.flush().map_err(|e| write_error(output_path, e))?;
    Ok(())
}

/// 导出 DAS 总谱为 CSV 格式
pub fn das_to_csv(das: &Das, output_path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(output_path)?;

    for (i, &energy) in das.energy_mesh_ev.iter().enumerate() {
        wtr.serialize(DasRow {
            energy_ev: energy,
            wavelength_nm: ev_to_nm(energy),
            das: das.das_total[i],
            jdos_new: das.jdos_new_total[i],
            jdos_ref: das.jdos_ref_total[i],
        })?;
    }

    wtr.flush().map_err(|e| write_error(output_path, e))?;
    Ok(())
}

/// 导出按能带跃迁分解的谱为 CSV 格式
///
/// 列顺序与跃迁的排序一致，列名为 `(i, f)` 或 `(i, f, spin)`。
pub fn decomposition_to_csv(
    energy_mesh_ev: &[f64],
    decomp: &BTreeMap<TransitionKey, Vec<f64>>,
    output_path: &Path,
) -> Result<()> {
    let mut wtr = csv::Writer::from_path(output_path)?;

    let mut header = vec!["energy_ev".to_string()];
    header.extend(decomp.keys().map(|k| k.to_string()));
    wtr.write_record(&header)?;

    for (i, energy) in energy_mesh_ev.iter().enumerate() {
        let mut record = vec![format!("{:.6}", energy)];
        record.extend(decomp.values().map(|v| format!("{:.6e}", v[i])));
        wtr.write_record(&record)?;
    }

    wtr.flush().map_err(|e| write_error(output_path, e))?;
    Ok(())
}

/// 导出一条谱为 XY 格式
pub fn to_xy(
    energy_mesh_ev: &[f64],
    values: &[f64],
    comments: &[String],
    output_path: &Path,
) -> Result<()> {
    let file = File::create(output_path).map_err(|e| write_error(output_path, e))?;
    let mut out = BufWriter::new(file);

    for line in comments {
        writeln!(out, "# {}", line).map_err(|e| write_error(output_path, e))?;
    }
    writeln!(out, "#").map_err(|e| write_error(output_path, e))?;

    for (energy, value) in energy_mesh_ev.iter().zip(values) {
        writeln!(out, "{:.4}\t{:.6e}", energy, value).map_err(|e| write_error(output_path, e))?;
    }

    out.flush().map_err(|e| write_error(output_path, e))?;
    Ok(())
}
