//! # 解析器模块
//!
//! 读取 VASP 计算目录中的 EIGENVAL、DOSCAR 与 POSCAR/CONTCAR。
//!
//! ## 依赖关系
//! - 被 `commands/` 模块使用
//! - 使用 `models/` 数据模型
//! - 子模块: eigenval, doscar, poscar

pub mod doscar;
pub mod eigenval;
pub mod poscar;

use crate::error::{Result, TaspecError};
use crate::models::Calculation;
use std::path::Path;

/// 计算目录必需的文件
pub const REQUIRED_FILES: [&str; 2] = ["EIGENVAL", "DOSCAR"];

/// 读取一个 VASP 计算目录
///
/// 能带结构的费米能级取自 DOSCAR；存在 CONTCAR（优先）或 POSCAR 时，
/// 用其晶胞体积替换 DOSCAR 头部的体积。
pub fn load_calculation(dir: &Path) -> Result<Calculation> {
    if !dir.is_dir() {
        return Err(TaspecError::DirectoryNotFound {
            path: dir.display().to_string(),
        });
    }

    for name in REQUIRED_FILES {
        if !dir.join(name).is_file() {
            return Err(TaspecError::MissingInput {
                file: name.to_string(),
                dir: dir.display().to_string(),
            });
        }
    }

    let mut dos = doscar::parse_doscar(&dir.join("DOSCAR"))?;
    let mut band_structure =
        eigenval::parse_eigenval(&dir.join("EIGENVAL"))?.into_band_structure(dos.efermi)?;

    let structure_file = ["CONTCAR", "POSCAR"]
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.is_file());

    if let Some(path) = structure_file {
        let crystal = poscar::parse_poscar_file(&path)?;
        if crystal.volume() > 0.0 {
            dos.volume = crystal.volume();
        }
        band_structure.structure = Some(crystal);
    }

    let name = dir
        .canonicalize()
        .ok()
        .as_deref()
        .and_then(|p| p.file_name())
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| dir.display().to_string());

    Ok(Calculation::new(name, band_structure, dos))
}
