//! # VASP EIGENVAL 格式解析器
//!
//! 读取各 k 点的本征能量构造能带结构。VASP 5.4.4 之后附带的占据数列被忽略，
//! 暗态/光照态占据数统一由 `spectra::occupancy` 计算。
//!
//! ## EIGENVAL 格式说明
//! ```text
//! natoms natoms nloops ISPIN      # 第 1 行，第 4 列为自旋数
//! volume a b c POTIM              # 第 2-5 行忽略
//! ...
//! nelect nkpts nbands             # 第 6 行
//!                                 # 空行
//! kx ky kz weight                 # 每个 k 点一块
//! 1  e_up [e_down] [occ_up occ_down]
//! ...
//! ```
//!
//! ## 依赖关系
//! - 被 `parsers/mod.rs` 使用
//! - 使用 `models/band_structure.rs`

use crate::error::{Result, TaspecError};
use crate::models::{BandStructure, Spin};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// EIGENVAL 文件内容
#[derive(Debug, Clone)]
pub struct EigenvalData {
    pub nelect: f64,
    pub nkpts: usize,
    pub nbands: usize,
    pub ispin: usize,
    pub kpoints: Vec<[f64; 3]>,
    /// 归一化 k 点权重（和为 1）
    pub weights: Vec<f64>,
    /// 本征能量 `bands[spin][band][kpoint]`
    pub bands: BTreeMap<Spin, Vec<Vec<f64>>>,
}

impl EigenvalData {
    /// 转换为能带结构，`efermi` 通常取自 DOSCAR
    pub fn into_band_structure(self, efermi: f64) -> Result<BandStructure> {
        let mut bs = BandStructure::new(efermi, self.kpoints, self.weights, self.bands)?;
        bs.nelect = Some(self.nelect);
        Ok(bs)
    }
}

/// 解析 EIGENVAL 文件
pub fn parse_eigenval(path: &Path) -> Result<EigenvalData> {
    let content = fs::read_to_string(path).map_err(|e| TaspecError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_eigenval_content(&content, &path.display().to_string())
}

/// 从字符串内容解析 EIGENVAL 格式
pub fn parse_eigenval_content(content: &str, source_name: &str) -> Result<EigenvalData> {
    let parse_err = |reason: String| TaspecError::ParseError {
        format: "EIGENVAL".to_string(),
        path: source_name.to_string(),
        reason,
    };

    let lines: Vec<&str> = content.lines().collect();
    if lines.len() < 7 {
        return Err(parse_err("File too short".to_string()));
    }

    // Line 0: ISPIN 在第 4 列
    let ispin: usize = lines[0]
        .split_whitespace()
        .nth(3)
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| parse_err("Cannot read ISPIN from line 1".to_string()))?;
    if ispin != 1 && ispin != 2 {
        return Err(parse_err(format!("ISPIN must be 1 or 2, got {}", ispin)));
    }

    // Line 5: nelect nkpts nbands
    let header: Vec<&str> = lines[5].split_whitespace().collect();
    if header.len() < 3 {
        return Err(parse_err("Cannot read NELECT/NKPTS/NBANDS from line 6".to_string()));
    }
    let nelect: f64 = header[0]
        .parse()
        .map_err(|_| parse_err(format!("Invalid NELECT '{}'", header[0])))?;
    let nkpts: usize = header[1]
        .parse()
        .map_err(|_| parse_err(format!("Invalid NKPTS '{}'", header[1])))?;
    let nbands: usize = header[2]
        .parse()
        .map_err(|_| parse_err(format!("Invalid NBANDS '{}'", header[2])))?;

    let spins: Vec<Spin> = if ispin == 2 {
        vec![Spin::Up, Spin::Down]
    } else {
        vec![Spin::Up]
    };

    let mut bands: BTreeMap<Spin, Vec<Vec<f64>>> = spins
        .iter()
        .map(|&s| (s, vec![Vec::with_capacity(nkpts); nbands]))
        .collect();

    let mut kpoints = Vec::with_capacity(nkpts);
    let mut weights = Vec::with_capacity(nkpts);

    // 余下的非空行：每个 k 点 1 行坐标 + nbands 行能量
    let mut body = lines[6..].iter().filter(|l| !l.trim().is_empty());

    for k in 0..nkpts {
        let kline = body
            .next()
            .ok_or_else(|| parse_err(format!("Missing k-point {} of {}", k + 1, nkpts)))?;
        let kparts: Vec<f64> = kline
            .split_whitespace()
            .filter_map(|s| s.parse().ok())
            .collect();
        if kparts.len() < 4 {
            return Err(parse_err(format!("Invalid k-point line: '{}'", kline.trim())));
        }
        kpoints.push([kparts[0], kparts[1], kparts[2]]);
        weights.push(kparts[3]);

        for b in 0..nbands {
            let line = body.next().ok_or_else(|| {
                parse_err(format!("Missing band {} at k-point {}", b + 1, k + 1))
            })?;
            let values: Vec<f64> = line
                .split_whitespace()
                .skip(1)
                .map(|s| s.parse::<f64>())
                .collect::<std::result::Result<_, _>>()
                .map_err(|_| parse_err(format!("Invalid eigenvalue line: '{}'", line.trim())))?;

            if values.len() < ispin {
                return Err(parse_err(format!(
                    "Expected {} eigenvalue(s) at band {} k-point {}",
                    ispin,
                    b + 1,
                    k + 1
                )));
            }
            for (s, spin) in spins.iter().enumerate() {
                if let Some(spin_bands) = bands.get_mut(spin) {
                    spin_bands[b].push(values[s]);
                }
            }
        }
    }

    let total_weight: f64 = weights.iter().sum();
    if total_weight <= 0.0 {
        return Err(parse_err("k-point weights sum to zero".to_string()));
    }
    for w in &mut weights {
        *w /= total_weight;
    }

    Ok(EigenvalData {
        nelect,
        nkpts,
        nbands,
        ispin,
        kpoints,
        weights,
        bands,
    })
}
