//! # VASP DOSCAR 格式解析器
//!
//! 只读取总态密度块，投影态密度忽略。
//!
//! ## DOSCAR 格式说明
//! ```text
//! natoms natoms partial ncdij
//! volume a b c POTIM             # 第 2 行，第 1 列为晶胞体积 (Å³)
//! TEBEG
//! CAR
//! system
//! emax emin nedos efermi weight  # 第 6 行
//! e dos idos                     # ISPIN = 1，共 nedos 行
//! e dos_up dos_dn idos_up idos_dn  # ISPIN = 2
//! ```
//!
//! ## 依赖关系
//! - 被 `parsers/mod.rs` 使用
//! - 使用 `models/dos.rs`

use crate::error::{Result, TaspecError};
use crate::models::{Dos, Spin};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// 解析 DOSCAR 文件
pub fn parse_doscar(path: &Path) -> Result<Dos> {
    let content = fs::read_to_string(path).map_err(|e| TaspecError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_doscar_content(&content, &path.display().to_string())
}

/// 从字符串内容解析 DOSCAR 格式
pub fn parse_doscar_content(content: &str, source_name: &str) -> Result<Dos> {
    let parse_err = |reason: String| TaspecError::ParseError {
        format: "DOSCAR".to_string(),
        path: source_name.to_string(),
        reason,
    };

    let lines: Vec<&str> = content.lines().collect();
    if lines.len() < 6 {
        return Err(parse_err("File too short".to_string()));
    }

    let volume: f64 = lines[1]
        .split_whitespace()
        .next()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| parse_err("Cannot read cell volume from line 2".to_string()))?;

    let header: Vec<&str> = lines[5].split_whitespace().collect();
    if header.len() < 4 {
        return Err(parse_err("Cannot read NEDOS/E-fermi from line 6".to_string()));
    }
    // NEDOS 可能被写成浮点数
    let nedos = header[2]
        .parse::<f64>()
        .map_err(|_| parse_err(format!("Invalid NEDOS '{}'", header[2])))? as usize;
    let efermi: f64 = header[3]
        .parse()
        .map_err(|_| parse_err(format!("Invalid E-fermi '{}'", header[3])))?;

    let available = lines.len() - 6;
    if available < nedos {
        return Err(parse_err(format!(
            "Expected {} DOS lines, found {}",
            nedos, available
        )));
    }

    let mut energies = Vec::with_capacity(nedos);
    let mut up = Vec::with_capacity(nedos);
    let mut down = Vec::with_capacity(nedos);
    let mut ncols = None;

    for line in &lines[6..6 + nedos] {
        let values: Vec<f64> = line
            .split_whitespace()
            .map(|s| s.parse::<f64>())
            .collect::<std::result::Result<_, _>>()
            .map_err(|_| parse_err(format!("Invalid DOS line: '{}'", line.trim())))?;

        // 3 列为非自旋极化，5 列为自旋极化
        let n = *ncols.get_or_insert(values.len());
        if values.len() != n || (n != 3 && n != 5) {
            return Err(parse_err(format!(
                "Unexpected number of DOS columns ({}) in line '{}'",
                values.len(),
                line.trim()
            )));
        }

        energies.push(values[0]);
        up.push(values[1]);
        if n == 5 {
            down.push(values[2]);
        }
    }

    let mut densities = BTreeMap::new();
    densities.insert(Spin::Up, up);
    if ncols == Some(5) {
        densities.insert(Spin::Down, down);
    }

    Ok(Dos {
        efermi,
        energies,
        densities,
        volume,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// ISPIN = 1，6 个能量点
    pub(crate) const DOSCAR_ISPIN1: &str = "   2   2   1   0
  0.4000000E+02  0.3800000E-09  0.3800000E-09  0.3800000E-09  0.5000000E-15
  1.000000000000000E-004
  CAR
 test system
      2.00000000     -3.00000000      6      0.00000000      1.00000000
    -3.000  0.2000E+01  0.0000E+00
    -2.000  0.2000E+01  0.2000E+01
    -1.000  0.0000E+00  0.4000E+01
     0.000  0.0000E+00  0.4000E+01
     1.000  0.2000E+01  0.4000E+01
     2.000  0.2000E+01  0.6000E+01
";

    const DOSCAR_ISPIN2: &str = "   1   1   1   0
  0.2000000E+02  0.3800000E-09  0.3800000E-09  0.3800000E-09  0.5000000E-15
  1.000000000000000E-004
  CAR
 magnetic
      1.00000000     -1.00000000      3      0.25000000      1.00000000
    -1.000  0.1000E+01  0.5000E+00  0.0000E+00  0.0000E+00
     0.000  0.0000E+00  0.0000E+00  0.1000E+01  0.5000E+00
     1.000  0.3000E+01  0.1000E+01  0.1000E+01  0.5000E+00
";

    #[test]
    fn test_parse_doscar_ispin1() {
        let dos = parse_doscar_content(DOSCAR_ISPIN1, "DOSCAR").unwrap();
        assert_eq!(dos.volume, 40.0);
        assert_eq!(dos.efermi, 0.0);
        assert_eq!(dos.energies.len(), 6);
        assert_eq!(dos.densities.len(), 1);
        assert_eq!(dos.densities[&Spin::Up][4], 2.0);
    }

    #[test]
    fn test_parse_doscar_ispin2() {
        let dos = parse_doscar_content(DOSCAR_ISPIN2, "DOSCAR").unwrap();
        assert_eq!(dos.efermi, 0.25);
        assert_eq!(dos.densities[&Spin::Down], vec![0.5, 0.0, 1.0]);
        assert_eq!(dos.total_densities(), vec![1.5, 0.0, 4.0]);
    }

    #[test]
    fn test_parse_doscar_missing_lines() {
        let truncated: String = DOSCAR_ISPIN2.lines().take(7).collect::<Vec<_>>().join("\n");
        assert!(parse_doscar_content(&truncated, "DOSCAR").is_err());
    }

    #[test]
    fn test_parse_doscar_huge_nedos_is_error() {
        let huge = DOSCAR_ISPIN2.replacen("      3      0.25", "  1e30      0.25", 1);
        assert_ne!(huge, DOSCAR_ISPIN2);
        let err = parse_doscar_content(&huge, "DOSCAR").unwrap_err();
        assert!(err.to_string().contains("Expected"));
    }
}
