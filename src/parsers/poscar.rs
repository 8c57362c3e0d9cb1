//! # VASP POSCAR 格式解析器
//!
//! 解析计算目录中的 POSCAR/CONTCAR，用于晶胞体积和材料化学式。
//!
//! ## POSCAR 格式说明
//! ```text
//! Comment line (structure name)
//! 1.0                    # scaling factor（负数表示目标体积）
//! a1 a2 a3               # lattice vector a
//! b1 b2 b3               # lattice vector b
//! c1 c2 c3               # lattice vector c
//! Element1 Element2 ...  # element symbols (VASP 5+)
//! n1 n2 ...              # number of atoms per element
//! Selective dynamics     # optional
//! Direct/Cartesian       # coordinate type
//! x1 y1 z1               # atom positions
//! ```
//!
//! ## 依赖关系
//! - 被 `parsers/mod.rs` 使用
//! - 使用 `models/structure.rs`

use crate::error::{Result, TaspecError};
use crate::models::{Atom, Crystal, Lattice};
use std::fs;
use std::path::Path;

/// 解析 POSCAR/CONTCAR 文件
pub fn parse_poscar_file(path: &Path) -> Result<Crystal> {
    let content = fs::read_to_string(path).map_err(|e| TaspecError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_poscar_content(
        &content,
        path.file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown"),
    )
}

/// 从字符串内容解析 POSCAR 格式
pub fn parse_poscar_content(content: &str, default_name: &str) -> Result<Crystal> {
    let lines: Vec<&str> = content.lines().collect();

    let parse_err = |reason: &str| TaspecError::ParseError {
        format: "POSCAR".to_string(),
        path: default_name.to_string(),
        reason: reason.to_string(),
    };

    if lines.len() < 7 {
        return Err(parse_err("File too short"));
    }

    let name = match lines[0].trim() {
        "" => default_name.to_string(),
        comment => comment.to_string(),
    };

    let scale: f64 = lines[1]
        .split_whitespace()
        .next()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| parse_err("Invalid scaling factor"))?;

    let mut matrix = [[0.0; 3]; 3];
    for (i, row) in matrix.iter_mut().enumerate() {
        let parts: Vec<f64> = lines[2 + i]
            .split_whitespace()
            .filter_map(|s| s.parse().ok())
            .collect();
        if parts.len() < 3 {
            return Err(parse_err(&format!("Invalid lattice vector at line {}", 3 + i)));
        }
        *row = [parts[0], parts[1], parts[2]];
    }

    // 负的缩放因子为目标晶胞体积
    let factor = if scale < 0.0 {
        let raw_volume = Lattice::from_vectors(matrix).volume().abs();
        if raw_volume <= 0.0 {
            return Err(parse_err("Degenerate lattice"));
        }
        (-scale / raw_volume).cbrt()
    } else {
        scale
    };
    for row in matrix.iter_mut() {
        for x in row.iter_mut() {
            *x *= factor;
        }
    }
    let lattice = Lattice::from_vectors(matrix);

    // Line 5: 元素符号 (VASP 5+) 或原子数 (VASP 4)
    let line5: Vec<&str> = lines[5].split_whitespace().collect();
    let first = line5.first().ok_or_else(|| parse_err("Missing species line"))?;
    let (elements, counts, mut coord_line) = if first.parse::<usize>().is_ok() {
        let counts: Vec<usize> = line5.iter().filter_map(|s| s.parse().ok()).collect();
        let elements: Vec<String> = (0..counts.len()).map(|i| format!("X{}", i + 1)).collect();
        (elements, counts, 6)
    } else {
        let elements: Vec<String> = line5
            .iter()
            // VASP 6 可能写成 "Ti_pv/hash"
            .map(|s| s.split(['_', '/']).next().unwrap_or_default().to_string())
            .collect();
        let counts: Vec<usize> = lines[6]
            .split_whitespace()
            .filter_map(|s| s.parse().ok())
            .collect();
        (elements, counts, 7)
    };

    if elements.len() != counts.len() {
        return Err(parse_err("Element symbols and counts differ in length"));
    }

    if lines
        .get(coord_line)
        .map(|l| l.trim().to_lowercase().starts_with('s'))
        .unwrap_or(false)
    {
        coord_line += 1;
    }
    if lines.len() <= coord_line {
        return Err(parse_err("Missing coordinate type line"));
    }

    let mut atoms = Vec::new();
    let mut positions = lines[coord_line + 1..].iter();
    for (element, &count) in elements.iter().zip(&counts) {
        for _ in 0..count {
            let parts: Vec<f64> = positions
                .next()
                .map(|l| {
                    l.split_whitespace()
                        .take(3)
                        .filter_map(|s| s.parse().ok())
                        .collect()
                })
                .unwrap_or_default();
            if parts.len() < 3 {
                return Err(parse_err(&format!(
                    "Expected {} atomic positions",
                    counts.iter().sum::<usize>()
                )));
            }
            atoms.push(Atom::new(element.clone(), [parts[0], parts[1], parts[2]]));
        }
    }

    Ok(Crystal::new(name, lattice, atoms))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_poscar_vasp5() {
        let content = r#"NaCl
1.0
5.64 0.0 0.0
0.0 5.64 0.0
0.0 0.0 5.64
Na Cl
4 4
Direct
0.0 0.0 0.0
0.5 0.5 0.0
0.5 0.0 0.5
0.0 0.5 0.5
0.5 0.0 0.0
0.0 0.5 0.0
0.0 0.0 0.5
0.5 0.5 0.5
"#;
        let crystal = parse_poscar_content(content, "NaCl").unwrap();
        assert_eq!(crystal.name, "NaCl");
        assert_eq!(crystal.atoms.len(), 8);
        assert_eq!(crystal.formula(), "Na4Cl4");
        assert!((crystal.volume() - 5.64_f64.powi(3)).abs() < 1e-6);
    }

    #[test]
    fn test_parse_poscar_with_scale() {
        let content = r#"Si
2.0
2.0 0.0 0.0
0.0 2.0 0.0
0.0 0.0 2.0
Si
2
Direct
0.0 0.0 0.0
0.5 0.5 0.5
"#;
        let crystal = parse_poscar_content(content, "Si").unwrap();
        let (a, _, _) = crystal.lattice.lengths();
        assert!((a - 4.0).abs() < 1e-9);
        assert!((crystal.volume() - 64.0).abs() < 1e-9);
    }

    #[test]
    fn test_parse_poscar_negative_scale_is_volume() {
        let content = r#"CdTe
-100.0
1.0 0.0 0.0
0.0 1.0 0.0
0.0 0.0 1.0
Cd_GW Te
1 1
Cartesian
0.0 0.0 0.0
0.5 0.5 0.5
"#;
        let crystal = parse_poscar_content(content, "CdTe").unwrap();
        assert!((crystal.volume() - 100.0).abs() < 1e-9);
        assert_eq!(crystal.formula(), "CdTe");
    }

    #[test]
    fn test_parse_poscar_selective_dynamics() {
        let content = r#"Fe with selective
1.0
2.87 0.0 0.0
0.0 2.87 0.0
0.0 0.0 2.87
Fe
2
Selective dynamics
Direct
0.0 0.0 0.0 T T T
0.5 0.5 0.5 F F F
"#;
        let crystal = parse_poscar_content(content, "Fe").unwrap();
        assert_eq!(crystal.atoms.len(), 2);
    }

    #[test]
    fn test_parse_poscar_missing_positions() {
        let content = "Fe\n1.0\n1 0 0\n0 1 0\n0 0 1\nFe\n3\nDirect\n0 0 0\n";
        assert!(parse_poscar_content(content, "Fe").is_err());
    }
}
