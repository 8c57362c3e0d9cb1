//! # 光谱子命令共享逻辑
//!
//! 参数到库配置的转换、输出格式推断、能带信息与主要跃迁的终端表格。
//!
//! ## 依赖关系
//! - 被 `commands/tas.rs`, `commands/das.rs` 使用
//! - 使用 `cli/spectrum.rs` 的共享参数
//! - 使用 `tabled` 打印表格

use crate::cli::spectrum::{OutputFormat, PlotArgs, SpectrumArgs};
use crate::error::{Result, TaspecError};
use crate::models::Calculation;
use crate::spectra::plot::{PlotOptions, TransitionSelection, YAxis};
use crate::spectra::units::ev_to_nm;
use crate::spectra::{SpectrumConfig, TransitionKey};
use crate::utils::output;

use std::collections::BTreeMap;
use std::path::Path;
use tabled::{Table, Tabled};

/// 由命令行参数构造谱计算配置
pub fn spectrum_config(args: &SpectrumArgs) -> Result<SpectrumConfig> {
    let (energy_min, energy_max) = parse_range(&args.range)?;

    let config = SpectrumConfig {
        temperature: args.temperature,
        energy_min,
        energy_max,
        gaussian_width: args.width,
        step: args.step,
        jobs: args.jobs,
    };
    // 提前检查，避免读完文件才报错
    config.energy_mesh()?;

    Ok(config)
}

/// 由命令行参数构造绘图选项
pub fn plot_options(args: &PlotArgs, default_yaxis: YAxis, material: String) -> PlotOptions {
    let transitions = if args.transitions.is_empty() {
        TransitionSelection::Auto {
            cutoff: args.cutoff,
        }
    } else {
        TransitionSelection::Explicit(args.transitions.clone())
    };

    PlotOptions {
        x_axis: args.xaxis,
        y_axis: args.yaxis.unwrap_or(default_yaxis),
        transitions,
        xmin: args.xmin,
        xmax: args.xmax,
        ymin: args.ymin,
        ymax: args.ymax,
        bandgap: None,
        material: Some(args.material.clone().unwrap_or(material)),
        title: args.title.clone(),
    }
}

/// 从文件扩展名推断输出格式
pub fn guess_format_from_extension(path: &Path) -> OutputFormat {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_lowercase())
        .as_deref()
    {
        Some("svg") => OutputFormat::Svg,
        Some("csv") => OutputFormat::Csv,
        Some("xy") | Some("dat") | Some("txt") => OutputFormat::Xy,
        _ => OutputFormat::Png,
    }
}

/// 解析能量范围，如 "0-5" 或 "0.5-4.5"
pub fn parse_range(range: &str) -> Result<(f64, f64)> {
    let parts: Vec<&str> = range.split('-').map(str::trim).collect();
    if parts.len() != 2 {
        return Err(TaspecError::InvalidRange(range.to_string()));
    }

    let min: f64 = parts[0]
        .parse()
        .map_err(|_| TaspecError::InvalidRange(range.to_string()))?;
    let max: f64 = parts[1]
        .parse()
        .map_err(|_| TaspecError::InvalidRange(range.to_string()))?;

    if min < 0.0 || max <= min {
        return Err(TaspecError::InvalidRange(format!(
            "{} (must be 0 <= min < max, in eV)",
            range
        )));
    }

    Ok((min, max))
}

/// 打印计算的能带信息
pub fn print_calculation_summary(calc: &Calculation) {
    let bs = &calc.band_structure;

    output::print_quantity("Material", &calc.material());
    if bs.is_metal() {
        output::print_quantity("Band gap", "metallic");
    } else {
        output::print_quantity("Band gap", &format!("{:.3} eV", bs.band_gap()));
    }
    output::print_quantity("Fermi level", &format!("{:.4} eV", bs.efermi));
    output::print_quantity(
        "Spin polarised",
        if bs.is_spin_polarized() { "yes" } else { "no" },
    );
    output::print_quantity(
        "k-points / bands",
        &format!("{} / {}", bs.nkpoints(), bs.nbands()),
    );
    if let Some(crystal) = &bs.structure {
        let (a, b, c) = crystal.lattice.lengths();
        output::print_quantity(
            "Lattice a / b / c",
            &format!("{:.4} / {:.4} / {:.4} Å", a, b, c),
        );
    }
    output::print_quantity("Cell volume", &format!("{:.3} Å³", calc.dos.volume));
    println!();
}

/// 按最大幅值排序的跃迁
pub fn strongest_transitions(
    decomp: &BTreeMap<TransitionKey, Vec<f64>>,
    count: usize,
) -> Vec<(TransitionKey, usize, f64)> {
    let mut ranked: Vec<(TransitionKey, usize, f64)> = decomp
        .iter()
        .filter_map(|(key, values)| {
            values
                .iter()
                .enumerate()
                .max_by(|a, b| a.1.abs().total_cmp(&b.1.abs()))
                .filter(|(_, v)| v.abs() > 0.0)
                .map(|(i, v)| (*key, i, *v))
        })
        .collect();

    ranked.sort_by(|a, b| b.2.abs().total_cmp(&a.2.abs()));
    ranked.truncate(count);
    ranked
}

/// 打印主要跃迁表格
pub fn print_transition_table(
    decomp: &BTreeMap<TransitionKey, Vec<f64>>,
    energy_mesh_ev: &[f64],
    count: usize,
    quantity: &str,
) {
    #[derive(Tabled)]
    struct TransitionRow {
        #[tabled(rename = "Transition")]
        transition: String,
        #[tabled(rename = "Peak (eV)")]
        energy: String,
        #[tabled(rename = "Peak (nm)")]
        wavelength: String,
        #[tabled(rename = "Value")]
        value: String,
    }

    let rows: Vec<TransitionRow> = strongest_transitions(decomp, count)
        .into_iter()
        .map(|(key, idx, value)| {
            let energy = energy_mesh_ev.get(idx).copied().unwrap_or(f64::NAN);
            TransitionRow {
                transition: key.to_string(),
                energy: format!("{:.2}", energy),
                wavelength: format!("{:.0}", ev_to_nm(energy)),
                value: format!("{:+.4e}", value),
            }
        })
        .collect();

    if !rows.is_empty() {
        output::print_header(&format!("Top {} {} Transitions", rows.len(), quantity));
        let table = Table::new(&rows);
        println!("{}", table);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_range() {
        assert_eq!(parse_range("0-5").unwrap(), (0.0, 5.0));
        assert_eq!(parse_range("0.5 - 4.5").unwrap(), (0.5, 4.5));
        assert!(parse_range("5-1").is_err());
        assert!(parse_range("abc").is_err());
        assert!(parse_range("1-2-3").is_err());
    }

    #[test]
    fn test_guess_format_from_extension() {
        assert_eq!(guess_format_from_extension(Path::new("a.SVG")), OutputFormat::Svg);
        assert_eq!(guess_format_from_extension(Path::new("a.csv")), OutputFormat::Csv);
        assert_eq!(guess_format_from_extension(Path::new("a.dat")), OutputFormat::Xy);
        assert_eq!(guess_format_from_extension(Path::new("tas")), OutputFormat::Png);
    }

    #[test]
    fn test_strongest_transitions_ranking() {
        let mut decomp = BTreeMap::new();
        decomp.insert(TransitionKey::new(0, 1, None), vec![0.0, -2.0, 0.5]);
        decomp.insert(TransitionKey::new(-1, 1, None), vec![0.0, 1.0, 0.0]);
        decomp.insert(TransitionKey::new(-2, 1, None), vec![0.0, 0.0, 0.0]);

        let top = strongest_transitions(&decomp, 5);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0], (TransitionKey::new(0, 1, None), 1, -2.0));
        assert_eq!(top[1].0, TransitionKey::new(-1, 1, None));

        assert_eq!(strongest_transitions(&decomp, 1).len(), 1);
    }

    #[test]
    fn test_plot_options_from_args() {
        use crate::cli::Cli;
        use crate::cli::Commands;
        use clap::Parser;

        let cli = Cli::try_parse_from(["taspec", "tas", "calc", "--transition", "0:1"]).unwrap();
        let Commands::Tas(args) = cli.command else {
            panic!("expected tas");
        };
        let opts = plot_options(&args.plot, YAxis::Tas, "CdTe".to_string());
        assert_eq!(opts.y_axis, YAxis::Tas);
        assert_eq!(opts.material.as_deref(), Some("CdTe"));
        assert_eq!(
            opts.transitions,
            TransitionSelection::Explicit(vec![TransitionKey::new(0, 1, None)])
        );

        let config = spectrum_config(&args.spectrum).unwrap();
        assert_eq!(config.energy_mesh().unwrap().len(), 500);
    }
}
