//! # das 子命令实现
//!
//! 比较新体系与参考体系的暗态 JDOS，输出差分吸收谱。
//!
//! ## 依赖关系
//! - 使用 `cli/das.rs` 定义的 DasArgs
//! - 使用 `spectra/` 模块进行计算、绘图与导出
//! - 使用 `parsers/` 读取计算目录

use crate::cli::das::DasArgs;
use crate::cli::spectrum::OutputFormat;
use crate::commands::spectrum::{
    guess_format_from_extension, plot_options, print_calculation_summary, print_transition_table,
    spectrum_config,
};
use crate::error::Result;
use crate::models::Calculation;
use crate::parsers;
use crate::spectra::plot::{self, YAxis};
use crate::spectra::{export, AbsorptionSystem, DasGenerator};
use crate::utils::{output, progress};

use std::path::Path;

/// 执行 DAS 计算
pub fn execute(args: DasArgs) -> Result<()> {
    output::print_header("Differential Absorption Spectrum");

    let config = spectrum_config(&args.spectrum)?;

    let new_calc = load(&args.new_dir, "new")?;
    let ref_calc = load(&args.ref_dir, "reference")?;

    let generator = DasGenerator::new(
        absorption_system(&new_calc, args.bandgap)?,
        absorption_system(&ref_calc, args.bandgap_ref)?,
    );

    let spinner = progress::create_spinner("Computing JDOS of both systems...");
    let das = generator.generate(&config, None, None);
    spinner.finish_and_clear();
    let das = das?;

    output::print_success(&format!(
        "Band gaps: new {:.2} eV, reference {:.2} eV",
        das.bandgap_new, das.bandgap_ref
    ));

    let format = args
        .format
        .unwrap_or_else(|| guess_format_from_extension(&args.output));

    match format {
        OutputFormat::Png | OutputFormat::Svg => {
            let opts = plot_options(&args.plot, YAxis::Das, new_calc.material());
            let figure = plot::prepare_das_figure(&das, &opts)?;
            plot::render(
                &figure,
                &args.output,
                args.plot.fig_width,
                args.plot.fig_height,
                format == OutputFormat::Svg,
            )?;
        }
        OutputFormat::Csv => export::das_to_csv(&das, &args.output)?,
        OutputFormat::Xy => {
            let comments = vec![
                format!("DAS of {} relative to {}", new_calc.material(), ref_calc.material()),
                format!(
                    "T = {} K, band gaps {:.2} / {:.2} eV",
                    das.temperature, das.bandgap_new, das.bandgap_ref
                ),
                "Columns: energy (eV), JDOS(new) - JDOS(ref) (a.u.)".to_string(),
            ];
            export::to_xy(&das.energy_mesh_ev, &das.das_total, &comments, &args.output)?;
        }
    }

    if let Some(path) = &args.decomposition {
        export::decomposition_to_csv(&das.energy_mesh_ev, &das.das_decomp, path)?;
        output::print_success(&format!("Decomposition saved to '{}'", path.display()));
    }

    print_transition_table(&das.das_decomp, &das.energy_mesh_ev, args.plot.top, "DAS");

    output::print_done(&format!("DAS saved to '{}'", args.output.display()));
    Ok(())
}

fn load(dir: &Path, role: &str) -> Result<Calculation> {
    let spinner = progress::create_spinner(&format!("Reading {} system...", role));
    let calc = parsers::load_calculation(dir);
    spinner.finish_and_clear();
    let calc = calc?;

    output::print_success(&format!("Loaded {} system '{}'", role, calc.name));
    print_calculation_summary(&calc);
    Ok(calc)
}

fn absorption_system(calc: &Calculation, bandgap: Option<f64>) -> Result<AbsorptionSystem> {
    let bs = calc.band_structure.clone();
    match bandgap {
        Some(gap) => {
            let system = AbsorptionSystem::with_bandgap(bs, gap)?;
            output::print_info(&format!(
                "Scissor correction of '{}': {:.3} eV -> {:.3} eV",
                calc.name,
                calc.band_structure.band_gap(),
                system.band_structure().band_gap()
            ));
            Ok(system)
        }
        None => Ok(AbsorptionSystem::new(bs)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use crate::parsers::doscar::tests::DOSCAR_ISPIN1;
    use crate::parsers::eigenval::tests::EIGENVAL_ISPIN1;
    use clap::Parser;
    use std::fs;
    use tempfile::TempDir;

    fn write_calc(dir: &Path) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join("EIGENVAL"), EIGENVAL_ISPIN1).unwrap();
        fs::write(dir.join("DOSCAR"), DOSCAR_ISPIN1).unwrap();
    }

    #[test]
    fn test_das_scissor_csv() {
        let tmp = TempDir::new().unwrap();
        let new_dir = tmp.path().join("new");
        let ref_dir = tmp.path().join("ref");
        write_calc(&new_dir);
        write_calc(&ref_dir);
        let out = tmp.path().join("das.csv");

        let cli = Cli::try_parse_from([
            "taspec",
            "das",
            new_dir.to_str().unwrap(),
            ref_dir.to_str().unwrap(),
            "-o",
            out.to_str().unwrap(),
            "--bandgap",
            "1.0",
            "-j",
            "1",
        ])
        .unwrap();
        let Commands::Das(args) = cli.command else {
            panic!("expected das");
        };
        execute(args).unwrap();

        let mut rdr = csv::Reader::from_path(&out).unwrap();
        let rows: Vec<(f64, f64)> = rdr
            .records()
            .map(|r| {
                let r = r.unwrap();
                (r[0].parse().unwrap(), r[2].parse().unwrap())
            })
            .collect();
        assert_eq!(rows.len(), 500);

        // 带隙缩小后吸收边红移：低能处 DAS 为正
        let gain = rows.iter().map(|r| r.1).fold(f64::NEG_INFINITY, f64::max);
        let loss = rows.iter().map(|r| r.1).fold(f64::INFINITY, f64::min);
        assert!(gain > 0.0 && loss < 0.0);
    }
}
