//! # tas 子命令实现
//!
//! 读取 VASP 计算目录，计算瞬态吸收谱并输出图像或数据文件。
//!
//! ## 功能
//! - 单个计算目录或批量目录处理
//! - 可选剪刀修正带隙
//! - 输出图像 (PNG/SVG) 或数据文件 (CSV/XY)，可附加按跃迁分解的 CSV
//!
//! ## 依赖关系
//! - 使用 `cli/tas.rs` 定义的 TasArgs
//! - 使用 `batch/` 模块进行批量处理
//! - 使用 `spectra/` 模块进行计算、绘图与导出
//! - 使用 `parsers/` 读取计算目录

use crate::batch::{BatchRunner, CalcDirCollector, ProcessResult};
use crate::cli::spectrum::{OutputFormat, PlotArgs};
use crate::cli::tas::TasArgs;
use crate::commands::spectrum::{
    guess_format_from_extension, plot_options, print_calculation_summary, print_transition_table,
    spectrum_config,
};
use crate::error::{Result, TaspecError};
use crate::models::Calculation;
use crate::parsers;
use crate::spectra::plot::{self, PlotOptions, YAxis};
use crate::spectra::{export, SpectrumConfig, Tas, TasGenerator};
use crate::utils::{output, progress};

use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

/// 执行 TAS 计算
pub fn execute(args: TasArgs) -> Result<()> {
    output::print_header("Transient Absorption Spectrum");

    if !args.input.is_dir() {
        return Err(TaspecError::DirectoryNotFound {
            path: args.input.display().to_string(),
        });
    }

    if CalcDirCollector::is_calculation_dir(&args.input) {
        execute_single(&args)
    } else {
        execute_batch(&args)
    }
}

/// 由计算结果构造生成器，`bandgap` 给出时先做剪刀修正
fn build_generator(calc: &Calculation, bandgap: Option<f64>) -> Result<TasGenerator> {
    let bs = calc.band_structure.clone();
    match bandgap {
        Some(gap) => TasGenerator::with_bandgap(bs, &calc.dos, gap),
        None => TasGenerator::new(bs, &calc.dos),
    }
}

/// 单个计算目录
fn execute_single(args: &TasArgs) -> Result<()> {
    output::print_info(&format!("Calculation: '{}'", args.input.display()));

    let config = spectrum_config(&args.spectrum)?;

    let spinner = progress::create_spinner("Reading EIGENVAL and DOSCAR...");
    let calc = parsers::load_calculation(&args.input);
    spinner.finish_and_clear();
    let calc = calc?;

    output::print_success(&format!("Loaded calculation '{}'", calc.name));
    print_calculation_summary(&calc);

    let generator = build_generator(&calc, args.bandgap)?;
    if args.bandgap.is_some() {
        output::print_info(&format!(
            "Scissor correction: {:.3} eV -> {:.3} eV",
            calc.band_structure.band_gap(),
            generator.band_structure().band_gap()
        ));
    }

    output::print_info(&format!(
        "T = {} K, n = {:e} cm^-3, {:.2}-{:.2} eV (step {} eV, σ = {} eV)",
        config.temperature,
        args.concentration,
        config.energy_min,
        config.energy_max,
        config.step,
        config.gaussian_width
    ));

    let spinner = progress::create_spinner("Computing light and dark JDOS...");
    let tas = generator.generate(&config, args.concentration, None, None);
    spinner.finish_and_clear();
    let tas = tas?;

    output::print_success(&format!(
        "Computed TAS over {} energies and {} band transitions",
        tas.energy_mesh_ev.len(),
        tas.tas_decomp.len()
    ));

    let format = args
        .format
        .unwrap_or_else(|| guess_format_from_extension(&args.output));
    let opts = plot_options(&args.plot, YAxis::Tas, calc.material());

    write_tas(
        &tas,
        &args.output,
        format,
        &opts,
        (args.plot.fig_width, args.plot.fig_height),
    )?;

    if let Some(path) = &args.decomposition {
        export::decomposition_to_csv(&tas.energy_mesh_ev, &tas.tas_decomp, path)?;
        output::print_success(&format!("Decomposition saved to '{}'", path.display()));
    }

    print_transition_table(&tas.tas_decomp, &tas.energy_mesh_ev, args.plot.top, "TAS");

    output::print_done(&format!("TAS saved to '{}'", args.output.display()));
    Ok(())
}

/// 批量处理模式
fn execute_batch(args: &TasArgs) -> Result<()> {
    output::print_info(&format!("Batch mode: directory '{}'", args.input.display()));

    let collector = CalcDirCollector::new(args.input.clone())
        .with_pattern(&args.pattern)
        .recursive(args.recursive);

    let dirs = collector.collect();

    if dirs.is_empty() {
        return Err(TaspecError::NoCalculationsFound {
            path: args.input.display().to_string(),
        });
    }

    output::print_info(&format!("Found {} calculation directories", dirs.len()));

    fs::create_dir_all(&args.output).map_err(|e| TaspecError::FileWriteError {
        path: args.output.display().to_string(),
        source: e,
    })?;

    let format = args.format.unwrap_or(OutputFormat::Png);
    output::print_info(&format!("Output format: {:?}", format));

    let runner = BatchRunner::new(args.spectrum.jobs);
    output::print_info(&format!("Using {} parallel jobs", runner.jobs()));

    // 目录之间并行，单个目录内部串行
    let spectrum = SpectrumConfig {
        jobs: 1,
        ..spectrum_config(&args.spectrum)?
    };

    let config = Arc::new(BatchTasConfig {
        input_root: args.input.clone(),
        output_dir: args.output.clone(),
        spectrum,
        concentration: args.concentration,
        bandgap: args.bandgap,
        plot: args.plot.clone(),
        format,
        write_decomposition: args.decomposition.is_some(),
        overwrite: args.overwrite,
    });

    let result = runner.run(dirs, |dir| process_batch_dir(dir, &config))?;

    output::print_separator();
    output::print_success(&format!(
        "Batch complete: {} calculations, {} success, {} skipped, {} failed",
        result.total(),
        result.success,
        result.skipped,
        result.failed
    ));

    for msg in &result.skips {
        output::print_skip(msg);
    }

    if !result.failures.is_empty() {
        output::print_warning("Failed calculations:");
        for (path, err) in result.failures.iter().take(10) {
            output::print_error(&format!("  {}: {}", path, err));
        }
        if result.failures.len() > 10 {
            output::print_warning(&format!("  ... and {} more", result.failures.len() - 10));
        }
    }

    Ok(())
}

/// 批量处理配置
struct BatchTasConfig {
    input_root: PathBuf,
    output_dir: PathBuf,
    spectrum: SpectrumConfig,
    concentration: f64,
    bandgap: Option<f64>,
    plot: PlotArgs,
    format: OutputFormat,
    write_decomposition: bool,
    overwrite: bool,
}

/// 处理批量模式中的单个计算目录
fn process_batch_dir(dir: &PathBuf, config: &Arc<BatchTasConfig>) -> ProcessResult {
    let name = output_stem(&config.input_root, dir);

    let output_file = config
        .output_dir
        .join(format!("{}_tas.{}", name, config.format.extension()));

    if output_file.exists() && !config.overwrite {
        return ProcessResult::Skipped(format!(
            "Output exists, skipping: {}",
            output_file.display()
        ));
    }

    match process_calculation(dir, &output_file, config) {
        Ok(_) => ProcessResult::Success(format!("{} -> {}", dir.display(), output_file.display())),
        Err(e) => ProcessResult::Failed(dir.display().to_string(), e.to_string()),
    }
}

/// 输出文件名前缀：相对输入根目录的路径，各级以 `_` 连接
///
/// 递归模式下 `a/CdTe` 与 `b/CdTe` 分别得到 `a_CdTe` 与 `b_CdTe`。
fn output_stem(root: &Path, dir: &Path) -> String {
    let relative = dir.strip_prefix(root).unwrap_or(dir);
    let parts: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    if parts.is_empty() {
        "calculation".to_string()
    } else {
        parts.join("_")
    }
}

fn process_calculation(dir: &Path, output_file: &Path, config: &BatchTasConfig) -> Result<()> {
    let calc = parsers::load_calculation(dir)?;
    let generator = build_generator(&calc, config.bandgap)?;
    let tas = generator.generate(&config.spectrum, config.concentration, None, None)?;

    let opts = plot_options(&config.plot, YAxis::Tas, calc.material());
    write_tas(
        &tas,
        output_file,
        config.format,
        &opts,
        (config.plot.fig_width, config.plot.fig_height),
    )?;

    if config.write_decomposition {
        let decomp_file = output_file.with_extension("decomposition.csv");
        export::decomposition_to_csv(&tas.energy_mesh_ev, &tas.tas_decomp, &decomp_file)?;
    }

    Ok(())
}

/// 按输出格式写出 TAS
fn write_tas(
    tas: &Tas,
    output_path: &Path,
    format: OutputFormat,
    opts: &PlotOptions,
    (width, height): (u32, u32),
) -> Result<()> {
    match format {
        OutputFormat::Png | OutputFormat::Svg => {
            let figure = plot::prepare_tas_figure(tas, opts)?;
            plot::render(&figure, output_path, width, height, format == OutputFormat::Svg)
        }
        OutputFormat::Csv => export::tas_to_csv(tas, output_path),
        OutputFormat::Xy => {
            let comments = vec![
                format!(
                    "TAS of {}",
                    opts.material.as_deref().unwrap_or("unknown material")
                ),
                format!(
                    "T = {} K, n = {:e} cm^-3, band gap = {:.2} eV",
                    tas.temperature, tas.concentration, tas.bandgap
                ),
                "Columns: energy (eV), JDOS(light) - JDOS(dark) (a.u.)".to_string(),
            ];
            export::to_xy(&tas.energy_mesh_ev, &tas.total_tas, &comments, output_path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use crate::parsers::doscar::tests::DOSCAR_ISPIN1;
    use crate::parsers::eigenval::tests::EIGENVAL_ISPIN1;
    use clap::Parser;
    use tempfile::TempDir;

    fn tas_args(argv: &[&str]) -> TasArgs {
        let mut full = vec!["taspec", "tas"];
        full.extend_from_slice(argv);
        match Cli::try_parse_from(full).unwrap().command {
            Commands::Tas(args) => args,
            Commands::Das(_) => panic!("expected tas"),
        }
    }

    fn write_calc(dir: &Path) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join("EIGENVAL"), EIGENVAL_ISPIN1).unwrap();
        fs::write(dir.join("DOSCAR"), DOSCAR_ISPIN1).unwrap();
    }

    #[test]
    fn test_tas_single_csv_output() {
        let tmp = TempDir::new().unwrap();
        let calc = tmp.path().join("calc");
        write_calc(&calc);
        let out = tmp.path().join("tas.csv");
        let decomp = tmp.path().join("decomp.csv");

        let args = tas_args(&[
            calc.to_str().unwrap(),
            "-o",
            out.to_str().unwrap(),
            "--decomposition",
            decomp.to_str().unwrap(),
            "-c",
            "1e20",
            "-j",
            "1",
        ]);
        execute(args).unwrap();

        let content = fs::read_to_string(&out).unwrap();
        assert_eq!(content.lines().count(), 501);
        assert!(content.starts_with("energy_ev,wavelength_nm,tas"));
        assert!(decomp.is_file());
    }

    #[test]
    fn test_tas_batch_continues_after_failure() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("calcs");
        write_calc(&root.join("good"));
        // 缺少 DOSCAR
        fs::create_dir_all(root.join("broken")).unwrap();
        fs::write(root.join("broken").join("EIGENVAL"), EIGENVAL_ISPIN1).unwrap();

        let out_dir = tmp.path().join("out");
        let args = tas_args(&[
            root.to_str().unwrap(),
            "-o",
            out_dir.to_str().unwrap(),
            "-f",
            "xy",
            "-j",
            "2",
        ]);
        execute(args).unwrap();

        assert!(out_dir.join("good_tas.xy").is_file());
        assert!(!out_dir.join("broken_tas.xy").exists());
    }

    #[test]
    fn test_tas_recursive_batch_same_directory_names() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("calcs");
        write_calc(&root.join("a").join("CdTe"));
        write_calc(&root.join("b").join("CdTe"));

        let out_dir = tmp.path().join("out");
        let args = tas_args(&[
            root.to_str().unwrap(),
            "-o",
            out_dir.to_str().unwrap(),
            "-f",
            "xy",
            "--recursive",
            "-j",
            "2",
        ]);
        execute(args).unwrap();

        let mut outputs: Vec<String> = fs::read_dir(&out_dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        outputs.sort();
        assert_eq!(outputs, vec!["a_CdTe_tas.xy", "b_CdTe_tas.xy"]);
    }

    #[test]
    fn test_output_stem_from_relative_path() {
        let root = Path::new("/data/calcs");
        assert_eq!(output_stem(root, Path::new("/data/calcs/CdTe")), "CdTe");
        assert_eq!(output_stem(root, Path::new("/data/calcs/a/b/GaAs")), "a_b_GaAs");
        assert_eq!(output_stem(root, root), "calculation");
    }

    #[test]
    fn test_tas_missing_input() {
        let tmp = TempDir::new().unwrap();
        let args = tas_args(&[tmp.path().join("nope").to_str().unwrap()]);
        assert!(matches!(
            execute(args),
            Err(TaspecError::DirectoryNotFound { .. })
        ));
    }

    #[test]
    fn test_tas_empty_batch_directory() {
        let tmp = TempDir::new().unwrap();
        let args = tas_args(&[tmp.path().to_str().unwrap()]);
        assert!(matches!(
            execute(args),
            Err(TaspecError::NoCalculationsFound { .. })
        ));
    }
}
