//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数和子命令。
//!
//! ## 命令结构
//! - `tas`: 由单个计算（或一批计算）生成瞬态吸收谱
//! - `das`: 比较两个计算，生成差分吸收谱
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 子模块: spectrum（共享参数）, tas, das

pub mod das;
pub mod spectrum;
pub mod tas;

use clap::{Parser, Subcommand};

/// taspec - 由 DFT 能带结构计算瞬态/差分吸收谱
#[derive(Parser)]
#[command(name = "taspec")]
#[command(author = "Changjiang Wu")]
#[command(version)]
#[command(
    about = "Transient and differential absorption spectra from DFT band structures",
    long_about = None
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令
#[derive(Subcommand)]
pub enum Commands {
    /// Transient absorption spectrum (light - dark JDOS) of a VASP calculation
    Tas(tas::TasArgs),

    /// Differential absorption spectrum between a new and a reference calculation
    Das(das::DasArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectra::plot::{XAxis, YAxis};

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_tas_command() {
        let cli = Cli::try_parse_from([
            "taspec",
            "tas",
            "calc/CdTe",
            "-c",
            "1e20",
            "--bandgap",
            "1.5",
            "--xaxis",
            "energy",
            "--transition",
            "(0,1)",
            "--transition",
            "-1:1",
        ])
        .unwrap();

        match cli.command {
            Commands::Tas(args) => {
                assert_eq!(args.concentration, 1e20);
                assert_eq!(args.bandgap, Some(1.5));
                assert_eq!(args.spectrum.temperature, 300.0);
                assert_eq!(args.plot.xaxis, XAxis::Energy);
                assert_eq!(args.plot.yaxis, None);
                assert_eq!(args.plot.transitions.len(), 2);
                assert_eq!(args.plot.transitions[1].initial, -1);
            }
            Commands::Das(_) => panic!("expected tas"),
        }
    }

    #[test]
    fn test_parse_das_command() {
        let cli = Cli::try_parse_from([
            "taspec",
            "das",
            "new",
            "ref",
            "--bandgap-ref",
            "2.0",
            "--yaxis",
            "jdos",
        ])
        .unwrap();

        match cli.command {
            Commands::Das(args) => {
                assert_eq!(args.bandgap_ref, Some(2.0));
                assert_eq!(args.bandgap, None);
                assert_eq!(args.plot.yaxis, Some(YAxis::Jdos));
            }
            Commands::Tas(_) => panic!("expected das"),
        }
    }

    #[test]
    fn test_invalid_transition_rejected() {
        let result = Cli::try_parse_from(["taspec", "tas", "calc", "--transition", "VBM->CBM"]);
        assert!(result.is_err());
    }
}
