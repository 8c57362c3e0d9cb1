//! # taspec - 瞬态/差分吸收谱计算工具
//!
//! 由 VASP 能带结构（EIGENVAL + DOSCAR）计算联合态密度 (JDOS)，
//! 进而得到光激发载流子引起的瞬态吸收谱 (TAS) 与两个体系之间的差分吸收谱 (DAS)。
//!
//! ## 子命令
//! - `tas` - 光照态与暗态 JDOS 之差（支持批量目录）
//! - `das` - 新体系与参考体系 JDOS 之差
//!
//! ## 依赖关系
//! ```text
//! main.rs
//!   ├── cli/        (命令行参数定义)
//!   ├── commands/   (命令执行逻辑)
//!   │     ├── parsers/   (EIGENVAL/DOSCAR/POSCAR 解析)
//!   │     ├── spectra/   (占据数、JDOS、TAS/DAS、绘图、导出)
//!   │     ├── batch/     (批量目录处理)
//!   │     └── models/    (数据模型)
//!   ├── utils/      (输出与进度条)
//!   └── error.rs    (错误处理)
//! ```

mod batch;
mod cli;
mod commands;
mod error;
mod models;
mod parsers;
mod spectra;
mod utils;

use clap::Parser;
use cli::Cli;

fn main() {
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cli = Cli::parse();

    if let Err(e) = commands::run(cli.command) {
        utils::output::print_error(&format!("{}", e));
        std::process::exit(1);
    }
}
