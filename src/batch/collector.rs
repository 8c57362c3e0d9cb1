//! # 计算目录收集器
//!
//! 在根目录下查找包含 EIGENVAL 的 VASP 计算目录。
//!
//! ## 功能
//! - 按目录名 glob 模式过滤（逗号分隔多模式）
//! - 可选递归搜索
//! - 结果按路径排序，保证输出顺序稳定
//!
//! ## 依赖关系
//! - 被 `commands/tas.rs` 调用
//! - 使用 `walkdir` 遍历目录，`glob` 匹配目录名

use glob::Pattern;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// 标志一个计算目录的文件
const MARKER_FILE: &str = "EIGENVAL";

/// 计算目录收集器
pub struct CalcDirCollector {
    /// 根目录
    root: PathBuf,
    /// 目录名匹配模式
    patterns: Vec<Pattern>,
    /// 是否递归
    recursive: bool,
}

impl CalcDirCollector {
    /// 创建新的收集器
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            patterns: Vec::new(),
            recursive: false,
        }
    }

    /// 设置目录名匹配模式（逗号分隔的多模式）；无效模式被忽略
    pub fn with_pattern(mut self, pattern: &str) -> Self {
        self.patterns = pattern
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .filter_map(|s| Pattern::new(s).ok())
            .collect();
        self
    }

    /// 设置是否递归搜索
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// 根目录本身是否为计算目录
    pub fn is_calculation_dir(path: &Path) -> bool {
        path.join(MARKER_FILE).is_file()
    }

    /// 收集所有匹配的计算目录（不含根目录自身）
    pub fn collect(&self) -> Vec<PathBuf> {
        if !self.root.is_dir() {
            return vec![];
        }

        let max_depth = if self.recursive { usize::MAX } else { 1 };

        let mut dirs: Vec<PathBuf> = WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(max_depth)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_dir())
            .filter(|e| Self::is_calculation_dir(e.path()))
            .filter(|e| self.matches_patterns(e.path()))
            .map(|e| e.path().to_path_buf())
            .collect();

        dirs.sort();
        dirs
    }

    /// 检查目录名是否匹配任一模式（无模式时全部匹配）
    fn matches_patterns(&self, path: &Path) -> bool {
        if self.patterns.is_empty() {
            return true;
        }

        match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => self.patterns.iter().any(|p| p.matches(name)),
            None => false,
        }
    }
}
