//! 输出目录中的提取产物
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// 递归列出目录下的全部文件（排序后返回）；目录不存在时为空
pub fn list(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .collect();
    files.sort();
    files
}
