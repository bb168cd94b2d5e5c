//! 二进制可用性探测（每次调用实时查找 PATH，不做缓存）
use std::env;
use std::path::{Path, PathBuf};

/// 判断某个二进制当前是否可用
pub trait BinaryProbe: Send + Sync {
    fn is_available(&self, binary: &str) -> bool;
}

/// 基于 `PATH` 环境变量的真实探测
#[derive(Debug, Default, Clone, Copy)]
pub struct SearchPath;

impl BinaryProbe for SearchPath {
    fn is_available(&self, binary: &str) -> bool {
        find_executable(binary).is_some()
    }
}

/// 在 `PATH` 中查找可执行文件；名字中带路径分隔符时直接检查该路径
pub fn find_executable(name: &str) -> Option<PathBuf> {
    if name.is_empty() {
        return None;
    }
    let direct = Path::new(name);
    if direct.components().count() > 1 {
        return is_executable(direct).then(|| direct.to_path_buf());
    }

    let paths = env::var_os("PATH")?;
    for dir in env::split_paths(&paths) {
        let dir = if dir.as_os_str().is_empty() { PathBuf::from(".") } else { dir };
        for candidate in candidates(&dir, name) {
            if is_executable(&candidate) {
                return Some(candidate);
            }
        }
    }
    None
}

#[cfg(unix)]
fn candidates(dir: &Path, name: &str) -> Vec<PathBuf> {
    vec![dir.join(name)]
}

#[cfg(windows)]
fn candidates(dir: &Path, name: &str) -> Vec<PathBuf> {
    let mut out = vec![dir.join(name)];
    let exts = env::var("PATHEXT").unwrap_or_else(|_| ".EXE;.CMD;.BAT;.COM".to_string());
    for ext in exts.split(';').filter(|e| !e.is_empty()) {
        out.push(dir.join(format!("{name}{}", ext.to_ascii_lowercase())));
    }
    out
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    match path.metadata() {
        Ok(md) => md.is_file() && md.permissions().mode() & 0o111 != 0,
        Err(_) => false,
    }
}

#[cfg(windows)]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
