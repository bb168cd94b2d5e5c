//! 配置文件加载（TOML）
use directories::ProjectDirs;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;
use crate::options::RunOptions;

/// 配置文件结构；所有字段可选，未出现的字段使用 [`RunOptions`] 默认值
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub password: Option<String>,
    pub skip: Vec<String>,
    pub only: Vec<String>,
    pub output_dir: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
    pub verbose: bool,
}

impl FileConfig {
    pub fn into_options(self) -> RunOptions {
        RunOptions {
            password: self.password,
            only: self.only,
            skip: self.skip,
            output_dir: self.output_dir.unwrap_or_else(RunOptions::default_output_dir),
            timeout: self.timeout_secs.map(Duration::from_secs),
            verbose: self.verbose,
        }
    }
}

/// 从指定路径加载配置；文件不存在同样是错误
pub fn load_config(path: &Path) -> Result<FileConfig, ConfigError> {
    let txt = std::fs::read_to_string(path).map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
    toml::from_str(&txt).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
}

/// 平台配置目录下的 `stegsweep/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "stegsweep").map(|d| d.config_dir().join("config.toml"))
}

/// 加载默认位置的配置；文件不存在时返回默认值
pub fn load_default_config() -> Result<FileConfig, ConfigError> {
    match default_config_path() {
        Some(path) if path.is_file() => load_config(&path),
        _ => Ok(FileConfig::default()),
    }
}
