//! 错误类型（分类阶段 / 单个工具 / 配置 / 注册表）
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::report::format_duration;

/// 文件分类失败：对整个扫描是致命的，任何工具都不会被派发
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("cannot access file: {path}")]
    Access {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("path is a directory, not a file: {0}")]
    IsDirectory(PathBuf),

    #[error("cannot read file: {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// 单个工具的错误。前两种表示“跳过”，后两种表示“失败”；均不影响同批次其他工具。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolError {
    #[error("{binary} not installed")]
    Missing { binary: String },

    #[error("{0}")]
    NotApplicable(String),

    #[error("timeout after {}", format_duration(.after))]
    Timeout { after: Duration },

    #[error("{0}")]
    Process(String),
}

impl ToolError {
    /// 是否属于“未运行”类（缺少二进制或命令不适用）
    pub fn is_skip(&self) -> bool {
        matches!(self, ToolError::Missing { .. } | ToolError::NotApplicable(_))
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file: {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config file: {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("duplicate tool name in registry: {0}")]
    DuplicateTool(String),

    #[error("cannot create output directory: {path}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
