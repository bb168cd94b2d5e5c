//! 运行选项（模块）
use std::path::PathBuf;
use std::time::Duration;

/// 单个工具的默认超时
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// 单个工具超时的上限，更大的值按此截断
pub const MAX_TIMEOUT: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// 默认输出目录名（位于系统临时目录下）
const DEFAULT_OUTPUT_DIR_NAME: &str = "stegsweep-output";

/// 一次扫描的运行选项，扫描期间不可变
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// steghide / openstego 的提取口令
    pub password: Option<String>,
    /// 仅运行这些工具（不区分大小写）；为空表示不限制
    pub only: Vec<String>,
    /// 跳过这些工具（不区分大小写）；与 only 冲突时 skip 优先
    pub skip: Vec<String>,
    /// 提取产物的输出目录
    pub output_dir: PathBuf,
    /// 单个工具超时；None 或 0 使用 [`DEFAULT_TIMEOUT`]
    pub timeout: Option<Duration>,
    pub verbose: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            password: None,
            only: Vec::new(),
            skip: Vec::new(),
            output_dir: Self::default_output_dir(),
            timeout: None,
            verbose: false,
        }
    }
}

impl RunOptions {
    pub fn default_output_dir() -> PathBuf {
        std::env::temp_dir().join(DEFAULT_OUTPUT_DIR_NAME)
    }

    /// 实际生效的超时
    pub fn effective_timeout(&self) -> Duration {
        match self.timeout {
            Some(t) if !t.is_zero() => t.min(MAX_TIMEOUT),
            _ => DEFAULT_TIMEOUT,
        }
    }

    /// 口令（未设置时为空串，部分工具需要显式传入空口令以避免交互提示）
    pub fn password(&self) -> &str {
        self.password.as_deref().unwrap_or("")
    }
}
