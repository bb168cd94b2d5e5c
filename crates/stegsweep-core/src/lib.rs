//! 隐写分析工具调度核心
//!
//! 设计要点：
//! - 文件分类采用“魔数优先、扩展名兜底”，保证改名后的文件仍能被正确识别。
//! - 工具注册表是显式构造的值，不存在全局可变状态；过滤函数为纯函数。
//! - 每个适用工具独立并发执行，各自带超时；超时只终止本工具的进程组。
//! - 结果按过滤后列表的固定下标写回，完成顺序不影响展示顺序。

mod error;
mod detect;
mod options;
mod tool;
mod registry;
mod filter;
mod probe;
mod exec;
mod results;
mod runner;
mod report;
mod types;
mod config;
pub mod deps;
pub mod artifacts;

pub use error::{ClassifyError, ConfigError, RegistryError, ToolError};
pub use detect::{classify, detect, FileCategory, FileRecord, HEADER_LEN};
pub use options::{RunOptions, DEFAULT_TIMEOUT, MAX_TIMEOUT};
pub use tool::{CommandSpec, DirPrep, NotApplicable, ToolCategory, ToolDescriptor};
pub use registry::Registry;
pub use filter::applicable;
pub use probe::{find_executable, BinaryProbe, SearchPath};
pub use exec::{execute, Execution, Exit};
pub use results::{Outcome, ScanResult, ToolResult};
pub use runner::{run_all, run_all_with_progress};
pub use report::{by_category, excerpt, format_duration, Excerpt, Summary, MAX_OUTPUT_LINES};
pub use types::{write_json, ScanReport, Status, ToolEntry};
pub use config::{default_config_path, load_config, load_default_config, FileConfig};
