//! 单个工具结果与整批扫描结果
use std::time::Duration;

use crate::detect::FileRecord;
use crate::error::ToolError;
use crate::tool::ToolCategory;

/// 工具执行的唯一主结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// 成功，输出已去除首尾空白（可能为空）
    Output(String),
    Failed(ToolError),
    Skipped(ToolError),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Output(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Outcome::Failed(_))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Outcome::Skipped(_))
    }

    /// 成功且输出非空时返回输出
    pub fn output(&self) -> Option<&str> {
        match self {
            Outcome::Output(s) if !s.is_empty() => Some(s),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ToolError> {
        match self {
            Outcome::Failed(e) | Outcome::Skipped(e) => Some(e),
            Outcome::Output(_) => None,
        }
    }
}

impl From<ToolError> for Outcome {
    /// 按错误种类归入跳过或失败
    fn from(err: ToolError) -> Self {
        if err.is_skip() {
            Outcome::Skipped(err)
        } else {
            Outcome::Failed(err)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolResult {
    pub tool: String,
    pub category: ToolCategory,
    pub outcome: Outcome,
    pub duration: Duration,
}

/// 一次扫描的结果：槽位顺序即过滤后工具列表的顺序
#[derive(Debug, Clone)]
pub struct ScanResult {
    pub file: FileRecord,
    /// None 表示该工具未能回报结果
    pub results: Vec<Option<ToolResult>>,
    /// 派发开始到全部结束的墙钟时间
    pub duration: Duration,
}

impl ScanResult {
    /// 已完成的结果（保持槽位顺序）
    pub fn completed(&self) -> impl Iterator<Item = &ToolResult> {
        self.results.iter().flatten()
    }

    pub fn is_complete(&self) -> bool {
        self.results.iter().all(Option::is_some)
    }
}
