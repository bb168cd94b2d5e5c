//! JSON 报告结构（对外暴露）
use serde::Serialize;
use std::io::Write;

use crate::detect::FileRecord;
use crate::report::Summary;
use crate::results::{Outcome, ScanResult};
use crate::tool::ToolCategory;

/// 单个工具的展示状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Ok,
    /// 成功但无输出
    Empty,
    Failed,
    Skipped,
    /// 未回报结果
    NotRun,
}

impl Status {
    pub fn of(outcome: &Outcome) -> Self {
        match outcome {
            Outcome::Output(s) if s.is_empty() => Status::Empty,
            Outcome::Output(_) => Status::Ok,
            Outcome::Failed(_) => Status::Failed,
            Outcome::Skipped(_) => Status::Skipped,
        }
    }
}

/// 报告中的单个工具条目
#[derive(Debug, Clone, Serialize)]
pub struct ToolEntry<'a> {
    pub tool: &'a str,
    pub category: Option<ToolCategory>,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub duration_ms: u64,
}

/// 完整报告（对应 `--json` 输出）
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport<'a> {
    pub file: &'a FileRecord,
    pub tools: Vec<ToolEntry<'a>>,
    pub summary: Summary,
}

impl<'a> ScanReport<'a> {
    /// `names` 为过滤后的工具名列表，与结果槽位一一对应
    pub fn new(scan: &'a ScanResult, names: &[&'a str]) -> Self {
        let tools = scan
            .results
            .iter()
            .enumerate()
            .map(|(i, slot)| match slot {
                Some(r) => ToolEntry {
                    tool: &r.tool,
                    category: Some(r.category),
                    status: Status::of(&r.outcome),
                    output: r.outcome.output(),
                    reason: r.outcome.error().map(ToString::to_string),
                    duration_ms: r.duration.as_millis() as u64,
                },
                None => ToolEntry {
                    tool: names.get(i).copied().unwrap_or("?"),
                    category: None,
                    status: Status::NotRun,
                    output: None,
                    reason: None,
                    duration_ms: 0,
                },
            })
            .collect();
        Self { file: &scan.file, tools, summary: Summary::from_scan(scan) }
    }
}

/// 以 pretty JSON 写出报告
pub fn write_json(report: &ScanReport<'_>, out: &mut dyn Write) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *out, report)?;
    writeln!(out)?;
    Ok(())
}
