//! 结果汇总、分组与输出截断（不涉及终端样式）
use serde::Serialize;
use std::time::Duration;

use crate::results::{Outcome, ScanResult, ToolResult};
use crate::tool::ToolCategory;

/// 非详细模式下每个工具最多展示的输出行数
pub const MAX_OUTPUT_LINES: usize = 30;

/// 整秒显示为 "60s"，否则显示为毫秒 "250ms"
pub fn format_duration(d: &Duration) -> String {
    if d.subsec_nanos() == 0 {
        format!("{}s", d.as_secs())
    } else {
        format!("{}ms", d.as_millis())
    }
}

/// 汇总计数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    /// 过滤后的工具数
    pub total: usize,
    pub succeeded: usize,
    /// 成功且输出非空
    pub with_output: usize,
    pub failed: usize,
    pub skipped: usize,
    /// 未回报结果的槽位
    pub not_run: usize,
    #[serde(rename = "duration_ms", serialize_with = "as_millis")]
    pub duration: Duration,
}

fn as_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

impl Summary {
    pub fn from_scan(scan: &ScanResult) -> Self {
        let mut sum = Summary { total: scan.results.len(), duration: scan.duration, ..Summary::default() };
        for slot in &scan.results {
            match slot.as_ref().map(|r| &r.outcome) {
                Some(Outcome::Output(out)) => {
                    sum.succeeded += 1;
                    if !out.is_empty() {
                        sum.with_output += 1;
                    }
                }
                Some(Outcome::Failed(_)) => sum.failed += 1,
                Some(Outcome::Skipped(_)) => sum.skipped += 1,
                None => sum.not_run += 1,
            }
        }
        sum
    }
}

/// 按固定类别顺序分组，组内保持结果顺序；空类别不返回
pub fn by_category(scan: &ScanResult) -> Vec<(ToolCategory, Vec<&ToolResult>)> {
    ToolCategory::ORDER
        .iter()
        .map(|&cat| (cat, scan.completed().filter(|r| r.category == cat).collect::<Vec<_>>()))
        .filter(|(_, rs)| !rs.is_empty())
        .collect()
}

/// 截断后的输出片段
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Excerpt<'a> {
    pub lines: Vec<&'a str>,
    /// 被隐藏的行数
    pub hidden: usize,
}

/// 取前 `max` 行；`max == 0` 表示不截断
pub fn excerpt(output: &str, max: usize) -> Excerpt<'_> {
    let all: Vec<&str> = output.lines().collect();
    if max == 0 || all.len() <= max {
        return Excerpt { lines: all, hidden: 0 };
    }
    let hidden = all.len() - max;
    Excerpt { lines: all[..max].to_vec(), hidden }
}
