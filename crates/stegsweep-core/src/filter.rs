//! 派发过滤（纯函数）
use std::collections::HashSet;

use crate::detect::FileRecord;
use crate::options::RunOptions;
use crate::tool::ToolDescriptor;

/// 从注册表中挑出适用于该文件的工具，保持注册表顺序
/// 1. 名字（不区分大小写）在 skip 中 → 丢弃
/// 2. only 非空且名字不在其中 → 丢弃（skip 始终优先）
/// 3. 类别集合非空且不含文件类别 → 丢弃
pub fn applicable<'a>(tools: &'a [ToolDescriptor], file: &FileRecord, opts: &RunOptions) -> Vec<&'a ToolDescriptor> {
    let skip: HashSet<String> = opts.skip.iter().map(|s| s.trim().to_lowercase()).collect();
    let only: HashSet<String> = opts.only.iter().map(|s| s.trim().to_lowercase()).collect();

    tools
        .iter()
        .filter(|t| {
            let name = t.name.to_lowercase();
            if skip.contains(&name) {
                return false;
            }
            if !only.is_empty() && !only.contains(&name) {
                return false;
            }
            t.supports(file.category)
        })
        .collect()
}
