//! 工具描述符与命令规格
use serde::Serialize;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::detect::FileCategory;
use crate::options::RunOptions;

/// 工具所属的分析类别（用于报告分组）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolCategory {
    General,
    Image,
    Audio,
    Text,
}

impl ToolCategory {
    /// 报告中的固定展示顺序
    pub const ORDER: [ToolCategory; 4] =
        [ToolCategory::General, ToolCategory::Image, ToolCategory::Audio, ToolCategory::Text];

    pub fn as_str(self) -> &'static str {
        match self {
            ToolCategory::General => "general",
            ToolCategory::Image => "image",
            ToolCategory::Audio => "audio",
            ToolCategory::Text => "text",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            ToolCategory::General => "General Analysis",
            ToolCategory::Image => "Image Steganography",
            ToolCategory::Audio => "Audio Steganography",
            ToolCategory::Text => "Text / Misc Steganography",
        }
    }
}

impl fmt::Display for ToolCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 启动子进程前对输出子目录的准备动作
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirPrep {
    /// 删除目录（工具要求目标目录不存在）
    Remove(PathBuf),
    /// 删除后重新创建（保证是空目录）
    Recreate(PathBuf),
    /// 确保目录存在
    Ensure(PathBuf),
}

/// 可执行命令规格：程序、参数与启动前的目录准备
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<OsString>,
    pub prepare: Vec<DirPrep>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self { program: program.into(), args: Vec::new(), prepare: Vec::new() }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args.extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    pub fn prepare(mut self, step: DirPrep) -> Self {
        self.prepare.push(step);
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for a in &self.args {
            let a = a.to_string_lossy();
            // 多行参数（内嵌脚本）只显示占位符
            if a.contains('\n') {
                f.write_str(" <script>")?;
            } else {
                write!(f, " {a}")?;
            }
        }
        Ok(())
    }
}

/// 命令构造器在调用时判定“不适用”（例如所需的字典文件不存在）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotApplicable(pub String);

impl fmt::Display for NotApplicable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 命令构造函数：(文件路径, 运行选项) → 命令规格或“不适用”
pub type BuildFn = dyn Fn(&Path, &RunOptions) -> Result<CommandSpec, NotApplicable> + Send + Sync;

/// 工具描述符（注册表持有，构造后不再修改）
#[derive(Clone)]
pub struct ToolDescriptor {
    pub name: String,
    pub binary: String,
    /// 备选二进制名，任一存在即视为已安装
    pub alt_binaries: Vec<String>,
    pub category: ToolCategory,
    /// 适用的文件类别；为空表示适用于全部类别（含 unknown）
    pub applies_to: Vec<FileCategory>,
    builder: Arc<BuildFn>,
}

impl ToolDescriptor {
    pub fn new<F>(name: impl Into<String>, binary: impl Into<String>, category: ToolCategory, builder: F) -> Self
    where
        F: Fn(&Path, &RunOptions) -> Result<CommandSpec, NotApplicable> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            binary: binary.into(),
            alt_binaries: Vec::new(),
            category,
            applies_to: Vec::new(),
            builder: Arc::new(builder),
        }
    }

    /// 限定适用的文件类别
    pub fn for_categories(mut self, cats: &[FileCategory]) -> Self {
        self.applies_to = cats.to_vec();
        self
    }

    pub fn alt_binary(mut self, binary: impl Into<String>) -> Self {
        self.alt_binaries.push(binary.into());
        self
    }

    /// 是否适用于给定文件类别
    pub fn supports(&self, category: FileCategory) -> bool {
        self.applies_to.is_empty() || self.applies_to.contains(&category)
    }

    /// 主二进制及全部备选
    pub fn binaries(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.binary.as_str()).chain(self.alt_binaries.iter().map(String::as_str))
    }

    pub fn build(&self, file: &Path, opts: &RunOptions) -> Result<CommandSpec, NotApplicable> {
        (self.builder)(file, opts)
    }
}

impl fmt::Debug for ToolDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolDescriptor")
            .field("name", &self.name)
            .field("binary", &self.binary)
            .field("alt_binaries", &self.alt_binaries)
            .field("category", &self.category)
            .field("applies_to", &self.applies_to)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn echo_tool() -> ToolDescriptor {
        ToolDescriptor::new("echo", "echo", ToolCategory::General, |fp, _| Ok(CommandSpec::new("echo").arg(fp)))
    }

    #[test]
    fn empty_category_set_supports_everything() {
        let tool = echo_tool();
        assert!(tool.supports(FileCategory::Png));
        assert!(tool.supports(FileCategory::Unknown));
    }

    #[test]
    fn restricted_categories() {
        let tool = echo_tool().for_categories(&[FileCategory::Png, FileCategory::Bmp]);
        assert!(tool.supports(FileCategory::Bmp));
        assert!(!tool.supports(FileCategory::Jpg));
        assert!(!tool.supports(FileCategory::Unknown));
    }

    #[test]
    fn binaries_include_alternates() {
        let tool = echo_tool().alt_binary("gecho");
        assert_eq!(tool.binaries().collect::<Vec<_>>(), vec!["echo", "gecho"]);
    }

    #[test]
    fn build_and_display() {
        let spec = echo_tool().build(Path::new("/tmp/a.png"), &RunOptions::default()).unwrap();
        assert_eq!(spec.to_string(), "echo /tmp/a.png");

        let script = CommandSpec::new("python3").arg("-c").arg("import sys\nprint(1)").arg("x");
        assert_eq!(script.to_string(), "python3 -c <script> x");
    }
}
