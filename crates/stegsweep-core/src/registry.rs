//! 内置工具注册表
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::deps::wordlist_path;
use crate::detect::FileCategory as F;
use crate::error::RegistryError;
use crate::options::RunOptions;
use crate::tool::{CommandSpec, DirPrep, NotApplicable, ToolCategory, ToolDescriptor};

const BITPLANES_PY: &str = include_str!("../scripts/bitplanes.py");
const ZERO_WIDTH_PY: &str = include_str!("../scripts/zero_width.py");
const SPAMMIMIC_PY: &str = include_str!("../scripts/spammimic.py");

/// steghide 系列支持的载体格式
const STEGHIDE_TYPES: &[F] = &[F::Jpg, F::Bmp, F::Wav, F::Au];

/// 有序、确定的工具描述符列表
#[derive(Debug, Clone)]
pub struct Registry {
    tools: Vec<ToolDescriptor>,
}

impl Registry {
    /// 构造内置注册表；唯一的 I/O 是确保输出目录存在
    pub fn builtin(opts: &RunOptions) -> Result<Self, RegistryError> {
        std::fs::create_dir_all(&opts.output_dir)
            .map_err(|source| RegistryError::OutputDir { path: opts.output_dir.clone(), source })?;
        Self::from_tools(builtin_tools())
    }

    /// 由自定义描述符构造；工具名（不区分大小写）必须唯一
    pub fn from_tools(tools: Vec<ToolDescriptor>) -> Result<Self, RegistryError> {
        let mut seen = HashSet::new();
        for t in &tools {
            if !seen.insert(t.name.to_lowercase()) {
                return Err(RegistryError::DuplicateTool(t.name.clone()));
            }
        }
        Ok(Self { tools })
    }

    pub fn tools(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.iter().find(|t| t.name.eq_ignore_ascii_case(name))
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

fn out(opts: &RunOptions, name: &str) -> PathBuf {
    opts.output_dir.join(name)
}

fn stegseek(fp: &Path, opts: &RunOptions, out_name: &str) -> Result<CommandSpec, NotApplicable> {
    let wordlist = wordlist_path().ok_or_else(|| NotApplicable("rockyou.txt wordlist not found".into()))?;
    Ok(CommandSpec::new("stegseek").arg(fp).arg(wordlist).arg(out(opts, out_name)).arg("--force"))
}

fn steghide_extract(fp: &Path, opts: &RunOptions, out_name: &str) -> CommandSpec {
    CommandSpec::new("steghide")
        .arg("extract")
        .arg("-sf")
        .arg(fp)
        .arg("-p")
        .arg(opts.password())
        .arg("-xf")
        .arg(out(opts, out_name))
        .arg("-f")
}

fn steghide_info(fp: &Path) -> CommandSpec {
    // 显式传入空口令，避免交互式提示
    CommandSpec::new("steghide").arg("info").arg(fp).args(["-p", ""])
}

fn python_script(script: &str) -> CommandSpec {
    CommandSpec::new("python3").arg("-c").arg(script)
}

fn builtin_tools() -> Vec<ToolDescriptor> {
    use ToolCategory::{Audio, General, Image, Text};

    vec![
        // 通用工具：适用于所有类别（含 unknown）
        ToolDescriptor::new("file", "file", General, |fp, _| Ok(CommandSpec::new("file").args(["-b", "--mime"]).arg(fp))),
        ToolDescriptor::new("exiftool", "exiftool", General, |fp, _| Ok(CommandSpec::new("exiftool").arg(fp))),
        ToolDescriptor::new("binwalk", "binwalk", General, |fp, _| Ok(CommandSpec::new("binwalk").arg(fp))),
        ToolDescriptor::new("strings", "strings", General, |fp, _| Ok(CommandSpec::new("strings").args(["-n", "8"]).arg(fp))),
        // 前 50 行十六进制（每行 16 字节）
        ToolDescriptor::new("hexdump", "xxd", General, |fp, _| Ok(CommandSpec::new("xxd").args(["-l", "800"]).arg(fp))),
        ToolDescriptor::new("foremost", "foremost", General, |fp, opts| {
            let dir = out(opts, "foremost");
            Ok(CommandSpec::new("foremost")
                .args(["-t", "all", "-i"])
                .arg(fp)
                .arg("-o")
                .arg(&dir)
                .prepare(DirPrep::Remove(dir)))
        }),
        // 图像
        ToolDescriptor::new("zsteg", "zsteg", Image, |fp, _| Ok(CommandSpec::new("zsteg").arg(fp).arg("--all")))
            .for_categories(&[F::Png, F::Bmp]),
        ToolDescriptor::new("steghide-extract", "steghide", Image, |fp, opts| {
            Ok(steghide_extract(fp, opts, "steghide_extracted.txt"))
        })
        .for_categories(STEGHIDE_TYPES),
        ToolDescriptor::new("steghide-info", "steghide", Image, |fp, _| Ok(steghide_info(fp))).for_categories(STEGHIDE_TYPES),
        ToolDescriptor::new("pngcheck", "pngcheck", Image, |fp, _| Ok(CommandSpec::new("pngcheck").arg("-vtp").arg(fp)))
            .for_categories(&[F::Png]),
        ToolDescriptor::new("identify", "gm", Image, |fp, _| {
            Ok(CommandSpec::new("gm").args(["identify", "-verbose"]).arg(fp))
        })
        .for_categories(F::IMAGES),
        ToolDescriptor::new("jsteg", "jsteg", Image, |fp, _| Ok(CommandSpec::new("jsteg").arg("reveal").arg(fp)))
            .for_categories(&[F::Jpg]),
        ToolDescriptor::new("openstego", "openstego", Image, |fp, opts| {
            let mut spec = CommandSpec::new("openstego")
                .args(["extract", "--algorithm", "RandomLSB", "-sf"])
                .arg(fp)
                .arg("-xd")
                .arg(out(opts, "openstego_extracted"));
            if let Some(pass) = opts.password.as_deref().filter(|p| !p.is_empty()) {
                spec = spec.arg("-p").arg(pass);
            }
            Ok(spec)
        })
        .for_categories(&[F::Png]),
        ToolDescriptor::new("stegoveritas", "stegoveritas", Image, |fp, opts| {
            let dir = out(opts, "stegoveritas");
            Ok(CommandSpec::new("stegoveritas")
                .arg("-out")
                .arg(&dir)
                .arg(fp)
                .prepare(DirPrep::Recreate(dir)))
        })
        .for_categories(F::IMAGES),
        ToolDescriptor::new("stegseek", "stegseek", Image, |fp, opts| stegseek(fp, opts, "stegseek_extracted.txt"))
            .for_categories(STEGHIDE_TYPES),
        ToolDescriptor::new("stegsolve", "python3", Image, |fp, opts| {
            let dir = out(opts, "stegsolve_planes");
            Ok(python_script(BITPLANES_PY).arg(&dir).arg(fp).prepare(DirPrep::Ensure(dir)))
        })
        .for_categories(&[F::Png, F::Bmp, F::Jpg]),
        // 音频
        ToolDescriptor::new("steghide-audio", "steghide", Audio, |fp, opts| {
            Ok(steghide_extract(fp, opts, "steghide_audio_extracted.txt"))
        })
        .for_categories(&[F::Wav, F::Au]),
        ToolDescriptor::new("steghide-audio-info", "steghide", Audio, |fp, _| Ok(steghide_info(fp)))
            .for_categories(&[F::Wav, F::Au]),
        ToolDescriptor::new("wavsteg", "stegolsb", Audio, |fp, opts| {
            Ok(CommandSpec::new("stegolsb")
                .args(["wavsteg", "-r", "-i"])
                .arg(fp)
                .arg("-o")
                .arg(out(opts, "wavsteg_extracted.txt"))
                .args(["-n", "2", "-b", "1000"]))
        })
        .for_categories(&[F::Wav]),
        ToolDescriptor::new("sox-spectrogram", "sox", Audio, |fp, opts| {
            Ok(CommandSpec::new("sox")
                .arg(fp)
                .args(["-n", "spectrogram", "-o"])
                .arg(out(opts, "spectrogram.png")))
        })
        .for_categories(&[F::Wav, F::Mp3, F::Flac, F::Ogg]),
        ToolDescriptor::new("stegseek-audio", "stegseek", Audio, |fp, opts| {
            stegseek(fp, opts, "stegseek_audio_extracted.txt")
        })
        .for_categories(&[F::Wav, F::Au]),
        // 文本 / 杂项：适用于所有类别
        ToolDescriptor::new("unicode-steg", "python3", Text, |fp, _| Ok(python_script(ZERO_WIDTH_PY).arg(fp))),
        ToolDescriptor::new("spammimic", "python3", Text, |fp, _| Ok(python_script(SPAMMIMIC_PY).arg(fp))),
    ]
}
