//! 文件分类（魔数优先，扩展名兜底）
use serde::Serialize;
use std::fmt;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use crate::error::ClassifyError;

/// 读取文件头的最大字节数
pub const HEADER_LEN: usize = 512;
/// 魔数判定至少需要的字节数；不足则直接走扩展名
const MIN_MAGIC_LEN: usize = 8;

/// 规范化的文件类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
    Png,
    Jpg,
    Bmp,
    Gif,
    Tiff,
    Webp,
    Wav,
    Mp3,
    Flac,
    Ogg,
    Au,
    Unknown,
}

impl FileCategory {
    pub const IMAGES: &'static [FileCategory] = &[
        FileCategory::Png,
        FileCategory::Jpg,
        FileCategory::Bmp,
        FileCategory::Gif,
        FileCategory::Tiff,
        FileCategory::Webp,
    ];

    pub const AUDIO: &'static [FileCategory] = &[
        FileCategory::Wav,
        FileCategory::Mp3,
        FileCategory::Flac,
        FileCategory::Ogg,
        FileCategory::Au,
    ];

    pub fn is_image(self) -> bool {
        Self::IMAGES.contains(&self)
    }

    pub fn is_audio(self) -> bool {
        Self::AUDIO.contains(&self)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FileCategory::Png => "png",
            FileCategory::Jpg => "jpg",
            FileCategory::Bmp => "bmp",
            FileCategory::Gif => "gif",
            FileCategory::Tiff => "tiff",
            FileCategory::Webp => "webp",
            FileCategory::Wav => "wav",
            FileCategory::Mp3 => "mp3",
            FileCategory::Flac => "flac",
            FileCategory::Ogg => "ogg",
            FileCategory::Au => "au",
            FileCategory::Unknown => "unknown",
        }
    }

    /// 类别对应的 MIME；未知类别的 MIME 由文件头内容决定，见 [`detect`]
    pub fn mime_type(self) -> &'static str {
        match self {
            FileCategory::Png => "image/png",
            FileCategory::Jpg => "image/jpeg",
            FileCategory::Bmp => "image/bmp",
            FileCategory::Gif => "image/gif",
            FileCategory::Tiff => "image/tiff",
            FileCategory::Webp => "image/webp",
            FileCategory::Wav => "audio/wave",
            FileCategory::Mp3 => "audio/mpeg",
            FileCategory::Flac => "audio/flac",
            FileCategory::Ogg => "application/ogg",
            FileCategory::Au => "audio/basic",
            FileCategory::Unknown => "application/octet-stream",
        }
    }

    /// 按扩展名（小写，可带前导点）查找类别
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.trim_start_matches('.');
        let cat = match ext {
            "png" => FileCategory::Png,
            "jpg" | "jpeg" | "jfif" | "jpe" => FileCategory::Jpg,
            "bmp" => FileCategory::Bmp,
            "gif" => FileCategory::Gif,
            "tiff" | "tif" => FileCategory::Tiff,
            "webp" => FileCategory::Webp,
            "wav" => FileCategory::Wav,
            "mp3" => FileCategory::Mp3,
            "flac" => FileCategory::Flac,
            "ogg" => FileCategory::Ogg,
            "au" => FileCategory::Au,
            _ => return None,
        };
        Some(cat)
    }
}

impl fmt::Display for FileCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 一次扫描的目标文件信息（创建后只读）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRecord {
    /// 绝对路径
    pub path: PathBuf,
    /// 展示用文件名
    pub name: String,
    pub size: u64,
    pub category: FileCategory,
    pub mime_type: String,
    /// 小写扩展名（含前导点）；无扩展名时为空串
    pub extension: String,
}

impl FileRecord {
    pub fn is_image(&self) -> bool {
        self.category.is_image()
    }

    pub fn is_audio(&self) -> bool {
        self.category.is_audio()
    }
}

/// 魔数签名：按表中顺序判定，先命中者胜出
struct Signature {
    category: FileCategory,
    matches: fn(&[u8]) -> bool,
}

const SIGNATURES: &[Signature] = &[
    Signature { category: FileCategory::Png, matches: is_png },
    Signature { category: FileCategory::Jpg, matches: is_jpeg },
    Signature { category: FileCategory::Bmp, matches: is_bmp },
    Signature { category: FileCategory::Gif, matches: is_gif },
    Signature { category: FileCategory::Tiff, matches: is_tiff },
    Signature { category: FileCategory::Wav, matches: is_wave },
    Signature { category: FileCategory::Webp, matches: is_webp },
    Signature { category: FileCategory::Flac, matches: is_flac },
    Signature { category: FileCategory::Ogg, matches: is_ogg },
    Signature { category: FileCategory::Mp3, matches: is_mp3 },
    Signature { category: FileCategory::Au, matches: is_au },
];

fn is_png(h: &[u8]) -> bool {
    h.starts_with(b"\x89PNG")
}

fn is_jpeg(h: &[u8]) -> bool {
    h.starts_with(b"\xFF\xD8\xFF")
}

fn is_bmp(h: &[u8]) -> bool {
    h.starts_with(b"BM")
}

fn is_gif(h: &[u8]) -> bool {
    h.starts_with(b"GIF8")
}

fn is_tiff(h: &[u8]) -> bool {
    h.starts_with(b"II\x2A\x00") || h.starts_with(b"MM\x00\x2A")
}

fn riff_form(h: &[u8], form: &[u8; 4]) -> bool {
    h.len() >= 12 && h.starts_with(b"RIFF") && &h[8..12] == form
}

fn is_wave(h: &[u8]) -> bool {
    riff_form(h, b"WAVE")
}

fn is_webp(h: &[u8]) -> bool {
    riff_form(h, b"WEBP")
}

fn is_flac(h: &[u8]) -> bool {
    h.starts_with(b"fLaC")
}

fn is_ogg(h: &[u8]) -> bool {
    h.starts_with(b"OggS")
}

fn is_mp3(h: &[u8]) -> bool {
    // MPEG 帧同步（11 个置位）或 ID3 标签
    (h.len() >= 2 && h[0] == 0xFF && (h[1] & 0xE0) == 0xE0) || h.starts_with(b"ID3")
}

fn is_au(h: &[u8]) -> bool {
    h.starts_with(b".snd")
}

/// 根据文件头与扩展名判定类别（纯函数）
pub fn classify(header: &[u8], extension: &str) -> FileCategory {
    if header.len() >= MIN_MAGIC_LEN {
        if let Some(sig) = SIGNATURES.iter().find(|s| (s.matches)(header)) {
            return sig.category;
        }
    }
    FileCategory::from_extension(&extension.to_ascii_lowercase()).unwrap_or(FileCategory::Unknown)
}

/// 检测文件并生成 [`FileRecord`]
/// - 路径不存在 / 是目录 / 无法打开 → 访问错误
/// - 读取文件头失败（含空文件）→ 读取错误
pub fn detect(path: impl AsRef<Path>) -> Result<FileRecord, ClassifyError> {
    let path = path.as_ref();
    let abs = absolutize(path).map_err(|source| ClassifyError::Access { path: path.to_path_buf(), source })?;

    let meta = fs::metadata(&abs).map_err(|source| ClassifyError::Access { path: abs.clone(), source })?;
    if meta.is_dir() {
        return Err(ClassifyError::IsDirectory(abs));
    }

    let file = File::open(&abs).map_err(|source| ClassifyError::Access { path: abs.clone(), source })?;
    let mut header = Vec::with_capacity(HEADER_LEN);
    file.take(HEADER_LEN as u64)
        .read_to_end(&mut header)
        .map_err(|source| ClassifyError::Read { path: abs.clone(), source })?;
    if header.is_empty() {
        return Err(ClassifyError::Read {
            path: abs,
            source: io::Error::new(io::ErrorKind::UnexpectedEof, "file is empty"),
        });
    }

    let extension = abs
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
        .unwrap_or_default();
    let category = classify(&header, &extension);
    let mime_type = match category {
        FileCategory::Unknown if is_likely_text(&header) => "text/plain; charset=utf-8".to_string(),
        other => other.mime_type().to_string(),
    };
    let name = abs
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(FileRecord { path: abs, name, size: meta.len(), category, mime_type, extension })
}

fn absolutize(path: &Path) -> io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

/// 非文本控制字符占比低于 10% 即视为文本
fn is_likely_text(bytes: &[u8]) -> bool {
    if bytes.is_empty() {
        return false;
    }
    let non_text = bytes
        .iter()
        .filter(|&&b| !(b == 9 || b == 10 || b == 13 || (32..=126).contains(&b) || b >= 128))
        .count();
    (non_text as f64 / bytes.len() as f64) < 0.1
}
