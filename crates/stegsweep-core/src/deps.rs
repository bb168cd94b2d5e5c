//! 外部依赖清单、可用性检查与字典定位
use directories::BaseDirs;
use std::fmt;
use std::path::PathBuf;

use crate::probe::BinaryProbe;

/// 各发行版族的系统包名；None 表示该包管理器没有对应包
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SystemPackages {
    pub apt: Option<&'static str>,
    pub pacman: Option<&'static str>,
    /// pacman 官方仓库没有时的 AUR 包名
    pub aur: Option<&'static str>,
    pub dnf: Option<&'static str>,
    pub zypper: Option<&'static str>,
}

impl SystemPackages {
    const fn all(name: &'static str) -> Self {
        Self { apt: Some(name), pacman: Some(name), aur: None, dnf: Some(name), zypper: Some(name) }
    }

    /// 该发行版官方仓库中的包名（AUR 单独处理）
    pub fn for_distro(&self, distro: Distro) -> Option<&'static str> {
        match distro {
            Distro::Debian => self.apt,
            Distro::Arch => self.pacman,
            Distro::Fedora => self.dnf,
            Distro::Suse => self.zypper,
            Distro::Unknown => None,
        }
    }
}

/// 按包管理器划分的发行版族
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Distro {
    Debian,
    Arch,
    Fedora,
    Suse,
    Unknown,
}

impl Distro {
    pub fn as_str(self) -> &'static str {
        match self {
            Distro::Debian => "debian",
            Distro::Arch => "arch",
            Distro::Fedora => "fedora",
            Distro::Suse => "suse",
            Distro::Unknown => "unknown",
        }
    }

    /// 根据 /etc/os-release 内容推断
    pub fn from_os_release(content: &str) -> Self {
        let content = content.to_lowercase();
        let has = |keys: &[&str]| keys.iter().any(|k| content.contains(k));
        if has(&["ubuntu", "debian", "kali", "mint"]) {
            Distro::Debian
        } else if has(&["arch", "manjaro", "endeavour"]) {
            Distro::Arch
        } else if has(&["fedora", "rhel", "centos", "rocky"]) {
            Distro::Fedora
        } else if has(&["suse"]) {
            Distro::Suse
        } else {
            Distro::Unknown
        }
    }
}

impl fmt::Display for Distro {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 先看可用的包管理器，再退回 /etc/os-release；非 Linux 为 Unknown
pub fn detect_distro(probe: &dyn BinaryProbe) -> Distro {
    if !cfg!(target_os = "linux") {
        return Distro::Unknown;
    }
    let by_manager = [
        ("apt-get", Distro::Debian),
        ("pacman", Distro::Arch),
        ("dnf", Distro::Fedora),
        ("zypper", Distro::Suse),
    ];
    if let Some((_, d)) = by_manager.iter().find(|(bin, _)| probe.is_available(bin)) {
        return *d;
    }
    std::fs::read_to_string("/etc/os-release").map(|c| Distro::from_os_release(&c)).unwrap_or(Distro::Unknown)
}

/// 安装方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallMethod {
    /// 系统自带，不尝试安装
    Builtin,
    System(SystemPackages),
    Pip(&'static str),
    Gem(&'static str),
    /// `go install` 的模块路径
    Go(&'static str),
}

/// 单个外部依赖
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolDep {
    pub name: &'static str,
    pub binary: &'static str,
    pub alt_binaries: &'static [&'static str],
    pub install: InstallMethod,
    pub manual_url: Option<&'static str>,
    pub description: &'static str,
}

impl ToolDep {
    /// 主二进制或任一备选存在即视为可用
    pub fn is_available(&self, probe: &dyn BinaryProbe) -> bool {
        probe.is_available(self.binary) || self.alt_binaries.iter().any(|b| probe.is_available(b))
    }
}

const fn dep(name: &'static str, binary: &'static str, install: InstallMethod, description: &'static str) -> ToolDep {
    ToolDep { name, binary, alt_binaries: &[], install, manual_url: None, description }
}

/// 全部外部依赖（顺序即展示顺序）
pub const CATALOG: &[ToolDep] = &[
    dep("file", "file", InstallMethod::Builtin, "File type identification"),
    dep("strings", "strings", InstallMethod::Builtin, "Extract printable strings"),
    dep(
        "xxd",
        "xxd",
        InstallMethod::System(SystemPackages {
            apt: Some("xxd"),
            pacman: Some("xxd"),
            aur: None,
            dnf: Some("vim-common"),
            zypper: Some("vim-data-common"),
        }),
        "Hex dump utility",
    ),
    dep(
        "exiftool",
        "exiftool",
        InstallMethod::System(SystemPackages {
            apt: Some("libimage-exiftool-perl"),
            pacman: Some("perl-image-exiftool"),
            aur: None,
            dnf: Some("perl-Image-ExifTool"),
            zypper: Some("exiftool"),
        }),
        "Metadata extraction",
    ),
    dep("binwalk", "binwalk", InstallMethod::System(SystemPackages::all("binwalk")), "Embedded file detection"),
    dep("foremost", "foremost", InstallMethod::System(SystemPackages::all("foremost")), "File carving tool"),
    dep(
        "steghide",
        "steghide",
        InstallMethod::System(SystemPackages::all("steghide")),
        "Steganography hide/extract (JPG/BMP/WAV/AU)",
    ),
    dep("zsteg", "zsteg", InstallMethod::Gem("zsteg"), "LSB steganography (PNG/BMP)"),
    dep("pngcheck", "pngcheck", InstallMethod::System(SystemPackages::all("pngcheck")), "PNG integrity check"),
    dep("stegoveritas", "stegoveritas", InstallMethod::Pip("stegoveritas"), "Advanced image steganalysis"),
    ToolDep {
        name: "stegseek",
        binary: "stegseek",
        alt_binaries: &[],
        install: InstallMethod::System(SystemPackages {
            apt: Some("stegseek"),
            pacman: None,
            aur: Some("stegseek"),
            dnf: None,
            zypper: None,
        }),
        manual_url: Some("https://github.com/RickdeJager/stegseek/releases"),
        description: "Fast steghide brute-force cracker",
    },
    ToolDep {
        name: "openstego",
        binary: "openstego",
        alt_binaries: &[],
        install: InstallMethod::System(SystemPackages {
            apt: Some("openstego"),
            pacman: None,
            aur: Some("openstego"),
            dnf: None,
            zypper: None,
        }),
        manual_url: Some("https://github.com/syvaidya/OpenStego/releases"),
        description: "OpenStego extraction (PNG)",
    },
    dep("jsteg", "jsteg", InstallMethod::Go("lukechampine.com/jsteg@latest"), "JPEG steganography (no password)"),
    dep(
        "GraphicsMagick",
        "gm",
        InstallMethod::System(SystemPackages {
            apt: Some("graphicsmagick"),
            pacman: Some("graphicsmagick"),
            aur: None,
            dnf: Some("GraphicsMagick"),
            zypper: Some("GraphicsMagick"),
        }),
        "Image identification and analysis",
    ),
    dep("sox", "sox", InstallMethod::System(SystemPackages::all("sox")), "Audio spectrogram generation"),
    dep("stegolsb", "stegolsb", InstallMethod::Pip("stego-lsb"), "WAV LSB steganography"),
    dep("stegsolve", "python3", InstallMethod::Pip("Pillow"), "Stegsolve-like bitplane extraction"),
];

/// 单个依赖的检查结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepStatus {
    pub dep: &'static ToolDep,
    pub available: bool,
}

/// 按清单顺序检查全部依赖
pub fn check_all(probe: &dyn BinaryProbe) -> Vec<DepStatus> {
    CATALOG.iter().map(|dep| DepStatus { dep, available: dep.is_available(probe) }).collect()
}

/// 当前缺失的依赖名（清单顺序）
pub fn missing(probe: &dyn BinaryProbe) -> Vec<&'static str> {
    check_all(probe).into_iter().filter(|s| !s.available).map(|s| s.dep.name).collect()
}

/// 系统级 rockyou 字典位置（按优先级）
pub const SYSTEM_WORDLISTS: &[&str] = &[
    "/usr/share/wordlists/rockyou.txt",
    "/usr/share/seclists/Passwords/Leaked-Databases/rockyou.txt",
];

/// 压缩版字典位置（安装步骤会尝试解压）
pub const COMPRESSED_WORDLISTS: &[&str] = &["/usr/share/wordlists/rockyou.txt.gz"];

/// 本地字典目录：~/.stegsweep/wordlists
pub fn local_wordlist_dir() -> Option<PathBuf> {
    BaseDirs::new().map(|d| d.home_dir().join(".stegsweep").join("wordlists"))
}

/// 本地字典文件名
pub const WORDLIST_NAME: &str = "rockyou.txt";

/// 下载地址（`install` 在系统中找不到字典时使用）
pub const WORDLIST_URL: &str = "https://github.com/brannondorsey/naive-hashcat/releases/download/data/rockyou.txt";

/// 本地字典文件：~/.stegsweep/wordlists/rockyou.txt
pub fn local_wordlist_path() -> Option<PathBuf> {
    local_wordlist_dir().map(|d| d.join(WORDLIST_NAME))
}

/// 查找可用的 rockyou 字典；都不存在时返回 None
pub fn wordlist_path() -> Option<PathBuf> {
    first_existing(SYSTEM_WORDLISTS.iter().map(PathBuf::from).chain(local_wordlist_path()))
}

/// 候选中第一个存在的普通文件
pub fn first_existing(candidates: impl IntoIterator<Item = PathBuf>) -> Option<PathBuf> {
    candidates.into_iter().find(|p| p.is_file())
}
