//! 缺失依赖的自动安装、字典解压与下载
use anyhow::{anyhow, bail, Context, Result};
use colored::Colorize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;
use tracing::{debug, info, warn};

use stegsweep_core::deps::{
    detect_distro, local_wordlist_path, wordlist_path, Distro, InstallMethod, SystemPackages, ToolDep, CATALOG,
    COMPRESSED_WORDLISTS, WORDLIST_URL,
};
use stegsweep_core::BinaryProbe;

/// 按清单顺序安装所有缺失的依赖；单个失败不会中断
pub fn install_missing(probe: &dyn BinaryProbe) -> Result<()> {
    let distro = detect_distro(probe);
    println!();
    println!("  {}", "Installing missing dependencies...".cyan().bold());
    println!("  {} {distro}", "Detected distro:".cyan().bold());
    println!();

    for dep in CATALOG {
        if dep.is_available(probe) {
            println!("  {}", format!("✓ {} already installed", dep.name).green());
            continue;
        }
        if dep.install == InstallMethod::Builtin {
            continue;
        }

        print!("  Installing {}...", dep.name);
        let _ = std::io::stdout().flush();
        match install_one(dep, distro, probe) {
            Ok(()) => println!(" {}", "✓ done".green()),
            Err(e) => {
                warn!(tool = dep.name, error = %e, "install failed");
                println!(" {}", format!("✗ failed: {e}").red());
                if let Some(url) = dep.manual_url {
                    println!("    {}", format!("→ Manual install: {url}").yellow());
                }
            }
        }
    }

    ensure_wordlist();
    println!();
    println!("  {}", "✓ Installation complete!".green());
    println!();
    Ok(())
}

fn install_one(dep: &ToolDep, distro: Distro, probe: &dyn BinaryProbe) -> Result<()> {
    match dep.install {
        InstallMethod::Builtin => Ok(()),
        InstallMethod::System(pkgs) => install_system(&pkgs, distro, probe),
        InstallMethod::Pip(pkg) => install_pip(pkg, probe),
        InstallMethod::Gem(pkg) => {
            if !probe.is_available("gem") {
                bail!("gem not found, install ruby first");
            }
            run_quiet("gem", &["install", pkg])
        }
        InstallMethod::Go(module) => {
            if !probe.is_available("go") {
                bail!("go not found");
            }
            install_go(module)
        }
    }
}

fn install_system(pkgs: &SystemPackages, distro: Distro, probe: &dyn BinaryProbe) -> Result<()> {
    let res = match (distro, pkgs.for_distro(distro)) {
        (Distro::Debian, Some(pkg)) => run_quiet("sudo", &["apt-get", "install", "-y", pkg]),
        (Distro::Arch, Some(pkg)) => run_quiet("sudo", &["pacman", "-S", "--noconfirm", pkg]),
        (Distro::Fedora, Some(pkg)) => run_quiet("sudo", &["dnf", "install", "-y", pkg]),
        (Distro::Suse, Some(pkg)) => run_quiet("sudo", &["zypper", "install", "-y", pkg]),
        (Distro::Arch, None) => match pkgs.aur {
            Some(pkg) => return install_aur(pkg, probe),
            None => bail!("no pacman/AUR package available"),
        },
        (Distro::Unknown, _) => bail!("unknown distro, cannot install automatically"),
        (d, None) => bail!("no {d} package available"),
    };
    // 官方仓库失败时尝试 AUR
    match (res, distro, pkgs.aur) {
        (Err(_), Distro::Arch, Some(pkg)) => install_aur(pkg, probe),
        (res, _, _) => res,
    }
}

/// yay / paru 自行处理 sudo，交互输出直接透传
fn install_aur(pkg: &str, probe: &dyn BinaryProbe) -> Result<()> {
    for helper in ["yay", "paru"] {
        if !probe.is_available(helper) {
            continue;
        }
        let status = Command::new(helper).args(["-S", "--noconfirm", "--needed", pkg]).status();
        match status {
            Ok(s) if s.success() => return Ok(()),
            Ok(s) => debug!(helper, %s, "aur helper failed"),
            Err(e) => debug!(helper, error = %e, "aur helper failed to start"),
        }
    }
    Err(anyhow!("no AUR helper (yay/paru) found or install failed for {pkg}"))
}

fn install_pip(pkg: &str, probe: &dyn BinaryProbe) -> Result<()> {
    let pip = ["pip3", "pip"]
        .into_iter()
        .find(|p| probe.is_available(p))
        .ok_or_else(|| anyhow!("pip/pip3 not found, install python3-pip first"))?;
    // 新版 Python 需要 --break-system-packages，旧版 pip 不认识该参数
    run_quiet(pip, &["install", "--break-system-packages", pkg]).or_else(|_| run_quiet(pip, &["install", pkg]))
}

fn install_go(module: &str) -> Result<()> {
    let gopath = std::env::var_os("GOPATH")
        .map(PathBuf::from)
        .or_else(|| directories::BaseDirs::new().map(|d| d.home_dir().join("go")))
        .ok_or_else(|| anyhow!("cannot determine GOPATH"))?;
    let status = Command::new("go")
        .args(["install", module])
        .env("GOBIN", gopath.join("bin"))
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()?;
    if !status.success() {
        bail!("go install exited with {status}");
    }
    Ok(())
}

fn run_quiet(program: &str, args: &[&str]) -> Result<()> {
    debug!(program, ?args, "running installer");
    let status = Command::new(program).args(args).stdout(Stdio::null()).stderr(Stdio::null()).status()?;
    if !status.success() {
        bail!("{program} exited with {status}");
    }
    Ok(())
}

/// 字典下载的整体超时
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(600);

/// 找不到字典时先解压系统自带的压缩版本，再下载到 ~/.stegsweep/wordlists
fn ensure_wordlist() {
    if let Some(path) = wordlist_path() {
        println!("  {}", format!("✓ rockyou.txt found at {}", path.display()).green());
        return;
    }
    for gz in COMPRESSED_WORDLISTS.iter().map(Path::new).filter(|p| p.is_file()) {
        println!("  {}", format!("Found compressed rockyou at {}, extracting...", gz.display()).yellow());
        let gz_arg = gz.to_string_lossy().into_owned();
        match run_quiet("sudo", &["gzip", "-dk", gz_arg.as_str()]) {
            Ok(()) => {
                println!("  {}", format!("✓ Extracted to {}", gz.with_extension("").display()).green());
                return;
            }
            Err(e) => println!("  {}", format!("⚠ Extraction failed: {e}").yellow()),
        }
    }

    let Some(dest) = local_wordlist_path() else {
        println!("  {}", "⚠ Cannot determine home directory; stegseek will be skipped".yellow());
        return;
    };
    println!("  {}", "Downloading rockyou.txt (~134MB)...".yellow());
    match http_client().and_then(|client| download(&client, WORDLIST_URL, &dest)) {
        Ok(bytes) => {
            info!(path = %dest.display(), bytes, "wordlist downloaded");
            println!("  {}", format!("✓ Downloaded rockyou.txt to {}", dest.display()).green());
        }
        Err(e) => {
            warn!(error = %e, "wordlist download failed");
            println!("  {}", format!("⚠ Cannot download rockyou.txt: {e:#}").yellow());
            println!("  {}", "⚠ stegseek will be skipped".yellow());
        }
    }
}

fn http_client() -> Result<reqwest::blocking::Client> {
    reqwest::blocking::Client::builder()
        .user_agent(concat!("stegsweep/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(Duration::from_secs(30))
        .timeout(DOWNLOAD_TIMEOUT)
        .build()
        .context("build http client")
}

/// 下载 `url` 到 `dest`，返回字节数；先写 `.part` 文件，成功后改名，失败时删除残留
fn download(client: &reqwest::blocking::Client, url: &str, dest: &Path) -> Result<u64> {
    if let Some(dir) = dest.parent() {
        std::fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    }
    let partial = dest.with_extension("part");
    let res = fetch_into(client, url, &partial)
        .and_then(|n| std::fs::rename(&partial, dest).map(|_| n).context("move downloaded file into place"));
    if res.is_err() {
        let _ = std::fs::remove_file(&partial);
    }
    res
}

fn fetch_into(client: &reqwest::blocking::Client, url: &str, path: &Path) -> Result<u64> {
    debug!(url, path = %path.display(), "downloading");
    let mut resp = client.get(url).send().with_context(|| format!("GET {url}"))?.error_for_status()?;
    let mut file = std::fs::File::create(path).with_context(|| format!("create {}", path.display()))?;
    let n = std::io::copy(&mut resp, &mut file).context("read response body")?;
    file.flush()?;
    Ok(n)
}
