use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use stegsweep_core::{
    applicable, artifacts, deps, detect, load_config, load_default_config, run_all_with_progress, write_json, Registry,
    RunOptions, ScanReport, SearchPath, Summary, ToolDescriptor,
};

mod install;
mod render;

/// 命令行入口（基于 clap）
#[derive(Parser, Debug)]
#[command(name = "stegsweep", version, about = "Run every applicable steganography tool against a file")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 扫描单个文件
    Scan(ScanArgs),
    /// 查看外部工具的安装状态
    Deps,
    /// 安装缺失的外部工具
    Install,
}

#[derive(Args, Debug)]
struct ScanArgs {
    /// 目标文件
    file: PathBuf,

    /// steghide / openstego 提取口令
    #[arg(short, long)]
    password: Option<String>,

    /// 跳过的工具（逗号分隔）
    #[arg(long, value_delimiter = ',')]
    skip: Vec<String>,

    /// 只运行这些工具（逗号分隔）
    #[arg(long, value_delimiter = ',')]
    only: Vec<String>,

    /// 提取产物的输出目录（默认 <tmp>/stegsweep-output）
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// 单个工具超时（秒），0 表示默认 60 秒
    #[arg(short, long)]
    timeout: Option<u64>,

    /// 显示完整输出与调试日志
    #[arg(short, long)]
    verbose: bool,

    /// 以 JSON 输出报告
    #[arg(long)]
    json: bool,

    /// 配置文件路径（TOML）
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan(args) => {
            // 日志级别取合并配置文件之后的 verbose
            let opts = resolve_options(&args)?;
            init_tracing(opts.verbose);
            scan(args, opts)
        }
        Commands::Deps => {
            init_tracing(false);
            let statuses = deps::check_all(&SearchPath);
            render::deps_table(&statuses, deps::detect_distro(&SearchPath));
            Ok(())
        }
        Commands::Install => {
            init_tracing(false);
            install::install_missing(&SearchPath)
        }
    }
}

fn scan(args: ScanArgs, opts: RunOptions) -> Result<()> {
    let file = detect(&args.file).with_context(|| format!("cannot classify {}", args.file.display()))?;
    info!(file = %file.path.display(), category = %file.category, "starting scan");

    let registry = Registry::builtin(&opts).context("build tool registry")?;
    let tools: Vec<&ToolDescriptor> = applicable(registry.tools(), &file, &opts);

    if args.json {
        let scan = run_all_with_progress(&tools, &file, &opts, &SearchPath, |_, _| {});
        let names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
        let stdout = std::io::stdout();
        let mut out = BufWriter::new(stdout.lock());
        write_json(&ScanReport::new(&scan, &names), &mut out).context("write json report")?;
        out.flush().ok();
        return Ok(());
    }

    render::banner();
    render::file_box(&file);
    render::deps_notice(&deps::missing(&SearchPath));
    render::scan_start(tools.len());

    let total = tools.len();
    let mut done = 0usize;
    let scan = run_all_with_progress(&tools, &file, &opts, &SearchPath, |_, r| {
        done += 1;
        render::progress(done, total, &r.tool);
    });
    render::clear_progress();

    render::results(&scan, opts.verbose);
    let summary = Summary::from_scan(&scan);
    render::summary(&summary);
    render::output_dir(&opts.output_dir, artifacts::list(&opts.output_dir).len());

    info!(succeeded = summary.succeeded, failed = summary.failed, skipped = summary.skipped, "scan finished");
    Ok(())
}

/// 配置文件打底，命令行参数覆盖（列表整体替换）
fn resolve_options(args: &ScanArgs) -> Result<RunOptions> {
    let file_cfg = match &args.config {
        Some(path) => load_config(path)?,
        None => load_default_config()?,
    };
    let mut opts = file_cfg.into_options();

    if args.password.is_some() {
        opts.password = args.password.clone();
    }
    if !args.skip.is_empty() {
        opts.skip = args.skip.clone();
    }
    if !args.only.is_empty() {
        opts.only = args.only.clone();
    }
    if let Some(dir) = &args.output_dir {
        opts.output_dir = dir.clone();
    }
    if let Some(secs) = args.timeout {
        opts.timeout = Some(Duration::from_secs(secs));
    }
    opts.verbose |= args.verbose;
    Ok(opts)
}

/// RUST_LOG 未设置时的默认级别
fn default_level(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "info"
    }
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::{EnvFilter, FmtSubscriber};
    // RUST_LOG 优先
    let default = default_level(verbose);
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let subscriber = FmtSubscriber::builder().with_env_filter(env_filter).with_writer(std::io::stderr).finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config() {
        let dir = tempfile::TempDir::new().unwrap();
        let cfg = dir.path().join("config.toml");
        std::fs::write(&cfg, "password = \"fromfile\"\nskip = [\"binwalk\"]\ntimeout_secs = 5\n").unwrap();

        let cli = Cli::parse_from([
            "stegsweep",
            "scan",
            "x.png",
            "--config",
            cfg.to_str().unwrap(),
            "--skip",
            "foremost,strings",
            "-t",
            "9",
        ]);
        let Commands::Scan(args) = cli.command else { panic!("expected scan") };
        let opts = resolve_options(&args).unwrap();
        assert_eq!(opts.password.as_deref(), Some("fromfile"));
        assert_eq!(opts.skip, vec!["foremost", "strings"]);
        assert_eq!(opts.effective_timeout(), Duration::from_secs(9));
    }

    #[test]
    fn config_verbose_raises_log_level() {
        let dir = tempfile::TempDir::new().unwrap();
        let cfg = dir.path().join("config.toml");
        std::fs::write(&cfg, "verbose = true\n").unwrap();

        let cli = Cli::parse_from(["stegsweep", "scan", "x.png", "--config", cfg.to_str().unwrap()]);
        let Commands::Scan(args) = cli.command else { panic!("expected scan") };
        assert!(!args.verbose);
        let opts = resolve_options(&args).unwrap();
        assert!(opts.verbose);
        assert_eq!(default_level(opts.verbose), "debug");
    }

    #[test]
    fn quiet_by_default() {
        let cli = Cli::parse_from(["stegsweep", "scan", "x.png", "--config", "/dev/null"]);
        let Commands::Scan(args) = cli.command else { panic!("expected scan") };
        assert_eq!(default_level(resolve_options(&args).unwrap().verbose), "info");
    }

    #[test]
    fn missing_explicit_config_fails() {
        let cli = Cli::parse_from(["stegsweep", "scan", "x.png", "--config", "/nonexistent/stegsweep.toml"]);
        let Commands::Scan(args) = cli.command else { panic!("expected scan") };
        assert!(resolve_options(&args).is_err());
    }
}
