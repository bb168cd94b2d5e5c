//! 终端彩色报告
use colored::Colorize;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use stegsweep_core::deps::{DepStatus, Distro};
use stegsweep_core::{
    by_category, excerpt, FileCategory, FileRecord, Outcome, ScanResult, Summary, ToolResult, MAX_OUTPUT_LINES,
};

/// 方框内部宽度（两侧边框之间）
const BOX_WIDTH: usize = 62;

fn box_top() {
    println!("  {}", format!("╔{}╗", "═".repeat(BOX_WIDTH)).cyan().bold());
}

fn box_sep() {
    println!("  {}", format!("╠{}╣", "═".repeat(BOX_WIDTH)).cyan().bold());
}

fn box_bottom() {
    println!("  {}", format!("╚{}╝", "═".repeat(BOX_WIDTH)).cyan().bold());
}

/// 一行方框内容；`text` 按字符数补齐，样式由 `paint` 决定
fn box_line(text: &str, paint: impl Fn(&str) -> colored::ColoredString) {
    let pad = BOX_WIDTH.saturating_sub(text.chars().count());
    println!("  {}{}{}{}", "║".cyan().bold(), paint(text), " ".repeat(pad), "║".cyan().bold());
}

const BANNER: &str = r"
   ___ _              ___
  / __| |_ ___ __ _  / __|_ __ _____ ___ _ __
  \__ \  _/ -_) _` | \__ \ V  V / -_) -_) '_ \
  |___/\__\___\__, | |___/\_/\_/\___\___| .__/
              |___/                     |_|";

/// 启动横幅（仅彩色模式）
pub fn banner() {
    println!("{}", BANNER.cyan().bold());
    println!("  {}", format!("multi-tool steganography scanner v{}", env!("CARGO_PKG_VERSION")).bright_black());
    println!();
}

pub fn file_box(file: &FileRecord) {
    box_top();
    box_line("  TARGET FILE", |s| s.yellow().bold());
    box_sep();
    let path = file.path.display().to_string();
    let fields = [
        ("File:", truncate_left(&file.name, 47)),
        ("Path:", truncate_left(&path, 47)),
        ("MIME:", file.mime_type.clone()),
        ("Size:", format_size(file.size)),
        ("Category:", file.category.as_str().to_uppercase()),
    ];
    for (label, value) in fields {
        box_line(&format!("  {label:<12}{value}"), |s| s.normal());
    }
    box_bottom();
    println!();

    if file.category == FileCategory::Unknown {
        println!("  {}", "⚠  Unknown file type. Running general and text tools only.".yellow().bold());
        println!();
    }
}

pub fn deps_notice(missing: &[&str]) {
    if missing.is_empty() {
        return;
    }
    println!(
        "  {}",
        format!("⚠  {} tools not installed (will be skipped): {}", missing.len(), missing.join(", ")).yellow()
    );
    println!("  {}", "Run 'stegsweep install' to install all missing tools.".yellow());
    println!();
}

pub fn scan_start(count: usize) {
    println!("  {}", format!("Starting scan with {count} tools...").yellow().bold());
    println!();
}

/// 单行进度（覆盖刷新）
pub fn progress(done: usize, total: usize, tool: &str) {
    let line = format!("[{done}/{total}] {tool} finished");
    print!("\r  {:<60}", line.cyan());
    let _ = std::io::stdout().flush();
}

pub fn clear_progress() {
    print!("\r{}\r", " ".repeat(80));
    let _ = std::io::stdout().flush();
}

pub fn results(scan: &ScanResult, verbose: bool) {
    let max = if verbose { 0 } else { MAX_OUTPUT_LINES };
    for (category, results) in by_category(scan) {
        println!();
        let title = category.title().to_uppercase();
        let rule = "─".repeat(55usize.saturating_sub(title.chars().count()));
        println!("  {}", format!("┌─── {title} {rule}").magenta().bold());
        for r in results {
            tool_result(r, max);
        }
    }
}

fn tool_result(r: &ToolResult, max_lines: usize) {
    let took = format!("({})", format_elapsed(r.duration));
    match &r.outcome {
        Outcome::Skipped(reason) => {
            println!("  {}", format!("│ ⊘ {:<20}skipped: {reason}", r.tool).bright_black());
        }
        Outcome::Failed(err) => {
            println!(
                "  {} {} {}",
                format!("│ ✗ {:<20}", r.tool).red(),
                took.bright_black(),
                format!("error: {err}").red()
            );
        }
        Outcome::Output(out) if out.is_empty() => {
            println!("  {} {}", format!("│ ○ {:<20}", r.tool).bright_black(), format!("{took} no output").bright_black());
        }
        Outcome::Output(out) => {
            println!("  {} {}", format!("│ ✓ {:<20}", r.tool).green().bold(), took.cyan());
            let ex = excerpt(out, max_lines);
            for line in ex.lines {
                println!("  │   {line}");
            }
            if ex.hidden > 0 {
                println!("  {}", format!("│   ... and {} more lines", ex.hidden).yellow());
            }
        }
    }
}

pub fn summary(sum: &Summary) {
    println!();
    box_top();
    box_line("  SCAN SUMMARY", |s| s.cyan().bold());
    box_sep();
    let stat = |label: &str, value: String, paint: fn(&str) -> colored::ColoredString| {
        box_line(&format!("  {label:<18}{value}"), paint);
    };
    stat("Total tools:", sum.total.to_string(), |s| s.cyan().bold());
    stat("Successful:", sum.succeeded.to_string(), |s| s.green().bold());
    stat("With output:", sum.with_output.to_string(), |s| s.yellow().bold());
    stat("Failed:", sum.failed.to_string(), |s| s.red().bold());
    stat("Skipped:", sum.skipped.to_string(), |s| s.yellow().bold());
    if sum.not_run > 0 {
        stat("Not run:", sum.not_run.to_string(), |s| s.red().bold());
    }
    stat("Duration:", format_elapsed(sum.duration), |s| s.cyan().bold());
    box_bottom();
    println!();
}

pub fn output_dir(dir: &Path, artifacts: usize) {
    println!("  {}", format!("Extracted files saved to: {}", dir.display()).cyan());
    if artifacts > 0 {
        println!("  {}", format!("{artifacts} file(s) extracted").cyan());
    }
    println!();
}

pub fn deps_table(statuses: &[DepStatus], distro: Distro) {
    println!();
    println!("  {} {}", "Detected system:".cyan().bold(), distro);
    println!();
    println!("  {:<20} {:<12} {}", "TOOL", "STATUS", "DESCRIPTION");
    println!("  {}", "─".repeat(65));
    for s in statuses {
        let status = if s.available { format!("{:<12}", "✓ ready").green() } else { format!("{:<12}", "✗ missing").red() };
        println!("  {:<20} {} {}", s.dep.name, status, s.dep.description);
    }
    println!();
    println!("  {}", "─".repeat(65));

    let installed = statuses.iter().filter(|s| s.available).count();
    if installed == statuses.len() {
        println!("  {}", format!("✓ All {installed} tools are installed and ready!").green());
    } else {
        println!(
            "  {}",
            format!("⚠ {installed}/{} tools installed. Missing tools will be skipped during scan.", statuses.len())
                .yellow()
        );
        println!("  {}", "Run 'stegsweep install' to install missing tools.".yellow());
    }
    println!();
}

/// 毫秒精度的耗时
fn format_elapsed(d: Duration) -> String {
    let ms = d.as_millis();
    if ms >= 1000 {
        format!("{:.3}s", d.as_secs_f64())
    } else {
        format!("{ms}ms")
    }
}

/// 超长时保留尾部并加前缀 "..."
fn truncate_left(s: &str, max: usize) -> String {
    let n = s.chars().count();
    if n <= max {
        return s.to_string();
    }
    let tail: String = s.chars().skip(n - max + 3).collect();
    format!("...{tail}")
}

fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;
    match bytes {
        b if b >= GB => format!("{:.2} GB", b as f64 / GB as f64),
        b if b >= MB => format!("{:.2} MB", b as f64 / MB as f64),
        b if b >= KB => format!("{:.2} KB", b as f64 / KB as f64),
        b => format!("{b} B"),
    }
}
