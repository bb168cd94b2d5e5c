#![cfg(unix)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use stegsweep_core::{
    applicable, detect, execute, run_all, CommandSpec, Exit, FileCategory, NotApplicable, Outcome, Registry, RunOptions,
    SearchPath, ToolCategory, ToolDescriptor, ToolError,
};
use tempfile::TempDir;

fn sh(name: &str, script: &'static str) -> ToolDescriptor {
    ToolDescriptor::new(name, "sh", ToolCategory::General, move |_, _| Ok(CommandSpec::new("sh").arg("-c").arg(script)))
}

fn sample_png(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("cover.txt");
    let mut bytes = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
    bytes.extend_from_slice(&[0u8; 24]);
    std::fs::write(&path, bytes).unwrap();
    path
}

fn options(dir: &TempDir, timeout: Duration) -> RunOptions {
    RunOptions { output_dir: dir.path().join("out"), timeout: Some(timeout), ..RunOptions::default() }
}

fn outcome_of(tool: ToolDescriptor, dir: &TempDir, timeout: Duration) -> Outcome {
    let file = detect(sample_png(dir)).unwrap();
    let scan = run_all(&[&tool], &file, &options(dir, timeout), &SearchPath);
    scan.results.into_iter().next().flatten().unwrap().outcome
}

#[test]
fn merged_output_is_trimmed() {
    let dir = TempDir::new().unwrap();
    let out = outcome_of(sh("echo", "echo '  hello  '; echo oops 1>&2"), &dir, Duration::from_secs(10));
    let text = match out {
        Outcome::Output(text) => text,
        other => panic!("expected success, got {other:?}"),
    };
    assert!(text.starts_with("hello") || text.starts_with("oops"));
    assert!(text.contains("hello") && text.contains("oops"));
    assert_eq!(text, text.trim());
}

#[test]
fn nonzero_exit_with_output_is_success() {
    let dir = TempDir::new().unwrap();
    let out = outcome_of(sh("finder", "echo 'found secret'; exit 1"), &dir, Duration::from_secs(10));
    assert_eq!(out, Outcome::Output("found secret".into()));
}

#[test]
fn nonzero_exit_without_output_fails() {
    let dir = TempDir::new().unwrap();
    let out = outcome_of(sh("quiet", "exit 3"), &dir, Duration::from_secs(10));
    match out {
        Outcome::Failed(ToolError::Process(msg)) => assert!(msg.contains('3'), "{msg}"),
        other => panic!("expected process failure, got {other:?}"),
    }
}

#[test]
fn zero_exit_without_output_is_empty_success() {
    let dir = TempDir::new().unwrap();
    assert_eq!(outcome_of(sh("silent", "true"), &dir, Duration::from_secs(10)), Outcome::Output(String::new()));
}

#[test]
fn timeout_names_duration_and_returns_promptly() {
    let dir = TempDir::new().unwrap();
    let start = Instant::now();
    let out = outcome_of(sh("sleeper", "sleep 30"), &dir, Duration::from_millis(300));
    assert!(start.elapsed() < Duration::from_secs(10));
    let err = match out {
        Outcome::Failed(err) => err,
        other => panic!("expected failure, got {other:?}"),
    };
    assert_eq!(err.to_string(), "timeout after 300ms");
}

#[test]
fn escaped_descendant_holding_pipe_times_out() {
    let dir = TempDir::new().unwrap();
    let start = Instant::now();
    let out = outcome_of(sh("forker", "sleep 30 & echo started"), &dir, Duration::from_millis(400));
    assert!(start.elapsed() < Duration::from_secs(10));
    assert!(matches!(out, Outcome::Failed(ToolError::Timeout { .. })), "{out:?}");
}

/// 进程不存在或已成僵尸
#[cfg(target_os = "linux")]
fn is_gone(pid: u32) -> bool {
    match std::fs::read_to_string(format!("/proc/{pid}/stat")) {
        Err(_) => true,
        Ok(stat) => stat.rsplit(')').next().is_some_and(|rest| rest.trim_start().starts_with('Z')),
    }
}

#[cfg(target_os = "linux")]
#[test]
fn timeout_kills_whole_process_group() {
    let dir = TempDir::new().unwrap();
    let pidfile = dir.path().join("bg.pid");
    let script = format!("sleep 30 & echo $! > '{}'; wait", pidfile.display());
    let tool = ToolDescriptor::new("group", "sh", ToolCategory::General, move |_, _| {
        Ok(CommandSpec::new("sh").arg("-c").arg(&script))
    });
    let out = outcome_of(tool, &dir, Duration::from_millis(500));
    assert!(matches!(out, Outcome::Failed(ToolError::Timeout { .. })));

    let pid: u32 = std::fs::read_to_string(&pidfile).unwrap().trim().parse().unwrap();
    let deadline = Instant::now() + Duration::from_secs(3);
    while !is_gone(pid) && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(50));
    }
    assert!(is_gone(pid), "background child {pid} survived");
}

#[test]
fn slow_tool_does_not_block_fast_ones() {
    let dir = TempDir::new().unwrap();
    let file = detect(sample_png(&dir)).unwrap();
    let tools = [sh("slow", "sleep 30"), sh("fast", "echo quick")];
    let refs: Vec<&ToolDescriptor> = tools.iter().collect();
    let scan = run_all(&refs, &file, &options(&dir, Duration::from_millis(500)), &SearchPath);

    assert_eq!(scan.results.len(), 2);
    let slow = scan.results[0].as_ref().unwrap();
    let fast = scan.results[1].as_ref().unwrap();
    assert_eq!(slow.tool, "slow");
    assert!(slow.outcome.is_failed());
    assert_eq!(fast.outcome, Outcome::Output("quick".into()));
    assert!(fast.duration < Duration::from_millis(500));
}

#[test]
fn missing_binary_never_builds() {
    let dir = TempDir::new().unwrap();
    let called = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&called);
    let tool = ToolDescriptor::new("ghost", "definitely-not-a-real-binary-4f1c9", ToolCategory::Image, move |_, _| {
        flag.store(true, Ordering::SeqCst);
        Ok(CommandSpec::new("definitely-not-a-real-binary-4f1c9"))
    });
    let out = outcome_of(tool, &dir, Duration::from_secs(5));
    assert!(out.is_skipped());
    assert_eq!(out.error().unwrap().to_string(), "definitely-not-a-real-binary-4f1c9 not installed");
    assert!(!called.load(Ordering::SeqCst));
}

#[test]
fn results_keep_filtered_order() {
    let dir = TempDir::new().unwrap();
    let file = detect(sample_png(&dir)).unwrap();
    let tools: Vec<ToolDescriptor> = vec![
        sh("first", "sleep 0.3; echo 1"),
        sh("second", "echo 2"),
        ToolDescriptor::new("third", "sh", ToolCategory::Text, |_, _| Err(NotApplicable("nope".into()))),
        sh("fourth", "sleep 0.1; echo 4"),
    ];
    let refs: Vec<&ToolDescriptor> = tools.iter().collect();
    let scan = run_all(&refs, &file, &options(&dir, Duration::from_secs(10)), &SearchPath);

    assert!(scan.is_complete());
    let names: Vec<&str> = scan.completed().map(|r| r.tool.as_str()).collect();
    assert_eq!(names, vec!["first", "second", "third", "fourth"]);
    assert_eq!(scan.completed().filter_map(|r| r.outcome.output()).collect::<Vec<_>>(), vec!["1", "2", "4"]);
}

#[test]
fn renamed_png_dispatches_image_tools() {
    let dir = TempDir::new().unwrap();
    let opts = options(&dir, Duration::from_secs(5));
    let file = detect(sample_png(&dir)).unwrap();
    assert_eq!(file.category, FileCategory::Png);
    assert_eq!(file.extension, ".txt");

    let registry = Registry::builtin(&opts).unwrap();
    let names: Vec<&str> = applicable(registry.tools(), &file, &opts).into_iter().map(|t| t.name.as_str()).collect();
    assert!(names.contains(&"zsteg"));
    assert!(names.contains(&"pngcheck"));
    assert!(!names.contains(&"jsteg"));
    assert!(!names.contains(&"wavsteg"));
    assert_eq!(names.first(), Some(&"file"));
}

#[test]
fn directory_prep_runs_before_spawn() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("carve");
    std::fs::create_dir_all(&target).unwrap();
    std::fs::write(target.join("stale"), b"x").unwrap();
    let watched = target.clone();
    let tool = ToolDescriptor::new("carver", "sh", ToolCategory::General, move |_, _| {
        Ok(CommandSpec::new("sh")
            .arg("-c")
            .arg("ls -A \"$0\" | wc -l")
            .arg(&watched)
            .prepare(stegsweep_core::DirPrep::Recreate(watched.clone())))
    });
    let out = outcome_of(tool, &dir, Duration::from_secs(10));
    assert_eq!(out, Outcome::Output("0".into()));
    assert!(Path::new(&target).is_dir());
}

#[test]
fn huge_timeout_runs_normally() {
    let spec = CommandSpec::new("sh").arg("-c").arg("echo done");
    let exec = execute(&spec, Duration::from_secs(u64::MAX));
    assert!(matches!(exec.exit, Exit::Status(s) if s.success()), "{:?}", exec.exit);
    assert_eq!(exec.into_outcome(Duration::from_secs(u64::MAX)), Outcome::Output("done".into()));

    let opts = RunOptions { timeout: Some(Duration::from_secs(u64::MAX)), ..RunOptions::default() };
    let exec = execute(&CommandSpec::new("true"), opts.effective_timeout());
    assert!(matches!(exec.exit, Exit::Status(s) if s.success()));
}

#[test]
fn huge_timeout_in_batch_keeps_every_result() {
    let dir = TempDir::new().unwrap();
    let out = outcome_of(sh("big", "echo fine"), &dir, Duration::from_secs(u64::MAX));
    assert_eq!(out, Outcome::Output("fine".into()));
}

#[test]
fn installed_alternate_binary_is_spawned() {
    let dir = TempDir::new().unwrap();
    let tool = ToolDescriptor::new("alt", "definitely-not-a-real-binary-4f1c9", ToolCategory::General, |_, _| {
        Ok(CommandSpec::new("definitely-not-a-real-binary-4f1c9").arg("-c").arg("echo via alternate"))
    })
    .alt_binary("sh");
    let out = outcome_of(tool, &dir, Duration::from_secs(10));
    assert_eq!(out, Outcome::Output("via alternate".into()));
}
