//! 并发派发与结果回收
use crossbeam_channel as channel;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::detect::FileRecord;
use crate::error::ToolError;
use crate::exec::execute;
use crate::options::RunOptions;
use crate::probe::BinaryProbe;
use crate::results::{Outcome, ScanResult, ToolResult};
use crate::tool::ToolDescriptor;

/// 并发执行全部工具，结果按输入顺序排列
pub fn run_all(tools: &[&ToolDescriptor], file: &FileRecord, opts: &RunOptions, probe: &dyn BinaryProbe) -> ScanResult {
    run_all_with_progress(tools, file, opts, probe, |_, _| {})
}

/// 同 [`run_all`]，每个工具完成时（按完成顺序）回调 `on_result(下标, 结果)`
pub fn run_all_with_progress<F>(
    tools: &[&ToolDescriptor],
    file: &FileRecord,
    opts: &RunOptions,
    probe: &dyn BinaryProbe,
    mut on_result: F,
) -> ScanResult
where
    F: FnMut(usize, &ToolResult),
{
    let start = Instant::now();
    let task = Task { file, opts, probe, timeout: opts.effective_timeout() };
    info!(file = %file.path.display(), category = %file.category, tools = tools.len(), "dispatching tools");

    let mut results: Vec<Option<ToolResult>> = vec![None; tools.len()];
    if tools.is_empty() {
        return ScanResult { file: file.clone(), results, duration: start.elapsed() };
    }

    // worker → collector：(下标, 结果)
    let (tx, rx) = channel::unbounded::<(usize, ToolResult)>();

    std::thread::scope(|scope| {
        let task = &task;
        scope.spawn(move || {
            // 每个工具一个线程，不做限流
            match rayon::ThreadPoolBuilder::new()
                .num_threads(tools.len())
                .thread_name(|i| format!("stegsweep-tool-{i}"))
                .build()
            {
                Ok(pool) => pool.scope(|s| spawn_tasks(s, tools, task, &tx)),
                Err(e) => {
                    warn!(error = %e, "cannot build dedicated pool, using global pool");
                    rayon::scope(|s| spawn_tasks(s, tools, task, &tx));
                }
            }
            // tx 在此处被丢弃，collector 随之结束
        });

        // collector：只写入预先分配的槽位
        while let Ok((idx, result)) = rx.recv() {
            on_result(idx, &result);
            if let Some(slot) = results.get_mut(idx) {
                *slot = Some(result);
            }
        }
    });

    let scan = ScanResult { file: file.clone(), results, duration: start.elapsed() };
    info!(completed = scan.completed().count(), elapsed_ms = scan.duration.as_millis() as u64, "all tools finished");
    scan
}

fn spawn_tasks<'s>(
    s: &rayon::Scope<'s>,
    tools: &'s [&'s ToolDescriptor],
    task: &'s Task<'s>,
    tx: &channel::Sender<(usize, ToolResult)>,
) {
    for (idx, tool) in tools.iter().enumerate() {
        let tx = tx.clone();
        s.spawn(move |_| {
            let result = task.run(tool);
            let _ = tx.send((idx, result));
        });
    }
}

/// 单个工具执行所需的只读上下文
struct Task<'a> {
    file: &'a FileRecord,
    opts: &'a RunOptions,
    probe: &'a dyn BinaryProbe,
    timeout: Duration,
}

impl Task<'_> {
    fn run(&self, tool: &ToolDescriptor) -> ToolResult {
        let (outcome, duration) = self.outcome(tool);
        ToolResult { tool: tool.name.clone(), category: tool.category, outcome, duration }
    }

    fn outcome(&self, tool: &ToolDescriptor) -> (Outcome, Duration) {
        let Some(installed) = tool.binaries().find(|b| self.probe.is_available(b)) else {
            debug!(tool = %tool.name, binary = %tool.binary, "binary missing");
            return (Outcome::Skipped(ToolError::Missing { binary: tool.binary.clone() }), Duration::ZERO);
        };

        let mut spec = match tool.build(&self.file.path, self.opts) {
            Ok(spec) => spec,
            Err(na) => {
                debug!(tool = %tool.name, reason = %na, "not applicable");
                return (Outcome::Skipped(ToolError::NotApplicable(na.0)), Duration::ZERO);
            }
        };

        // 构造器按主二进制命名；只装了备选时改为启动备选
        if spec.program == tool.binary && installed != tool.binary {
            spec.program = installed.to_string();
        }

        debug!(tool = %tool.name, command = %spec, "running");
        let exec = execute(&spec, self.timeout);
        let elapsed = exec.elapsed;
        let outcome = exec.into_outcome(self.timeout);
        if let Outcome::Failed(e) = &outcome {
            debug!(tool = %tool.name, error = %e, "tool failed");
        }
        (outcome, elapsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::FileCategory;
    use crate::tool::{CommandSpec, NotApplicable, ToolCategory};
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    struct Nothing;

    impl BinaryProbe for Nothing {
        fn is_available(&self, _: &str) -> bool {
            false
        }
    }

    struct Everything;

    impl BinaryProbe for Everything {
        fn is_available(&self, _: &str) -> bool {
            true
        }
    }

    fn record() -> FileRecord {
        FileRecord {
            path: PathBuf::from("/tmp/cover.png"),
            name: "cover.png".into(),
            size: 8,
            category: FileCategory::Png,
            mime_type: "image/png".into(),
            extension: ".png".into(),
        }
    }

    #[test]
    fn missing_binary_skips_without_building() {
        let called = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&called);
        let tool = ToolDescriptor::new("zsteg", "zsteg", ToolCategory::Image, move |_, _| {
            flag.store(true, Ordering::SeqCst);
            Ok(CommandSpec::new("zsteg"))
        });

        let scan = run_all(&[&tool], &record(), &RunOptions::default(), &Nothing);
        let result = scan.results[0].as_ref().unwrap();
        assert_eq!(result.outcome, Outcome::Skipped(ToolError::Missing { binary: "zsteg".into() }));
        assert_eq!(result.outcome.error().unwrap().to_string(), "zsteg not installed");
        assert!(!called.load(Ordering::SeqCst));
    }

    #[test]
    fn alternate_binary_satisfies_probe() {
        struct Alt;
        impl BinaryProbe for Alt {
            fn is_available(&self, b: &str) -> bool {
                b == "alt"
            }
        }
        let tool = ToolDescriptor::new("t", "main", ToolCategory::General, |_, _| Err(NotApplicable("n/a".into())))
            .alt_binary("alt");
        let scan = run_all(&[&tool], &record(), &RunOptions::default(), &Alt);
        assert_eq!(scan.results[0].as_ref().unwrap().outcome, Outcome::Skipped(ToolError::NotApplicable("n/a".into())));
    }

    #[test]
    fn not_applicable_is_skip_with_reason() {
        let tool = ToolDescriptor::new("stegseek", "stegseek", ToolCategory::Image, |_, _| {
            Err(NotApplicable("rockyou.txt wordlist not found".into()))
        });
        let scan = run_all(&[&tool], &record(), &RunOptions::default(), &Everything);
        let outcome = &scan.results[0].as_ref().unwrap().outcome;
        assert!(outcome.is_skipped());
        assert_eq!(outcome.error().unwrap().to_string(), "rockyou.txt wordlist not found");
    }

    #[test]
    fn empty_tool_list() {
        let scan = run_all(&[], &record(), &RunOptions::default(), &Everything);
        assert!(scan.results.is_empty());
        assert!(scan.is_complete());
    }

    #[test]
    fn every_slot_filled_and_progress_sees_all() {
        let tools: Vec<ToolDescriptor> = (0..12)
            .map(|i| ToolDescriptor::new(format!("t{i}"), format!("bin{i}"), ToolCategory::General, |_, _| Ok(CommandSpec::new("x"))))
            .collect();
        let refs: Vec<&ToolDescriptor> = tools.iter().collect();
        let mut seen = Vec::new();
        let scan = run_all_with_progress(&refs, &record(), &RunOptions::default(), &Nothing, |idx, r| {
            seen.push((idx, r.tool.clone()))
        });
        assert_eq!(scan.results.len(), 12);
        assert!(scan.is_complete());
        for (i, r) in scan.completed().enumerate() {
            assert_eq!(r.tool, format!("t{i}"));
        }
        seen.sort();
        assert_eq!(seen.len(), 12);
        assert!(seen.iter().all(|(idx, name)| name == &format!("t{idx}")));
    }
}
