//! 子进程执行：合并输出、超时与进程组终止
use crossbeam_channel as channel;
use std::io::{self, Read};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::error::ToolError;
use crate::results::Outcome;
use crate::tool::{CommandSpec, DirPrep};

/// 轮询子进程状态的间隔
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// 终止后等待子进程回收的上限
const KILL_GRACE: Duration = Duration::from_secs(2);

/// 超时过大以致期限无法表示时使用的上限（约 100 年）
const FAR_DEADLINE: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// 子进程的结束方式
#[derive(Debug)]
pub enum Exit {
    Status(ExitStatus),
    /// 超过期限被终止（包括子孙进程在期限后仍占用输出管道）
    TimedOut,
    /// 启动或等待失败
    Io(io::Error),
}

/// 一次执行的原始结果
#[derive(Debug)]
pub struct Execution {
    pub exit: Exit,
    /// stdout 与 stderr 合并后的字节流
    pub output: Vec<u8>,
    /// 从启动前到结束（或被终止）的耗时
    pub elapsed: Duration,
}

impl Execution {
    /// 按结果策略归类：非零退出但有输出同样视为成功
    pub fn into_outcome(self, timeout: Duration) -> Outcome {
        let text = String::from_utf8_lossy(&self.output).trim().to_string();
        match self.exit {
            Exit::TimedOut => Outcome::Failed(ToolError::Timeout { after: timeout }),
            Exit::Io(e) => Outcome::Failed(ToolError::Process(e.to_string())),
            Exit::Status(status) if status.success() || !text.is_empty() => Outcome::Output(text),
            Exit::Status(status) => Outcome::Failed(ToolError::Process(status.to_string())),
        }
    }
}

/// 执行命令并在 `timeout` 内收集合并输出；超时后终止整个进程组
pub fn execute(spec: &CommandSpec, timeout: Duration) -> Execution {
    prepare_dirs(&spec.prepare);

    let start = Instant::now();
    let deadline = deadline_after(start, timeout);

    let mut cmd = Command::new(&spec.program);
    cmd.args(&spec.args).stdin(Stdio::null()).stdout(Stdio::piped()).stderr(Stdio::piped());
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        // 子进程自成一组，超时时连同其子孙一起终止
        cmd.process_group(0);
    }

    let mut child = match cmd.spawn() {
        Ok(c) => c,
        Err(e) => {
            debug!(program = %spec.program, error = %e, "spawn failed");
            return Execution { exit: Exit::Io(e), output: Vec::new(), elapsed: start.elapsed() };
        }
    };

    let buf = Arc::new(Mutex::new(Vec::new()));
    let (drained_tx, drained_rx) = channel::unbounded::<()>();
    let mut readers = 0usize;
    if let Some(out) = child.stdout.take() {
        spawn_reader(out, Arc::clone(&buf), drained_tx.clone());
        readers += 1;
    }
    if let Some(err) = child.stderr.take() {
        spawn_reader(err, Arc::clone(&buf), drained_tx.clone());
        readers += 1;
    }
    drop(drained_tx);

    let exit = match wait_until(&mut child, deadline) {
        Ok(Some(status)) => {
            // 进程已退出，但逃逸的子孙可能仍持有管道
            if wait_drained(&drained_rx, readers, deadline) {
                Exit::Status(status)
            } else {
                terminate_group(&mut child);
                Exit::TimedOut
            }
        }
        Ok(None) => {
            terminate_group(&mut child);
            Exit::TimedOut
        }
        Err(e) => {
            terminate_group(&mut child);
            Exit::Io(e)
        }
    };

    let elapsed = start.elapsed();
    if matches!(exit, Exit::TimedOut) {
        // 给读线程一点时间收尾，但不无限等待
        wait_drained(&drained_rx, readers, Instant::now() + POLL_INTERVAL * 5);
    }
    let output = match buf.lock() {
        Ok(g) => g.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    };
    Execution { exit, output, elapsed }
}

/// `start + timeout`，溢出时退回到一个足够远的期限
fn deadline_after(start: Instant, timeout: Duration) -> Instant {
    start
        .checked_add(timeout)
        .or_else(|| start.checked_add(FAR_DEADLINE))
        .unwrap_or(start)
}

fn spawn_reader<R: Read + Send + 'static>(mut src: R, buf: Arc<Mutex<Vec<u8>>>, done: channel::Sender<()>) {
    thread::spawn(move || {
        let mut chunk = [0u8; 8192];
        loop {
            match src.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => match buf.lock() {
                    Ok(mut g) => g.extend_from_slice(&chunk[..n]),
                    Err(poisoned) => poisoned.into_inner().extend_from_slice(&chunk[..n]),
                },
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(_) => break,
            }
        }
        let _ = done.send(());
    });
}

/// 轮询直到子进程退出或到达期限；到期返回 Ok(None)
fn wait_until(child: &mut Child, deadline: Instant) -> io::Result<Option<ExitStatus>> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        let now = Instant::now();
        if now >= deadline {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL.min(deadline - now));
    }
}

/// 等待全部读线程在期限内读到 EOF
fn wait_drained(rx: &channel::Receiver<()>, readers: usize, deadline: Instant) -> bool {
    for _ in 0..readers {
        if rx.recv_deadline(deadline).is_err() {
            return false;
        }
    }
    true
}

/// 终止子进程所在的进程组并回收子进程
fn terminate_group(child: &mut Child) {
    let pid = child.id();
    if let Err(e) = kill_group(pid) {
        warn!(pid, error = %e, "process group termination failed");
    }
    // 组终止失败时至少保证直接子进程被终止
    let _ = child.kill();
    let grace = Instant::now() + KILL_GRACE;
    while Instant::now() < grace {
        match child.try_wait() {
            Ok(Some(_)) | Err(_) => return,
            Ok(None) => thread::sleep(POLL_INTERVAL),
        }
    }
    warn!(pid, "child not reaped after kill");
}

#[cfg(unix)]
fn kill_group(pid: u32) -> io::Result<()> {
    let status = Command::new("kill")
        .args(["-s", "KILL", "--", &format!("-{pid}")])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()?;
    if status.success() {
        Ok(())
    } else {
        Err(io::Error::new(io::ErrorKind::Other, format!("kill exited with {status}")))
    }
}

#[cfg(windows)]
fn kill_group(pid: u32) -> io::Result<()> {
    let status = Command::new("taskkill")
        .args(["/F", "/T", "/PID", &pid.to_string()])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()?;
    if status.success() {
        Ok(())
    } else {
        Err(io::Error::new(io::ErrorKind::Other, format!("taskkill exited with {status}")))
    }
}

/// 启动前的目录准备；失败只记录警告，交由工具自身报错
fn prepare_dirs(steps: &[DirPrep]) {
    for step in steps {
        let res = match step {
            DirPrep::Remove(dir) => remove_if_exists(dir),
            DirPrep::Recreate(dir) => remove_if_exists(dir).and_then(|_| std::fs::create_dir_all(dir)),
            DirPrep::Ensure(dir) => std::fs::create_dir_all(dir),
        };
        if let Err(e) = res {
            warn!(?step, error = %e, "directory preparation failed");
        }
    }
}

fn remove_if_exists(dir: &std::path::Path) -> io::Result<()> {
    match std::fs::remove_dir_all(dir) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}
