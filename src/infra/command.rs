//! # Process Control Module / 进程控制模块
//!
//! Spawns the external runner, drains its output, and enforces the timeout.
//! The child is placed in its own process group so that the whole tree
//! (runner plus simulator) can be killed at once.
//!
//! 启动外部运行器、读取其输出并强制执行超时。
//! 子进程被放入独立的进程组，以便一次性终止整个进程树（运行器和仿真器）。

use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// How long the reader tasks may keep draining after the process group is gone.
const READER_GRACE: Duration = Duration::from_secs(5);

/// How the wait for the child ended.
/// 等待子进程的结束方式。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Exited(ExitStatus),
    TimedOut,
    Cancelled,
}

/// Output captured from the child, decoded lossily.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Spawns a command, captures its stdout and stderr separately, and waits
/// up to `timeout` or until `cancel` fires. On timeout or cancellation, and
/// after a normal exit, the child's process group is killed so no descendant
/// outlives the call. Output produced before the kill is preserved.
///
/// # Returns
/// `Err` only when the process cannot be spawned or waited on.
///
/// 派生一个命令，分别捕获其 stdout 和 stderr，并等待至多 `timeout`
/// 或直到 `cancel` 被触发。超时、取消以及正常退出后，都会终止子进程所在的进程组，
/// 确保没有后代进程残留。终止前产生的输出会被保留。
pub async fn spawn_and_capture(
    mut cmd: Command,
    timeout: Duration,
    cancel: &CancellationToken,
) -> std::io::Result<(WaitOutcome, CapturedOutput)> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    #[cfg(unix)]
    cmd.process_group(0);

    let mut child = cmd.spawn()?;
    let pid = child.id();

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| std::io::Error::other("failed to capture stdout"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| std::io::Error::other("failed to capture stderr"))?;

    let stdout_buf = Arc::new(Mutex::new(Vec::new()));
    let stderr_buf = Arc::new(Mutex::new(Vec::new()));
    let stdout_handle = tokio::spawn(drain(stdout, Arc::clone(&stdout_buf)));
    let stderr_handle = tokio::spawn(drain(stderr, Arc::clone(&stderr_buf)));

    let outcome = tokio::select! {
        status = child.wait() => WaitOutcome::Exited(status?),
        _ = tokio::time::sleep(timeout) => WaitOutcome::TimedOut,
        _ = cancel.cancelled() => WaitOutcome::Cancelled,
    };

    if let Some(pid) = pid {
        kill_process_group(pid);
    }
    if !matches!(outcome, WaitOutcome::Exited(_)) {
        // Reap the direct child; the group was already signalled.
        let _ = child.kill().await;
    }

    finish_reader(stdout_handle).await;
    finish_reader(stderr_handle).await;

    let captured = CapturedOutput {
        stdout: String::from_utf8_lossy(&stdout_buf.lock().await).into_owned(),
        stderr: String::from_utf8_lossy(&stderr_buf.lock().await).into_owned(),
    };
    Ok((outcome, captured))
}

async fn drain<R: AsyncRead + Unpin>(mut reader: R, sink: Arc<Mutex<Vec<u8>>>) {
    let mut buf = [0u8; 8192];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => sink.lock().await.extend_from_slice(&buf[..n]),
        }
    }
}

async fn finish_reader(mut handle: JoinHandle<()>) {
    if tokio::time::timeout(READER_GRACE, &mut handle).await.is_err() {
        handle.abort();
    }
}

/// Sends `SIGKILL` to the process group led by `pid`.
pub fn kill_process_group(pid: u32) {
    #[cfg(unix)]
    {
        let Ok(pid) = i32::try_from(pid) else {
            return;
        };
        // SAFETY: kill(2) has no memory-safety preconditions.
        unsafe {
            let _ = libc::kill(-pid, libc::SIGKILL);
        }
    }
    #[cfg(not(unix))]
    {
        let _ = pid;
    }
}
