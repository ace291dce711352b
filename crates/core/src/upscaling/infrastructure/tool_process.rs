use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::upscaling::domain::upscaler::UpscaleError;

/// How often a child with a deadline is polled for exit.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Exit status plus everything the child wrote to stdout/stderr.
#[derive(Debug)]
pub struct ToolOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

/// Runs `command` to completion with both output streams captured.
///
/// With a `timeout`, a child still running at the deadline is killed and
/// reaped before [`UpscaleError::Timeout`] is returned. Without one the call
/// blocks for as long as the child runs.
pub fn run_captured(mut command: Command, timeout: Option<Duration>) -> Result<ToolOutput, UpscaleError> {
    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(UpscaleError::LaunchFailed)?;

    // Drain both pipes on their own threads so a chatty child can't fill a
    // pipe buffer and stall while we wait on it.
    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    let status = match timeout {
        None => child.wait().map_err(UpscaleError::LaunchFailed)?,
        Some(limit) => match wait_until(&mut child, Instant::now() + limit)? {
            Some(status) => status,
            None => {
                let _ = child.kill();
                let _ = child.wait();
                // Grandchildren may still hold the pipes open; detach the
                // readers rather than block on them.
                drop(stdout);
                drop(stderr);
                return Err(UpscaleError::Timeout(limit));
            }
        },
    };

    Ok(ToolOutput {
        status,
        stdout: join(stdout),
        stderr: join(stderr),
    })
}

fn wait_until(child: &mut Child, deadline: Instant) -> Result<Option<ExitStatus>, UpscaleError> {
    loop {
        if let Some(status) = child.try_wait().map_err(UpscaleError::LaunchFailed)? {
            return Ok(Some(status));
        }
        let now = Instant::now();
        if now >= deadline {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL.min(deadline - now));
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<Vec<u8>>> {
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            buf
        })
    })
}

fn join(handle: Option<JoinHandle<Vec<u8>>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}
