//! Run a Python script inside the sandbox with a wall-clock timeout.

use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::{Sandbox, SearchError};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Kills the child if it is still running when dropped.
struct ChildGuard(Option<Child>);

impl ChildGuard {
    fn try_wait(&mut self) -> std::io::Result<Option<ExitStatus>> {
        match self.0.as_mut() {
            Some(child) => child.try_wait(),
            None => Ok(None),
        }
    }

    fn kill(&mut self) {
        if let Some(mut child) = self.0.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        let running = self
            .0
            .as_mut()
            .is_some_and(|child| matches!(child.try_wait(), Ok(None)));
        if running {
            self.kill();
        }
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        buf
    })
}

/// Execute `file_path` with `python`, working directory = sandbox root.
///
/// Output is stdout followed by stderr. A non-zero exit code is appended as
/// `Process exited with code N`.
pub fn run_python_file(
    sandbox: &Sandbox,
    file_path: &str,
    args: &[String],
    python: &str,
    timeout: Duration,
) -> Result<String, SearchError> {
    let full = sandbox.resolve(file_path)?;
    if !full.exists() {
        return Err(SearchError::NotFound(file_path.to_string()));
    }
    if Path::new(file_path).extension().is_none_or(|e| e != "py") {
        return Err(SearchError::InvalidArgs(format!(
            "\"{}\" is not a Python file",
            file_path
        )));
    }

    let start = Instant::now();
    let mut child = Command::new(python)
        .arg(&full)
        .args(args)
        .current_dir(sandbox.root())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    // Pipes are drained on their own threads so a chatty script cannot fill
    // the OS buffer and block before exiting.
    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());
    let mut guard = ChildGuard(Some(child));

    let status = loop {
        if let Some(status) = guard.try_wait()? {
            break status;
        }
        if start.elapsed() >= timeout {
            guard.kill();
            warn!(path = file_path, timeout_secs = timeout.as_secs(), "Script timed out");
            return Err(SearchError::Timeout {
                path: file_path.to_string(),
                secs: timeout.as_secs(),
            });
        }
        thread::sleep(POLL_INTERVAL);
    };

    let stdout = String::from_utf8_lossy(&stdout.join().unwrap_or_default()).into_owned();
    let stderr = String::from_utf8_lossy(&stderr.join().unwrap_or_default()).into_owned();

    info!(
        path = file_path,
        code = ?status.code(),
        elapsed_ms = format_args!("{:.1}", start.elapsed().as_secs_f64() * 1000.0),
        "Script finished"
    );

    Ok(compose_output(&stdout, &stderr, status.code()))
}

fn compose_output(stdout: &str, stderr: &str, code: Option<i32>) -> String {
    let mut out = stdout.to_string();
    if !stderr.is_empty() {
        if !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(stderr);
    }
    if out.trim().is_empty() {
        out = "No output produced.".to_string();
    }
    match code {
        Some(0) => {}
        Some(code) => {
            if !out.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(&format!("Process exited with code {}", code));
        }
        None => {
            if !out.ends_with('\n') {
                out.push('\n');
            }
            out.push_str("Process terminated by signal");
        }
    }
    out
}
