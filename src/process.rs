//! Capture process management.
//!
//! The external capture tool is the only concurrent entity in the panel. It
//! is owned by a `CaptureProcess` handle: spawned into its own process group,
//! terminated with SIGTERM (then SIGKILL after a grace period), and always
//! torn down on drop so no transition can leak a process that still holds the
//! camera.

use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::command::CaptureCommand;

/// Grace period between SIGTERM and SIGKILL.
const TERMINATE_GRACE: Duration = Duration::from_secs(2);

/// Poll interval for process exit and output-file checks.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("capture tool '{0}' not found")]
    ToolNotFound(String),

    #[error("failed to spawn capture tool: {0}")]
    SpawnFailed(std::io::Error),

    #[error("expected output {path:?} did not appear within {waited:?}")]
    OutputTimeout {
        path: std::path::PathBuf,
        waited: Duration,
    },

    #[error("capture tool exited with {status}")]
    ToolFailed { status: ExitStatus },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// An owned handle to the single running capture or preview process.
#[derive(Debug)]
pub struct CaptureProcess {
    child: Child,
    program: String,
}

impl CaptureProcess {
    /// Spawn the described command in its own process group.
    pub fn spawn(command: &CaptureCommand) -> Result<Self, CaptureError> {
        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        let child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CaptureError::ToolNotFound(command.program.clone())
            } else {
                CaptureError::SpawnFailed(e)
            }
        })?;

        log::debug!("spawned {} (pid {})", command.program, child.id());
        Ok(CaptureProcess {
            child,
            program: command.program.clone(),
        })
    }

    pub fn is_running(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    /// Wait up to `timeout` for the process to exit on its own.
    pub fn wait_timeout(&mut self, timeout: Duration) -> Result<Option<ExitStatus>, CaptureError> {
        let deadline = Instant::now() + timeout;
        loop {
            match self.child.try_wait() {
                Ok(Some(status)) => return Ok(Some(status)),
                Ok(None) => {
                    if Instant::now() >= deadline {
                        return Ok(None);
                    }
                    std::thread::sleep(POLL_INTERVAL);
                }
                Err(e) => return Err(CaptureError::Io(e)),
            }
        }
    }

    /// Terminate the process group and reap the child.
    ///
    /// SIGTERM first so the tool can finalize its output file; SIGKILL only
    /// after the grace period.
    pub fn terminate(&mut self) {
        if !self.is_running() {
            return;
        }

        #[cfg(unix)]
        {
            unsafe {
                libc::killpg(self.child.id() as i32, libc::SIGTERM);
            }
        }
        #[cfg(not(unix))]
        {
            let _ = self.child.kill();
        }

        let start = Instant::now();
        loop {
            match self.child.try_wait() {
                Ok(Some(_)) => break,
                Ok(None) => {
                    if start.elapsed() > TERMINATE_GRACE {
                        let _ = self.child.kill();
                        let _ = self.child.wait();
                        break;
                    }
                    std::thread::sleep(Duration::from_millis(50));
                }
                Err(_) => break,
            }
        }
        log::debug!("terminated {}", self.program);
    }
}

impl Drop for CaptureProcess {
    fn drop(&mut self) {
        self.terminate();
    }
}

/// Wait for an expected output file with a bounded poll.
///
/// The capture tool communicates only through the filesystem, so this is the
/// one synchronization point with it. A missing file after the deadline is a
/// capture failure, never an infinite spin.
pub fn wait_for_file(path: &Path, timeout: Duration) -> Result<(), CaptureError> {
    let deadline = Instant::now() + timeout;
    while !path.exists() {
        if Instant::now() >= deadline {
            return Err(CaptureError::OutputTimeout {
                path: path.to_path_buf(),
                waited: timeout,
            });
        }
        std::thread::sleep(POLL_INTERVAL);
    }
    Ok(())
}

/// Global flag set by the Ctrl+C handler.
static INTERRUPT_RECEIVED: AtomicBool = AtomicBool::new(false);

pub fn interrupt_received() -> bool {
    INTERRUPT_RECEIVED.load(Ordering::SeqCst)
}

/// Install the Ctrl+C handler. Call once at startup.
pub fn setup_interrupt_handler() -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(move || {
        INTERRUPT_RECEIVED.store(true, Ordering::SeqCst);
        log::info!("interrupt received, shutting down");
    })
}
