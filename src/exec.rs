//! Bounded external command execution with captured output.

use std::io;
use std::path::Path;
use std::time::Duration;

#[cfg(test)]
use mockall::automock;

/// Shell-wrapped command execution, as a seam for tests. The engine only
/// consumes this interface; process plumbing is not its concern.
#[cfg_attr(test, automock)]
pub trait CommandRunner {
    /// Run a command line through the shell with stdout captured to the
    /// given file. Returns `Ok(true)` only for a clean zero exit within
    /// `timeout`; an expired timeout kills the process and reports failure,
    /// indistinguishable from a non-zero exit.
    fn run_captured(&self, command_line: &str, timeout: Duration, capture: &Path)
    -> io::Result<bool>;
}

#[cfg(unix)]
pub use host::HostRunner;

#[cfg(unix)]
mod host {
    use super::*;
    use std::fs::File;
    use std::process::{Command, Stdio};
    use std::thread;
    use std::time::Instant;
    use tracing::debug;

    /// Interval between exit checks while waiting on a bounded command.
    const POLL_INTERVAL: Duration = Duration::from_millis(25);

    #[derive(Debug, Default)]
    pub struct HostRunner;

    impl CommandRunner for HostRunner {
        fn run_captured(
            &self,
            command_line: &str,
            timeout: Duration,
            capture: &Path,
        ) -> io::Result<bool> {
            let output = File::create(capture)?;
            let mut child = Command::new("/bin/sh")
                .arg("-c")
                .arg(command_line)
                .stdin(Stdio::null())
                .stdout(output)
                .stderr(Stdio::null())
                .spawn()?;

            let deadline = Instant::now() + timeout;
            loop {
                if let Some(status) = child.try_wait()? {
                    debug!("command {command_line:?} exited with {status}");
                    return Ok(status.success());
                }
                if Instant::now() >= deadline {
                    debug!("command {command_line:?} timed out after {timeout:?}");
                    child.kill().ok();
                    child.wait().ok();
                    return Ok(false);
                }
                thread::sleep(POLL_INTERVAL);
            }
        }
    }

}
