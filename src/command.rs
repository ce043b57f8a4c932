use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, error};

use crate::error::{Error, Result};

/// Runs one external program to completion and hands back its trimmed stdout.
///
/// The flow only ever awaits one command at a time, so implementations need
/// not be `Send` or reentrant.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    async fn run(&self, program: &str, args: &[&str]) -> Result<String>;
}

/// Spawns real processes through tokio.
#[derive(Debug, Clone)]
pub struct SystemRunner {
    timeout: Duration,
}

impl SystemRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl CommandRunner for SystemRunner {
    async fn run(&self, program: &str, args: &[&str]) -> Result<String> {
        let rendered = display_command(program, args);
        debug!(command = %rendered, "running command");

        let mut cmd = Command::new(program);
        cmd.args(args);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(source)) => {
                return Err(Error::Spawn {
                    command: rendered,
                    source,
                });
            }
            Err(_) => {
                error!(command = %rendered, timeout = ?self.timeout, "command timed out");
                return Err(Error::Timeout {
                    command: rendered,
                    timeout: self.timeout,
                });
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if output.status.success() {
            // stdout may hold a secret; only its size is worth logging.
            debug!(command = %rendered, bytes = stdout.len(), "command finished");
            Ok(stdout)
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            error!(command = %rendered, status = %output.status, stderr = %stderr, "command failed");
            Err(Error::CommandFailed {
                command: rendered,
                status: output.status,
                message: failure_message(stderr, stdout),
            })
        }
    }
}

fn failure_message(stderr: String, stdout: String) -> String {
    if stderr.is_empty() { stdout } else { stderr }
}

pub fn display_command(program: &str, args: &[&str]) -> String {
    let mut parts = Vec::with_capacity(args.len() + 1);
    parts.push(program);
    parts.extend_from_slice(args);
    parts.join(" ")
}
