//! Child process invocation shared by the process-driven steps

use crate::steps::ProcessError;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

/// What a finished child process left behind
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    /// Exit code, `-1` when the process was killed by a signal
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Runs a program to completion and captures its output
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    program: String,
    args: Vec<String>,
    working_dir: Option<PathBuf>,
    env: BTreeMap<String, String>,
    timeout_secs: Option<u64>,
}

impl ProcessRunner {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
            env: BTreeMap::new(),
            timeout_secs: None,
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn working_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.working_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn envs(mut self, vars: &BTreeMap<String, String>) -> Self {
        self.env
            .extend(vars.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    pub fn timeout(mut self, secs: Option<u64>) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Command line as it would be typed in a shell (for logs)
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Run the program and wait for it to exit.
    ///
    /// A non-zero exit code is not an error here; callers decide which codes
    /// they accept. Spawn failures and timeouts are.
    pub async fn run(&self) -> Result<ProcessOutput, ProcessError> {
        debug!("Spawning: {}", self.display());

        let mut command = Command::new(&self.program);
        command.args(&self.args).envs(&self.env).kill_on_drop(true);
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }

        let clock = Instant::now();
        let output = match self.timeout_secs {
            Some(secs) => timeout(Duration::from_secs(secs), command.output())
                .await
                .map_err(|_| ProcessError::Timeout {
                    program: self.program.clone(),
                    secs,
                })?,
            None => command.output().await,
        }
        .map_err(|source| ProcessError::Spawn {
            program: self.program.clone(),
            source,
        })?;
        let elapsed = clock.elapsed();

        let exit_code = output.status.code().unwrap_or(-1);
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if exit_code != 0 {
            warn!("{} exited with code {}: {}", self.program, exit_code, stderr.trim());
        }
        debug!(
            "{} finished in {:?} ({} bytes of output)",
            self.program,
            elapsed,
            stdout.len()
        );

        Ok(ProcessOutput {
            exit_code,
            stdout,
            stderr,
            elapsed,
        })
    }

    /// Run the program and turn exit codes outside `accepted` into an error
    pub async fn run_checked(&self, accepted: &[i32]) -> Result<ProcessOutput, ProcessError> {
        let output = self.run().await?;
        if accepted.contains(&output.exit_code) {
            Ok(output)
        } else {
            Err(ProcessError::ExitCode {
                program: self.program.clone(),
                code: output.exit_code,
                stderr: output.stderr.trim().to_string(),
            })
        }
    }
}
