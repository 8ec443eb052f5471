//! Generic external command step (build tools and the like)

use crate::core::{
    bag::{keys, ParameterBag},
    state::StepOutcome,
    step::{Step, StepError},
};
use crate::steps::{artifact, ProcessError, ProcessRunner};
use async_trait::async_trait;
use std::collections::BTreeMap;
use tracing::info;

/// Runs a program in the bag's working directory.
///
/// Arguments may reference bag values as `{{ key }}`. When `produces` is set,
/// the newest executable matching that glob (relative to the working
/// directory) is stored under [`keys::TARGET_BINARY`].
#[derive(Debug, Clone)]
pub struct CommandStep {
    name: String,
    program: String,
    args: Vec<String>,
    env: BTreeMap<String, String>,
    timeout_secs: Option<u64>,
    accepted_exit_codes: Vec<i32>,
    produces: Option<String>,
    stdout_key: Option<String>,
}

impl CommandStep {
    pub fn new(program: impl Into<String>) -> Self {
        let program = program.into();
        Self {
            name: program.clone(),
            program,
            args: Vec::new(),
            env: BTreeMap::new(),
            timeout_secs: None,
            accepted_exit_codes: vec![0],
            produces: None,
            stdout_key: None,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn envs(mut self, env: BTreeMap<String, String>) -> Self {
        self.env.extend(env);
        self
    }

    pub fn timeout(mut self, secs: Option<u64>) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn accept_exit_codes(mut self, codes: Vec<i32>) -> Self {
        self.accepted_exit_codes = codes;
        self
    }

    pub fn produces(mut self, pattern: impl Into<String>) -> Self {
        self.produces = Some(pattern.into());
        self
    }

    /// Store trimmed stdout under `key` after a successful run
    pub fn stdout_to(mut self, key: impl Into<String>) -> Self {
        self.stdout_key = Some(key.into());
        self
    }
}

#[async_trait]
impl Step for CommandStep {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&mut self, bag: &mut ParameterBag) -> Result<StepOutcome, StepError> {
        let args = self
            .args
            .iter()
            .map(|arg| bag.render(arg))
            .collect::<Result<Vec<_>, _>>()?;
        let working_dir = match bag.try_get(keys::WORKING_DIR) {
            Some(_) => bag.working_dir()?.to_path_buf(),
            None => std::env::current_dir()?,
        };

        let runner = ProcessRunner::new(&self.program)
            .args(args)
            .envs(&self.env)
            .working_dir(&working_dir)
            .timeout(self.timeout_secs);

        let output = match runner.run_checked(&self.accepted_exit_codes).await {
            Ok(output) => output,
            Err(e @ (ProcessError::ExitCode { .. } | ProcessError::Timeout { .. })) => {
                return Ok(StepOutcome::failure(e.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        info!(
            "{} finished with code {} in {:?}",
            runner.display(),
            output.exit_code,
            output.elapsed
        );

        if let Some(key) = &self.stdout_key {
            bag.set(key.as_str(), output.stdout.trim().to_string());
        }

        let mut outcome = StepOutcome::success(format!(
            "{} exited with code {} after {} ms",
            self.program,
            output.exit_code,
            output.elapsed.as_millis()
        ));

        if let Some(pattern) = &self.produces {
            match artifact::newest_executable(&working_dir, pattern)? {
                Some(binary) => {
                    info!("Resolved '{}' -> '{}'", pattern, binary.display());
                    bag.set(keys::TARGET_BINARY, binary.clone());
                    outcome = outcome.with_artifact(binary);
                }
                None => {
                    return Ok(StepOutcome::failure(format!(
                        "No executable matches '{}' in {}",
                        pattern,
                        working_dir.display()
                    )));
                }
            }
        }

        Ok(outcome)
    }
}
