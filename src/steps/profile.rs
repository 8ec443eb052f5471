//! Runs the built target, optionally under a profiler, and archives the results

use crate::core::{
    bag::{keys, ParameterBag},
    state::StepOutcome,
    step::{Step, StepError},
};
use crate::steps::{artifact, ProcessError, ProcessOutput, ProcessRunner};
use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use zip::write::FileOptions;

/// External profiler wrapped around the target binary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profiler {
    pub program: String,
    pub args: Vec<String>,
}

/// Timing summary written into every archive
#[derive(Debug, Serialize)]
struct Timing<'a> {
    scenario: Option<&'a str>,
    command: String,
    exit_code: i32,
    elapsed_ms: u128,
    finished_at: String,
}

/// Executes [`keys::TARGET_BINARY`] and packs the results into a zip archive.
///
/// Without a profiler the binary runs as a plain process. The archive holds
/// `timing.json`, the captured output, every file matching the `collect`
/// globs and, when `include_scenario` is set, the generated project sources.
#[derive(Debug, Clone)]
pub struct ProfileStep {
    name: String,
    profiler: Option<Profiler>,
    target_args: Vec<String>,
    archive: String,
    collect: Vec<String>,
    include_scenario: bool,
    timeout_secs: Option<u64>,
    env: BTreeMap<String, String>,
}

impl ProfileStep {
    pub fn new(archive: impl Into<String>) -> Self {
        Self {
            name: "profile".to_string(),
            profiler: None,
            target_args: Vec::new(),
            archive: archive.into(),
            collect: Vec::new(),
            include_scenario: false,
            timeout_secs: None,
            env: BTreeMap::new(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn profiler(mut self, profiler: Profiler) -> Self {
        self.profiler = Some(profiler);
        self
    }

    pub fn target_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.target_args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn collect(mut self, pattern: impl Into<String>) -> Self {
        self.collect.push(pattern.into());
        self
    }

    pub fn include_scenario(mut self, include: bool) -> Self {
        self.include_scenario = include;
        self
    }

    pub fn timeout(mut self, secs: Option<u64>) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn envs(mut self, env: BTreeMap<String, String>) -> Self {
        self.env.extend(env);
        self
    }

    fn runner(&self, bag: &ParameterBag, binary: &Path) -> Result<ProcessRunner, StepError> {
        let target_args = self
            .target_args
            .iter()
            .map(|arg| bag.render(arg))
            .collect::<Result<Vec<_>, _>>()?;
        let binary = binary.to_string_lossy().into_owned();

        let runner = match &self.profiler {
            Some(profiler) => {
                let profiler_args = profiler
                    .args
                    .iter()
                    .map(|arg| bag.render(arg))
                    .collect::<Result<Vec<_>, _>>()?;
                ProcessRunner::new(&profiler.program)
                    .args(profiler_args)
                    .args([binary])
                    .args(target_args)
            }
            None => ProcessRunner::new(binary).args(target_args),
        };

        Ok(runner.envs(&self.env).timeout(self.timeout_secs))
    }
}

#[async_trait]
impl Step for ProfileStep {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&mut self, bag: &mut ParameterBag) -> Result<StepOutcome, StepError> {
        let binary = bag.target_binary()?.to_path_buf();
        let working_dir = match bag.try_get(keys::WORKING_DIR) {
            Some(_) => bag.working_dir()?.to_path_buf(),
            None => std::env::current_dir()?,
        };
        let runner = self.runner(bag, &binary)?.working_dir(&working_dir);

        info!("Profiling: {}", runner.display());
        let output = match runner.run_checked(&[0]).await {
            Ok(output) => output,
            Err(e @ (ProcessError::ExitCode { .. } | ProcessError::Timeout { .. })) => {
                return Ok(StepOutcome::failure(e.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let timing_json = {
            let timing = Timing {
                scenario: bag.scenario().ok(),
                command: runner.display(),
                exit_code: output.exit_code,
                elapsed_ms: output.elapsed.as_millis(),
                finished_at: Utc::now().to_rfc3339(),
            };
            serde_json::to_vec_pretty(&timing)
                .map_err(|e| StepError::Invalid(format!("Failed to encode timing: {}", e)))?
        };

        let mut entries: Vec<(String, PathBuf)> = Vec::new();
        let mut collected_paths = HashSet::new();
        for pattern in &self.collect {
            for path in artifact::expand(&working_dir, pattern)? {
                if !collected_paths.insert(path.clone()) {
                    continue;
                }
                entries.push((entry_name(&working_dir, &path), path));
            }
        }
        if self.include_scenario {
            let project = bag.project_dir()?.to_path_buf();
            for path in artifact::walk_files(&project, &["target"])? {
                let name = format!("scenario/{}", entry_name(&project, &path));
                entries.push((name, path));
            }
        }

        let archive = working_dir.join(bag.render(&self.archive)?);
        let archive_path = archive.clone();
        let collected = entries.len();
        tokio::task::spawn_blocking(move || {
            write_archive(&archive_path, &timing_json, &output, &entries)
        })
        .await
        .map_err(|e| StepError::Archive(e.to_string()))??;

        debug!("Wrote {} ({} collected files)", archive.display(), collected);
        bag.push_path(keys::ARTIFACTS, archive.clone())?;

        Ok(StepOutcome::success(format!(
            "Profiled {} into {}",
            binary.display(),
            archive.display()
        ))
        .with_artifact(archive))
    }
}

/// Archive entry name: `path` relative to `base`, with forward slashes
fn entry_name(base: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(base).unwrap_or(path);
    relative.to_string_lossy().replace('\\', "/")
}

fn write_archive(
    archive: &Path,
    timing_json: &[u8],
    output: &ProcessOutput,
    entries: &[(String, PathBuf)],
) -> Result<(), StepError> {
    let mut zip = zip::ZipWriter::new(File::create(archive)?);
    let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    zip.start_file("timing.json", options)?;
    zip.write_all(timing_json)?;

    zip.start_file("output.txt", options)?;
    zip.write_all(output.stdout.as_bytes())?;
    if !output.stderr.is_empty() {
        zip.write_all(b"\n--- stderr ---\n")?;
        zip.write_all(output.stderr.as_bytes())?;
    }

    for (name, path) in entries {
        zip.start_file(name.as_str(), options)?;
        zip.write_all(&std::fs::read(path)?)?;
    }

    zip.finish()?;
    Ok(())
}
