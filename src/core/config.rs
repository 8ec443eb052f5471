//! Scenario catalog configuration from YAML

use crate::core::{
    bag::ParameterBag,
    pipeline::Pipeline,
    platform::Platform,
    step::{Step, StepFactory},
};
use crate::execution::{PipelinesRunner, RegistryError};
use crate::steps::{
    CleanupDisposable, CommandStep, GenerateProject, MoveFiles, ProfileStep, Profiler,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Catalog shipped with the binary
const BUILTIN_CATALOG: &str = include_str!("../../catalog/default.yaml");

/// Group used when a scenario does not name one
pub const DEFAULT_GROUP: &str = "Default";

/// Top-level scenario catalog loaded from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Catalog name (optional)
    #[serde(default)]
    pub name: Option<String>,

    pub scenarios: Vec<ScenarioConfig>,
}

/// One scenario as defined in YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub name: String,

    #[serde(default = "default_group")]
    pub group: String,

    /// Optional description
    #[serde(default)]
    pub description: Option<String>,

    /// Platforms the scenario may run on (all when omitted)
    #[serde(default = "Platform::all")]
    pub platforms: Vec<Platform>,

    pub steps: Vec<StepConfig>,
}

/// Step configuration, tagged by `kind`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepConfig {
    Generate {
        classes: usize,
        methods_per_class: usize,
        #[serde(default)]
        root: Option<PathBuf>,
    },
    Command(CommandConfig),
    Profile(ProfileConfig),
    MoveFiles {
        pattern: String,
        #[serde(default)]
        destination: Option<PathBuf>,
    },
    Cleanup,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandConfig {
    /// Display name (defaults to the program)
    #[serde(default)]
    pub name: Option<String>,

    pub program: String,

    /// Arguments, `{{ key }}` placeholders are filled from the bag
    #[serde(default)]
    pub args: Vec<String>,

    #[serde(default)]
    pub env: BTreeMap<String, String>,

    #[serde(default)]
    pub timeout_secs: Option<u64>,

    #[serde(default = "default_exit_codes")]
    pub accepted_exit_codes: Vec<i32>,

    /// Glob for the produced binary, relative to the working directory
    #[serde(default)]
    pub produces: Option<String>,

    /// Bag key receiving the trimmed stdout
    #[serde(default)]
    pub stdout_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileConfig {
    #[serde(default)]
    pub name: Option<String>,

    /// Archive file name (bag placeholders allowed), created in the working directory
    pub archive: String,

    /// Profiler wrapped around the target; plain process when omitted
    #[serde(default)]
    pub profiler: Option<ProfilerConfig>,

    #[serde(default)]
    pub target_args: Vec<String>,

    /// Globs of profiler output files to pack into the archive
    #[serde(default)]
    pub collect: Vec<String>,

    #[serde(default)]
    pub include_scenario: bool,

    #[serde(default)]
    pub timeout_secs: Option<u64>,

    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfilerConfig {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

fn default_group() -> String {
    DEFAULT_GROUP.to_string()
}

fn default_exit_codes() -> Vec<i32> {
    vec![0]
}

impl StepConfig {
    /// Kind name as written in YAML
    pub fn kind(&self) -> &'static str {
        match self {
            StepConfig::Generate { .. } => "generate",
            StepConfig::Command(_) => "command",
            StepConfig::Profile(_) => "profile",
            StepConfig::MoveFiles { .. } => "move_files",
            StepConfig::Cleanup => "cleanup",
        }
    }

    /// Construct the step this configuration describes
    pub fn build(&self) -> Box<dyn Step> {
        match self {
            StepConfig::Generate {
                classes,
                methods_per_class,
                root,
            } => {
                let step = GenerateProject::new(*classes, *methods_per_class);
                match root {
                    Some(root) => Box::new(step.in_dir(root)),
                    None => Box::new(step),
                }
            }
            StepConfig::Command(c) => {
                let mut step = CommandStep::new(&c.program)
                    .args(c.args.iter().cloned())
                    .envs(c.env.clone())
                    .timeout(c.timeout_secs)
                    .accept_exit_codes(c.accepted_exit_codes.clone());
                if let Some(name) = &c.name {
                    step = step.named(name);
                }
                if let Some(pattern) = &c.produces {
                    step = step.produces(pattern);
                }
                if let Some(key) = &c.stdout_key {
                    step = step.stdout_to(key);
                }
                Box::new(step)
            }
            StepConfig::Profile(p) => {
                let mut step = ProfileStep::new(&p.archive)
                    .target_args(p.target_args.iter().cloned())
                    .include_scenario(p.include_scenario)
                    .timeout(p.timeout_secs)
                    .envs(p.env.clone());
                if let Some(name) = &p.name {
                    step = step.named(name);
                }
                if let Some(profiler) = &p.profiler {
                    step = step.profiler(Profiler {
                        program: profiler.program.clone(),
                        args: profiler.args.clone(),
                    });
                }
                for pattern in &p.collect {
                    step = step.collect(pattern);
                }
                Box::new(step)
            }
            StepConfig::MoveFiles {
                pattern,
                destination,
            } => {
                let step = MoveFiles::new(pattern);
                match destination {
                    Some(dir) => Box::new(step.to(dir)),
                    None => Box::new(step),
                }
            }
            StepConfig::Cleanup => Box::new(CleanupDisposable::new()),
        }
    }

    /// Deferred constructor for use in a pipeline
    pub fn factory(&self) -> StepFactory {
        let config = self.clone();
        Box::new(move |_| config.build())
    }

    fn validate(&self, scenario: &str, index: usize) -> Result<()> {
        let at = || format!("Scenario '{}' step {} ({})", scenario, index + 1, self.kind());

        match self {
            StepConfig::Generate {
                classes,
                methods_per_class,
                ..
            } => {
                if *classes == 0 || *methods_per_class == 0 {
                    anyhow::bail!("{}: classes and methods_per_class must be positive", at());
                }
            }
            StepConfig::Command(c) => {
                if c.program.trim().is_empty() {
                    anyhow::bail!("{}: program is empty", at());
                }
                if c.accepted_exit_codes.is_empty() {
                    anyhow::bail!("{}: accepted_exit_codes is empty", at());
                }
                if let Some(pattern) = &c.produces {
                    check_glob(pattern).with_context(at)?;
                }
            }
            StepConfig::Profile(p) => {
                if p.archive.trim().is_empty() {
                    anyhow::bail!("{}: archive name is empty", at());
                }
                if let Some(profiler) = &p.profiler {
                    if profiler.program.trim().is_empty() {
                        anyhow::bail!("{}: profiler program is empty", at());
                    }
                }
                for pattern in &p.collect {
                    check_glob(pattern).with_context(at)?;
                }
            }
            StepConfig::MoveFiles { pattern, .. } => {
                check_glob(pattern).with_context(at)?;
            }
            StepConfig::Cleanup => {}
        }

        Ok(())
    }
}

fn check_glob(pattern: &str) -> Result<()> {
    if pattern.trim().is_empty() {
        anyhow::bail!("glob pattern is empty");
    }
    glob::Pattern::new(pattern)
        .with_context(|| format!("invalid glob pattern '{}'", pattern))?;
    Ok(())
}

/// Chain the configured steps into a pipeline around `bag`
pub fn build_pipeline(first: &StepConfig, rest: &[StepConfig], bag: ParameterBag) -> Pipeline {
    rest.iter()
        .fold(Pipeline::first_step(first.factory(), bag), |pipeline, step| {
            pipeline.next_step(step.factory())
        })
}

impl CatalogConfig {
    /// Load a catalog from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog {}", path.display()))?;
        Self::from_yaml(&content)
    }

    /// Parse a catalog from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: CatalogConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// The catalog embedded in the binary
    pub fn builtin() -> Result<Self> {
        Self::from_yaml(BUILTIN_CATALOG).context("Built-in catalog is invalid")
    }

    /// Validate the catalog
    pub fn validate(&self) -> Result<()> {
        if self.scenarios.is_empty() {
            anyhow::bail!("Catalog defines no scenarios");
        }

        let mut seen = HashSet::new();
        for scenario in &self.scenarios {
            if scenario.name.trim().is_empty() {
                anyhow::bail!("Scenario with empty name");
            }
            if !seen.insert((scenario.group.as_str(), scenario.name.as_str())) {
                anyhow::bail!(
                    "Duplicate scenario '{}' in group '{}'",
                    scenario.name,
                    scenario.group
                );
            }
            if scenario.platforms.is_empty() {
                anyhow::bail!("Scenario '{}' lists no platforms", scenario.name);
            }
            if scenario.steps.is_empty() {
                anyhow::bail!("Scenario '{}' has no steps", scenario.name);
            }
            for (index, step) in scenario.steps.iter().enumerate() {
                step.validate(&scenario.name, index)?;
            }
        }

        Ok(())
    }

    /// Register every scenario with the runner. Nothing is registered when
    /// any scenario collides with one the runner already holds.
    pub fn register(&self, runner: &mut PipelinesRunner) -> Result<()> {
        self.validate()?;

        if let Some(taken) = self
            .scenarios
            .iter()
            .find(|s| runner.registry().get(&s.group, &s.name).is_some())
        {
            return Err(RegistryError::DuplicateScenario {
                group: taken.group.clone(),
                scenario: taken.name.clone(),
            }
            .into());
        }

        for scenario in &self.scenarios {
            let Some((first, rest)) = scenario.steps.split_first() else {
                continue;
            };
            let first = first.clone();
            let rest: Arc<[StepConfig]> = rest.into();
            runner.add_pipeline(&scenario.group, &scenario.name, &scenario.platforms, move |bag| {
                build_pipeline(&first, &rest, bag)
            })?;
        }

        Ok(())
    }

    /// Total number of steps across all scenarios
    pub fn step_count(&self) -> usize {
        self.scenarios.iter().map(|s| s.steps.len()).sum()
    }
}
