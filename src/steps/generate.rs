//! Sample test project generator

use crate::core::{
    bag::{keys, ParameterBag},
    state::StepOutcome,
    step::{Step, StepError},
};
use async_trait::async_trait;
use std::fmt::Write as _;
use std::path::PathBuf;
use tokio::fs;
use tracing::info;
use uuid::Uuid;

/// Crate name of the generated project
pub const SAMPLE_CRATE: &str = "perf_scenario";

/// Generates a cargo project holding `classes` test modules with
/// `methods_per_class` tests each.
///
/// The project lands in a fresh directory under `root` (the system temp dir
/// by default) which is registered for the cleanup step.
#[derive(Debug, Clone)]
pub struct GenerateProject {
    classes: usize,
    methods_per_class: usize,
    root: Option<PathBuf>,
}

impl GenerateProject {
    pub fn new(classes: usize, methods_per_class: usize) -> Self {
        Self {
            classes,
            methods_per_class,
            root: None,
        }
    }

    /// Generate under `root` instead of the system temp dir
    pub fn in_dir(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    fn manifest() -> String {
        format!(
            r#"[package]
name = "{SAMPLE_CRATE}"
version = "0.1.0"
edition = "2021"
publish = false

[[test]]
name = "generated"
path = "tests/generated.rs"

[workspace]
"#
        )
    }

    fn test_source(&self) -> String {
        let mut source = String::new();
        for class in 0..self.classes {
            let _ = writeln!(source, "mod class_{class} {{");
            for method in 0..self.methods_per_class {
                let _ = writeln!(source, "    #[test]");
                let _ = writeln!(source, "    fn test_method_{method}() {{");
                let _ = writeln!(
                    source,
                    "        assert_eq!({SAMPLE_CRATE}::identity({method}), {method});"
                );
                let _ = writeln!(source, "    }}");
            }
            let _ = writeln!(source, "}}");
        }
        source
    }
}

#[async_trait]
impl Step for GenerateProject {
    fn name(&self) -> &str {
        "generate"
    }

    async fn execute(&mut self, bag: &mut ParameterBag) -> Result<StepOutcome, StepError> {
        if self.classes == 0 || self.methods_per_class == 0 {
            return Ok(StepOutcome::failure(
                "Sample project needs at least one class and one method",
            ));
        }

        let label = bag.scenario().unwrap_or("scenario").to_string();
        let root = self.root.clone().unwrap_or_else(std::env::temp_dir);
        let project_dir = root.join(format!("perf-runner-{}-{}", label, Uuid::new_v4().simple()));

        // Register before writing so a half-written project is still cleaned up
        bag.push_path(keys::DISPOSABLES, project_dir.clone())?;

        fs::create_dir_all(project_dir.join("src")).await?;
        fs::create_dir_all(project_dir.join("tests")).await?;
        fs::write(project_dir.join("Cargo.toml"), Self::manifest()).await?;
        fs::write(
            project_dir.join("src").join("lib.rs"),
            "pub fn identity(value: u64) -> u64 {\n    value\n}\n",
        )
        .await?;
        fs::write(
            project_dir.join("tests").join("generated.rs"),
            self.test_source(),
        )
        .await?;

        let total = self.classes * self.methods_per_class;
        info!("Generated {} tests in {}", total, project_dir.display());

        bag.set(keys::PROJECT_DIR, project_dir.clone());
        bag.set(keys::WORKING_DIR, project_dir.clone());

        Ok(StepOutcome::success(format!(
            "Generated {} test modules x {} tests in {}",
            self.classes,
            self.methods_per_class,
            project_dir.display()
        )))
    }
}
