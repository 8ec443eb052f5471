//! Parameter bag - shared state passed between the steps of one pipeline run

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;

/// Well-known keys written and read by the built-in steps
pub mod keys {
    /// Name of the scenario being run (seeded by the runner)
    pub const SCENARIO: &str = "scenario";
    /// Directory collected artifacts are moved into (seeded by the runner)
    pub const RESULTS_DIR: &str = "results_dir";
    /// Root of the generated sample project
    pub const PROJECT_DIR: &str = "project_dir";
    /// Directory in which process steps run
    pub const WORKING_DIR: &str = "working_dir";
    /// Binary produced by the build step
    pub const TARGET_BINARY: &str = "target_binary";
    /// Files produced by profiling steps
    pub const ARTIFACTS: &str = "artifacts";
    /// Temporary paths removed by the cleanup step
    pub const DISPOSABLES: &str = "disposables";
}

/// Errors raised when reading the bag
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BagError {
    #[error("Parameter '{0}' was never set")]
    KeyNotFound(String),

    #[error("Parameter '{key}' holds {found}, expected {expected}")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        found: &'static str,
    },
}

/// A value stored in the bag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum BagValue {
    Text(String),
    Integer(i64),
    Flag(bool),
    Path(PathBuf),
    Paths(Vec<PathBuf>),
}

impl BagValue {
    fn kind(&self) -> &'static str {
        match self {
            BagValue::Text(_) => "text",
            BagValue::Integer(_) => "integer",
            BagValue::Flag(_) => "flag",
            BagValue::Path(_) => "path",
            BagValue::Paths(_) => "paths",
        }
    }
}

impl fmt::Display for BagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BagValue::Text(s) => f.write_str(s),
            BagValue::Integer(i) => write!(f, "{}", i),
            BagValue::Flag(b) => write!(f, "{}", b),
            BagValue::Path(p) => write!(f, "{}", p.display()),
            BagValue::Paths(paths) => {
                let joined: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();
                f.write_str(&joined.join(" "))
            }
        }
    }
}

impl From<&str> for BagValue {
    fn from(value: &str) -> Self {
        BagValue::Text(value.to_string())
    }
}

impl From<String> for BagValue {
    fn from(value: String) -> Self {
        BagValue::Text(value)
    }
}

impl From<i64> for BagValue {
    fn from(value: i64) -> Self {
        BagValue::Integer(value)
    }
}

impl From<bool> for BagValue {
    fn from(value: bool) -> Self {
        BagValue::Flag(value)
    }
}

impl From<PathBuf> for BagValue {
    fn from(value: PathBuf) -> Self {
        BagValue::Path(value)
    }
}

impl From<&Path> for BagValue {
    fn from(value: &Path) -> Self {
        BagValue::Path(value.to_path_buf())
    }
}

impl From<Vec<PathBuf>> for BagValue {
    fn from(value: Vec<PathBuf>) -> Self {
        BagValue::Paths(value)
    }
}

/// Shared key/value context for a single pipeline run.
///
/// Entries keep their insertion order. There is intentionally no removal:
/// a value written by one step stays readable by every later step of the
/// same run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParameterBag {
    values: IndexMap<String, BagValue>,
}

impl ParameterBag {
    /// Create a new empty bag
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<BagValue>) {
        self.values.insert(key.into(), value.into());
    }

    /// Get a value, failing if the key was never set
    pub fn get(&self, key: &str) -> Result<&BagValue, BagError> {
        self.values
            .get(key)
            .ok_or_else(|| BagError::KeyNotFound(key.to_string()))
    }

    /// Get a value if present
    pub fn try_get(&self, key: &str) -> Option<&BagValue> {
        self.values.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Keys in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get_text(&self, key: &str) -> Result<&str, BagError> {
        match self.get(key)? {
            BagValue::Text(s) => Ok(s),
            other => Err(mismatch(key, "text", other)),
        }
    }

    pub fn get_integer(&self, key: &str) -> Result<i64, BagError> {
        match self.get(key)? {
            BagValue::Integer(i) => Ok(*i),
            other => Err(mismatch(key, "integer", other)),
        }
    }

    pub fn get_flag(&self, key: &str) -> Result<bool, BagError> {
        match self.get(key)? {
            BagValue::Flag(b) => Ok(*b),
            other => Err(mismatch(key, "flag", other)),
        }
    }

    pub fn get_path(&self, key: &str) -> Result<&Path, BagError> {
        match self.get(key)? {
            BagValue::Path(p) => Ok(p),
            other => Err(mismatch(key, "path", other)),
        }
    }

    /// Get a list of paths. A single `Path` value reads as a one-element list.
    pub fn get_paths(&self, key: &str) -> Result<Vec<PathBuf>, BagError> {
        match self.get(key)? {
            BagValue::Paths(paths) => Ok(paths.clone()),
            BagValue::Path(p) => Ok(vec![p.clone()]),
            other => Err(mismatch(key, "paths", other)),
        }
    }

    /// Append a path to a `Paths` entry, creating the entry if absent
    pub fn push_path(&mut self, key: &str, path: impl Into<PathBuf>) -> Result<(), BagError> {
        let path = path.into();
        match self.values.get_mut(key) {
            None => {
                self.values.insert(key.to_string(), BagValue::Paths(vec![path]));
                Ok(())
            }
            Some(BagValue::Paths(paths)) => {
                paths.push(path);
                Ok(())
            }
            Some(BagValue::Path(existing)) => {
                let first = existing.clone();
                self.values
                    .insert(key.to_string(), BagValue::Paths(vec![first, path]));
                Ok(())
            }
            Some(other) => Err(mismatch(key, "paths", other)),
        }
    }

    /// Replace `{{ key }}` placeholders with the textual form of bag values
    pub fn render(&self, template: &str) -> Result<String, BagError> {
        let re = placeholder_regex();
        let mut rendered = String::with_capacity(template.len());
        let mut last = 0;

        for caps in re.captures_iter(template) {
            let (Some(whole), Some(key)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            rendered.push_str(&template[last..whole.start()]);
            rendered.push_str(&self.get(key.as_str())?.to_string());
            last = whole.end();
        }
        rendered.push_str(&template[last..]);

        Ok(rendered)
    }

    // Typed accessors for well-known keys

    pub fn scenario(&self) -> Result<&str, BagError> {
        self.get_text(keys::SCENARIO)
    }

    pub fn results_dir(&self) -> Result<&Path, BagError> {
        self.get_path(keys::RESULTS_DIR)
    }

    pub fn project_dir(&self) -> Result<&Path, BagError> {
        self.get_path(keys::PROJECT_DIR)
    }

    pub fn working_dir(&self) -> Result<&Path, BagError> {
        self.get_path(keys::WORKING_DIR)
    }

    pub fn target_binary(&self) -> Result<&Path, BagError> {
        self.get_path(keys::TARGET_BINARY)
    }
}

fn mismatch(key: &str, expected: &'static str, found: &BagValue) -> BagError {
    BagError::TypeMismatch {
        key: key.to_string(),
        expected,
        found: found.kind(),
    }
}

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\{\{\s*([A-Za-z0-9_.\-]+)\s*\}\}").expect("placeholder regex is valid")
    })
}
