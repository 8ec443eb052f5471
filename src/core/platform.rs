//! Host platform descriptor

use serde::{Deserialize, Serialize};
use std::fmt;

/// Operating system family a scenario can run on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Windows,
    Linux,
    #[serde(alias = "osx", alias = "darwin")]
    MacOs,
    FreeBsd,
    /// Any host outside the families above; no scenario supports it
    #[serde(skip_deserializing)]
    Other,
}

impl Platform {
    /// The platform this binary was compiled for
    pub fn current() -> Platform {
        if cfg!(target_os = "windows") {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::MacOs
        } else if cfg!(target_os = "freebsd") {
            Platform::FreeBsd
        } else if cfg!(target_os = "linux") {
            Platform::Linux
        } else {
            Platform::Other
        }
    }

    /// Every platform a scenario can declare
    pub fn all() -> Vec<Platform> {
        vec![
            Platform::Windows,
            Platform::Linux,
            Platform::MacOs,
            Platform::FreeBsd,
        ]
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Platform::Windows => "windows",
            Platform::Linux => "linux",
            Platform::MacOs => "macos",
            Platform::FreeBsd => "freebsd",
            Platform::Other => "other",
        };
        f.write_str(name)
    }
}
