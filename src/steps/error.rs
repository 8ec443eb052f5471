//! Process invocation errors

use thiserror::Error;

/// Error types for external process invocations
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("Failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{program}' timed out after {secs} seconds")]
    Timeout { program: String, secs: u64 },

    #[error("'{program}' exited with code {code}: {stderr}")]
    ExitCode {
        program: String,
        code: i32,
        stderr: String,
    },
}
