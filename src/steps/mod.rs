//! Built-in steps: sample generation, external commands, profiling,
//! artifact collection and cleanup

pub mod artifact;
pub mod cleanup;
pub mod command;
pub mod error;
pub mod generate;
pub mod move_files;
pub mod process;
pub mod profile;

pub use cleanup::CleanupDisposable;
pub use command::CommandStep;
pub use error::ProcessError;
pub use generate::GenerateProject;
pub use move_files::MoveFiles;
pub use process::{ProcessOutput, ProcessRunner};
pub use profile::{ProfileStep, Profiler};
