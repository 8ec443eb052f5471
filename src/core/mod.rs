//! Core domain models
//!
//! This module defines the parameter bag, steps, pipelines and the
//! configuration that describes scenario catalogs.

pub mod bag;
pub mod config;
pub mod pipeline;
pub mod platform;
pub mod state;
pub mod step;

pub use bag::*;
pub use config::CatalogConfig;
pub use pipeline::*;
pub use platform::*;
pub use state::*;
pub use step::*;
