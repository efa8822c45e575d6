pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::cli::LocalStorage;

pub use core::engine::{PrepEngine, PrepPipeline};
pub use domain::model::{FileInput, FileOutcome, FileStatus};
pub use utils::error::{PrepError, Result};
