pub mod apply;
pub mod engine;
pub mod format;
pub mod parser;
pub mod plan;
pub mod profile;

pub use crate::domain::model::{
    DataProfile, FileFormat, FileInput, FileOutcome, FileStatus, Record, Table, Transform,
    TransformPlan,
};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
