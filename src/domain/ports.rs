use crate::domain::model::{DataProfile, FileInput, Table, TransformPlan};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn output_path(&self) -> &str;
    fn concurrent_files(&self) -> usize;
    fn sample_rows(&self) -> usize;
    fn apply_plan(&self) -> bool;
}

/// Per-file processing stages: parse, profile + plan, optionally apply + export.
#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self, input: &FileInput) -> Result<Table>;
    async fn analyze(
        &self,
        table: &Table,
        input: &FileInput,
    ) -> Result<(DataProfile, TransformPlan)>;
    async fn load(
        &self,
        table: Table,
        plan: &TransformPlan,
        file_name: &str,
    ) -> Result<Option<String>>;
}
