use crate::core::{apply, format, parser, plan, profile};
use crate::domain::model::{
    DataProfile, FileFormat, FileInput, FileOutcome, FileStatus, Table, TransformPlan,
};
use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
use crate::utils::error::{PrepError, Result};
#[cfg(feature = "cli")]
use crate::utils::monitor::BatchMonitor;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Production pipeline: detect + parse, profile + plan, optionally apply the
/// plan and export CSV through the storage port.
pub struct PrepPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
}

impl<S: Storage, C: ConfigProvider> PrepPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self { storage, config }
    }
}

#[async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for PrepPipeline<S, C> {
    async fn extract(&self, input: &FileInput) -> Result<Table> {
        let detected = format::detect(&input.name, &input.mime);
        tracing::debug!("'{}' detected as {}", input.name, detected);
        if detected == FileFormat::Unknown {
            return Err(PrepError::UnsupportedFormat {
                format: format!("unknown ('{}')", input.name),
            });
        }
        parser::parse_file(detected, input)
    }

    async fn analyze(
        &self,
        table: &Table,
        input: &FileInput,
    ) -> Result<(DataProfile, TransformPlan)> {
        let detected = format::detect(&input.name, &input.mime);
        let profile = profile::build_profile(
            table,
            input.bytes.len(),
            detected,
            self.config.sample_rows(),
        );
        let plan = plan::build_plan(table);
        Ok((profile, plan))
    }

    async fn load(
        &self,
        table: Table,
        plan: &TransformPlan,
        file_name: &str,
    ) -> Result<Option<String>> {
        if !self.config.apply_plan() {
            return Ok(None);
        }

        let cleaned = apply::apply_plan(&table, plan)?;
        let csv = apply::to_csv(&cleaned);
        let output_name = format!("{}_clean.csv", file_stem(file_name));
        self.storage
            .write_file(&output_name, csv.as_bytes())
            .await?;
        Ok(Some(format!(
            "{}/{}",
            self.config.output_path(),
            output_name
        )))
    }
}

fn file_stem(name: &str) -> String {
    Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output")
        .to_string()
}

/// Batch driver: one task per file, capped by a semaphore, results collected
/// once every task finishes. Files share nothing, so one failing file never
/// blocks or cancels the rest.
pub struct PrepEngine<P: Pipeline> {
    pipeline: Arc<P>,
    concurrency: usize,
    #[cfg(feature = "cli")]
    monitor: Option<BatchMonitor>,
}

impl<P: Pipeline + 'static> PrepEngine<P> {
    pub fn new(pipeline: P, concurrency: usize) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            concurrency,
            #[cfg(feature = "cli")]
            monitor: None,
        }
    }

    #[cfg(feature = "cli")]
    pub fn new_with_monitoring(pipeline: P, concurrency: usize, monitor_enabled: bool) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            concurrency,
            monitor: monitor_enabled.then(|| BatchMonitor::new(true)),
        }
    }

    pub async fn run(&self, inputs: Vec<FileInput>) -> Vec<FileOutcome> {
        let total = inputs.len();
        tracing::info!("Processing {} file(s)", total);

        let semaphore = Arc::new(Semaphore::new(self.concurrency.max(1)));
        let mut workers = JoinSet::new();

        for (index, input) in inputs.into_iter().enumerate() {
            let pipeline = Arc::clone(&self.pipeline);
            let semaphore = Arc::clone(&semaphore);
            workers.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                (index, process_file(pipeline.as_ref(), input).await)
            });
        }

        let mut outcomes: Vec<Option<FileOutcome>> = (0..total).map(|_| None).collect();
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok((index, outcome)) => outcomes[index] = Some(outcome),
                Err(e) => tracing::error!("File worker crashed: {}", e),
            }
        }

        #[cfg(feature = "cli")]
        if let Some(monitor) = &self.monitor {
            monitor.log_phase("Batch complete");
        }

        outcomes.into_iter().flatten().collect()
    }
}

async fn process_file<P: Pipeline>(pipeline: &P, input: FileInput) -> FileOutcome {
    let file = input.name.clone();
    match run_stages(pipeline, &input).await {
        Ok((profile, plan, output_path)) => {
            tracing::info!(
                "✅ {}: {} rows, {} columns, {} transforms planned",
                file,
                profile.row_count,
                profile.column_count,
                plan.stats.transform_count
            );
            FileOutcome {
                file,
                status: FileStatus::Completed {
                    profile,
                    plan,
                    output_path,
                },
            }
        }
        Err(e) => {
            tracing::warn!("❌ {}: {}", file, e);
            FileOutcome {
                file,
                status: FileStatus::Error {
                    message: e.user_friendly_message(),
                },
            }
        }
    }
}

async fn run_stages<P: Pipeline>(
    pipeline: &P,
    input: &FileInput,
) -> Result<(DataProfile, TransformPlan, Option<String>)> {
    let table = pipeline.extract(input).await?;
    let (profile, plan) = pipeline.analyze(&table, input).await?;
    let output_path = pipeline.load(table, &plan, &input.name).await?;
    Ok((profile, plan, output_path))
}
