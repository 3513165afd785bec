//! Export job handler: load plan data, render the requested format, store it.
//!
//! Nothing is written to storage unless rendering succeeded in full. Any
//! error fails the job attempt and the queue's retry policy takes over.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, instrument};

use tasknator_core::{RepairPlanId, WorkspaceId};
use tasknator_export::{ExportData, ExportError, build_archive, render_tasks_csv};
use tasknator_jobs::{ExportFormat, ExportJobData, HandlerResult, Job, JobHandler, QueueError};

use crate::source::{ExportSource, SourceError};
use crate::storage::{ObjectStorage, StorageError};

#[derive(Debug, Error)]
pub enum ExportJobError {
    #[error("invalid export payload: {0}")]
    Payload(#[from] QueueError),

    #[error("repair plan {repair_plan_id} not found in workspace {workspace_id}")]
    PlanNotFound {
        workspace_id: WorkspaceId,
        repair_plan_id: RepairPlanId,
    },

    #[error("export format `{0}` is not supported by the export worker")]
    UnsupportedFormat(ExportFormat),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("export assembly failed: {0}")]
    Assembly(#[from] ExportError),

    #[error("failed to store export: {0}")]
    Storage(#[from] StorageError),
}

/// Where a finished export was stored. Recorded as the job's return value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportArtifact {
    pub key: String,
    pub url: String,
    pub format: ExportFormat,
    pub content_type: String,
    pub size: usize,
}

/// `exports/<workspaceId>/<repairPlanId>.<ext>`
pub fn export_object_key(data: &ExportJobData) -> String {
    format!(
        "exports/{}/{}.{}",
        data.workspace_id,
        data.repair_plan_id,
        data.format.extension()
    )
}

/// Render export data in the requested format.
pub fn render_export(format: ExportFormat, data: &ExportData) -> Result<Vec<u8>, ExportJobError> {
    match format {
        ExportFormat::Zip => Ok(build_archive(data)?),
        ExportFormat::Csv => Ok(render_tasks_csv(data).into_bytes()),
        ExportFormat::Pdf => Err(ExportJobError::UnsupportedFormat(format)),
    }
}

pub struct ExportJobRunner {
    source: Arc<dyn ExportSource>,
    storage: Arc<dyn ObjectStorage>,
}

impl ExportJobRunner {
    pub fn new(source: Arc<dyn ExportSource>, storage: Arc<dyn ObjectStorage>) -> Self {
        Self { source, storage }
    }

    #[instrument(
        skip(self, data),
        fields(
            workspace_id = %data.workspace_id,
            repair_plan_id = %data.repair_plan_id,
            format = %data.format
        ),
        err
    )]
    pub async fn run(&self, data: &ExportJobData) -> Result<ExportArtifact, ExportJobError> {
        // Fail fast before touching the database.
        if !data.format.is_renderable() {
            return Err(ExportJobError::UnsupportedFormat(data.format));
        }

        let export = self
            .source
            .load(&data.workspace_id, &data.repair_plan_id)
            .await?
            .ok_or_else(|| ExportJobError::PlanNotFound {
                workspace_id: data.workspace_id.clone(),
                repair_plan_id: data.repair_plan_id.clone(),
            })?;

        let bytes = render_export(data.format, &export)?;
        let size = bytes.len();
        let key = export_object_key(data);
        let content_type = data.format.content_type();

        let url = self.storage.put(&key, bytes, content_type).await?;
        info!(key = %key, size, "export stored");

        Ok(ExportArtifact {
            key,
            url,
            format: data.format,
            content_type: content_type.to_string(),
            size,
        })
    }
}

#[async_trait]
impl JobHandler for ExportJobRunner {
    async fn handle(&self, job: &Job) -> HandlerResult {
        let data: ExportJobData = job.data()?;
        let artifact = self.run(&data).await?;
        Ok(Some(serde_json::to_value(&artifact)?))
    }
}
