//! Job data contracts: the payload shapes shared by producers and workers.
//!
//! Field names are camelCase on the wire. Every identifier is required and
//! validated on decode, so a partially addressed job cannot be built.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use tasknator_core::{AuditRunId, BusinessProfileId, DomainError, RepairPlanId, WorkspaceId};

use crate::types::JobKind;

/// A typed job payload bound to exactly one job kind.
pub trait JobData: Serialize + DeserializeOwned + Send + Sync + 'static {
    const KIND: JobKind;

    /// Workspace the job runs on behalf of.
    fn workspace_id(&self) -> &WorkspaceId;
}

/// Payload of an `audit` job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AuditJobData {
    pub audit_run_id: AuditRunId,
    pub business_profile_id: BusinessProfileId,
    pub workspace_id: WorkspaceId,
}

/// Payload of a `plan` job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PlanJobData {
    pub audit_run_id: AuditRunId,
    pub business_profile_id: BusinessProfileId,
    pub workspace_id: WorkspaceId,
}

/// Payload of an `asset` job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AssetJobData {
    pub repair_plan_id: RepairPlanId,
    /// Asset type tag, e.g. `AD_COPY` or `SOCIAL_POST`.
    pub asset_type: String,
    pub business_profile_id: BusinessProfileId,
    pub workspace_id: WorkspaceId,
}

/// Payload of an `export` job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ExportJobData {
    pub repair_plan_id: RepairPlanId,
    pub format: ExportFormat,
    pub workspace_id: WorkspaceId,
}

impl JobData for AuditJobData {
    const KIND: JobKind = JobKind::Audit;

    fn workspace_id(&self) -> &WorkspaceId {
        &self.workspace_id
    }
}

impl JobData for PlanJobData {
    const KIND: JobKind = JobKind::Plan;

    fn workspace_id(&self) -> &WorkspaceId {
        &self.workspace_id
    }
}

impl JobData for AssetJobData {
    const KIND: JobKind = JobKind::Asset;

    fn workspace_id(&self) -> &WorkspaceId {
        &self.workspace_id
    }
}

impl JobData for ExportJobData {
    const KIND: JobKind = JobKind::Export;

    fn workspace_id(&self) -> &WorkspaceId {
        &self.workspace_id
    }
}

/// Requested export format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Pdf,
    Zip,
    Csv,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Zip => "zip",
            ExportFormat::Csv => "csv",
        }
    }

    pub fn extension(&self) -> &'static str {
        self.as_str()
    }

    /// Whether the export worker can render this format. `pdf` is part of the
    /// payload contract but has no renderer.
    pub fn is_renderable(&self) -> bool {
        !matches!(self, ExportFormat::Pdf)
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Zip => "application/zip",
            ExportFormat::Csv => "text/csv; charset=utf-8",
        }
    }
}

impl core::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for ExportFormat {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pdf" => Ok(ExportFormat::Pdf),
            "zip" => Ok(ExportFormat::Zip),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(DomainError::validation(format!(
                "unknown export format `{other}` (expected one of: pdf, zip, csv)"
            ))),
        }
    }
}
