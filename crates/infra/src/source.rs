//! Export data loading.
//!
//! Export data is read fresh for every export so archives reflect the plan's
//! current state. Every lookup is scoped by workspace: a plan outside the
//! requesting workspace reads as missing.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use thiserror::Error;
use tokio::sync::RwLock;

use tasknator_core::{RepairPlanId, WorkspaceId};
use tasknator_export::{ExportAsset, ExportData, ExportTask};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait ExportSource: Send + Sync {
    /// Load a plan with its business profile, tasks and assets.
    /// `None` when the plan does not exist in the workspace.
    async fn load(
        &self,
        workspace_id: &WorkspaceId,
        repair_plan_id: &RepairPlanId,
    ) -> Result<Option<ExportData>, SourceError>;
}

/// Reads the application's plan tables.
///
/// Tasks and assets come back in creation order, which is the plan order
/// shown to users.
#[derive(Debug, Clone)]
pub struct PostgresExportSource {
    pool: PgPool,
}

impl PostgresExportSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ExportSource for PostgresExportSource {
    async fn load(
        &self,
        workspace_id: &WorkspaceId,
        repair_plan_id: &RepairPlanId,
    ) -> Result<Option<ExportData>, SourceError> {
        let Some(plan) = sqlx::query(
            r#"
            SELECT
                rp."title" AS plan_title,
                rp."summary" AS plan_summary,
                bp."name" AS business_name,
                bp."industry" AS industry
            FROM "RepairPlan" rp
            JOIN "BusinessProfile" bp ON bp."id" = rp."businessProfileId"
            WHERE rp."id" = $1 AND bp."workspaceId" = $2
            "#,
        )
        .bind(repair_plan_id.as_str())
        .bind(workspace_id.as_str())
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };

        let tasks = sqlx::query(
            r#"
            SELECT
                "phase"::text AS phase,
                "title",
                "description",
                "impact"::text AS impact,
                "timeEstimate" AS time_estimate
            FROM "PlanTask"
            WHERE "repairPlanId" = $1
            ORDER BY "createdAt", "id"
            "#,
        )
        .bind(repair_plan_id.as_str())
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(|row| -> Result<ExportTask, sqlx::Error> {
            Ok(ExportTask {
                phase: row.try_get("phase")?,
                title: row.try_get("title")?,
                description: optional_text(&row, "description")?,
                impact: optional_text(&row, "impact")?,
                time_estimate: optional_text(&row, "time_estimate")?,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

        let assets = sqlx::query(
            r#"
            SELECT "type"::text AS asset_type, "title", "content"
            FROM "Asset"
            WHERE "repairPlanId" = $1
            ORDER BY "createdAt", "id"
            "#,
        )
        .bind(repair_plan_id.as_str())
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(|row| -> Result<ExportAsset, sqlx::Error> {
            Ok(ExportAsset {
                asset_type: row.try_get("asset_type")?,
                title: row.try_get("title")?,
                content: optional_text(&row, "content")?,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(ExportData {
            plan_title: plan.try_get("plan_title")?,
            plan_summary: optional_text(&plan, "plan_summary")?,
            business_name: plan.try_get("business_name")?,
            industry: optional_text(&plan, "industry")?,
            tasks,
            assets,
        }))
    }
}

fn optional_text(row: &sqlx::postgres::PgRow, column: &str) -> Result<String, sqlx::Error> {
    Ok(row.try_get::<Option<String>, _>(column)?.unwrap_or_default())
}

/// Export data held in memory, keyed by workspace and plan (tests/dev).
#[derive(Debug, Default)]
pub struct InMemoryExportSource {
    plans: RwLock<HashMap<(WorkspaceId, RepairPlanId), ExportData>>,
}

impl InMemoryExportSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(
        &self,
        workspace_id: WorkspaceId,
        repair_plan_id: RepairPlanId,
        data: ExportData,
    ) {
        self.plans
            .write()
            .await
            .insert((workspace_id, repair_plan_id), data);
    }
}

#[async_trait]
impl ExportSource for InMemoryExportSource {
    async fn load(
        &self,
        workspace_id: &WorkspaceId,
        repair_plan_id: &RepairPlanId,
    ) -> Result<Option<ExportData>, SourceError> {
        Ok(self
            .plans
            .read()
            .await
            .get(&(workspace_id.clone(), repair_plan_id.clone()))
            .cloned())
    }
}
