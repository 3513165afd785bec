//! Export input model.
//!
//! Built fresh from current plan state for every export request and consumed
//! once by the assembler.

use serde::{Deserialize, Serialize};

/// Everything needed to render one plan export.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportData {
    pub plan_title: String,
    pub plan_summary: String,
    pub business_name: String,
    pub industry: String,
    /// Tasks in plan order.
    pub tasks: Vec<ExportTask>,
    /// Assets in plan order.
    pub assets: Vec<ExportAsset>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportTask {
    /// Phase tag (`DAY_30`, `DAY_60`, `DAY_90`). Other tags are not rendered.
    pub phase: String,
    pub title: String,
    pub description: String,
    pub impact: String,
    pub time_estimate: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportAsset {
    /// Type tag, e.g. `AD_COPY`.
    #[serde(rename = "type")]
    pub asset_type: String,
    pub title: String,
    pub content: String,
}

/// Plan time horizons, in rendering order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Day30,
    Day60,
    Day90,
}

impl Phase {
    pub const ORDERED: [Phase; 3] = [Phase::Day30, Phase::Day60, Phase::Day90];

    pub fn tag(&self) -> &'static str {
        match self {
            Phase::Day30 => "DAY_30",
            Phase::Day60 => "DAY_60",
            Phase::Day90 => "DAY_90",
        }
    }

    /// Heading label: the tag with underscores replaced by spaces.
    pub fn label(&self) -> String {
        self.tag().replace('_', " ")
    }

    pub fn from_tag(tag: &str) -> Option<Phase> {
        Phase::ORDERED.into_iter().find(|p| p.tag() == tag)
    }
}

impl ExportData {
    /// Tasks of one phase, in input order.
    pub fn tasks_in(&self, phase: Phase) -> impl Iterator<Item = &ExportTask> {
        self.tasks.iter().filter(move |t| t.phase == phase.tag())
    }

    /// Tasks grouped by phase in rendering order; unknown phase tags are dropped.
    pub fn phased_tasks(&self) -> impl Iterator<Item = (Phase, &ExportTask)> {
        Phase::ORDERED
            .into_iter()
            .flat_map(move |phase| self.tasks_in(phase).map(move |t| (phase, t)))
    }

    /// Number of tasks whose phase tag is not recognized.
    pub fn unphased_task_count(&self) -> usize {
        self.tasks
            .iter()
            .filter(|t| Phase::from_tag(&t.phase).is_none())
            .count()
    }
}
