//! `plan.md` rendering.

use std::fmt::Write as _;

use crate::data::{ExportData, Phase};

/// Render the plan document.
///
/// Phases always appear as DAY_30, DAY_60, DAY_90 regardless of task order;
/// empty phases get no heading and tasks with unknown phase tags are skipped.
pub fn render_plan_markdown(data: &ExportData) -> String {
    let mut md = String::new();

    // Writing to a String cannot fail.
    let _ = writeln!(md, "# {}", data.plan_title);
    md.push('\n');
    let _ = writeln!(md, "> {}", data.plan_summary);
    md.push('\n');
    let _ = writeln!(md, "**Business:** {}", data.business_name);
    let _ = writeln!(md, "**Industry:** {}", data.industry);
    md.push('\n');
    md.push_str("---\n");

    for phase in Phase::ORDERED {
        let mut tasks = data.tasks_in(phase).peekable();
        if tasks.peek().is_none() {
            continue;
        }

        md.push('\n');
        let _ = writeln!(md, "## {}", phase.label());

        for task in tasks {
            md.push('\n');
            let _ = writeln!(md, "### {}", task.title);
            let _ = writeln!(md, "- **Impact:** {}", task.impact);
            let _ = writeln!(md, "- **Estimated Time:** {}", task.time_estimate);
            let _ = writeln!(md, "- **Description:** {}", task.description);
        }
    }

    md
}
