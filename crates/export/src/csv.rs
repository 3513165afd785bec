//! Tasks CSV rendering, used for `csv` exports.

use crate::data::ExportData;

const HEADER: [&str; 5] = ["phase", "title", "description", "impact", "timeEstimate"];

/// Render the plan's tasks as RFC 4180 CSV (CRLF line endings).
///
/// Rows follow the same phase ordering as `plan.md`, so tasks with unknown
/// phase tags are left out here too.
pub fn render_tasks_csv(data: &ExportData) -> String {
    let mut out = String::new();
    push_row(&mut out, HEADER);

    for (phase, task) in data.phased_tasks() {
        push_row(
            &mut out,
            [
                phase.tag(),
                task.title.as_str(),
                task.description.as_str(),
                task.impact.as_str(),
                task.time_estimate.as_str(),
            ],
        );
    }

    out
}

fn push_row<'a>(out: &mut String, fields: impl IntoIterator<Item = &'a str>) {
    for (i, field) in fields.into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        push_field(out, field);
    }
    out.push_str("\r\n");
}

fn push_field(out: &mut String, field: &str) {
    if field.contains([',', '"', '\n', '\r']) {
        out.push('"');
        out.push_str(&field.replace('"', "\"\""));
        out.push('"');
    } else {
        out.push_str(field);
    }
}
