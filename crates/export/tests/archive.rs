use std::io::{Cursor, Read};

use proptest::prelude::*;
use tasknator_export::{
    ExportAsset, ExportData, ExportTask, build_archive, render_plan_markdown, render_tasks_csv,
};
use zip::ZipArchive;

fn task(phase: &str, title: &str) -> ExportTask {
    ExportTask {
        phase: phase.to_string(),
        title: title.to_string(),
        description: format!("Do {title}"),
        impact: "High".to_string(),
        time_estimate: "2h".to_string(),
    }
}

fn asset(asset_type: &str, title: &str, content: &str) -> ExportAsset {
    ExportAsset {
        asset_type: asset_type.to_string(),
        title: title.to_string(),
        content: content.to_string(),
    }
}

fn fix_it_plan() -> ExportData {
    ExportData {
        plan_title: "Fix It".to_string(),
        plan_summary: "Quick wins for the storefront".to_string(),
        business_name: "Acme".to_string(),
        industry: "Retail".to_string(),
        tasks: vec![
            task("DAY_60", "Launch newsletter"),
            task("DAY_30", "Update hours"),
        ],
        assets: vec![
            asset("SOCIAL_POST", "Post", "Hello world"),
            asset("AD_COPY", "Ads", "headline,body\r\nBuy,Now\r\n"),
        ],
    }
}

fn entries(bytes: &[u8]) -> Vec<(String, String)> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).expect("valid zip");
    (0..archive.len())
        .map(|i| {
            let mut file = archive.by_index(i).expect("entry");
            let mut content = String::new();
            file.read_to_string(&mut content).expect("utf-8 entry");
            (file.name().to_string(), content)
        })
        .collect()
}

#[test]
fn archive_contains_plan_assets_and_summary_in_order() {
    let data = fix_it_plan();
    let bytes = build_archive(&data).unwrap();
    let files = entries(&bytes);

    let names: Vec<&str> = files.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "plan.md",
            "assets/social_post.md",
            "assets/ad_copy.csv",
            "summary.txt"
        ]
    );

    assert_eq!(files[0].1, render_plan_markdown(&data));
    assert!(files[0].1.starts_with("# Fix It\n"));
    let day30 = files[0].1.find("## DAY 30").unwrap();
    let day60 = files[0].1.find("## DAY 60").unwrap();
    assert!(day30 < day60);

    assert_eq!(files[1].1, "Hello world");
    assert_eq!(files[2].1, "headline,body\r\nBuy,Now\r\n");
    assert!(files[3].1.contains("Plan: Fix It"));
    assert!(files[3].1.contains("assets/ad_copy.csv"));
}

#[test]
fn identical_input_gives_identical_bytes() {
    let data = fix_it_plan();
    assert_eq!(build_archive(&data).unwrap(), build_archive(&data).unwrap());
}

#[test]
fn entries_are_deflated() {
    let mut data = fix_it_plan();
    data.assets = vec![asset("BLOG_POST", "Long", &"lorem ipsum ".repeat(500))];
    let bytes = build_archive(&data).unwrap();

    let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    let file = archive.by_name("assets/blog_post.md").unwrap();
    assert_eq!(file.compression(), zip::CompressionMethod::Deflated);
    assert!(file.compressed_size() < file.size());
}

#[test]
fn empty_plan_still_produces_all_fixed_files() {
    let bytes = build_archive(&ExportData::default()).unwrap();
    let names: Vec<String> = entries(&bytes).into_iter().map(|(n, _)| n).collect();

    assert_eq!(names, vec!["plan.md", "summary.txt"]);
}

#[test]
fn irregular_asset_types_map_to_safe_names() {
    let mut data = fix_it_plan();
    data.assets = vec![
        asset("Website Copy!", "Site", "copy"),
        asset("Website Copy!", "Site again", "more copy"),
    ];
    let names: Vec<String> = entries(&build_archive(&data).unwrap())
        .into_iter()
        .map(|(n, _)| n)
        .collect();

    assert!(names.contains(&"assets/website_copy_.md".to_string()));
    assert!(names.contains(&"assets/website_copy__2.md".to_string()));
}

#[test]
fn tasks_csv_matches_plan_order() {
    let csv = render_tasks_csv(&fix_it_plan());
    let lines: Vec<&str> = csv.split("\r\n").collect();

    assert_eq!(lines[0], "phase,title,description,impact,timeEstimate");
    assert!(lines[1].starts_with("DAY_30,Update hours,"));
    assert!(lines[2].starts_with("DAY_60,Launch newsletter,"));
}

fn phase_strategy() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("DAY_30"), Just("DAY_60"), Just("DAY_90"), Just("LATER")]
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        ..ProptestConfig::default()
    })]

    /// Phase headings never appear out of order, whatever order the tasks come in.
    #[test]
    fn phase_headings_are_always_ordered(phases in prop::collection::vec(phase_strategy(), 0..20)) {
        let data = ExportData {
            tasks: phases
                .iter()
                .enumerate()
                .map(|(i, phase)| task(phase, &format!("task-{i}")))
                .collect(),
            ..Default::default()
        };
        let md = render_plan_markdown(&data);

        let positions: Vec<usize> = ["## DAY 30", "## DAY 60", "## DAY 90"]
            .iter()
            .filter_map(|h| md.find(h))
            .collect();
        prop_assert!(positions.windows(2).all(|w| w[0] < w[1]));

        let rendered = md.matches("\n### ").count();
        let expected = phases.iter().filter(|p| **p != "LATER").count();
        prop_assert_eq!(rendered, expected);
    }
}
