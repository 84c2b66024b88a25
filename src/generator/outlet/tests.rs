use super::*;
use crate::generator::brief::Brief;
use tempfile::TempDir;

const CHART: &str = r#"{
    "title": "Prevalensi Stunting",
    "mark": "line",
    "x": { "field": "Tahun", "kind": "ordinal" },
    "y": { "field": "Prevalensi", "kind": "quantitative" },
    "data": [ { "Tahun": "2022", "Prevalensi": 20.8 } ]
}"#;

fn state(chart: Option<ChartSnippet>, sources: Option<Vec<String>>) -> ResultState {
    ResultState::new(
        "penurunan stunting",
        Brief::Freeform(
            "**Judul:** Stunting\n### 1. Ringkasan Eksekutif\nIsi <b>ringkasan</b>.\n- Poin".to_string(),
        ),
        chart,
        sources,
        "web search (DuckDuckGo)",
    )
}

fn kinds(report: &Report) -> Vec<&'static str> {
    report
        .sections
        .iter()
        .map(|s| match s {
            ReportSection::Download { .. } => "download",
            ReportSection::Brief { .. } => "brief",
            ReportSection::Chart { .. } => "chart",
            ReportSection::ChartFailed { .. } => "chart_failed",
            ReportSection::References { .. } => "references",
            ReportSection::DocumentNotice => "document_notice",
        })
        .collect()
}

#[test]
fn test_render_order_with_chart_and_references() {
    let state = state(
        Some(ChartSnippet::Spec(CHART.to_string())),
        Some(vec!["https://jatengprov.go.id".to_string()]),
    );
    let report = Presenter::render(&state, TargetLanguage::Indonesian);

    assert_eq!(kinds(&report), vec!["download", "brief", "chart", "references"]);
    assert_eq!(report.id, state.id);
    assert!(report.has_chart());
    assert_eq!(
        report.sections[0],
        ReportSection::Download {
            file_name: "Policy_Brief_penurunan_stunting.docx".to_string()
        }
    );
}

#[test]
fn test_no_data_suppresses_chart() {
    let state = state(Some(ChartSnippet::NoData), Some(vec![]));
    let report = Presenter::render(&state, TargetLanguage::Indonesian);
    assert_eq!(kinds(&report), vec!["download", "brief", "references"]);

    let state = state_without_chart();
    let report = Presenter::render(&state, TargetLanguage::Indonesian);
    assert_eq!(kinds(&report), vec!["download", "brief", "document_notice"]);
}

fn state_without_chart() -> ResultState {
    state(None, None)
}

#[test]
fn test_invalid_chart_degrades_to_warning() {
    let raw = "chart = alt.Chart(data).mark_bar()";
    let state = state(Some(ChartSnippet::Spec(raw.to_string())), None);
    let report = Presenter::render(&state, TargetLanguage::English);

    assert_eq!(
        kinds(&report),
        vec!["download", "brief", "chart_failed", "document_notice"]
    );
    match &report.sections[2] {
        ReportSection::ChartFailed { warning, raw: shown } => {
            assert!(warning.starts_with("Failed to build the chart: "));
            assert_eq!(shown, raw);
        }
        other => panic!("unexpected section: {:?}", other),
    }
}

#[test]
fn test_export_excludes_references() {
    let state = state(None, Some(vec!["https://jatengprov.go.id".to_string()]));
    let document = Presenter::export(&state, TargetLanguage::Indonesian);

    assert_eq!(document.heading_count(1), 1);
    assert_eq!(document.heading_count(3), 1);
    assert_eq!(document.bullet_count(), 1);
    assert!(
        !document
            .blocks()
            .iter()
            .any(|b| matches!(b, ExportBlock::Paragraph(p) if p.contains("jatengprov")))
    );
}

#[test]
fn test_html_outlet_escapes_and_links() {
    let state = state(
        Some(ChartSnippet::Spec(CHART.to_string())),
        Some(vec!["https://example.org/?a=1&b=2".to_string()]),
    );
    let report = Presenter::render(&state, TargetLanguage::Indonesian);
    let html = HtmlOutlet.publish(&state, &report).unwrap();

    assert!(html.contains(&format!("href=\"/download/{}\"", state.id)));
    assert!(html.contains("<h3>1. Ringkasan Eksekutif</h3>"));
    assert!(!html.contains("<b>ringkasan</b>"));
    assert!(html.contains("https://example.org/?a=1&amp;b=2"));
    assert!(html.contains("vegaEmbed("));
    assert!(html.contains("5. Referensi"));
}

#[test]
fn test_escape_html() {
    assert_eq!(
        html::escape_html("<a href=\"x\">'&'</a>"),
        "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;"
    );
}

#[test]
fn test_disk_outlet_writes_files() {
    let temp_dir = TempDir::new().unwrap();
    let state = state(
        Some(ChartSnippet::Spec(CHART.to_string())),
        Some(vec!["https://jatengprov.go.id".to_string()]),
    );
    let report = Presenter::render(&state, TargetLanguage::Indonesian);

    let outlet = DiskOutlet::new(temp_dir.path().join("out"));
    let written = outlet.publish(&state, &report).unwrap();

    let names: Vec<String> = written
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
        .collect();
    assert_eq!(
        names,
        vec![
            "Policy_Brief_penurunan_stunting.md",
            "Policy_Brief_penurunan_stunting.docx",
            "Policy_Brief_penurunan_stunting.chart.vl.json",
        ]
    );

    let markdown = std::fs::read_to_string(&written[0]).unwrap();
    assert!(markdown.starts_with("**Judul:** Stunting"));
    assert!(markdown.contains("### 5. Referensi\n- https://jatengprov.go.id\n"));
}

#[test]
fn test_disk_outlet_document_source() {
    let temp_dir = TempDir::new().unwrap();
    let state = state(Some(ChartSnippet::NoData), None);
    let report = Presenter::render(&state, TargetLanguage::English);

    let written = DiskOutlet::new(temp_dir.path())
        .publish(&state, &report)
        .unwrap();

    assert_eq!(written.len(), 2);
    let markdown = std::fs::read_to_string(&written[0]).unwrap();
    assert!(markdown.contains("uploaded document"));
}
