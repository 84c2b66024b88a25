use super::*;
use crate::llm::testing::ScriptedGenerator;
use crate::types::notice::NoticeLevel;
use serde_json::json;

fn acquired() -> AcquiredContext {
    AcquiredContext {
        context: "Prevalensi stunting Jawa Tengah 20,8% pada 2023.".to_string(),
        sources: Some(vec!["https://jatengprov.go.id/a".to_string()]),
        provenance: "web search (DuckDuckGo)".to_string(),
    }
}

fn sample_brief() -> serde_json::Value {
    json!({
        "title": "Percepatan Penurunan Stunting",
        "executive_summary": "Prevalensi 20,8%.",
        "background": "Stunting masih tinggi.",
        "findings": "### Tema 1\n| Tahun | Prevalensi |\n|---|---|\n| 2023 | 20,8 |",
        "recommendations": "- Perkuat posyandu."
    })
}

#[test]
fn test_structured_markdown_has_four_sections() {
    let brief: PolicyBrief = serde_json::from_value(sample_brief()).unwrap();
    let markdown = Brief::Structured(brief).to_markdown(TargetLanguage::Indonesian.labels());

    assert!(markdown.starts_with("**Judul:** Percepatan Penurunan Stunting"));
    let markers = markdown
        .lines()
        .filter(|line| line.starts_with("### "))
        .count();
    assert_eq!(markers, 4);
    assert!(markdown.contains("### 1. Ringkasan Eksekutif"));
    assert!(markdown.contains("**Tema 1**"));
    assert!(markdown.contains("| 2023 | 20,8 |"));
    assert!(!markdown.contains("5. Referensi"));
}

#[test]
fn test_missing_fields() {
    let mut brief: PolicyBrief = serde_json::from_value(sample_brief()).unwrap();
    assert!(brief.is_valid());

    brief.background = "  ".to_string();
    brief.recommendations.clear();
    assert_eq!(brief.missing_fields(), vec!["background", "recommendations"]);
}

#[test]
fn test_strip_title_markers() {
    assert_eq!(strip_title_markers("**Judul:** Banjir Rob"), "Banjir Rob");
    assert_eq!(strip_title_markers("**Title: Flood Control**"), "Flood Control");
    assert_eq!(strip_title_markers("# Kebijakan Air"), "Kebijakan Air");
    assert_eq!(strip_title_markers("Plain title"), "Plain title");
}

#[test]
fn test_freeform_title_uses_first_line() {
    let brief = Brief::Freeform("\n**Judul:** Banjir Rob\n### 1. Ringkasan".to_string());
    assert_eq!(brief.title().as_deref(), Some("Banjir Rob"));
    assert!(!brief.is_structured());
}

#[tokio::test]
async fn test_compose_prefers_structured_output() {
    let generator = ScriptedGenerator::new().with_extract(sample_brief());
    let composer = BriefComposer::new(TargetLanguage::Indonesian, "jawa tengah");
    let mut notices = Notices::new();

    let brief = composer
        .compose(&generator, "stunting", &acquired(), &mut notices)
        .await
        .unwrap();

    assert!(brief.is_structured());
    assert_eq!(generator.extract_calls(), 1);
    assert_eq!(generator.prompt_calls(), 0);

    let user_prompt = &generator.user_prompts()[0];
    assert!(user_prompt.contains("\"stunting\""));
    assert!(user_prompt.contains("Prevalensi stunting Jawa Tengah 20,8%"));
}

#[tokio::test]
async fn test_compose_falls_back_to_freeform_unmodified() {
    let text = "**Judul:** Banjir\n### 1. Ringkasan Eksekutif\nisi\n";
    let generator = ScriptedGenerator::new()
        .with_extract_error("schema mismatch")
        .with_prompt(text);
    let composer = BriefComposer::new(TargetLanguage::Indonesian, "");
    let mut notices = Notices::new();

    let brief = composer
        .compose(&generator, "banjir", &acquired(), &mut notices)
        .await
        .unwrap();

    assert_eq!(brief, Brief::Freeform(text.to_string()));
    assert_eq!(
        brief.to_markdown(TargetLanguage::Indonesian.labels()),
        text
    );
    assert!(!notices.has_errors());
}

#[tokio::test]
async fn test_compose_incomplete_structured_output_falls_back() {
    let mut incomplete = sample_brief();
    incomplete["findings"] = json!("");
    let generator = ScriptedGenerator::new()
        .with_extract(incomplete)
        .with_prompt("free text");
    let composer = BriefComposer::new(TargetLanguage::English, "");
    let mut notices = Notices::new();

    let brief = composer
        .compose(&generator, "flood", &acquired(), &mut notices)
        .await;

    assert_eq!(brief, Some(Brief::Freeform("free text".to_string())));
    assert_eq!(generator.prompt_calls(), 1);
}

#[tokio::test]
async fn test_compose_failure_reports_error() {
    let generator = ScriptedGenerator::new()
        .with_extract_error("quota")
        .with_prompt_error("quota exceeded");
    let composer = BriefComposer::new(TargetLanguage::English, "");
    let mut notices = Notices::new();

    let brief = composer
        .compose(&generator, "flood", &acquired(), &mut notices)
        .await;

    assert!(brief.is_none());
    assert_eq!(notices.count(NoticeLevel::Error), 1);
    assert!(
        notices
            .iter()
            .any(|n| n.message.contains("quota exceeded"))
    );
}
