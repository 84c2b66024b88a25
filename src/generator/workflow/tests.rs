use super::*;
use crate::generator::brief::Brief;
use crate::generator::chart::ChartSnippet;
use crate::llm::testing::ScriptedGenerator;
use crate::search::SearchProvider;
use crate::types::context::SearchHit;
use crate::types::notice::NoticeLevel;
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

struct FixedProvider {
    engine: SearchEngine,
    hits: Vec<SearchHit>,
    calls: AtomicUsize,
}

impl FixedProvider {
    fn new(engine: SearchEngine, hits: Vec<SearchHit>) -> Arc<Self> {
        Arc::new(Self {
            engine,
            hits,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchProvider for FixedProvider {
    fn engine(&self) -> SearchEngine {
        self.engine
    }

    async fn search(&self, _query: &str, _max_results: usize) -> anyhow::Result<Vec<SearchHit>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.hits.clone())
    }
}

struct Fixture {
    ddg: Arc<FixedProvider>,
    google: Arc<FixedProvider>,
    pipeline: BriefPipeline<ScriptedGenerator>,
}

fn fixture(generator: ScriptedGenerator, ddg_hits: Vec<SearchHit>) -> Fixture {
    fixture_in(TargetLanguage::Indonesian, generator, ddg_hits)
}

fn fixture_in(
    language: TargetLanguage,
    generator: ScriptedGenerator,
    ddg_hits: Vec<SearchHit>,
) -> Fixture {
    let mut config = Config::default();
    config.target_language = language;
    let ddg = FixedProvider::new(SearchEngine::DuckDuckGo, ddg_hits);
    let google = FixedProvider::new(
        SearchEngine::Google,
        vec![SearchHit::url_only("https://jatengprov.go.id/stunting")],
    );
    let acquirer = SourceAcquirer::with_providers(
        config.search.clone(),
        config.max_context_chars,
        ddg.clone(),
        google.clone(),
    );
    Fixture {
        ddg,
        google,
        pipeline: BriefPipeline::with_acquirer(&config, generator, acquirer),
    }
}

fn snippet_hits() -> Vec<SearchHit> {
    vec![SearchHit::with_snippet(
        "https://jatengprov.go.id/stunting",
        "Prevalensi stunting Jawa Tengah 20,8% pada 2023.",
    )]
}

fn brief_json() -> serde_json::Value {
    json!({
        "title": "Percepatan Penurunan Stunting",
        "executive_summary": "Prevalensi 20,8%.",
        "background": "Stunting masih tinggi.",
        "findings": "Data menunjukkan penurunan lambat.",
        "recommendations": "- Perkuat posyandu."
    })
}

fn search(topic: &str, engine: SearchEngine) -> BriefRequest {
    BriefRequest::Search {
        topic: topic.to_string(),
        engine,
    }
}

#[tokio::test]
async fn test_empty_topic_skips_acquisition() {
    let fixture = fixture(ScriptedGenerator::new(), snippet_hits());

    for topic in ["", "   \t"] {
        let result = fixture
            .pipeline
            .run(search(topic, SearchEngine::DuckDuckGo))
            .await;
        assert_eq!(result.unwrap_err(), PipelineError::EmptyTopic);
    }

    assert_eq!(fixture.ddg.calls(), 0);
    assert_eq!(fixture.google.calls(), 0);
    assert_eq!(fixture.pipeline.generator().total_calls(), 0);
}

#[tokio::test]
async fn test_zero_results_skip_composers() {
    let fixture = fixture(ScriptedGenerator::new(), vec![]);

    let run = fixture
        .pipeline
        .run(search("stunting", SearchEngine::DuckDuckGo))
        .await
        .unwrap();

    assert_eq!(run.outcome, PipelineOutcome::NoRelevantInformation);
    assert_eq!(fixture.pipeline.generator().total_calls(), 0);
    assert!(run.notices.iter().any(|n| {
        n.level == NoticeLevel::Warning
            && n.message == TargetLanguage::Indonesian.labels().no_relevant_information
    }));
}

#[tokio::test]
async fn test_completed_run_with_no_data_chart() {
    let generator = ScriptedGenerator::new()
        .with_extract(brief_json())
        .with_prompt("```\n#NO_DATA\n```");
    let fixture = fixture(generator, snippet_hits());

    let run = fixture
        .pipeline
        .run(search("  stunting  ", SearchEngine::DuckDuckGo))
        .await
        .unwrap();

    let state = run.completed().unwrap();
    assert_eq!(state.topic, "stunting");
    assert_eq!(state.file_name, "Policy_Brief_stunting.docx");
    assert!(state.brief.is_structured());
    assert_eq!(state.chart, Some(ChartSnippet::NoData));
    assert_eq!(
        state.sources,
        Some(vec!["https://jatengprov.go.id/stunting".to_string()])
    );
    assert_eq!(state.provenance, "web search (DuckDuckGo)");
    assert_eq!(run.notices.count(NoticeLevel::Success), 2);
    assert!(!run.notices.has_errors());

    let report = crate::generator::Presenter::render(state, fixture.pipeline.language());
    assert!(!report.has_chart());
}

#[tokio::test]
async fn test_brief_failure_skips_chart() {
    let generator = ScriptedGenerator::new()
        .with_extract_error("quota")
        .with_prompt_error("quota");
    let fixture = fixture(generator, snippet_hits());

    let run = fixture
        .pipeline
        .run(search("stunting", SearchEngine::DuckDuckGo))
        .await
        .unwrap();

    assert_eq!(run.outcome, PipelineOutcome::GenerationFailed);
    assert_eq!(fixture.pipeline.generator().extract_calls(), 1);
    assert_eq!(fixture.pipeline.generator().prompt_calls(), 1);
    assert!(run.notices.has_errors());
}

#[tokio::test]
async fn test_chart_failure_keeps_brief() {
    let generator = ScriptedGenerator::new()
        .with_extract_error("schema")
        .with_prompt("**Judul:** Stunting\n### 1. Ringkasan Eksekutif\nisi")
        .with_prompt_error("timeout");
    let fixture = fixture(generator, snippet_hits());

    let run = fixture
        .pipeline
        .run(search("stunting", SearchEngine::DuckDuckGo))
        .await
        .unwrap();

    let state = run.completed().unwrap();
    assert!(matches!(state.brief, Brief::Freeform(_)));
    assert!(state.chart.is_none());
    assert!(run.notices.has_errors());
}

#[tokio::test]
async fn test_engine_routing_is_isolated() {
    let generator = ScriptedGenerator::new()
        .with_extract(brief_json())
        .with_prompt("#NO_DATA")
        .with_extract(brief_json())
        .with_prompt("#NO_DATA");
    let fixture = fixture(generator, snippet_hits());

    fixture
        .pipeline
        .run(search("stunting", SearchEngine::Google))
        .await
        .unwrap();
    assert_eq!(fixture.google.calls(), 1);
    assert_eq!(fixture.ddg.calls(), 0);

    fixture
        .pipeline
        .run(search("stunting", SearchEngine::DuckDuckGo))
        .await
        .unwrap();
    assert_eq!(fixture.google.calls(), 1);
    assert_eq!(fixture.ddg.calls(), 1);
}

#[tokio::test]
async fn test_unsupported_document() {
    let fixture = fixture(ScriptedGenerator::new(), vec![]);

    let result = fixture
        .pipeline
        .run(BriefRequest::Document {
            topic: "stunting".to_string(),
            file_name: "notes.txt".to_string(),
            bytes: b"hello".to_vec(),
        })
        .await;

    assert_eq!(
        result.unwrap_err(),
        PipelineError::UnsupportedDocument("notes.txt".to_string())
    );
    assert_eq!(fixture.pipeline.generator().total_calls(), 0);
}

fn docx_bytes(text: &str) -> Vec<u8> {
    use docx_rs::{Docx, Paragraph, Run};
    use std::io::Cursor;

    let mut buffer = Cursor::new(Vec::new());
    Docx::new()
        .add_paragraph(Paragraph::new().add_run(Run::new().add_text(text)))
        .build()
        .pack(&mut buffer)
        .unwrap();
    buffer.into_inner()
}

fn messages(run: &PipelineRun) -> Vec<String> {
    run.notices.iter().map(|n| n.message.clone()).collect()
}

#[tokio::test]
async fn test_document_request_has_no_sources() {

    let generator = ScriptedGenerator::new()
        .with_extract(brief_json())
        .with_prompt("#NO_DATA");
    let fixture = fixture(generator, vec![]);

    let run = fixture
        .pipeline
        .run(BriefRequest::Document {
            topic: "stunting".to_string(),
            file_name: "kajian.docx".to_string(),
            bytes: docx_bytes("Prevalensi stunting 20,8%."),
        })
        .await
        .unwrap();

    let state = run.completed().unwrap();
    assert!(state.sources.is_none());
    assert_eq!(state.provenance, "uploaded document kajian.docx");
    assert_eq!(fixture.ddg.calls() + fixture.google.calls(), 0);
    assert!(
        fixture.pipeline.generator().user_prompts()[0].contains("Prevalensi stunting 20,8%.")
    );
}

#[tokio::test]
async fn test_empty_document_reports_document_notice() {
    let fixture = fixture(ScriptedGenerator::new(), vec![]);

    let run = fixture
        .pipeline
        .run(BriefRequest::Document {
            topic: "stunting".to_string(),
            file_name: "kosong.docx".to_string(),
            bytes: docx_bytes(""),
        })
        .await
        .unwrap();

    let labels = TargetLanguage::Indonesian.labels();
    assert_eq!(run.outcome, PipelineOutcome::NoRelevantInformation);
    assert_eq!(fixture.pipeline.generator().total_calls(), 0);
    assert!(run.notices.iter().any(|n| {
        n.level == NoticeLevel::Warning && n.message == labels.no_document_text
    }));
    assert!(
        !run.notices
            .iter()
            .any(|n| n.message == labels.no_relevant_information)
    );
}

#[tokio::test]
async fn test_indonesian_run_has_only_indonesian_notices() {
    let generator = ScriptedGenerator::new()
        .with_extract(brief_json())
        .with_prompt_error("timeout");
    let fixture = fixture(generator, snippet_hits());

    let run = fixture
        .pipeline
        .run(search("stunting", SearchEngine::DuckDuckGo))
        .await
        .unwrap();

    assert!(run.completed().is_some());
    assert_eq!(
        messages(&run),
        vec![
            "🔎 Mencari dengan DuckDuckGo...",
            "Berhasil mengumpulkan konteks & sumber!",
            "🤖 Menganalisis konteks dan menyusun draf...",
            "Draf berhasil dibuat!",
            "📊 Merancang visualisasi data...",
            "Terjadi kesalahan saat membuat grafik: timeout",
        ]
    );
}

#[tokio::test]
async fn test_english_run_has_english_notices() {
    let generator = ScriptedGenerator::new()
        .with_extract_error("schema")
        .with_prompt_error("quota");
    let fixture = fixture_in(TargetLanguage::English, generator, snippet_hits());

    let run = fixture
        .pipeline
        .run(search("stunting", SearchEngine::DuckDuckGo))
        .await
        .unwrap();

    assert_eq!(run.outcome, PipelineOutcome::GenerationFailed);
    assert_eq!(
        messages(&run),
        vec![
            "🔎 Searching with DuckDuckGo...",
            "Context and sources collected!",
            "🤖 Analysing the context and drafting the brief...",
            "Error while generating the brief: quota",
            "The policy brief draft could not be generated.",
        ]
    );
}
