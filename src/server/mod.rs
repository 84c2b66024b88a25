//! 网页服务

use anyhow::{Context, Result};
use axum::{
    Form, Router,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::generator::outlet::{DOCX_MIME, HtmlOutlet, Outlet, Presenter};
use crate::generator::workflow::{BriefPipeline, BriefRequest, PipelineError, PipelineRun};
use crate::i18n::TargetLanguage;
use crate::llm::{Generator, LLMClient};
use crate::search::SearchEngine;
use crate::session::ResultStore;
use crate::types::notice::{Notice, NoticeLevel};

pub mod page;

use page::{PageView, render_page};

/// 处理器共享的应用状态
pub struct AppState<G: Generator> {
    pub pipeline: BriefPipeline<G>,
    pub results: Arc<RwLock<ResultStore>>,
    pub language: TargetLanguage,
}

impl<G: Generator> AppState<G> {
    pub fn new(pipeline: BriefPipeline<G>, retained_results: usize) -> Self {
        let language = pipeline.language();
        Self {
            pipeline,
            results: Arc::new(RwLock::new(ResultStore::new(retained_results))),
            language,
        }
    }
}

type SharedState<G> = Arc<AppState<G>>;

#[derive(Debug, Deserialize)]
pub struct SearchForm {
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub engine: String,
}

/// 构建路由
pub fn router<G: Generator + 'static>(state: SharedState<G>, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(index::<G>))
        .route("/brief/search", post(search_brief::<G>))
        .route("/brief/upload", post(upload_brief::<G>))
        .route("/download/:id", get(download::<G>))
        .with_state(state)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
}

fn page_response<G: Generator>(
    state: &AppState<G>,
    status: StatusCode,
    view: PageView<'_>,
) -> Response {
    (status, Html(render_page(&view, state.language))).into_response()
}

fn message(level: NoticeLevel, message: impl Into<String>) -> Notice {
    Notice {
        level,
        message: message.into(),
    }
}

async fn index<G: Generator>(State(state): State<SharedState<G>>) -> Response {
    page_response(&state, StatusCode::OK, PageView::default())
}

async fn search_brief<G: Generator>(
    State(state): State<SharedState<G>>,
    Form(form): Form<SearchForm>,
) -> Response {
    let labels = state.language.labels();
    let engine = if form.engine.trim().is_empty() {
        SearchEngine::default()
    } else {
        match form.engine.parse::<SearchEngine>() {
            Ok(engine) => engine,
            Err(e) => {
                let view = PageView {
                    topic: &form.topic,
                    notices: vec![message(NoticeLevel::Error, e)],
                    ..Default::default()
                };
                return page_response(&state, StatusCode::UNPROCESSABLE_ENTITY, view);
            }
        }
    };

    let result = state
        .pipeline
        .run(BriefRequest::Search {
            topic: form.topic.clone(),
            engine,
        })
        .await;

    let view = PageView {
        topic: &form.topic,
        engine,
        ..Default::default()
    };
    match result {
        Ok(run) => present_run(&state, run, view).await,
        Err(e) => {
            let text = match e {
                PipelineError::EmptyTopic => labels.empty_topic.to_string(),
                other => other.to_string(),
            };
            let view = PageView {
                notices: vec![message(NoticeLevel::Error, text)],
                ..view
            };
            page_response(&state, StatusCode::UNPROCESSABLE_ENTITY, view)
        }
    }
}

/// 上传表单中的字段
#[derive(Debug, Default)]
struct UploadForm {
    topic: String,
    file_name: Option<String>,
    bytes: Vec<u8>,
}

async fn read_upload(mut multipart: Multipart) -> Result<UploadForm, (StatusCode, String)> {
    let mut form = UploadForm::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| (e.status(), e.body_text()))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("topic") => {
                form.topic = field.text().await.map_err(|e| (e.status(), e.body_text()))?;
            }
            Some("file") => {
                form.file_name = field
                    .file_name()
                    .map(str::to_string)
                    .filter(|name| !name.trim().is_empty());
                form.bytes = field
                    .bytes()
                    .await
                    .map_err(|e| (e.status(), e.body_text()))?
                    .to_vec();
            }
            _ => {}
        }
    }
    Ok(form)
}

async fn upload_brief<G: Generator>(
    State(state): State<SharedState<G>>,
    multipart: Multipart,
) -> Response {
    let labels = state.language.labels();
    let form = match read_upload(multipart).await {
        Ok(form) => form,
        Err((status, text)) => {
            warn!("rejected upload: {}", text);
            let view = PageView {
                notices: vec![message(NoticeLevel::Error, text)],
                ..Default::default()
            };
            return page_response(&state, status, view);
        }
    };

    let Some(file_name) = form.file_name.clone() else {
        let text = if form.topic.trim().is_empty() {
            labels.empty_topic
        } else {
            labels.unsupported_document
        };
        let view = PageView {
            topic: &form.topic,
            notices: vec![message(NoticeLevel::Error, text)],
            ..Default::default()
        };
        return page_response(&state, StatusCode::UNPROCESSABLE_ENTITY, view);
    };

    let result = state
        .pipeline
        .run(BriefRequest::Document {
            topic: form.topic.clone(),
            file_name,
            bytes: form.bytes,
        })
        .await;

    let view = PageView {
        topic: &form.topic,
        ..Default::default()
    };
    match result {
        Ok(run) => present_run(&state, run, view).await,
        Err(e) => {
            let text = match e {
                PipelineError::EmptyTopic => labels.empty_topic.to_string(),
                PipelineError::UnsupportedDocument(_) => labels.unsupported_document.to_string(),
            };
            let view = PageView {
                notices: vec![message(NoticeLevel::Error, text)],
                ..view
            };
            page_response(&state, StatusCode::UNPROCESSABLE_ENTITY, view)
        }
    }
}

/// 保存完成的结果并渲染报告
async fn present_run<G: Generator>(
    state: &AppState<G>,
    run: PipelineRun,
    view: PageView<'_>,
) -> Response {
    let mut view = PageView {
        notices: run.notices.iter().cloned().collect(),
        ..view
    };

    if let Some(result) = run.completed() {
        let report = Presenter::render(result, state.language);
        match HtmlOutlet.publish(result, &report) {
            Ok(html) => view.report_html = Some(html),
            Err(e) => {
                error!("Failed to render report: {:#}", e);
                view.notices
                    .push(message(NoticeLevel::Error, format!("{:#}", e)));
                return page_response(state, StatusCode::INTERNAL_SERVER_ERROR, view);
            }
        }
        let mut results = state.results.write().await;
        results.insert(result.clone());
    }

    page_response(state, StatusCode::OK, view)
}

async fn download<G: Generator>(
    State(state): State<SharedState<G>>,
    Path(id): Path<String>,
) -> Response {
    let Ok(id) = Uuid::parse_str(&id) else {
        return (StatusCode::NOT_FOUND, "Result not found").into_response();
    };

    let (file_name, document) = {
        let results = state.results.read().await;
        let Some(result) = results.get(&id) else {
            return (StatusCode::NOT_FOUND, "Result not found").into_response();
        };
        (
            result.file_name.clone(),
            Presenter::export(result, state.language),
        )
    };

    match document.to_docx() {
        Ok(bytes) => (
            [
                (header::CONTENT_TYPE, DOCX_MIME.to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", file_name),
                ),
            ],
            bytes,
        )
            .into_response(),
        Err(e) => {
            error!("DOCX export failed: {:#}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "DOCX export failed").into_response()
        }
    }
}

/// 启动网页服务
pub async fn run(config: &Config, check_connection: bool) -> Result<()> {
    let client = LLMClient::new(config.clone())?;
    if check_connection {
        client.check_connection().await?;
    }
    let pipeline = BriefPipeline::new(config, client)?;
    let state = Arc::new(AppState::new(pipeline, config.server.retained_results));
    let app = router(state, config.server.max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind))?;
    info!(
        provider = %config.llm.provider,
        model = %config.llm.model,
        "🌐 Listening on http://{}",
        config.server.bind
    );

    axum::serve(listener, app).await?;
    Ok(())
}
