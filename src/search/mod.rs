//! 上下文获取：网页搜索与上传文档

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::config::SearchConfig;
use crate::i18n::TargetLanguage;
use crate::ingest::{self, DocumentKind};
use crate::types::context::{AcquiredContext, SearchHit};
use crate::types::notice::Notices;
use crate::utils::text::truncate_context;

pub mod duckduckgo;
pub mod google;

pub use duckduckgo::DuckDuckGoSearch;
pub use google::GoogleSearch;

/// 搜索引擎选择
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchEngine {
    #[serde(rename = "duckduckgo")]
    #[default]
    DuckDuckGo,
    #[serde(rename = "google")]
    Google,
}

impl SearchEngine {
    pub fn display_name(&self) -> &'static str {
        match self {
            SearchEngine::DuckDuckGo => "DuckDuckGo",
            SearchEngine::Google => "Google",
        }
    }

    pub fn all() -> [SearchEngine; 2] {
        [SearchEngine::DuckDuckGo, SearchEngine::Google]
    }
}

impl std::fmt::Display for SearchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchEngine::DuckDuckGo => write!(f, "duckduckgo"),
            SearchEngine::Google => write!(f, "google"),
        }
    }
}

impl std::str::FromStr for SearchEngine {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "duckduckgo" | "ddg" | "1" | "mesin 1" | "engine 1" => Ok(SearchEngine::DuckDuckGo),
            "google" | "2" | "mesin 2" | "engine 2" => Ok(SearchEngine::Google),
            _ => Err(format!("Unknown search engine: {}", s)),
        }
    }
}

/// 搜索服务接口
#[async_trait]
pub trait SearchProvider: Send + Sync {
    fn engine(&self) -> SearchEngine;

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>>;
}

/// 构造带地区关键词和站点过滤的查询语句
pub fn build_query(topic: &str, region: &str, preferred_domains: &[String]) -> String {
    let topic = topic.trim();
    let region = region.trim();
    let keyword = if region.is_empty() {
        format!("\"{}\"", topic)
    } else {
        format!("\"{} {}\"", topic, region)
    };

    let filter = preferred_domains
        .iter()
        .map(|d| d.trim())
        .filter(|d| !d.is_empty())
        .map(|d| format!("site:{}", d))
        .collect::<Vec<_>>()
        .join(" OR ");

    if filter.is_empty() {
        keyword
    } else {
        format!("{} ({})", keyword, filter)
    }
}

/// 把搜索结果拼成上下文；有摘要时使用摘要，否则列出链接
pub fn assemble_context(hits: &[SearchHit], provenance: &str) -> Option<AcquiredContext> {
    if hits.is_empty() {
        return None;
    }

    let snippets: Vec<&str> = hits
        .iter()
        .filter_map(|hit| hit.snippet.as_deref())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    let context = if snippets.is_empty() {
        let list = hits
            .iter()
            .map(|hit| format!("- {}", hit.url))
            .collect::<Vec<_>>()
            .join("\n");
        format!("Relevant sources:\n{}", list)
    } else {
        snippets.join("\n\n")
    };

    Some(AcquiredContext {
        context,
        sources: Some(hits.iter().map(|hit| hit.url.clone()).collect()),
        provenance: provenance.to_string(),
    })
}

/// 上下文获取器
///
/// 按搜索引擎选择对应的provider，或者从上传文档中提取文本。
/// 所有外部错误都会转为用户可见的提示，并返回None。
pub struct SourceAcquirer {
    duckduckgo: Arc<dyn SearchProvider>,
    google: Arc<dyn SearchProvider>,
    config: SearchConfig,
    max_context_chars: usize,
    language: TargetLanguage,
}

impl SourceAcquirer {
    /// 使用真实的搜索引擎创建
    pub fn new(config: &SearchConfig, max_context_chars: usize) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(config.user_agent.clone())
            .build()
            .context("Failed to build HTTP client for search")?;

        Ok(Self::with_providers(
            config.clone(),
            max_context_chars,
            Arc::new(DuckDuckGoSearch::new(http.clone())),
            Arc::new(GoogleSearch::new(http)),
        ))
    }

    pub fn with_providers(
        config: SearchConfig,
        max_context_chars: usize,
        duckduckgo: Arc<dyn SearchProvider>,
        google: Arc<dyn SearchProvider>,
    ) -> Self {
        Self {
            duckduckgo,
            google,
            config,
            max_context_chars,
            language: TargetLanguage::default(),
        }
    }

    /// 提示信息使用的语言
    pub fn with_language(mut self, language: TargetLanguage) -> Self {
        self.language = language;
        self
    }

    fn provider(&self, engine: SearchEngine) -> &dyn SearchProvider {
        match engine {
            SearchEngine::DuckDuckGo => self.duckduckgo.as_ref(),
            SearchEngine::Google => self.google.as_ref(),
        }
    }

    fn max_results(&self, engine: SearchEngine) -> usize {
        match engine {
            SearchEngine::DuckDuckGo => self.config.duckduckgo_max_results,
            SearchEngine::Google => self.config.google_max_results,
        }
    }

    fn bounded(&self, mut acquired: AcquiredContext) -> AcquiredContext {
        acquired.context = truncate_context(&acquired.context, self.max_context_chars);
        acquired
    }

    /// 通过网页搜索获取上下文
    pub async fn acquire(
        &self,
        topic: &str,
        engine: SearchEngine,
        notices: &mut Notices,
    ) -> Option<AcquiredContext> {
        let labels = self.language.labels();
        let provider = self.provider(engine);
        let name = provider.engine().display_name();
        notices.info(format!("{} {}...", labels.searching, name));

        let query = build_query(topic, &self.config.region, &self.config.preferred_domains);
        debug!(%engine, %query, "search query");

        let hits = match provider.search(&query, self.max_results(engine)).await {
            Ok(hits) => hits,
            Err(e) => {
                notices.error(format!("{} ({}): {:#}", labels.search_failed, name, e));
                return None;
            }
        };
        debug!(%engine, hits = hits.len(), "search finished");

        let provenance = format!("web search ({})", name);
        assemble_context(&hits, &provenance).map(|acquired| self.bounded(acquired))
    }

    /// 从上传文档中提取上下文
    pub async fn acquire_document(
        &self,
        file_name: &str,
        kind: DocumentKind,
        bytes: Vec<u8>,
        notices: &mut Notices,
    ) -> Option<AcquiredContext> {
        let labels = self.language.labels();
        notices.info(format!("{} {}...", labels.reading_document, file_name));

        let extracted =
            tokio::task::spawn_blocking(move || ingest::extract_text(kind, &bytes)).await;
        let text = match extracted {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                notices.error(format!(
                    "{} {}: {:#}",
                    labels.document_read_failed, file_name, e
                ));
                return None;
            }
            Err(e) => {
                notices.error(format!(
                    "{} {}: {}",
                    labels.document_read_failed, file_name, e
                ));
                return None;
            }
        };

        if text.trim().is_empty() {
            return None;
        }

        Some(self.bounded(AcquiredContext {
            context: text,
            sources: None,
            provenance: format!("uploaded document {}", file_name),
        }))
    }
}
