//! DuckDuckGo HTML搜索

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Url;
use scraper::{Html, Selector};

use super::{SearchEngine, SearchProvider};
use crate::types::context::SearchHit;
use crate::utils::text::collapse_whitespace;

/// 无需API KEY的HTML结果页
const DDG_HTML_URL: &str = "https://html.duckduckgo.com/html/";

pub struct DuckDuckGoSearch {
    http: reqwest::Client,
}

impl DuckDuckGoSearch {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl SearchProvider for DuckDuckGoSearch {
    fn engine(&self) -> SearchEngine {
        SearchEngine::DuckDuckGo
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
        let response = self
            .http
            .post(DDG_HTML_URL)
            .form(&[("q", query), ("kl", "id-id")])
            .send()
            .await
            .context("Search request failed")?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("Search returned HTTP {}", status.as_u16()));
        }

        let body = response
            .text()
            .await
            .context("Failed to read search results")?;
        parse_results(&body, max_results)
    }
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("invalid selector {}: {:?}", css, e))
}

/// 解析结果页，跳过广告条目
pub(crate) fn parse_results(html: &str, max_results: usize) -> Result<Vec<SearchHit>> {
    let document = Html::parse_document(html);
    let result_selector = selector("div.result")?;
    let link_selector = selector("a.result__a")?;
    let snippet_selector = selector(".result__snippet")?;

    let mut hits = Vec::new();
    for result in document.select(&result_selector) {
        if hits.len() >= max_results {
            break;
        }
        if result.value().classes().any(|c| c == "result--ad") {
            continue;
        }

        let Some(href) = result
            .select(&link_selector)
            .next()
            .and_then(|a| a.value().attr("href"))
        else {
            continue;
        };
        let Some(url) = resolve_href(href) else {
            continue;
        };

        let snippet = result
            .select(&snippet_selector)
            .next()
            .map(|s| collapse_whitespace(&s.text().collect::<String>()))
            .filter(|s| !s.is_empty());

        hits.push(SearchHit { url, snippet });
    }

    Ok(hits)
}

/// 还原 `//duckduckgo.com/l/?uddg=...` 形式的跳转链接
pub(crate) fn resolve_href(href: &str) -> Option<String> {
    let absolute = if href.starts_with("//") {
        format!("https:{}", href)
    } else if href.starts_with('/') {
        format!("https://duckduckgo.com{}", href)
    } else {
        href.to_string()
    };

    let url = Url::parse(&absolute).ok()?;
    let is_redirect = url
        .host_str()
        .is_some_and(|host| host.ends_with("duckduckgo.com"));
    if is_redirect {
        return url
            .query_pairs()
            .find(|(key, _)| key == "uddg")
            .map(|(_, value)| value.into_owned());
    }

    match url.scheme() {
        "http" | "https" => Some(url.to_string()),
        _ => None,
    }
}
