//! Google搜索，只收集结果链接

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Url;
use scraper::{Html, Selector};

use super::{SearchEngine, SearchProvider};
use crate::types::context::SearchHit;

const GOOGLE_SEARCH_URL: &str = "https://www.google.com/search";

pub struct GoogleSearch {
    http: reqwest::Client,
}

impl GoogleSearch {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl SearchProvider for GoogleSearch {
    fn engine(&self) -> SearchEngine {
        SearchEngine::Google
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
        // 多取几条，过滤掉Google自身的链接后仍能凑够数量
        let num = (max_results + 2).to_string();
        let response = self
            .http
            .get(GOOGLE_SEARCH_URL)
            .query(&[("q", query), ("num", num.as_str()), ("hl", "id")])
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
        parse_result_urls(&body, max_results)
    }
}

/// 提取带标题的结果链接，去重并跳过Google自身的页面
pub(crate) fn parse_result_urls(html: &str, max_results: usize) -> Result<Vec<SearchHit>> {
    let document = Html::parse_document(html);
    let anchor_selector =
        Selector::parse("a[href]").map_err(|e| anyhow!("invalid selector: {:?}", e))?;
    let heading_selector =
        Selector::parse("h3").map_err(|e| anyhow!("invalid selector: {:?}", e))?;

    let mut urls: Vec<String> = Vec::new();
    for anchor in document.select(&anchor_selector) {
        if urls.len() >= max_results {
            break;
        }
        if anchor.select(&heading_selector).next().is_none() {
            continue;
        }
        let Some(url) = anchor.value().attr("href").and_then(resolve_href) else {
            continue;
        };
        if !urls.contains(&url) {
            urls.push(url);
        }
    }

    Ok(urls.into_iter().map(SearchHit::url_only).collect())
}

fn is_google_host(host: &str) -> bool {
    host == "google.com"
        || host.ends_with(".google.com")
        || host.contains(".google.")
        || host.ends_with("googleusercontent.com")
}

/// 还原 `/url?q=...` 跳转链接
pub(crate) fn resolve_href(href: &str) -> Option<String> {
    let url = if href.starts_with("/url?") {
        let redirect = Url::parse(&format!("https://www.google.com{}", href)).ok()?;
        let target = redirect
            .query_pairs()
            .find(|(key, _)| key == "q" || key == "url")
            .map(|(_, value)| value.into_owned())?;
        Url::parse(&target).ok()?
    } else {
        Url::parse(href).ok()?
    };

    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    if url.host_str().is_none_or(is_google_host) {
        return None;
    }
    Some(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
<html><body>
<a href="https://www.google.com/preferences"><h3>Settings</h3></a>
<div class="g"><a href="/url?q=https://jatengprov.go.id/data-stunting&amp;sa=U&amp;ved=x"><h3>Data Stunting</h3></a></div>
<div class="g"><a href="https://undip.ac.id/penelitian"><h3>Penelitian</h3></a></div>
<div class="g"><a href="https://undip.ac.id/penelitian"><h3>Duplicate</h3></a></div>
<div class="g"><a href="https://uns.ac.id/no-heading">No heading</a></div>
<div class="g"><a href="https://unnes.ac.id/x"><h3>Third</h3></a></div>
</body></html>
"#;

    #[test]
    fn test_parse_result_urls() {
        let hits = parse_result_urls(SAMPLE, 10).unwrap();
        let urls: Vec<&str> = hits.iter().map(|h| h.url.as_str()).collect();

        assert_eq!(
            urls,
            vec![
                "https://jatengprov.go.id/data-stunting",
                "https://undip.ac.id/penelitian",
                "https://unnes.ac.id/x",
            ]
        );
        assert!(hits.iter().all(|h| h.snippet.is_none()));
    }

    #[test]
    fn test_parse_result_urls_respects_max_results() {
        let hits = parse_result_urls(SAMPLE, 2).unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn test_resolve_href_rejects_google_and_relative_links() {
        assert!(resolve_href("/search?q=next").is_none());
        assert!(resolve_href("https://maps.google.com/x").is_none());
        assert!(resolve_href("/url?q=https://accounts.google.com/").is_none());
        assert_eq!(
            resolve_href("/url?q=https://example.org/a%20b&sa=U").as_deref(),
            Some("https://example.org/a%20b")
        );
    }
}
