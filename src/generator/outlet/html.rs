//! 网页输出：报告渲染为HTML片段

use anyhow::{Result, anyhow};

use super::{Outlet, Report, ReportSection};
use crate::session::ResultState;

/// HTML文本转义
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Markdown渲染为HTML，支持GFM表格，不允许原始HTML
pub fn markdown_to_html(markdown: &str) -> Result<String> {
    markdown::to_html_with_options(markdown, &markdown::Options::gfm())
        .map_err(|e| anyhow!("Failed to render markdown: {}", e))
}

pub struct HtmlOutlet;

impl HtmlOutlet {
    fn render_section(&self, report: &Report, section: &ReportSection, html: &mut String) -> Result<()> {
        let labels = report.language.labels();
        match section {
            ReportSection::Download { file_name } => {
                html.push_str(&format!(
                    "<p class=\"download\"><a class=\"button\" href=\"/download/{}\" download=\"{}\">{}</a></p>\n",
                    report.id,
                    escape_html(file_name),
                    escape_html(labels.download)
                ));
            }
            ReportSection::Brief { markdown } => {
                html.push_str("<article class=\"brief\">\n");
                html.push_str(&markdown_to_html(markdown)?);
                html.push_str("\n</article>\n");
            }
            ReportSection::Chart { title, vega_lite } => {
                let element_id = format!("chart-{}", report.id.simple());
                // 防止JSON中的 `</script>` 提前结束脚本块
                let spec = serde_json::to_string(vega_lite)?.replace("</", "<\\/");
                html.push_str(&format!(
                    "<section class=\"chart\">\n<h3>{}</h3>\n<div id=\"{id}\" class=\"chart-view\" aria-label=\"{}\"></div>\n<script type=\"application/json\" id=\"{id}-spec\">{}</script>\n<script>vegaEmbed('#{id}', JSON.parse(document.getElementById('{id}-spec').textContent), {{actions: false}});</script>\n</section>\n",
                    escape_html(labels.chart),
                    escape_html(title),
                    spec,
                    id = element_id,
                ));
            }
            ReportSection::ChartFailed { warning, raw } => {
                html.push_str(&format!(
                    "<section class=\"chart\">\n<h3>{}</h3>\n<p class=\"notice warning\">⚠️ {}</p>\n<pre><code>{}</code></pre>\n</section>\n",
                    escape_html(labels.chart),
                    escape_html(warning),
                    escape_html(raw)
                ));
            }
            ReportSection::References { urls } => {
                html.push_str(&format!(
                    "<section class=\"references\">\n<h3>{}</h3>\n<ul>\n",
                    escape_html(labels.references)
                ));
                for url in urls {
                    let url = escape_html(url);
                    html.push_str(&format!(
                        "<li><a href=\"{0}\" rel=\"noopener noreferrer\" target=\"_blank\">{0}</a></li>\n",
                        url
                    ));
                }
                html.push_str("</ul>\n</section>\n");
            }
            ReportSection::DocumentNotice => {
                html.push_str(&format!(
                    "<p class=\"notice info\">ℹ️ {}</p>\n",
                    escape_html(labels.document_notice)
                ));
            }
        }
        Ok(())
    }
}

impl Outlet for HtmlOutlet {
    type Output = String;

    fn publish(&self, _state: &ResultState, report: &Report) -> Result<String> {
        let mut html = String::new();
        for section in &report.sections {
            self.render_section(report, section, &mut html)?;
        }
        Ok(html)
    }
}
