//! 单页表单的HTML

use crate::generator::outlet::html::escape_html;
use crate::i18n::TargetLanguage;
use crate::search::SearchEngine;
use crate::types::notice::{Notice, NoticeLevel};

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; max-width: 880px; margin: 2rem auto; padding: 0 1rem; color: #1f2933; }
form { border: 1px solid #d9e2ec; border-radius: 8px; padding: 1rem; margin-bottom: 1rem; }
fieldset { border: none; padding: 0; margin: 0.5rem 0; }
input[type=text] { width: 100%; padding: 0.5rem; box-sizing: border-box; }
.button, button { background: #1f6feb; color: #fff; border: none; border-radius: 6px; padding: 0.5rem 1rem; text-decoration: none; cursor: pointer; }
.notice { padding: 0.5rem 0.75rem; border-radius: 6px; margin: 0.25rem 0; }
.notice.info { background: #e8f1fd; }
.notice.success { background: #e3f9e5; }
.notice.warning { background: #fff7e0; }
.notice.error { background: #ffe3e3; }
.chart-view { width: 100%; }
table { border-collapse: collapse; }
td, th { border: 1px solid #d9e2ec; padding: 0.25rem 0.5rem; }
"#;

const VEGA_SCRIPTS: &str = r#"<script src="https://cdn.jsdelivr.net/npm/vega@5"></script>
<script src="https://cdn.jsdelivr.net/npm/vega-lite@5"></script>
<script src="https://cdn.jsdelivr.net/npm/vega-embed@6"></script>"#;

/// 页面需要展示的内容
#[derive(Debug, Default)]
pub struct PageView<'a> {
    pub topic: &'a str,
    pub engine: SearchEngine,
    pub notices: Vec<Notice>,
    /// 已渲染的报告片段
    pub report_html: Option<String>,
}

fn level_class(level: NoticeLevel) -> &'static str {
    match level {
        NoticeLevel::Info => "info",
        NoticeLevel::Success => "success",
        NoticeLevel::Warning => "warning",
        NoticeLevel::Error => "error",
    }
}

fn render_notice(notice: &Notice) -> String {
    format!(
        "<p class=\"notice {}\">{} {}</p>\n",
        level_class(notice.level),
        notice.level.icon(),
        escape_html(&notice.message)
    )
}

fn render_forms(view: &PageView<'_>, language: TargetLanguage) -> String {
    let labels = language.labels();
    let topic = escape_html(view.topic);

    let radios = SearchEngine::all()
        .iter()
        .map(|engine| {
            format!(
                "<label><input type=\"radio\" name=\"engine\" value=\"{}\"{}> {}</label>",
                engine,
                if *engine == view.engine { " checked" } else { "" },
                engine.display_name()
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"<form method="post" action="/brief/search">
<h2>{search_tab}</h2>
<label for="topic-search">{topic_label}</label>
<input type="text" id="topic-search" name="topic" value="{topic}" placeholder="{placeholder}">
<fieldset><legend>{engine_label}</legend>
{radios}
</fieldset>
<button type="submit">{submit}</button>
</form>
<form method="post" action="/brief/upload" enctype="multipart/form-data">
<h2>{upload_tab}</h2>
<label for="topic-upload">{topic_label}</label>
<input type="text" id="topic-upload" name="topic" value="{topic}" placeholder="{placeholder}">
<fieldset><label for="file">{file_label}</label>
<input type="file" id="file" name="file" accept=".pdf,.docx">
</fieldset>
<button type="submit">{submit}</button>
</form>
"#,
        search_tab = escape_html(labels.search_tab),
        upload_tab = escape_html(labels.upload_tab),
        topic_label = escape_html(labels.topic_label),
        placeholder = escape_html(labels.topic_placeholder),
        engine_label = escape_html(labels.engine_label),
        file_label = escape_html(labels.file_label),
        submit = escape_html(labels.submit),
        topic = topic,
        radios = radios,
    )
}

/// 渲染完整页面
pub fn render_page(view: &PageView<'_>, language: TargetLanguage) -> String {
    let labels = language.labels();

    let mut body = String::new();
    body.push_str(&format!(
        "<h1>{}</h1>\n<p>{}</p>\n<hr>\n",
        escape_html(labels.page_title),
        escape_html(labels.page_subtitle)
    ));
    body.push_str(&render_forms(view, language));

    if !view.notices.is_empty() {
        body.push_str("<section class=\"notices\">\n");
        for notice in &view.notices {
            body.push_str(&render_notice(notice));
        }
        body.push_str("</section>\n");
    }

    if let Some(report) = &view.report_html {
        body.push_str("<hr>\n");
        body.push_str(report);
    }

    format!(
        "<!DOCTYPE html>\n<html lang=\"{}\">\n<head>\n<meta charset=\"utf-8\">\n<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n<title>{}</title>\n<style>{}</style>\n{}\n</head>\n<body>\n{}</body>\n</html>\n",
        language,
        escape_html(labels.page_title),
        STYLE,
        VEGA_SCRIPTS,
        body
    )
}
