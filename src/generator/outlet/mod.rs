use anyhow::Result;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::generator::chart::{ChartSnippet, ChartSpec};
use crate::i18n::TargetLanguage;
use crate::session::ResultState;

pub mod disk;
pub mod docx;
pub mod html;

pub use disk::DiskOutlet;
pub use docx::{DOCX_MIME, ExportBlock, ExportDocument, export_file_name};
pub use html::HtmlOutlet;

/// 报告中的一个展示块，按渲染顺序排列
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReportSection {
    Download { file_name: String },
    Brief { markdown: String },
    Chart { title: String, vega_lite: Value },
    /// 图表描述无法解析时展示警告和原始文本
    ChartFailed { warning: String, raw: String },
    References { urls: Vec<String> },
    DocumentNotice,
}

/// 一次结果的渲染计划
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub id: Uuid,
    pub language: TargetLanguage,
    pub sections: Vec<ReportSection>,
}

impl Report {
    pub fn has_chart(&self) -> bool {
        self.sections
            .iter()
            .any(|s| matches!(s, ReportSection::Chart { .. }))
    }
}

/// 把结果状态转换为报告
pub struct Presenter;

impl Presenter {
    pub fn render(state: &ResultState, language: TargetLanguage) -> Report {
        let labels = language.labels();
        let mut sections = vec![
            ReportSection::Download {
                file_name: state.file_name.clone(),
            },
            ReportSection::Brief {
                markdown: state.brief.to_markdown(labels),
            },
        ];

        if let Some(ChartSnippet::Spec(raw)) = &state.chart {
            match ChartSpec::parse(raw) {
                Ok(spec) => sections.push(ReportSection::Chart {
                    title: spec.title.clone(),
                    vega_lite: spec.to_vega_lite(),
                }),
                Err(e) => sections.push(ReportSection::ChartFailed {
                    warning: format!("{}: {}", labels.chart_failed, e),
                    raw: raw.clone(),
                }),
            }
        }

        match &state.sources {
            Some(urls) => sections.push(ReportSection::References { urls: urls.clone() }),
            None => sections.push(ReportSection::DocumentNotice),
        }

        Report {
            id: state.id,
            language,
            sections,
        }
    }

    /// 导出文档：只包含简报正文
    pub fn export(state: &ResultState, language: TargetLanguage) -> ExportDocument {
        ExportDocument::from_brief_text(&state.brief.to_markdown(language.labels()))
    }
}

/// 报告输出端
pub trait Outlet {
    type Output;

    fn publish(&self, state: &ResultState, report: &Report) -> Result<Self::Output>;
}

#[cfg(test)]
mod tests;
