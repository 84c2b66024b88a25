//! 命令行输出：把报告写入目录

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use super::{Outlet, Presenter, Report, ReportSection};
use crate::session::ResultState;

pub struct DiskOutlet {
    output_dir: PathBuf,
}

impl DiskOutlet {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// 报告的Markdown版本：正文、图表说明、参考资料
    pub fn report_markdown(report: &Report) -> String {
        let labels = report.language.labels();
        let mut markdown = String::new();

        for section in &report.sections {
            match section {
                ReportSection::Download { .. } => {}
                ReportSection::Brief { markdown: brief } => {
                    markdown.push_str(brief.trim_end());
                    markdown.push_str("\n\n");
                }
                ReportSection::Chart { title, .. } => {
                    markdown.push_str(&format!("### {}\n{}\n\n", labels.chart, title));
                }
                ReportSection::ChartFailed { warning, raw } => {
                    markdown.push_str(&format!(
                        "### {}\n> {}\n\n```json\n{}\n```\n\n",
                        labels.chart, warning, raw
                    ));
                }
                ReportSection::References { urls } => {
                    markdown.push_str(&format!("### {}\n", labels.references));
                    for url in urls {
                        markdown.push_str(&format!("- {}\n", url));
                    }
                }
                ReportSection::DocumentNotice => {
                    markdown.push_str(&format!("_{}_\n", labels.document_notice));
                }
            }
        }

        markdown
    }

    fn write(&self, path: PathBuf, contents: impl AsRef<[u8]>) -> Result<PathBuf> {
        fs::write(&path, contents)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("💾 Saved {}", path.display());
        Ok(path)
    }
}

impl Outlet for DiskOutlet {
    type Output = Vec<PathBuf>;

    fn publish(&self, state: &ResultState, report: &Report) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(&self.output_dir).with_context(|| {
            format!("Failed to create output directory {}", self.output_dir.display())
        })?;

        let stem = state
            .file_name
            .strip_suffix(".docx")
            .unwrap_or(&state.file_name);
        let mut written = Vec::new();

        written.push(self.write(
            self.output_dir.join(format!("{}.md", stem)),
            Self::report_markdown(report),
        )?);

        let docx = Presenter::export(state, report.language).to_docx()?;
        written.push(self.write(self.output_dir.join(&state.file_name), docx)?);

        for section in &report.sections {
            if let ReportSection::Chart { vega_lite, .. } = section {
                let spec = serde_json::to_string_pretty(vega_lite)?;
                written.push(self.write(
                    self.output_dir.join(format!("{}.chart.vl.json", stem)),
                    spec,
                )?);
            }
        }

        Ok(written)
    }
}
