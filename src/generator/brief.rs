//! 政策简报编写

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::generator::prompt::{GeneratorPromptBuilder, PromptSection, PromptTemplate};
use crate::i18n::{Labels, TargetLanguage};
use crate::llm::Generator;
use crate::types::context::AcquiredContext;
use crate::types::notice::Notices;

/// 结构化的四段式政策简报
#[derive(Debug, Serialize, Deserialize, Clone, JsonSchema, PartialEq)]
pub struct PolicyBrief {
    /// 简洁有力、体现分析结论的标题
    pub title: String,

    /// 执行摘要：1-2 个关键数据和主要建议
    pub executive_summary: String,

    /// 背景：问题的规模与紧迫性
    pub background: String,

    /// 按主题组织的发现与讨论，可包含Markdown表格，不包含标题行
    pub findings: String,

    /// 具体、可衡量、可执行的政策建议
    pub recommendations: String,
}

impl PolicyBrief {
    /// 返回为空的字段名
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("title", &self.title),
            ("executive_summary", &self.executive_summary),
            ("background", &self.background),
            ("findings", &self.findings),
            ("recommendations", &self.recommendations),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }

    pub fn is_valid(&self) -> bool {
        self.missing_fields().is_empty()
    }
}

/// 简报正文
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "kind", content = "content", rename_all = "snake_case")]
pub enum Brief {
    /// 通过校验的结构化输出
    Structured(PolicyBrief),
    /// 结构化提取失败后的自由文本，原样保留
    Freeform(String),
}

/// 字段内部的标题行降级为粗体，保证正文中只有四个章节标记
fn demote_headings(text: &str) -> String {
    text.trim()
        .lines()
        .map(|line| {
            let trimmed = line.trim_start();
            if trimmed.starts_with('#') {
                let heading = trimmed.trim_start_matches('#').trim();
                if heading.is_empty() {
                    String::new()
                } else {
                    format!("**{}**", heading)
                }
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// 去掉标题行中的Markdown标记和“标题:”前缀
pub fn strip_title_markers(line: &str) -> String {
    let mut title = line.trim().trim_start_matches('#').trim();
    title = title.trim_matches('*').trim();
    for label in TargetLanguage::all_title_labels() {
        if let Some(rest) = title.strip_prefix(label)
            && let Some(rest) = rest.trim_start().strip_prefix(':')
        {
            title = rest.trim_start_matches('*').trim();
            break;
        }
    }
    title.trim_matches('*').trim().to_string()
}

impl Brief {
    /// 渲染为Markdown；自由文本原样返回
    pub fn to_markdown(&self, labels: &Labels) -> String {
        match self {
            Brief::Structured(brief) => format!(
                "**{}:** {}\n\n### {}\n{}\n\n### {}\n{}\n\n### {}\n{}\n\n### {}\n{}\n",
                labels.title,
                collapse_title(&brief.title),
                labels.executive_summary,
                demote_headings(&brief.executive_summary),
                labels.background,
                demote_headings(&brief.background),
                labels.findings,
                demote_headings(&brief.findings),
                labels.recommendations,
                demote_headings(&brief.recommendations),
            ),
            Brief::Freeform(text) => text.clone(),
        }
    }

    /// 简报标题；自由文本取第一行
    pub fn title(&self) -> Option<String> {
        match self {
            Brief::Structured(brief) => Some(collapse_title(&brief.title)),
            Brief::Freeform(text) => text
                .lines()
                .find(|line| !line.trim().is_empty())
                .map(strip_title_markers)
                .filter(|title| !title.is_empty()),
        }
    }

    pub fn is_structured(&self) -> bool {
        matches!(self, Brief::Structured(_))
    }
}

fn collapse_title(title: &str) -> String {
    strip_title_markers(&title.split_whitespace().collect::<Vec<_>>().join(" "))
}

/// 政策简报编写器
pub struct BriefComposer {
    language: TargetLanguage,
    region: String,
}

impl BriefComposer {
    pub fn new(language: TargetLanguage, region: impl Into<String>) -> Self {
        Self {
            language,
            region: region.into(),
        }
    }

    fn system_prompt(&self) -> String {
        let agency = if self.region.trim().is_empty() {
            "a regional development planning agency".to_string()
        } else {
            format!(
                "the regional development planning agency (Bappeda) of {}",
                self.region.trim()
            )
        };
        format!(
            r#"You are a meticulous and analytical senior public policy analyst working for {}.
Your task is to SYNTHESISE the fragments of information in the CONTEXT into a data-rich, in-depth policy brief draft.

Rules:
- Use ONLY information found in the CONTEXT. Do not invent statistics, names, or sources.
- When you find comparative data or key statistics that can be tabulated, format them as a Markdown table.
- Do NOT write a references section and do NOT describe charts; the system appends those separately."#,
            agency
        )
    }

    fn structured_template(&self) -> PromptTemplate {
        PromptTemplate {
            system_prompt: self.system_prompt(),
            opening_instruction: r#"Analyse the material below and draft the policy brief."#.to_string(),
            closing_instruction: r#"## Output requirements
Fill in exactly these fields and nothing else:
- title: a sharp title that reflects the analysis (plain text, one line)
- executive_summary: a dense summary with 1-2 key data points and the main recommendation
- background: the background of the problem, with data on its scale and urgency in the region
- findings: the discussion organised by MAIN THEMES; for each theme present the data found (use Markdown tables where suitable), compare information from several sources, and analyse it
- recommendations: SPECIFIC, MEASURABLE, and ACTIONABLE policy recommendations, each strongly justified by the findings

Do not put Markdown headings (lines starting with #) inside any field."#
                .to_string(),
        }
    }

    fn freeform_template(&self, labels: &Labels) -> PromptTemplate {
        PromptTemplate {
            system_prompt: self.system_prompt(),
            opening_instruction: r#"Analyse the material below and draft the policy brief."#.to_string(),
            closing_instruction: format!(
                r#"## Output format
Write the policy brief using exactly this format (ONLY these 4 sections):

**{}:** [A sharp title that reflects the analysis]
### {}
[Dense summary, include 1-2 key data points, and state the main recommendation.]
### {}
[Background of the problem with data on its scale and urgency.]
### {}
[Discussion organised by MAIN THEMES. For each theme present the data found (use Markdown tables where suitable), compare information from several sources, and analyse it.]
### {}
[SPECIFIC, MEASURABLE, and ACTIONABLE recommendations with strong justification from the findings.]"#,
                labels.title,
                labels.executive_summary,
                labels.background,
                labels.findings,
                labels.recommendations
            ),
        }
    }

    fn sections(&self, topic: &str, acquired: &AcquiredContext) -> Vec<PromptSection> {
        vec![
            PromptSection::plain("Main topic", format!("\"{}\"", topic.trim())),
            PromptSection::plain("Context provenance", acquired.provenance.clone()),
            PromptSection::fenced("CONTEXT", acquired.context.clone()),
        ]
    }

    /// 编写简报：优先结构化提取，失败后退回自由文本
    pub async fn compose<G: Generator>(
        &self,
        generator: &G,
        topic: &str,
        acquired: &AcquiredContext,
        notices: &mut Notices,
    ) -> Option<Brief> {
        let labels = self.language.labels();
        notices.info(labels.drafting);
        let sections = self.sections(topic, acquired);

        let (system_prompt, user_prompt) = GeneratorPromptBuilder::new(self.structured_template())
            .build_prompts(self.language, &sections);
        match generator
            .extract::<PolicyBrief>(&system_prompt, &user_prompt)
            .await
        {
            Ok(brief) if brief.is_valid() => return Some(Brief::Structured(brief)),
            Ok(brief) => {
                warn!(missing = ?brief.missing_fields(), "structured brief incomplete, falling back to free-form draft");
            }
            Err(e) => {
                warn!(error = %e, "structured brief extraction failed, falling back to free-form draft");
            }
        }

        let (system_prompt, user_prompt) =
            GeneratorPromptBuilder::new(self.freeform_template(labels))
                .build_prompts(self.language, &sections);
        match generator.prompt(&system_prompt, &user_prompt).await {
            Ok(text) if !text.trim().is_empty() => Some(Brief::Freeform(text)),
            Ok(_) => {
                notices.error(format!("{}: {}", labels.brief_error, labels.empty_response));
                None
            }
            Err(e) => {
                notices.error(format!("{}: {:#}", labels.brief_error, e));
                None
            }
        }
    }
}

#[cfg(test)]
mod tests;
