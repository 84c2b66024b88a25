//! 数据可视化：声明式图表描述的生成、校验与Vega-Lite转换

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::sync::LazyLock;
use thiserror::Error;

use crate::generator::prompt::{GeneratorPromptBuilder, PromptSection, PromptTemplate};
use crate::i18n::TargetLanguage;
use crate::llm::Generator;
use crate::types::notice::Notices;

/// 模型表示“没有可视化数据”时返回的标记
pub const NO_DATA_SENTINEL: &str = "#NO_DATA";

/// 印尼语提示词下模型偶尔会使用的同义标记
const NO_DATA_ALIASES: [&str; 2] = [NO_DATA_SENTINEL, "#TIDAK_ADA_DATA"];

const MAX_ROWS: usize = 500;

static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"```[A-Za-z0-9_+-]*").unwrap());

/// 去掉模型输出中的代码块标记
pub fn strip_code_fences(raw: &str) -> String {
    CODE_FENCE.replace_all(raw, "").trim().to_string()
}

/// 图表生成结果，此阶段不做校验
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "kind", content = "content", rename_all = "snake_case")]
pub enum ChartSnippet {
    NoData,
    Spec(String),
}

impl ChartSnippet {
    pub fn from_response(raw: &str) -> Self {
        let text = strip_code_fences(raw);
        if text.is_empty() || NO_DATA_ALIASES.iter().any(|s| text.contains(s)) {
            ChartSnippet::NoData
        } else {
            ChartSnippet::Spec(text)
        }
    }
}

#[derive(Debug, Error)]
pub enum ChartSpecError {
    #[error("chart description is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("chart description has no data rows")]
    NoRows,
    #[error("chart description has {0} data rows, the limit is {MAX_ROWS}")]
    TooManyRows(usize),
    #[error("encoding field name is empty")]
    EmptyField,
    #[error("data row {row} has no field `{field}`")]
    MissingField { row: usize, field: String },
    #[error("data row {row} field `{field}` is not numeric")]
    NotNumeric { row: usize, field: String },
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChartMark {
    Bar,
    Line,
    Area,
    Point,
    Arc,
}

impl ChartMark {
    fn as_str(&self) -> &'static str {
        match self {
            ChartMark::Bar => "bar",
            ChartMark::Line => "line",
            ChartMark::Area => "area",
            ChartMark::Point => "point",
            ChartMark::Arc => "arc",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Nominal,
    Ordinal,
    Quantitative,
    Temporal,
}

impl FieldKind {
    fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Nominal => "nominal",
            FieldKind::Ordinal => "ordinal",
            FieldKind::Quantitative => "quantitative",
            FieldKind::Temporal => "temporal",
        }
    }
}

/// 单个通道的编码
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Encoding {
    pub field: String,
    #[serde(alias = "type")]
    pub kind: FieldKind,
    #[serde(default)]
    pub title: Option<String>,
}

impl Encoding {
    fn to_vega_lite(&self) -> Value {
        let mut channel = json!({
            "field": self.field,
            "type": self.kind.as_str(),
        });
        if let Some(title) = &self.title {
            channel["title"] = json!(title);
        }
        channel
    }
}

/// 声明式图表描述
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ChartSpec {
    pub title: String,
    pub mark: ChartMark,
    pub x: Encoding,
    pub y: Encoding,
    #[serde(default)]
    pub color: Option<Encoding>,
    pub data: Vec<Map<String, Value>>,
}

impl ChartSpec {
    /// 解析并校验模型给出的图表描述
    pub fn parse(snippet: &str) -> Result<Self, ChartSpecError> {
        let spec: ChartSpec = serde_json::from_str(snippet.trim())?;
        spec.validate()?;
        Ok(spec)
    }

    fn encodings(&self) -> impl Iterator<Item = &Encoding> {
        [Some(&self.x), Some(&self.y), self.color.as_ref()]
            .into_iter()
            .flatten()
    }

    pub fn validate(&self) -> Result<(), ChartSpecError> {
        if self.data.is_empty() {
            return Err(ChartSpecError::NoRows);
        }
        if self.data.len() > MAX_ROWS {
            return Err(ChartSpecError::TooManyRows(self.data.len()));
        }

        for encoding in self.encodings() {
            if encoding.field.trim().is_empty() {
                return Err(ChartSpecError::EmptyField);
            }
            for (row, values) in self.data.iter().enumerate() {
                let Some(value) = values.get(&encoding.field) else {
                    return Err(ChartSpecError::MissingField {
                        row,
                        field: encoding.field.clone(),
                    });
                };
                if encoding.kind == FieldKind::Quantitative && !value.is_number() {
                    return Err(ChartSpecError::NotNumeric {
                        row,
                        field: encoding.field.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// 转换为Vega-Lite v5文档；扇形图用theta/color通道
    pub fn to_vega_lite(&self) -> Value {
        let mut encoding = Map::new();
        if self.mark == ChartMark::Arc {
            encoding.insert("theta".to_string(), self.y.to_vega_lite());
            encoding.insert("color".to_string(), self.x.to_vega_lite());
        } else {
            encoding.insert("x".to_string(), self.x.to_vega_lite());
            encoding.insert("y".to_string(), self.y.to_vega_lite());
            if let Some(color) = &self.color {
                encoding.insert("color".to_string(), color.to_vega_lite());
            }
        }

        json!({
            "$schema": "https://vega.github.io/schema/vega-lite/v5.json",
            "title": self.title,
            "width": "container",
            "data": { "values": self.data },
            "mark": { "type": self.mark.as_str(), "tooltip": true },
            "encoding": encoding,
        })
    }
}

/// 图表描述生成器
pub struct ChartComposer {
    language: TargetLanguage,
}

impl ChartComposer {
    pub fn new(language: TargetLanguage) -> Self {
        Self { language }
    }

    fn template() -> PromptTemplate {
        PromptTemplate {
            system_prompt: "You are a data visualisation specialist. You describe charts declaratively as JSON; you never write code.".to_string(),
            opening_instruction: "Analyse the CONTEXT and design ONE simple chart that visualises its most interesting or important numeric data.".to_string(),
            closing_instruction: format!(
                r#"## Instructions
1. Look for numeric data that can be compared (for example across years, across regions, percentages).
2. If there is no data suitable for a chart, reply with exactly: {}
3. Otherwise reply with ONE JSON object and nothing else, using this schema:
   - title: chart title
   - mark: one of "bar", "line", "area", "point", "arc"
   - x, y: {{ "field": column name, "kind": one of "nominal", "ordinal", "quantitative", "temporal", "title": axis title (optional) }}
   - color: optional encoding with the same shape
   - data: array of row objects; every encoded field must be present in every row and quantitative values must be JSON numbers
4. Use only figures that appear in the CONTEXT.

Example of a good reply:
{{
  "title": "Decline in Stunting Cases",
  "mark": "bar",
  "x": {{ "field": "Year", "kind": "ordinal", "title": "Year" }},
  "y": {{ "field": "Cases", "kind": "quantitative", "title": "Stunting cases" }},
  "data": [
    {{ "Year": "2022", "Cases": 120 }},
    {{ "Year": "2023", "Cases": 95 }},
    {{ "Year": "2024", "Cases": 78 }}
  ]
}}"#,
                NO_DATA_SENTINEL
            ),
        }
    }

    /// 请求图表描述；失败时返回None，不影响简报展示
    pub async fn compose<G: Generator>(
        &self,
        generator: &G,
        context: &str,
        notices: &mut Notices,
    ) -> Option<ChartSnippet> {
        let labels = self.language.labels();
        notices.info(labels.charting);
        let (system_prompt, user_prompt) = GeneratorPromptBuilder::new(Self::template())
            .build_prompts(self.language, &[PromptSection::fenced("CONTEXT", context)]);

        match generator.prompt(&system_prompt, &user_prompt).await {
            Ok(raw) => Some(ChartSnippet::from_response(&raw)),
            Err(e) => {
                notices.error(format!("{}: {:#}", labels.chart_error, e));
                None
            }
        }
    }
}
