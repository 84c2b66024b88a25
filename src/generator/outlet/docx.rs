//! 简报文本到DOCX的逐行映射

use anyhow::{Context, Result};
use docx_rs::{
    AbstractNumbering, Docx, IndentLevel, Level, LevelJc, LevelText, NumberFormat, Numbering,
    NumberingId, Paragraph, Run, SpecialIndentType, Start, Style, StyleType,
};
use regex::Regex;
use std::io::Cursor;
use std::sync::LazyLock;

use crate::generator::brief::strip_title_markers;
use crate::utils::text::file_stem_from_topic;

pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

const BULLET_NUMBERING_ID: usize = 1;

/// Markdown表格分隔行，例如 `|---|:---:|`
static TABLE_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\s|:-]*-[\s|:-]*$").unwrap());

/// 导出文件名：`Policy_Brief_<主题>.docx`
pub fn export_file_name(topic: &str) -> String {
    format!("Policy_Brief_{}.docx", file_stem_from_topic(topic))
}

/// 导出文档中的一个块
#[derive(Debug, Clone, PartialEq)]
pub enum ExportBlock {
    Heading { level: usize, text: String },
    Bullet(String),
    Paragraph(String),
}

/// 由简报文本映射得到的文档结构
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportDocument {
    blocks: Vec<ExportBlock>,
}

fn strip_bold(text: &str) -> String {
    text.replace("**", "").trim().to_string()
}

fn is_table_separator(line: &str) -> bool {
    line.contains('|') && TABLE_SEPARATOR.is_match(line)
}

impl ExportDocument {
    /// 第一行非空文本作为一级标题，其余按行首标记映射
    pub fn from_brief_text(text: &str) -> Self {
        let mut blocks = Vec::new();
        let mut lines = text.lines().map(str::trim).filter(|line| !line.is_empty());

        if let Some(first) = lines.next() {
            blocks.push(ExportBlock::Heading {
                level: 1,
                text: strip_title_markers(first),
            });
        }

        for line in lines {
            if is_table_separator(line) {
                continue;
            }

            if line.starts_with('#') {
                let level = line.chars().take_while(|c| *c == '#').count().min(6);
                let heading = strip_bold(line.trim_start_matches('#'));
                if !heading.is_empty() {
                    blocks.push(ExportBlock::Heading {
                        level,
                        text: heading,
                    });
                }
            } else if let Some(item) = line.strip_prefix("- ").or_else(|| line.strip_prefix("* ")) {
                blocks.push(ExportBlock::Bullet(strip_bold(item)));
            } else {
                blocks.push(ExportBlock::Paragraph(strip_bold(line)));
            }
        }

        Self { blocks }
    }

    pub fn blocks(&self) -> &[ExportBlock] {
        &self.blocks
    }

    pub fn heading_count(&self, level: usize) -> usize {
        self.blocks
            .iter()
            .filter(|b| matches!(b, ExportBlock::Heading { level: l, .. } if *l == level))
            .count()
    }

    pub fn bullet_count(&self) -> usize {
        self.blocks
            .iter()
            .filter(|b| matches!(b, ExportBlock::Bullet(_)))
            .count()
    }

    pub fn paragraph_count(&self) -> usize {
        self.blocks
            .iter()
            .filter(|b| matches!(b, ExportBlock::Paragraph(_)))
            .count()
    }

    fn base_document() -> Docx {
        let mut docx = Docx::new();
        for (level, size) in [(1, 36), (2, 32), (3, 28), (4, 26), (5, 24), (6, 22)] {
            docx = docx.add_style(
                Style::new(format!("Heading{}", level), StyleType::Paragraph)
                    .name(format!("Heading {}", level))
                    .size(size)
                    .bold(),
            );
        }

        docx.add_abstract_numbering(
            AbstractNumbering::new(BULLET_NUMBERING_ID).add_level(
                Level::new(
                    0,
                    Start::new(1),
                    NumberFormat::new("bullet"),
                    LevelText::new("•"),
                    LevelJc::new("left"),
                )
                .indent(Some(720), Some(SpecialIndentType::Hanging(360)), None, None),
            ),
        )
        .add_numbering(Numbering::new(BULLET_NUMBERING_ID, BULLET_NUMBERING_ID))
    }

    /// 生成DOCX字节
    pub fn to_docx(&self) -> Result<Vec<u8>> {
        let mut docx = Self::base_document();

        for block in &self.blocks {
            let paragraph = match block {
                ExportBlock::Heading { level, text } => Paragraph::new()
                    .add_run(Run::new().add_text(text))
                    .style(&format!("Heading{}", level)),
                ExportBlock::Bullet(text) => Paragraph::new()
                    .add_run(Run::new().add_text(text))
                    .numbering(NumberingId::new(BULLET_NUMBERING_ID), IndentLevel::new(0)),
                ExportBlock::Paragraph(text) => {
                    Paragraph::new().add_run(Run::new().add_text(text))
                }
            };
            docx = docx.add_paragraph(paragraph);
        }

        let mut buffer = Cursor::new(Vec::new());
        docx.build()
            .pack(&mut buffer)
            .context("Failed to assemble the DOCX export")?;
        Ok(buffer.into_inner())
    }
}
