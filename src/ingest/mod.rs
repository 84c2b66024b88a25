//! 上传文档的文本提取

use anyhow::{Context, Result, anyhow};
use docx_rs::{DocumentChild, ParagraphChild, RunChild};
use serde::{Deserialize, Serialize};

/// 支持的上传文档格式
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
}

impl DocumentKind {
    /// 按扩展名识别，不区分大小写
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let (_, extension) = file_name.trim().rsplit_once('.')?;
        match extension.to_lowercase().as_str() {
            "pdf" => Some(DocumentKind::Pdf),
            "docx" => Some(DocumentKind::Docx),
            _ => None,
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentKind::Pdf => write!(f, "PDF"),
            DocumentKind::Docx => write!(f, "DOCX"),
        }
    }
}

/// 提取文档中的纯文本
pub fn extract_text(kind: DocumentKind, bytes: &[u8]) -> Result<String> {
    match kind {
        DocumentKind::Pdf => pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| anyhow!("PDF text extraction failed: {}", e)),
        DocumentKind::Docx => extract_docx_text(bytes),
    }
}

/// 逐段拼接 DOCX 正文中的文本
fn extract_docx_text(bytes: &[u8]) -> Result<String> {
    let docx = docx_rs::read_docx(bytes).context("DOCX text extraction failed")?;

    let mut paragraphs = Vec::new();
    for child in &docx.document.children {
        if let DocumentChild::Paragraph(paragraph) = child {
            let mut text = String::new();
            for paragraph_child in &paragraph.children {
                if let ParagraphChild::Run(run) = paragraph_child {
                    for run_child in &run.children {
                        if let RunChild::Text(t) = run_child {
                            text.push_str(&t.text);
                        }
                    }
                }
            }
            if !text.trim().is_empty() {
                paragraphs.push(text);
            }
        }
    }

    Ok(paragraphs.join("\n"))
}
