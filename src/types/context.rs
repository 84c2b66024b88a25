use serde::{Deserialize, Serialize};

/// 单条搜索结果
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SearchHit {
    pub url: String,

    /// 结果摘要；只返回链接的搜索引擎为None
    pub snippet: Option<String>,
}

impl SearchHit {
    pub fn url_only(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            snippet: None,
        }
    }

    pub fn with_snippet(url: impl Into<String>, snippet: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            snippet: Some(snippet.into()),
        }
    }
}

/// 获取到的上下文，作为简报生成的事实依据
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AcquiredContext {
    /// 拼接后的上下文文本
    pub context: String,

    /// 来源链接；上下文来自上传文档时为None
    pub sources: Option<Vec<String>>,

    /// 上下文来源说明，只用于提示词
    pub provenance: String,
}
