//! 文本生成服务抽象

use anyhow::Result;
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub mod client;

#[cfg(test)]
pub(crate) mod testing;

pub use client::LLMClient;

/// 生成服务接口，简报与图表的编写器只依赖这个trait
#[async_trait]
pub trait Generator: Send + Sync {
    /// 返回模型的自由文本输出
    async fn prompt(&self, system_prompt: &str, user_prompt: &str) -> Result<String>;

    /// 按 `T` 的JSON Schema提取结构化输出
    async fn extract<T>(&self, system_prompt: &str, user_prompt: &str) -> Result<T>
    where
        T: JsonSchema + for<'a> Deserialize<'a> + Serialize + Send + Sync + 'static;
}
