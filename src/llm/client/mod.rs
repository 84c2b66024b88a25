//! LLM客户端 - 提供统一的LLM服务接口

use anyhow::Result;
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::{cache::CacheManager, config::Config, llm::Generator};

mod providers;

use providers::ProviderClient;

const CACHE_PROMPT: &str = "prompt";
const CACHE_EXTRACT: &str = "extract";

/// LLM客户端 - 提供统一的LLM服务接口
#[derive(Clone)]
pub struct LLMClient {
    config: Config,
    client: ProviderClient,
    cache: Arc<CacheManager>,
}

impl LLMClient {
    /// 创建新的LLM客户端
    pub fn new(config: Config) -> Result<Self> {
        let client = ProviderClient::new(&config.llm)?;
        let cache = Arc::new(CacheManager::new(config.cache.clone()));
        Ok(Self {
            config,
            client,
            cache,
        })
    }

    /// 检查模型连接和功能是否正常
    pub async fn check_connection(&self) -> Result<()> {
        info!(provider = %self.config.llm.provider, model = %self.config.llm.model, "checking model connection");
        match self
            .prompt_with_model(
                &self.config.llm.model,
                "You are a helpful assistant.",
                "Hello",
            )
            .await
        {
            Ok(_) => {
                info!("model connection ok");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "model connection failed");
                Err(e)
            }
        }
    }

    /// 候选模型列表：主模型在前，备选模型在后
    fn candidate_models(&self) -> Vec<String> {
        let llm_config = &self.config.llm;
        let mut models = vec![llm_config.model.clone()];
        if let Some(fallback) = &llm_config.fallback_model
            && !fallback.trim().is_empty()
            && fallback != &llm_config.model
        {
            models.push(fallback.clone());
        }
        models
    }

    fn cache_key(model: &str, system_prompt: &str, user_prompt: &str) -> String {
        format!("{}\n---\n{}\n---\n{}", model, system_prompt, user_prompt)
    }

    /// 通用重试逻辑，retry_attempts 为 1 时只调用一次
    async fn retry_with_backoff<T, F, Fut>(&self, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, anyhow::Error>>,
    {
        let llm_config = &self.config.llm;
        let max_attempts = llm_config.retry_attempts.max(1);
        let retry_delay_ms = llm_config.retry_delay_ms;
        let mut attempts = 0;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(err) => {
                    attempts += 1;
                    if attempts >= max_attempts {
                        return Err(err);
                    }
                    warn!(
                        attempt = attempts,
                        max_attempts,
                        error = %err,
                        "model call failed, retrying"
                    );
                    tokio::time::sleep(std::time::Duration::from_millis(retry_delay_ms)).await;
                }
            }
        }
    }

    async fn prompt_with_model(
        &self,
        model: &str,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String> {
        let agent = self
            .client
            .create_agent(model, system_prompt, &self.config.llm)?;
        self.retry_with_backoff(|| async { agent.prompt(user_prompt).await })
            .await
    }

    async fn extract_with_model<T>(
        &self,
        model: &str,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<T>
    where
        T: JsonSchema + for<'a> Deserialize<'a> + Serialize + Send + Sync + 'static,
    {
        let extractor =
            self.client
                .create_extractor::<T>(model, system_prompt, &self.config.llm)?;
        self.retry_with_backoff(|| async { extractor.extract(user_prompt).await })
            .await
    }

    /// 单轮对话，主模型失败后尝试备选模型
    pub async fn prompt(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let mut last_error = None;

        for model in self.candidate_models() {
            let cache_key = Self::cache_key(&model, system_prompt, user_prompt);
            if let Some(cached) = self.cache.get::<String>(CACHE_PROMPT, &cache_key).await? {
                debug!(%model, "prompt served from cache");
                return Ok(cached);
            }

            match self
                .prompt_with_model(&model, system_prompt, user_prompt)
                .await
            {
                Ok(text) => {
                    if let Err(e) = self
                        .cache
                        .set(CACHE_PROMPT, &cache_key, &text, Some(&model))
                        .await
                    {
                        warn!(error = %e, "failed to write prompt cache");
                    }
                    return Ok(text);
                }
                Err(e) => {
                    warn!(%model, error = %e, "prompt failed");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| anyhow::anyhow!("no model configured")))
    }

    /// 结构化数据提取，主模型失败后尝试备选模型
    pub async fn extract<T>(&self, system_prompt: &str, user_prompt: &str) -> Result<T>
    where
        T: JsonSchema + for<'a> Deserialize<'a> + Serialize + Send + Sync + 'static,
    {
        let category = format!("{}/{}", CACHE_EXTRACT, short_type_name::<T>());
        let mut last_error = None;

        for model in self.candidate_models() {
            let cache_key = Self::cache_key(&model, system_prompt, user_prompt);
            if let Some(cached) = self.cache.get::<T>(&category, &cache_key).await? {
                debug!(%model, "extraction served from cache");
                return Ok(cached);
            }

            match self
                .extract_with_model::<T>(&model, system_prompt, user_prompt)
                .await
            {
                Ok(value) => {
                    if let Err(e) = self
                        .cache
                        .set(&category, &cache_key, &value, Some(&model))
                        .await
                    {
                        warn!(error = %e, "failed to write extraction cache");
                    }
                    return Ok(value);
                }
                Err(e) => {
                    warn!(%model, error = %e, "extraction failed");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| anyhow::anyhow!("no model configured")))
    }
}

/// 缓存目录名只取类型名最后一段
fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}

#[async_trait]
impl Generator for LLMClient {
    async fn prompt(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        LLMClient::prompt(self, system_prompt, user_prompt).await
    }

    async fn extract<T>(&self, system_prompt: &str, user_prompt: &str) -> Result<T>
    where
        T: JsonSchema + for<'a> Deserialize<'a> + Serialize + Send + Sync + 'static,
    {
        LLMClient::extract::<T>(self, system_prompt, user_prompt).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LLMProvider;
    use tempfile::TempDir;

    fn client_with(dir: &TempDir, fallback: Option<&str>) -> LLMClient {
        let mut config = Config::default();
        config.llm.provider = LLMProvider::Ollama;
        config.llm.model = "llama3".to_string();
        config.llm.fallback_model = fallback.map(str::to_string);
        config.cache.cache_dir = dir.path().to_path_buf();
        LLMClient::new(config).unwrap()
    }

    #[test]
    fn test_candidate_models_without_fallback() {
        let dir = TempDir::new().unwrap();
        let client = client_with(&dir, None);
        assert_eq!(client.candidate_models(), vec!["llama3".to_string()]);
    }

    #[test]
    fn test_candidate_models_with_fallback() {
        let dir = TempDir::new().unwrap();
        let client = client_with(&dir, Some("qwen2.5"));
        assert_eq!(
            client.candidate_models(),
            vec!["llama3".to_string(), "qwen2.5".to_string()]
        );
    }

    #[test]
    fn test_candidate_models_ignores_duplicate_fallback() {
        let dir = TempDir::new().unwrap();
        let client = client_with(&dir, Some("llama3"));
        assert_eq!(client.candidate_models().len(), 1);
    }

    #[tokio::test]
    async fn test_prompt_served_from_cache() {
        let dir = TempDir::new().unwrap();
        let client = client_with(&dir, None);

        let key = LLMClient::cache_key("llama3", "sys", "user");
        client
            .cache
            .set(CACHE_PROMPT, &key, "cached draft".to_string(), Some("llama3"))
            .await
            .unwrap();

        let text = client.prompt("sys", "user").await.unwrap();
        assert_eq!(text, "cached draft");
    }

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name::<String>(), "String");
        assert_eq!(short_type_name::<crate::generator::PolicyBrief>(), "PolicyBrief");
    }
}
