//! 单元测试用的脚本化生成服务

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::Generator;

/// 按顺序返回预设响应；预设用完后返回错误
#[derive(Default)]
pub struct ScriptedGenerator {
    extract_responses: Mutex<VecDeque<Result<serde_json::Value, String>>>,
    prompt_responses: Mutex<VecDeque<Result<String, String>>>,
    user_prompts: Mutex<Vec<String>>,
    extract_calls: AtomicUsize,
    prompt_calls: AtomicUsize,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_extract(self, value: serde_json::Value) -> Self {
        self.push_extract(Ok(value))
    }

    pub fn with_extract_error(self, message: &str) -> Self {
        self.push_extract(Err(message.to_string()))
    }

    pub fn with_prompt(self, text: &str) -> Self {
        self.push_prompt(Ok(text.to_string()))
    }

    pub fn with_prompt_error(self, message: &str) -> Self {
        self.push_prompt(Err(message.to_string()))
    }

    fn push_extract(self, response: Result<serde_json::Value, String>) -> Self {
        self.extract_responses.lock().unwrap().push_back(response);
        self
    }

    fn push_prompt(self, response: Result<String, String>) -> Self {
        self.prompt_responses.lock().unwrap().push_back(response);
        self
    }

    pub fn extract_calls(&self) -> usize {
        self.extract_calls.load(Ordering::SeqCst)
    }

    pub fn prompt_calls(&self) -> usize {
        self.prompt_calls.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.extract_calls() + self.prompt_calls()
    }

    pub fn user_prompts(&self) -> Vec<String> {
        self.user_prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn prompt(&self, _system_prompt: &str, user_prompt: &str) -> Result<String> {
        self.prompt_calls.fetch_add(1, Ordering::SeqCst);
        self.user_prompts
            .lock()
            .unwrap()
            .push(user_prompt.to_string());
        match self.prompt_responses.lock().unwrap().pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(anyhow!(message)),
            None => Err(anyhow!("no scripted prompt response")),
        }
    }

    async fn extract<T>(&self, _system_prompt: &str, user_prompt: &str) -> Result<T>
    where
        T: JsonSchema + for<'a> Deserialize<'a> + Serialize + Send + Sync + 'static,
    {
        self.extract_calls.fetch_add(1, Ordering::SeqCst);
        self.user_prompts
            .lock()
            .unwrap()
            .push(user_prompt.to_string());
        let response = self.extract_responses.lock().unwrap().pop_front();
        match response {
            Some(Ok(value)) => Ok(serde_json::from_value(value)?),
            Some(Err(message)) => Err(anyhow!(message)),
            None => Err(anyhow!("no scripted extract response")),
        }
    }
}
