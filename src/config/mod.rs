use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::i18n::TargetLanguage;

/// 主环境变量，优先于 `GOOGLE_API_KEY`
pub const API_KEY_ENV: &str = "POLICY_BRIEF_API_KEY";
pub const GOOGLE_API_KEY_ENV: &str = "GOOGLE_API_KEY";

/// 默认配置文件名
pub const DEFAULT_CONFIG_FILE: &str = "policy-brief.toml";

/// LLM Provider类型
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub enum LLMProvider {
    #[serde(rename = "gemini")]
    #[default]
    Gemini,
    #[serde(rename = "openai")]
    OpenAI,
    #[serde(rename = "anthropic")]
    Anthropic,
    #[serde(rename = "ollama")]
    Ollama,
}

impl LLMProvider {
    /// 本地推理服务不需要API KEY
    pub fn requires_api_key(&self) -> bool {
        !matches!(self, LLMProvider::Ollama)
    }
}

impl std::fmt::Display for LLMProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LLMProvider::Gemini => write!(f, "gemini"),
            LLMProvider::OpenAI => write!(f, "openai"),
            LLMProvider::Anthropic => write!(f, "anthropic"),
            LLMProvider::Ollama => write!(f, "ollama"),
        }
    }
}

impl std::str::FromStr for LLMProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gemini" | "google" => Ok(LLMProvider::Gemini),
            "openai" => Ok(LLMProvider::OpenAI),
            "anthropic" => Ok(LLMProvider::Anthropic),
            "ollama" => Ok(LLMProvider::Ollama),
            _ => Err(format!("Unknown provider: {}", s)),
        }
    }
}

/// 应用程序配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct Config {
    /// 生成简报使用的语言
    pub target_language: TargetLanguage,

    /// 上下文最大字符数，超出部分截断后再交给模型
    pub max_context_chars: usize,

    /// LLM模型配置
    pub llm: LLMConfig,

    /// 搜索配置
    pub search: SearchConfig,

    /// Web服务配置
    pub server: ServerConfig,

    /// 缓存配置
    pub cache: CacheConfig,

    /// 是否启用详细日志
    pub verbose: bool,
}

/// LLM模型配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LLMConfig {
    /// LLM Provider类型
    pub provider: LLMProvider,

    /// LLM API KEY
    pub api_key: String,

    /// LLM API基地址，为空时使用provider的默认地址
    pub api_base_url: String,

    /// 主模型
    pub model: String,

    /// 主模型失败后的备选模型
    pub fallback_model: Option<String>,

    /// 最大tokens
    pub max_tokens: u32,

    /// 温度
    pub temperature: f64,

    /// 调用次数（1 表示不重试）
    pub retry_attempts: u32,

    /// 重试间隔（毫秒）
    pub retry_delay_ms: u64,
}

/// 搜索配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct SearchConfig {
    /// 追加到主题后的地区关键词
    pub region: String,

    /// 优先检索的站点
    pub preferred_domains: Vec<String>,

    pub duckduckgo_max_results: usize,

    pub google_max_results: usize,

    /// 请求超时（秒）
    pub timeout_seconds: u64,

    pub user_agent: String,
}

/// Web服务配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    /// 监听地址
    pub bind: String,

    /// 上传文件大小上限（字节）
    pub max_upload_bytes: usize,

    /// 保留的生成结果数量，供下载和页面重绘使用
    pub retained_results: usize,
}

/// 缓存配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct CacheConfig {
    /// 是否启用缓存
    pub enabled: bool,

    /// 缓存目录
    pub cache_dir: PathBuf,

    /// 缓存过期时间（小时）
    pub expire_hours: u64,
}

impl Config {
    /// 从文件加载配置
    pub fn from_file(path: &Path) -> Result<Self> {
        let mut file =
            File::open(path).context(format!("Failed to open config file: {:?}", path))?;
        let mut content = String::new();
        file.read_to_string(&mut content)
            .context("Failed to read config file")?;

        let mut config: Config =
            toml::from_str(&content).context("Failed to parse config file")?;
        if config.llm.api_key.is_empty() {
            config.llm.api_key = api_key_from_env();
        }
        Ok(config)
    }

    /// 加载显式指定的配置文件；未指定时尝试当前目录下的默认文件，都不存在则使用默认值
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        let default_path = std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(DEFAULT_CONFIG_FILE);
        if default_path.exists() {
            Self::from_file(&default_path)
        } else {
            Ok(Config::default())
        }
    }

    /// 启动前校验，缺少凭据时直接报错
    pub fn validate(&self) -> Result<()> {
        if self.llm.provider.requires_api_key() && self.llm.api_key.trim().is_empty() {
            return Err(anyhow!(
                "No API key found for provider '{}'. Set {} (or {}) or add `api_key` under [llm] in {}.",
                self.llm.provider,
                API_KEY_ENV,
                GOOGLE_API_KEY_ENV,
                DEFAULT_CONFIG_FILE
            ));
        }
        if self.llm.model.trim().is_empty() {
            return Err(anyhow!("`llm.model` must not be empty"));
        }
        if self.max_context_chars == 0 {
            return Err(anyhow!("`max_context_chars` must be greater than zero"));
        }
        Ok(())
    }
}

fn api_key_from_env() -> String {
    std::env::var(API_KEY_ENV)
        .or_else(|_| std::env::var(GOOGLE_API_KEY_ENV))
        .unwrap_or_default()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target_language: TargetLanguage::default(),
            max_context_chars: 60_000,
            llm: LLMConfig::default(),
            search: SearchConfig::default(),
            server: ServerConfig::default(),
            cache: CacheConfig::default(),
            verbose: false,
        }
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            provider: LLMProvider::default(),
            api_key: api_key_from_env(),
            api_base_url: String::new(),
            model: String::from("gemini-1.5-flash"),
            fallback_model: None,
            max_tokens: 8192,
            temperature: 0.2,
            retry_attempts: 1,
            retry_delay_ms: 2000,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            region: String::from("jawa tengah"),
            preferred_domains: vec![
                "docrida.id".to_string(),
                "ejournal.jatengprov.go.id".to_string(),
                "jatengprov.go.id".to_string(),
                "undip.ac.id".to_string(),
                "uns.ac.id".to_string(),
                "unnes.ac.id".to_string(),
                "walisongo.ac.id".to_string(),
                "sinta.kemdikbud.go.id".to_string(),
                "rama.kemdikbud.go.id".to_string(),
                "go.id".to_string(),
                "ac.id".to_string(),
            ],
            duckduckgo_max_results: 7,
            google_max_results: 10,
            timeout_seconds: 30,
            user_agent: String::from(
                "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36",
            ),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: String::from("127.0.0.1:8501"),
            max_upload_bytes: 20 * 1024 * 1024,
            retained_results: 32,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cache_dir: PathBuf::from(".policy-brief/cache"),
            expire_hours: 24,
        }
    }
}
