use crate::config::{Config, LLMProvider};
use crate::i18n::TargetLanguage;
use crate::search::SearchEngine;
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::warn;

/// policy-brief - 由AI驱动的政策简报生成器
#[derive(Parser, Debug)]
#[command(name = "policy-brief")]
#[command(
    about = "AI-assisted policy brief generator. Gathers context from web search or an uploaded document and drafts a four-section policy brief with a data chart and a DOCX export."
)]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// 配置文件路径
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// 是否启用详细日志
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// LLM Provider (gemini, openai, anthropic, ollama)
    #[arg(long, global = true)]
    pub llm_provider: Option<String>,

    /// 主模型
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// 主模型失败时使用的备用模型
    #[arg(long, global = true)]
    pub fallback_model: Option<String>,

    /// LLM API基地址
    #[arg(long, global = true)]
    pub llm_api_base_url: Option<String>,

    /// LLM API KEY
    #[arg(long, global = true)]
    pub llm_api_key: Option<String>,

    /// 最大tokens数
    #[arg(long, global = true)]
    pub max_tokens: Option<u32>,

    /// 温度参数
    #[arg(long, global = true)]
    pub temperature: Option<f64>,

    /// 目标语言 (id, en)
    #[arg(long, global = true)]
    pub target_language: Option<String>,

    /// 搜索时附加的地区关键词
    #[arg(long, global = true)]
    pub region: Option<String>,

    /// 是否禁用缓存
    #[arg(long, global = true)]
    pub no_cache: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// 启动网页服务（默认）
    Serve {
        /// 监听地址
        #[arg(long)]
        bind: Option<String>,

        /// 启动前检查模型连接
        #[arg(long)]
        check: bool,
    },

    /// 生成一份简报并写入输出目录
    Generate {
        /// 简报主题
        #[arg(short, long)]
        topic: String,

        /// 搜索引擎 (duckduckgo, google)
        #[arg(short, long, default_value = "duckduckgo")]
        engine: SearchEngine,

        /// 使用PDF或DOCX文档作为上下文，代替网页搜索
        #[arg(short, long)]
        document: Option<PathBuf>,

        /// 输出目录
        #[arg(short, long, default_value = "./policy-brief.out")]
        output_dir: PathBuf,
    },
}

impl Default for Command {
    fn default() -> Self {
        Command::Serve {
            bind: None,
            check: false,
        }
    }
}

impl Args {
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or_default()
    }

    /// 将CLI参数转换为配置
    pub fn into_config(self) -> Result<Config> {
        let mut config = Config::load(self.config.as_deref())?;

        // 覆盖LLM配置
        if let Some(provider_str) = self.llm_provider {
            match provider_str.parse::<LLMProvider>() {
                Ok(provider) => config.llm.provider = provider,
                Err(e) => warn!("{}, keeping provider {}", e, config.llm.provider),
            }
        }
        if let Some(model) = self.model {
            config.llm.model = model;
        }
        if let Some(fallback_model) = self.fallback_model {
            config.llm.fallback_model = Some(fallback_model);
        }
        if let Some(llm_api_base_url) = self.llm_api_base_url {
            config.llm.api_base_url = llm_api_base_url;
        }
        if let Some(llm_api_key) = self.llm_api_key {
            config.llm.api_key = llm_api_key;
        }
        if let Some(max_tokens) = self.max_tokens {
            config.llm.max_tokens = max_tokens;
        }
        if let Some(temperature) = self.temperature {
            config.llm.temperature = temperature;
        }

        if let Some(target_language) = self.target_language {
            match target_language.parse::<TargetLanguage>() {
                Ok(language) => config.target_language = language,
                Err(e) => warn!("{}, keeping {}", e, config.target_language.display_name()),
            }
        }
        if let Some(region) = self.region {
            config.search.region = region;
        }

        if let Some(Command::Serve {
            bind: Some(bind), ..
        }) = self.command
        {
            config.server.bind = bind;
        }

        if self.no_cache {
            config.cache.enabled = false;
        }
        config.verbose = self.verbose;

        Ok(config)
    }
}
