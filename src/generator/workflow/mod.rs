use anyhow::{Result, bail};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::Config;
use crate::generator::brief::BriefComposer;
use crate::generator::chart::ChartComposer;
use crate::generator::outlet::{DiskOutlet, Outlet, Presenter};
use crate::i18n::TargetLanguage;
use crate::ingest::DocumentKind;
use crate::llm::{Generator, LLMClient};
use crate::search::{SearchEngine, SourceAcquirer};
use crate::session::ResultState;
use crate::types::notice::Notices;

/// 时间跟踪作用域，阶段耗时写入日志
pub struct TimingScope {
    start_time: Instant,
    phase_start_times: HashMap<&'static str, Instant>,
    phase_durations: HashMap<&'static str, Duration>,
}

impl Default for TimingScope {
    fn default() -> Self {
        Self::new()
    }
}

impl TimingScope {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            phase_start_times: HashMap::new(),
            phase_durations: HashMap::new(),
        }
    }

    /// 开始一个新的阶段计时
    pub fn start_phase(&mut self, phase_name: &'static str) {
        self.phase_start_times.insert(phase_name, Instant::now());
    }

    /// 结束一个阶段的计时
    pub fn end_phase(&mut self, phase_name: &'static str) -> Option<Duration> {
        let duration = self.phase_start_times.remove(phase_name)?.elapsed();
        debug!(
            phase = phase_name,
            seconds = duration.as_secs_f64(),
            "phase finished"
        );
        self.phase_durations.insert(phase_name, duration);
        Some(duration)
    }

    pub fn get_total_duration(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// 输出各阶段耗时汇总
    pub fn log_report(&self) {
        let mut phases: Vec<_> = self.phase_durations.iter().collect();
        phases.sort_by_key(|(_, duration)| std::cmp::Reverse(**duration));
        let summary = phases
            .iter()
            .map(|(phase, duration)| format!("{}={:.3}s", phase, duration.as_secs_f64()))
            .collect::<Vec<_>>()
            .join(" ");
        info!(
            total_seconds = self.get_total_duration().as_secs_f64(),
            "pipeline timing: {}", summary
        );
    }
}

/// 时间跟踪常量
pub struct TimingKeys;

impl TimingKeys {
    pub const ACQUIRE: &'static str = "acquire";
    pub const BRIEF: &'static str = "brief";
    pub const CHART: &'static str = "chart";
}

/// 一次简报生成请求
#[derive(Debug, Clone)]
pub enum BriefRequest {
    Search {
        topic: String,
        engine: SearchEngine,
    },
    Document {
        topic: String,
        file_name: String,
        bytes: Vec<u8>,
    },
}

impl BriefRequest {
    pub fn topic(&self) -> &str {
        match self {
            BriefRequest::Search { topic, .. } | BriefRequest::Document { topic, .. } => topic,
        }
    }
}

/// 在获取上下文之前就能判定的请求错误
#[derive(Debug, Error, PartialEq)]
pub enum PipelineError {
    #[error("topic must not be empty")]
    EmptyTopic,
    #[error("unsupported document `{0}`: only PDF and DOCX files are accepted")]
    UnsupportedDocument(String),
}

/// 流程结果
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOutcome {
    Completed(Box<ResultState>),
    /// 没有获取到上下文，简报与图表都未请求
    NoRelevantInformation,
    /// 简报生成失败，图表未请求
    GenerationFailed,
}

#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub outcome: PipelineOutcome,
    pub notices: Notices,
}

impl PipelineRun {
    pub fn completed(&self) -> Option<&ResultState> {
        match &self.outcome {
            PipelineOutcome::Completed(state) => Some(state.as_ref()),
            _ => None,
        }
    }
}

/// 简报生成流程：获取上下文，编写简报，再请求图表
pub struct BriefPipeline<G: Generator> {
    generator: G,
    acquirer: SourceAcquirer,
    brief_composer: BriefComposer,
    chart_composer: ChartComposer,
    language: TargetLanguage,
}

impl<G: Generator> BriefPipeline<G> {
    pub fn new(config: &Config, generator: G) -> Result<Self> {
        let acquirer = SourceAcquirer::new(&config.search, config.max_context_chars)?;
        Ok(Self::with_acquirer(config, generator, acquirer))
    }

    pub fn with_acquirer(config: &Config, generator: G, acquirer: SourceAcquirer) -> Self {
        let language = config.target_language;
        Self {
            generator,
            acquirer: acquirer.with_language(language),
            brief_composer: BriefComposer::new(language, config.search.region.clone()),
            chart_composer: ChartComposer::new(language),
            language,
        }
    }

    pub fn language(&self) -> TargetLanguage {
        self.language
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    pub async fn run(&self, request: BriefRequest) -> Result<PipelineRun, PipelineError> {
        let topic = request.topic().trim().to_string();
        if topic.is_empty() {
            return Err(PipelineError::EmptyTopic);
        }

        let labels = self.language.labels();
        let mut notices = Notices::new();
        let mut timing = TimingScope::new();

        timing.start_phase(TimingKeys::ACQUIRE);
        let (acquired, nothing_found) = match request {
            BriefRequest::Search { engine, .. } => {
                let acquired = self.acquirer.acquire(&topic, engine, &mut notices).await;
                if acquired.is_some() {
                    notices.success(labels.context_collected);
                }
                (acquired, labels.no_relevant_information)
            }
            BriefRequest::Document {
                file_name, bytes, ..
            } => {
                let kind = DocumentKind::from_file_name(&file_name)
                    .ok_or_else(|| PipelineError::UnsupportedDocument(file_name.clone()))?;
                let acquired = self
                    .acquirer
                    .acquire_document(&file_name, kind, bytes, &mut notices)
                    .await;
                if acquired.is_some() {
                    notices.success(labels.document_read);
                }
                (acquired, labels.no_document_text)
            }
        };
        timing.end_phase(TimingKeys::ACQUIRE);

        let Some(acquired) = acquired else {
            notices.warning(nothing_found);
            timing.log_report();
            return Ok(PipelineRun {
                outcome: PipelineOutcome::NoRelevantInformation,
                notices,
            });
        };

        timing.start_phase(TimingKeys::BRIEF);
        let brief = self
            .brief_composer
            .compose(&self.generator, &topic, &acquired, &mut notices)
            .await;
        timing.end_phase(TimingKeys::BRIEF);

        let Some(brief) = brief else {
            notices.error(labels.draft_failed);
            timing.log_report();
            return Ok(PipelineRun {
                outcome: PipelineOutcome::GenerationFailed,
                notices,
            });
        };
        notices.success(labels.draft_ready);

        timing.start_phase(TimingKeys::CHART);
        let chart = self
            .chart_composer
            .compose(&self.generator, &acquired.context, &mut notices)
            .await;
        timing.end_phase(TimingKeys::CHART);
        timing.log_report();

        let state = ResultState::new(
            &topic,
            brief,
            chart,
            acquired.sources,
            &acquired.provenance,
        );
        Ok(PipelineRun {
            outcome: PipelineOutcome::Completed(Box::new(state)),
            notices,
        })
    }
}

/// 命令行生成：运行一次流程并把报告写入输出目录
pub async fn launch(config: &Config, request: BriefRequest, output_dir: &Path) -> Result<Vec<PathBuf>> {
    let client = LLMClient::new(config.clone())?;

    // 启动时检查模型连接
    client.check_connection().await?;

    let pipeline = BriefPipeline::new(config, client)?;
    let run = pipeline.run(request).await?;
    let labels = pipeline.language().labels();

    match run.outcome {
        PipelineOutcome::Completed(state) => {
            let report = Presenter::render(&state, pipeline.language());
            DiskOutlet::new(output_dir).publish(&state, &report)
        }
        PipelineOutcome::NoRelevantInformation => bail!(labels.no_relevant_information),
        PipelineOutcome::GenerationFailed => bail!(labels.draft_failed),
    }
}

// Include tests
#[cfg(test)]
mod tests;
