//! 生成结果的显式状态与有界存储

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::debug;
use uuid::Uuid;

use crate::generator::brief::Brief;
use crate::generator::chart::ChartSnippet;
use crate::generator::outlet::docx::export_file_name;

/// 一次成功生成的完整结果，渲染时由调用方传入Presenter
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResultState {
    pub id: Uuid,
    pub topic: String,
    /// 导出文档的文件名
    pub file_name: String,
    pub brief: Brief,
    /// 图表生成失败时为None
    pub chart: Option<ChartSnippet>,
    /// 上下文来自上传文档时为None
    pub sources: Option<Vec<String>>,
    pub provenance: String,
    pub created_at: DateTime<Utc>,
}

impl ResultState {
    pub fn new(
        topic: &str,
        brief: Brief,
        chart: Option<ChartSnippet>,
        sources: Option<Vec<String>>,
        provenance: &str,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            topic: topic.trim().to_string(),
            file_name: export_file_name(topic),
            brief,
            chart,
            sources,
            provenance: provenance.to_string(),
            created_at: Utc::now(),
        }
    }
}

/// 保留最近若干个结果，超出容量时淘汰最早的
#[derive(Debug)]
pub struct ResultStore {
    capacity: usize,
    results: VecDeque<ResultState>,
}

impl ResultStore {
    /// 容量至少为1
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            results: VecDeque::with_capacity(capacity),
        }
    }

    pub fn insert(&mut self, state: ResultState) -> Uuid {
        let id = state.id;
        self.results.retain(|existing| existing.id != id);
        self.results.push_back(state);
        while self.results.len() > self.capacity {
            if let Some(evicted) = self.results.pop_front() {
                debug!(id = %evicted.id, topic = %evicted.topic, "result evicted from store");
            }
        }
        id
    }

    pub fn get(&self, id: &Uuid) -> Option<&ResultState> {
        self.results.iter().find(|state| &state.id == id)
    }

    /// 最近一次插入的结果
    pub fn latest(&self) -> Option<&ResultState> {
        self.results.back()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
