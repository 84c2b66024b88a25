use anyhow::Result;
use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::fs;
use tracing::{debug, warn};

use crate::config::CacheConfig;

/// 模型响应缓存管理器
///
/// 以prompt的MD5作为文件名，把模型输出按分类存放在缓存目录中。
/// 同一主题、同一上下文重复提交时可以直接复用上一次的生成结果。
pub struct CacheManager {
    config: CacheConfig,
}

/// 缓存条目
#[derive(Debug, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub data: T,
    pub timestamp: u64,
    /// prompt的MD5哈希值，用于缓存键的生成和验证
    pub prompt_hash: String,
    /// 使用的模型名称（可选）
    pub model_name: Option<String>,
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

impl CacheManager {
    pub fn new(config: CacheConfig) -> Self {
        Self { config }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// 生成prompt的MD5哈希
    pub fn hash_prompt(&self, prompt: &str) -> String {
        let mut hasher = Md5::new();
        hasher.update(prompt.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// 获取缓存文件路径
    fn get_cache_path(&self, category: &str, hash: &str) -> PathBuf {
        self.config
            .cache_dir
            .join(category)
            .join(format!("{}.json", hash))
    }

    /// 检查缓存是否过期
    fn is_expired(&self, timestamp: u64) -> bool {
        let expire_seconds = self.config.expire_hours * 3600;
        now_secs().saturating_sub(timestamp) > expire_seconds
    }

    /// 获取缓存；读取或反序列化失败都按未命中处理
    pub async fn get<T>(&self, category: &str, prompt: &str) -> Result<Option<T>>
    where
        T: for<'de> Deserialize<'de>,
    {
        if !self.config.enabled {
            return Ok(None);
        }

        let hash = self.hash_prompt(prompt);
        let cache_path = self.get_cache_path(category, &hash);

        if !cache_path.exists() {
            debug!(category, %hash, "cache miss");
            return Ok(None);
        }

        let content = match fs::read_to_string(&cache_path).await {
            Ok(content) => content,
            Err(e) => {
                warn!(category, error = %e, "failed to read cache entry");
                return Ok(None);
            }
        };

        match serde_json::from_str::<CacheEntry<T>>(&content) {
            Ok(entry) => {
                if self.is_expired(entry.timestamp) {
                    // 删除过期缓存
                    let _ = fs::remove_file(&cache_path).await;
                    debug!(category, %hash, "cache entry expired");
                    return Ok(None);
                }
                debug!(category, %hash, "cache hit");
                Ok(Some(entry.data))
            }
            Err(e) => {
                warn!(category, error = %e, "failed to deserialize cache entry");
                Ok(None)
            }
        }
    }

    /// 设置缓存
    pub async fn set<T>(
        &self,
        category: &str,
        prompt: &str,
        data: T,
        model_name: Option<&str>,
    ) -> Result<()>
    where
        T: Serialize,
    {
        if !self.config.enabled {
            return Ok(());
        }

        let hash = self.hash_prompt(prompt);
        let cache_path = self.get_cache_path(category, &hash);

        // 确保目录存在
        if let Some(parent) = cache_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let entry = CacheEntry {
            data,
            timestamp: now_secs(),
            prompt_hash: hash,
            model_name: model_name.map(str::to_string),
        };

        let content = serde_json::to_string_pretty(&entry)?;
        fs::write(&cache_path, content).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn manager(dir: &TempDir, enabled: bool, expire_hours: u64) -> CacheManager {
        CacheManager::new(CacheConfig {
            enabled,
            cache_dir: dir.path().to_path_buf(),
            expire_hours,
        })
    }

    #[test]
    fn test_hash_prompt_is_stable() {
        let dir = TempDir::new().unwrap();
        let cache = manager(&dir, true, 1);

        assert_eq!(cache.hash_prompt("abc"), "900150983cd24fb0d6963f7d28e17f72");
        assert_ne!(cache.hash_prompt("abc"), cache.hash_prompt("abd"));
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let dir = TempDir::new().unwrap();
        let cache = manager(&dir, true, 1);

        cache
            .set("prompt", "topic: stunting", "draft text".to_string(), Some("m"))
            .await
            .unwrap();
        let cached: Option<String> = cache.get("prompt", "topic: stunting").await.unwrap();
        assert_eq!(cached.as_deref(), Some("draft text"));

        let other: Option<String> = cache.get("prompt", "topic: banjir").await.unwrap();
        assert!(other.is_none());
    }

    #[tokio::test]
    async fn test_disabled_cache_never_hits() {
        let dir = TempDir::new().unwrap();
        let cache = manager(&dir, false, 1);

        cache
            .set("prompt", "p", "value".to_string(), None)
            .await
            .unwrap();
        let cached: Option<String> = cache.get("prompt", "p").await.unwrap();
        assert!(cached.is_none());
        assert!(!dir.path().join("prompt").exists());
    }

    #[tokio::test]
    async fn test_expired_entry_is_removed() {
        let dir = TempDir::new().unwrap();
        let cache = manager(&dir, true, 1);

        let hash = cache.hash_prompt("old");
        let path = dir.path().join("prompt").join(format!("{}.json", hash));
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        let entry = CacheEntry {
            data: "stale".to_string(),
            timestamp: 0,
            prompt_hash: hash,
            model_name: None,
        };
        std::fs::write(&path, serde_json::to_string(&entry).unwrap()).unwrap();

        let cached: Option<String> = cache.get("prompt", "old").await.unwrap();
        assert!(cached.is_none());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_a_miss() {
        let dir = TempDir::new().unwrap();
        let cache = manager(&dir, true, 1);

        let hash = cache.hash_prompt("broken");
        let path = dir.path().join("prompt").join(format!("{}.json", hash));
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{not json").unwrap();

        let cached: Option<String> = cache.get("prompt", "broken").await.unwrap();
        assert!(cached.is_none());
    }
}
