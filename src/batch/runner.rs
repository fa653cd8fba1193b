//! 批处理执行器：单次调用处理一批商品（计数 -> 拉取 -> 分类 -> 批量回写）
//! 不保存任何跨调用状态，进度完全由请求中的游标推导

use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::progress::{BatchProgress, BatchRequest};
use crate::classifier::ThemeClassifier;
use crate::config::{GlobalConfig, DEFAULT_BATCH_SIZE, MAX_BATCH_SIZE};
use crate::error::{ThemeMapperError, TmResult};
use crate::store::{ProductStore, ThemeAssignment};

/// 批处理执行器
pub struct BatchRunner<S: ?Sized> {
    store: Arc<S>,
    classifier: ThemeClassifier,
    default_batch_size: usize,
    max_batch_size: usize,
}

impl<S: ?Sized> Clone for BatchRunner<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            classifier: self.classifier.clone(),
            default_batch_size: self.default_batch_size,
            max_batch_size: self.max_batch_size,
        }
    }
}

impl<S: ProductStore + ?Sized> BatchRunner<S> {
    pub fn new(store: Arc<S>, classifier: ThemeClassifier) -> Self {
        Self {
            store,
            classifier,
            default_batch_size: DEFAULT_BATCH_SIZE,
            max_batch_size: MAX_BATCH_SIZE,
        }
    }

    /// 使用配置中的批大小限制
    pub fn from_config(store: Arc<S>, classifier: ThemeClassifier, config: &GlobalConfig) -> Self {
        Self {
            store,
            classifier,
            default_batch_size: config.default_batch_size,
            max_batch_size: config.max_batch_size,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn classifier(&self) -> &ThemeClassifier {
        &self.classifier
    }

    /// 解析批大小：未指定用默认值，越界视为输入错误
    pub fn resolve_batch_size(&self, requested: Option<usize>) -> TmResult<usize> {
        let size = requested.unwrap_or(self.default_batch_size);
        if size == 0 || size > self.max_batch_size {
            return Err(ThemeMapperError::InvalidInput(format!(
                "batch_size必须在1..={}之间，当前为{}",
                self.max_batch_size, size
            )));
        }
        Ok(size)
    }

    /// 执行一批，任何失败都折叠为 status=error 的进度
    pub async fn run_batch(&self, request: &BatchRequest) -> BatchProgress {
        match self.try_run_batch(request).await {
            Ok(progress) => progress,
            Err(e) => {
                warn!(
                    "批次{}执行失败（mode={}，last_processed_id={:?}）：{}",
                    request.batch_number(),
                    request.mode.as_str(),
                    request.last_processed_id,
                    e
                );
                BatchProgress::failed(request, &e)
            }
        }
    }

    /// 执行一批，失败以错误返回
    pub async fn try_run_batch(&self, request: &BatchRequest) -> TmResult<BatchProgress> {
        let started = Instant::now();
        let batch_size = self.resolve_batch_size(request.batch_size)?;
        let filter = request.mode.filter();

        // 1. 计数（与游标无关）
        let total_count = self.store.count(filter).await?;
        if total_count == 0 {
            info!("mode={}下没有待处理商品", request.mode.as_str());
            return Ok(BatchProgress::complete(request, 0));
        }

        // 2. 基于游标拉取
        let rows = self
            .store
            .fetch_page(filter, request.last_processed_id, batch_size)
            .await?;
        if rows.is_empty() {
            info!(
                "游标{:?}之后没有待处理商品（计数{}），处理完成",
                request.last_processed_id, total_count
            );
            return Ok(BatchProgress::complete(request, total_count));
        }

        // 3. 分类（按id升序）
        let assignments: Vec<ThemeAssignment> = rows
            .iter()
            .map(|row| ThemeAssignment {
                id: row.id,
                assigned_themes: self.classifier.classify(
                    row.name.as_deref().unwrap_or_default(),
                    row.category.as_deref(),
                    row.subcategory.as_deref(),
                ),
            })
            .collect();
        let last_processed_id = rows.last().map(|row| row.id);

        // 4. 单次批量回写
        let updated = self.store.bulk_update(&assignments).await?;
        if updated < assignments.len() {
            warn!("批量回写提交{}条，仅更新{}条", assignments.len(), updated);
        }

        let processed_count = rows.len() as u64;
        let progress = BatchProgress::after_batch(
            request,
            batch_size,
            total_count,
            processed_count,
            last_processed_id,
            started.elapsed(),
        );

        debug!(
            "批次{}/{}完成：处理{}条，计数{}，游标{:?} -> {:?}，耗时{:?}",
            progress.current_batch,
            progress.total_batches,
            processed_count,
            total_count,
            request.last_processed_id,
            last_processed_id,
            started.elapsed()
        );

        Ok(progress)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InMemoryProductStore, MappingMode};

    fn runner() -> BatchRunner<InMemoryProductStore> {
        BatchRunner::new(
            Arc::new(InMemoryProductStore::default()),
            ThemeClassifier::builtin().unwrap(),
        )
    }

    #[test]
    fn test_resolve_batch_size() {
        let runner = runner();
        assert_eq!(runner.resolve_batch_size(None).unwrap(), DEFAULT_BATCH_SIZE);
        assert_eq!(runner.resolve_batch_size(Some(5)).unwrap(), 5);
        assert!(runner.resolve_batch_size(Some(0)).is_err());
        assert!(runner.resolve_batch_size(Some(MAX_BATCH_SIZE + 1)).is_err());
    }

    #[tokio::test]
    async fn test_empty_store_is_complete() {
        let progress = runner().run_batch(&BatchRequest::new(MappingMode::All)).await;
        assert!(!progress.is_processing());
        assert_eq!(progress.processed_count, 0);
        assert_eq!(progress.total_count, 0);
    }

    #[tokio::test]
    async fn test_invalid_batch_size_becomes_error_progress() {
        let request = BatchRequest::new(MappingMode::All).with_batch_size(0);
        let progress = runner().run_batch(&request).await;
        assert_eq!(progress.status, crate::batch::BatchStatus::Error);
        assert_eq!(progress.phase, crate::batch::BatchPhase::Validating);
    }
}
