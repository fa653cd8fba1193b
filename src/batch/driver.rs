//! 批处理驱动循环（调用方侧）
//! 反复调用执行器并回传游标，直到状态不再是 processing

use std::time::Duration;
use thiserror::Error;
use tracing::{error, info};

use super::progress::{BatchProgress, BatchRequest, BatchStatus};
use super::runner::BatchRunner;
use crate::store::ProductStore;

/// 驱动结果汇总
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriveSummary {
    /// 已成功完成的批次数
    pub batches: u64,
    /// 累计分类商品数
    pub processed: u64,
    /// 最后一个成功写回的游标，可用于后续恢复
    pub last_processed_id: Option<i64>,
    /// 最后一次调用的进度
    pub final_progress: Option<BatchProgress>,
}

impl DriveSummary {
    fn new(start_cursor: Option<i64>) -> Self {
        Self {
            batches: 0,
            processed: 0,
            last_processed_id: start_cursor,
            final_progress: None,
        }
    }

    /// 是否已全部处理完毕
    pub fn is_complete(&self) -> bool {
        self.final_progress
            .as_ref()
            .is_some_and(|p| p.status == BatchStatus::Complete)
    }
}

/// 驱动中止：携带失败前的汇总，游标指向最后一个成功批次
#[derive(Debug, Error)]
#[error("批次{}执行失败（可从last_processed_id={:?}恢复）：{}", .failed_batch, .summary.last_processed_id, .message)]
pub struct DriveError {
    pub failed_batch: u64,
    pub message: String,
    pub summary: DriveSummary,
}

/// 批处理驱动器
#[derive(Debug, Clone, Default)]
pub struct BatchDriver {
    /// 批次之间的等待时间
    pub delay: Duration,
    /// 单次驱动的批次上限（None表示不限）
    pub max_batches: Option<u64>,
}

impl BatchDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_max_batches(mut self, max_batches: Option<u64>) -> Self {
        self.max_batches = max_batches;
        self
    }

    /// 循环执行直到完成、出错或达到批次上限
    pub async fn run_to_completion<S: ProductStore + ?Sized>(
        &self,
        runner: &BatchRunner<S>,
        request: BatchRequest,
    ) -> Result<DriveSummary, DriveError> {
        let mut summary = DriveSummary::new(request.last_processed_id);
        let mut request = request;

        loop {
            let progress = runner.run_batch(&request).await;

            if progress.status == BatchStatus::Error {
                let message = progress.error.clone().unwrap_or_default();
                error!("批次{}失败，停止驱动：{}", request.batch_number(), message);
                summary.final_progress = Some(progress);
                return Err(DriveError {
                    failed_batch: request.batch_number(),
                    message,
                    summary,
                });
            }

            if progress.processed_count > 0 {
                summary.batches += 1;
                summary.processed += progress.processed_count;
            }
            if progress.last_processed_id.is_some() {
                summary.last_processed_id = progress.last_processed_id;
            }

            info!(
                "批次{}/{}：本批{}条，累计{}条，剩余时间约{}",
                progress.current_batch,
                progress.total_batches,
                progress.processed_count,
                summary.processed,
                progress.estimated_time_remaining.as_deref().unwrap_or("-")
            );

            let keep_going = progress.is_processing();
            let next = request.next(&progress);
            summary.final_progress = Some(progress);

            if !keep_going {
                break;
            }
            if self.max_batches.is_some_and(|max| summary.batches >= max) {
                info!("达到批次上限{}，暂停驱动", summary.batches);
                break;
            }
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            request = next;
        }

        Ok(summary)
    }
}
