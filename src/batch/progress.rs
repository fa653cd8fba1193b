//! 批处理请求与进度模型
//! 进度中的批次数与剩余时间均为估算值，终止判断只依赖 has_more

use std::time::Duration;
use serde::{Deserialize, Serialize};

use crate::error::ThemeMapperError;
use crate::store::MappingMode;

/// 批处理请求（游标由调用方保存并回传）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRequest {
    #[serde(default)]
    pub mode: MappingMode,
    #[serde(default)]
    pub batch_size: Option<usize>,
    #[serde(default)]
    pub last_processed_id: Option<i64>,
    /// 调用方维护的批次序号（从1开始），仅用于进度估算
    #[serde(default)]
    pub batch_number: Option<u64>,
}

impl BatchRequest {
    pub fn new(mode: MappingMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = Some(batch_size);
        self
    }

    pub fn with_cursor(mut self, last_processed_id: Option<i64>) -> Self {
        self.last_processed_id = last_processed_id;
        self
    }

    /// 生成下一批请求：沿用模式与批大小，推进游标与序号
    pub fn next(&self, progress: &BatchProgress) -> Self {
        Self {
            mode: self.mode,
            batch_size: self.batch_size,
            last_processed_id: progress.last_processed_id.or(self.last_processed_id),
            batch_number: Some(self.batch_number().saturating_add(1)),
        }
    }

    pub fn batch_number(&self) -> u64 {
        self.batch_number.unwrap_or(1).max(1)
    }
}

/// 批处理状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    Processing,
    Complete,
    Error,
}

/// 批处理阶段（失败时指示出错的步骤）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchPhase {
    Validating,
    Counting,
    Fetching,
    Updating,
    Mapping,
    Complete,
    Failed,
}

impl BatchPhase {
    /// 根据错误类型推断失败阶段
    pub fn from_error(error: &ThemeMapperError) -> Self {
        match error {
            ThemeMapperError::InvalidInput(_) => BatchPhase::Validating,
            ThemeMapperError::StoreCountError(_) => BatchPhase::Counting,
            ThemeMapperError::StoreFetchError(_) => BatchPhase::Fetching,
            ThemeMapperError::StoreUpdateError(_) => BatchPhase::Updating,
            _ => BatchPhase::Failed,
        }
    }
}

/// 单次调用的进度响应
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchProgress {
    pub status: BatchStatus,
    pub phase: BatchPhase,
    pub processed_count: u64,
    pub total_count: u64,
    pub current_batch: u64,
    pub total_batches: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_time_remaining: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_processed_id: Option<i64>,
    pub has_more: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BatchProgress {
    /// 无需处理的终态（总数为0或本批未拉到数据）
    pub fn complete(request: &BatchRequest, total_count: u64) -> Self {
        let finished_batches = request.batch_number() - 1;
        Self {
            status: BatchStatus::Complete,
            phase: BatchPhase::Complete,
            processed_count: 0,
            total_count,
            current_batch: finished_batches,
            total_batches: finished_batches,
            estimated_time_remaining: None,
            last_processed_id: request.last_processed_id,
            has_more: false,
            error: None,
        }
    }

    /// 失败响应：游标保持请求时的值，便于原样重试
    pub fn failed(request: &BatchRequest, error: &ThemeMapperError) -> Self {
        let batch_number = request.batch_number();
        Self {
            status: BatchStatus::Error,
            phase: BatchPhase::from_error(error),
            processed_count: 0,
            total_count: 0,
            current_batch: batch_number,
            total_batches: batch_number,
            estimated_time_remaining: None,
            last_processed_id: request.last_processed_id,
            has_more: false,
            error: Some(error.to_string()),
        }
    }

    /// 本批写回完成后的进度
    pub fn after_batch(
        request: &BatchRequest,
        batch_size: usize,
        total_count: u64,
        processed_count: u64,
        last_processed_id: Option<i64>,
        batch_elapsed: Duration,
    ) -> Self {
        let remaining_count = total_count.saturating_sub(processed_count);
        let has_more = remaining_count > 0;
        let current_batch = request.batch_number();
        let total_batches = estimate_total_batches(request, batch_size, total_count).max(current_batch);
        let remaining_batches = total_batches - current_batch;

        let estimated_time_remaining = if has_more && remaining_batches > 0 {
            let factor = u32::try_from(remaining_batches).unwrap_or(u32::MAX);
            Some(format_eta(batch_elapsed.checked_mul(factor).unwrap_or(Duration::MAX)))
        } else {
            None
        };

        Self {
            status: if has_more { BatchStatus::Processing } else { BatchStatus::Complete },
            phase: if has_more { BatchPhase::Mapping } else { BatchPhase::Complete },
            processed_count,
            total_count,
            current_batch,
            total_batches,
            estimated_time_remaining,
            last_processed_id,
            has_more,
            error: None,
        }
    }

    pub fn is_processing(&self) -> bool {
        self.status == BatchStatus::Processing
    }
}

/// 估算总批次数
/// unmapped_only 模式下计数只包含尚未分类的商品，需要加上已完成的批次
fn estimate_total_batches(request: &BatchRequest, batch_size: usize, total_count: u64) -> u64 {
    let batch_size = batch_size.max(1) as u64;
    let batches_for_count = total_count.div_ceil(batch_size);
    match request.mode {
        MappingMode::UnmappedOnly => (request.batch_number() - 1).saturating_add(batches_for_count),
        MappingMode::All => batches_for_count,
    }
}

/// 剩余时间格式化（如 "45s"、"3m 20s"、"1h 5m"）
pub fn format_eta(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs == 0 {
        return "<1s".to_string();
    }
    let (hours, minutes, seconds) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}
