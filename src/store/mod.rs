//! 存储模块：商品表访问协议与实现（PostgREST/内存）
pub mod memory;
pub mod postgrest;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::TmResult;
use crate::rule::ThemeSet;

pub use self::memory::{InMemoryProductStore, StoredProduct};
pub use self::postgrest::PostgrestProductStore;

/// 映射模式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingMode {
    /// 仅处理 assigned_themes 为空的商品
    #[default]
    UnmappedOnly,
    /// 重新计算并覆盖全部商品
    All,
}

impl MappingMode {
    pub fn filter(self) -> ProductFilter {
        match self {
            MappingMode::UnmappedOnly => ProductFilter::Unmapped,
            MappingMode::All => ProductFilter::All,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MappingMode::UnmappedOnly => "unmapped_only",
            MappingMode::All => "all",
        }
    }
}

/// 商品过滤条件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductFilter {
    /// assigned_themes is null
    Unmapped,
    /// 不过滤
    All,
}

/// 分类所需的商品字段
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRow {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub subcategory: Option<String>,
}

/// 待回写的主题分配
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeAssignment {
    pub id: i64,
    pub assigned_themes: ThemeSet,
}

/// 商品存储协议
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// 统计符合过滤条件的商品数
    async fn count(&self, filter: ProductFilter) -> TmResult<u64>;

    /// 按id升序拉取 id > after_id 的至多 limit 条商品
    async fn fetch_page(
        &self,
        filter: ProductFilter,
        after_id: Option<i64>,
        limit: usize,
    ) -> TmResult<Vec<ProductRow>>;

    /// 单次往返批量写入 assigned_themes，返回更新行数
    async fn bulk_update(&self, assignments: &[ThemeAssignment]) -> TmResult<usize>;
}
