//! 内存商品存储
//! 与PostgREST实现遵循同一协议，用于离线运行与测试

use std::collections::BTreeMap;
use std::ops::Bound::{Excluded, Unbounded};
use std::path::Path;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

use super::{ProductFilter, ProductRow, ProductStore, ThemeAssignment};
use crate::error::{ThemeMapperError, TmResult};
use crate::rule::ThemeSet;

/// 内存中的完整商品记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredProduct {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub subcategory: Option<String>,
    #[serde(default)]
    pub assigned_themes: Option<ThemeSet>,
}

impl StoredProduct {
    pub fn new(id: i64, name: &str, category: Option<&str>, subcategory: Option<&str>) -> Self {
        Self {
            id,
            name: Some(name.to_string()),
            category: category.map(str::to_string),
            subcategory: subcategory.map(str::to_string),
            assigned_themes: None,
        }
    }

    fn matches(&self, filter: ProductFilter) -> bool {
        match filter {
            ProductFilter::Unmapped => self.assigned_themes.is_none(),
            ProductFilter::All => true,
        }
    }

    fn to_row(&self) -> ProductRow {
        ProductRow {
            id: self.id,
            name: self.name.clone(),
            category: self.category.clone(),
            subcategory: self.subcategory.clone(),
        }
    }
}

/// 内存商品存储（按id有序）
#[derive(Debug, Default)]
pub struct InMemoryProductStore {
    products: RwLock<BTreeMap<i64, StoredProduct>>,
}

impl InMemoryProductStore {
    pub fn new(products: impl IntoIterator<Item = StoredProduct>) -> Self {
        Self {
            products: RwLock::new(products.into_iter().map(|p| (p.id, p)).collect()),
        }
    }

    /// 从JSON数组文件加载商品
    pub async fn from_json_file(path: &Path) -> TmResult<Self> {
        let data = tokio::fs::read(path).await?;
        let products: Vec<StoredProduct> = serde_json::from_slice(&data)?;
        debug!("从{}加载{}条商品", path.display(), products.len());
        Ok(Self::new(products))
    }

    /// 插入或替换商品
    pub async fn insert(&self, product: StoredProduct) {
        self.products.write().await.insert(product.id, product);
    }

    pub async fn get(&self, id: i64) -> Option<StoredProduct> {
        self.products.read().await.get(&id).cloned()
    }

    /// 按id升序导出全部商品
    pub async fn snapshot(&self) -> Vec<StoredProduct> {
        self.products.read().await.values().cloned().collect()
    }

    /// 导出为JSON数组文件
    pub async fn save_json_file(&self, path: &Path) -> TmResult<()> {
        let data = serde_json::to_vec_pretty(&self.snapshot().await)?;
        tokio::fs::write(path, data).await?;
        Ok(())
    }
}

#[async_trait]
impl ProductStore for InMemoryProductStore {
    async fn count(&self, filter: ProductFilter) -> TmResult<u64> {
        let products = self.products.read().await;
        Ok(products.values().filter(|p| p.matches(filter)).count() as u64)
    }

    async fn fetch_page(
        &self,
        filter: ProductFilter,
        after_id: Option<i64>,
        limit: usize,
    ) -> TmResult<Vec<ProductRow>> {
        if limit == 0 {
            return Err(ThemeMapperError::StoreFetchError("limit必须大于0".to_string()));
        }
        let products = self.products.read().await;
        let rows: Vec<ProductRow> = match after_id {
            Some(after) => products
                .range((Excluded(after), Unbounded))
                .map(|(_, p)| p)
                .filter(|p| p.matches(filter))
                .take(limit)
                .map(StoredProduct::to_row)
                .collect(),
            None => products
                .values()
                .filter(|p| p.matches(filter))
                .take(limit)
                .map(StoredProduct::to_row)
                .collect(),
        };
        Ok(rows)
    }

    async fn bulk_update(&self, assignments: &[ThemeAssignment]) -> TmResult<usize> {
        let mut products = self.products.write().await;
        let mut updated = 0;
        for assignment in assignments {
            if let Some(product) = products.get_mut(&assignment.id) {
                product.assigned_themes = Some(assignment.assigned_themes.clone());
                updated += 1;
            }
        }
        Ok(updated)
    }
}
