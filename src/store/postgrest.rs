//! PostgREST（Supabase）商品存储
//! 计数/分页/批量回写各一次HTTP往返

use std::time::Duration;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_RANGE};
use reqwest::{Client, Response};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::{ProductFilter, ProductRow, ProductStore, ThemeAssignment};
use crate::config::GlobalConfig;
use crate::error::{ThemeMapperError, TmResult};

const PRODUCT_COLUMNS: &str = "id,name,category,subcategory";

/// 批量回写RPC的请求体
#[derive(Serialize)]
struct BulkUpdatePayload<'a> {
    updates: &'a [ThemeAssignment],
}

/// PostgREST商品存储
#[derive(Debug, Clone)]
pub struct PostgrestProductStore {
    client: Client,
    rest_base: Url,
    table: String,
    bulk_update_rpc: String,
}

impl PostgrestProductStore {
    pub fn new(config: &GlobalConfig) -> TmResult<Self> {
        let mut headers = HeaderMap::new();
        if !config.service_key.is_empty() {
            let key = HeaderValue::from_str(&config.service_key)
                .map_err(|e| ThemeMapperError::InvalidInput(format!("service_key无效：{}", e)))?;
            let bearer = HeaderValue::from_str(&format!("Bearer {}", config.service_key))
                .map_err(|e| ThemeMapperError::InvalidInput(format!("service_key无效：{}", e)))?;
            headers.insert("apikey", key);
            headers.insert(AUTHORIZATION, bearer);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            rest_base: Url::parse(&config.rest_base())?,
            table: config.product_table.clone(),
            bulk_update_rpc: config.bulk_update_rpc.clone(),
        })
    }

    /// 构建表查询URL（附带过滤条件）
    fn table_url(&self, filter: ProductFilter) -> TmResult<Url> {
        let mut url = self.rest_base.join(&self.table)?;
        if filter == ProductFilter::Unmapped {
            url.query_pairs_mut().append_pair("assigned_themes", "is.null");
        }
        Ok(url)
    }

    fn rpc_url(&self) -> TmResult<Url> {
        Ok(self.rest_base.join(&format!("rpc/{}", self.bulk_update_rpc))?)
    }

    /// 非2xx响应转为错误，携带状态码与响应体
    async fn ensure_success(response: Response) -> Result<Response, String> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        match response.text().await {
            Ok(body) => Err(format!("HTTP {}：{}", status, body.trim())),
            Err(e) => Err(format!("HTTP {}：响应体读取失败：{}", status, e)),
        }
    }
}

/// 解析 Content-Range（`0-24/3573` 或 `*/0`）中的总数
pub fn parse_content_range_total(value: &str) -> Option<u64> {
    let (_, total) = value.trim().rsplit_once('/')?;
    total.trim().parse().ok()
}

#[async_trait]
impl ProductStore for PostgrestProductStore {
    async fn count(&self, filter: ProductFilter) -> TmResult<u64> {
        let mut url = self.table_url(filter)?;
        url.query_pairs_mut().append_pair("select", "id");

        let response = self
            .client
            .head(url)
            .header("Prefer", "count=exact")
            .send()
            .await
            .map_err(|e| ThemeMapperError::StoreCountError(e.to_string()))?;
        let response = Self::ensure_success(response)
            .await
            .map_err(ThemeMapperError::StoreCountError)?;

        let total = response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range_total)
            .ok_or_else(|| ThemeMapperError::StoreCountError("响应缺少有效的Content-Range".to_string()))?;

        debug!("商品计数完成：filter={:?}，total={}", filter, total);
        Ok(total)
    }

    async fn fetch_page(
        &self,
        filter: ProductFilter,
        after_id: Option<i64>,
        limit: usize,
    ) -> TmResult<Vec<ProductRow>> {
        let mut url = self.table_url(filter)?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("select", PRODUCT_COLUMNS)
                .append_pair("order", "id.asc")
                .append_pair("limit", &limit.to_string());
            if let Some(after) = after_id {
                query.append_pair("id", &format!("gt.{}", after));
            }
        }

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ThemeMapperError::StoreFetchError(e.to_string()))?;
        let response = Self::ensure_success(response)
            .await
            .map_err(ThemeMapperError::StoreFetchError)?;

        let rows: Vec<ProductRow> = response
            .json()
            .await
            .map_err(|e| ThemeMapperError::StoreFetchError(format!("响应解析失败：{}", e)))?;
        debug!("拉取商品{}条：after_id={:?}，limit={}", rows.len(), after_id, limit);
        Ok(rows)
    }

    async fn bulk_update(&self, assignments: &[ThemeAssignment]) -> TmResult<usize> {
        if assignments.is_empty() {
            return Ok(0);
        }

        let response = self
            .client
            .post(self.rpc_url()?)
            .json(&BulkUpdatePayload { updates: assignments })
            .send()
            .await
            .map_err(|e| ThemeMapperError::StoreUpdateError(e.to_string()))?;
        let response = Self::ensure_success(response)
            .await
            .map_err(ThemeMapperError::StoreUpdateError)?;

        // RPC返回更新行数；void函数返回空体时按提交条数计
        let body = response
            .text()
            .await
            .map_err(|e| ThemeMapperError::StoreUpdateError(e.to_string()))?;
        let updated = match serde_json::from_str::<Value>(&body) {
            Ok(Value::Number(n)) => n.as_u64().map_or(assignments.len(), |n| n as usize),
            _ => assignments.len(),
        };
        debug!("批量回写完成：提交{}条，更新{}条", assignments.len(), updated);
        Ok(updated)
    }
}
