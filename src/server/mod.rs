//! HTTP接口：批处理触发与分类诊断

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::batch::{BatchProgress, BatchRequest, BatchRunner};
use crate::classifier::Classification;
use crate::error::{ThemeMapperError, TmResult};
use crate::rule::Theme;
use crate::store::ProductStore;

/// 服务共享状态
pub struct AppState {
    pub runner: BatchRunner<dyn ProductStore>,
}

impl AppState {
    pub fn new(runner: BatchRunner<dyn ProductStore>) -> Self {
        Self { runner }
    }
}

/// 单个商品分类请求
#[derive(Debug, Deserialize)]
pub struct ClassifyRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub subcategory: Option<String>,
}

/// 构建路由
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/themes", get(list_themes))
        .route("/classify", post(classify_product))
        .route("/map-product-themes", post(map_product_themes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// 启动服务，收到Ctrl-C后优雅退出
pub async fn serve(addr: SocketAddr, state: Arc<AppState>) -> TmResult<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("主题映射服务监听于 {}", addr);

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("监听退出信号失败：{}", e);
            }
        })
        .await?;
    Ok(())
}

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn list_themes() -> Json<[Theme; 14]> {
    Json(Theme::ALL)
}

pub async fn classify_product(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ClassifyRequest>,
) -> Json<Classification> {
    let classification = state.runner.classifier().classify_detailed(
        request.name.as_deref().unwrap_or_default(),
        request.category.as_deref(),
        request.subcategory.as_deref(),
    );
    Json(classification)
}

/// 批处理触发：空请求体按全默认参数处理
pub async fn map_product_themes(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> (StatusCode, Json<BatchProgress>) {
    let request = match parse_batch_request(&body) {
        Ok(request) => request,
        Err(e) => {
            let fallback = BatchRequest::default();
            return (StatusCode::BAD_REQUEST, Json(BatchProgress::failed(&fallback, &e)));
        }
    };

    match state.runner.try_run_batch(&request).await {
        Ok(progress) => (StatusCode::OK, Json(progress)),
        Err(e) => {
            let status = if e.is_client_error() {
                StatusCode::BAD_REQUEST
            } else {
                error!(
                    "批处理失败：mode={}，last_processed_id={:?}，error={}",
                    request.mode.as_str(),
                    request.last_processed_id,
                    e
                );
                StatusCode::INTERNAL_SERVER_ERROR
            };
            (status, Json(BatchProgress::failed(&request, &e)))
        }
    }
}

fn parse_batch_request(body: &[u8]) -> TmResult<BatchRequest> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(BatchRequest::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| ThemeMapperError::InvalidInput(format!("请求体无效：{}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MappingMode;

    #[test]
    fn test_parse_empty_body_uses_defaults() {
        assert_eq!(parse_batch_request(b"").unwrap(), BatchRequest::default());
        assert_eq!(parse_batch_request(b"  \n").unwrap(), BatchRequest::default());
    }

    #[test]
    fn test_parse_batch_request_fields() {
        let request = parse_batch_request(br#"{"mode":"all","batch_size":20,"last_processed_id":9}"#).unwrap();
        assert_eq!(request.mode, MappingMode::All);
        assert_eq!(request.batch_size, Some(20));
        assert_eq!(request.last_processed_id, Some(9));
    }

    #[test]
    fn test_parse_malformed_body_is_invalid_input() {
        let err = parse_batch_request(b"{mode:").unwrap_err();
        assert!(err.is_client_error());
        let err = parse_batch_request(br#"{"batch_size":-5}"#).unwrap_err();
        assert!(err.is_client_error());
    }
}
