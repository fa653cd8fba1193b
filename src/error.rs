//! 全局错误类型定义

use thiserror::Error;
use serde_json::Error as SerdeJsonError;
use std::io::Error as IoError;
use url::ParseError as UrlParseError;

#[derive(Error, Debug)]
pub enum ThemeMapperError {
    // 规则相关错误
    #[error("规则加载失败：{0}")]
    RuleLoadError(String),
    #[error("规则解析失败：{0}")]
    RuleParseError(String),

    // 分类器相关错误
    #[error("分类器初始化失败：{0}")]
    ClassifierInitError(String),

    // 存储相关错误
    #[error("商品计数失败：{0}")]
    StoreCountError(String),
    #[error("商品分页拉取失败：{0}")]
    StoreFetchError(String),
    #[error("主题批量回写失败：{0}")]
    StoreUpdateError(String),

    // 网络相关错误
    #[error("网络请求失败：{0}")]
    HttpError(#[from] reqwest::Error),

    // 序列化/反序列化错误
    #[error("JSON解析失败：{0}")]
    JsonError(#[from] SerdeJsonError),

    // 基础错误
    #[error("IO操作失败：{0}")]
    IoError(#[from] IoError),
    #[error("URL解析失败：{0}")]
    UrlError(#[from] UrlParseError),
    #[error("无效输入：{0}")]
    InvalidInput(String),
}

impl ThemeMapperError {
    /// 是否为调用方输入错误（对应HTTP 4xx，不应重试）
    pub fn is_client_error(&self) -> bool {
        matches!(self, ThemeMapperError::InvalidInput(_))
    }
}

// 全局Result类型
pub type TmResult<T> = Result<T, ThemeMapperError>;
