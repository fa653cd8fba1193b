//! 全局配置管理,存储所有可配置项

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::error::{ThemeMapperError, TmResult};

/// 默认批大小
pub const DEFAULT_BATCH_SIZE: usize = 1000;
/// 单批允许的最大商品数
pub const MAX_BATCH_SIZE: usize = 10_000;

/// 全局配置
#[derive(Debug, Clone)]
pub struct GlobalConfig {
    // Supabase项目地址（REST接口挂在 /rest/v1 下）
    pub store_url: String,
    // service_role密钥，同时用作apikey与Bearer令牌
    pub service_key: String,
    // 商品表名
    pub product_table: String,
    // 批量回写主题的RPC函数名
    pub bulk_update_rpc: String,
    // 超时配置（单位：秒）
    pub http_timeout: u64,
    // 未指定batch_size时的默认值
    pub default_batch_size: usize,
    // batch_size上限
    pub max_batch_size: usize,
    // HTTP服务监听地址
    pub listen_addr: SocketAddr,
    // 自定义规则文件（JSON），为空时使用内置规则
    pub rule_file: Option<PathBuf>,
    // 是否启用详细日志
    pub verbose: bool,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            store_url: "http://127.0.0.1:54321".to_string(),
            service_key: String::new(),
            product_table: "products".to_string(),
            bulk_update_rpc: "bulk_update_product_themes".to_string(),
            http_timeout: 30,
            default_batch_size: DEFAULT_BATCH_SIZE,
            max_batch_size: MAX_BATCH_SIZE,
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            rule_file: None,
            verbose: false,
        }
    }
}

impl GlobalConfig {
    /// 从环境变量读取配置（THEME_MAPPER_*），未设置的项保持默认值
    pub fn from_env() -> TmResult<Self> {
        let mut builder = ConfigManager::custom();

        if let Ok(url) = env::var("THEME_MAPPER_STORE_URL") {
            builder = builder.store_url(url);
        }
        if let Ok(key) = env::var("THEME_MAPPER_SERVICE_KEY") {
            builder = builder.service_key(key);
        }
        if let Ok(table) = env::var("THEME_MAPPER_PRODUCT_TABLE") {
            builder = builder.product_table(table);
        }
        if let Ok(rpc) = env::var("THEME_MAPPER_BULK_UPDATE_RPC") {
            builder = builder.bulk_update_rpc(rpc);
        }
        if let Ok(timeout) = env::var("THEME_MAPPER_HTTP_TIMEOUT") {
            builder = builder.http_timeout(parse_env("THEME_MAPPER_HTTP_TIMEOUT", &timeout)?);
        }
        if let Ok(size) = env::var("THEME_MAPPER_BATCH_SIZE") {
            builder = builder.default_batch_size(parse_env("THEME_MAPPER_BATCH_SIZE", &size)?);
        }
        if let Ok(addr) = env::var("THEME_MAPPER_LISTEN") {
            builder = builder.listen_addr(parse_env("THEME_MAPPER_LISTEN", &addr)?);
        }
        if let Ok(path) = env::var("THEME_MAPPER_RULE_FILE") {
            builder = builder.rule_file(Some(PathBuf::from(path)));
        }

        builder.build()
    }

    /// REST接口根地址
    pub fn rest_base(&self) -> String {
        format!("{}/rest/v1/", self.store_url.trim_end_matches('/'))
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, raw: &str) -> TmResult<T>
where
    T::Err: std::fmt::Display,
{
    raw.trim().parse::<T>().map_err(|e| {
        ThemeMapperError::InvalidInput(format!("环境变量{}取值无效：{}（{}）", name, raw, e))
    })
}

/// 配置管理器（单例）
pub struct ConfigManager;

impl ConfigManager {
    /// 获取默认配置
    pub fn get_default() -> GlobalConfig {
        GlobalConfig::default()
    }

    /// 自定义配置
    pub fn custom() -> CustomConfigBuilder {
        CustomConfigBuilder::new()
    }
}

/// 配置构建器（便于自定义配置）
#[derive(Debug, Clone, Default)]
pub struct CustomConfigBuilder {
    config: GlobalConfig,
}

impl CustomConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: GlobalConfig::default(),
        }
    }

    pub fn store_url(mut self, url: impl Into<String>) -> Self {
        self.config.store_url = url.into();
        self
    }

    pub fn service_key(mut self, key: impl Into<String>) -> Self {
        self.config.service_key = key.into();
        self
    }

    pub fn product_table(mut self, table: impl Into<String>) -> Self {
        self.config.product_table = table.into();
        self
    }

    pub fn bulk_update_rpc(mut self, rpc: impl Into<String>) -> Self {
        self.config.bulk_update_rpc = rpc.into();
        self
    }

    pub fn http_timeout(mut self, timeout: u64) -> Self {
        self.config.http_timeout = timeout;
        self
    }

    pub fn default_batch_size(mut self, size: usize) -> Self {
        self.config.default_batch_size = size;
        self
    }

    pub fn max_batch_size(mut self, size: usize) -> Self {
        self.config.max_batch_size = size;
        self
    }

    pub fn listen_addr(mut self, addr: SocketAddr) -> Self {
        self.config.listen_addr = addr;
        self
    }

    pub fn rule_file(mut self, path: Option<PathBuf>) -> Self {
        self.config.rule_file = path;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.config.verbose = verbose;
        self
    }

    /// 构建配置，校验批大小取值
    pub fn build(self) -> TmResult<GlobalConfig> {
        let config = self.config;
        if config.max_batch_size == 0 {
            return Err(ThemeMapperError::InvalidInput("max_batch_size必须大于0".to_string()));
        }
        if config.default_batch_size == 0 || config.default_batch_size > config.max_batch_size {
            return Err(ThemeMapperError::InvalidInput(format!(
                "default_batch_size必须在1..={}之间，当前为{}",
                config.max_batch_size, config.default_batch_size
            )));
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_overrides_defaults() {
        let config = ConfigManager::custom()
            .store_url("https://abc.supabase.co/")
            .service_key("secret")
            .default_batch_size(250)
            .build()
            .unwrap();

        assert_eq!(config.service_key, "secret");
        assert_eq!(config.default_batch_size, 250);
        assert_eq!(config.product_table, "products");
        assert_eq!(config.rest_base(), "https://abc.supabase.co/rest/v1/");
    }

    #[test]
    fn test_builder_rejects_batch_size_above_max() {
        let result = ConfigManager::custom()
            .max_batch_size(100)
            .default_batch_size(500)
            .build();
        assert!(matches!(result, Err(ThemeMapperError::InvalidInput(_))));
    }

    #[test]
    fn test_builder_rejects_zero_batch_size() {
        let result = ConfigManager::custom().default_batch_size(0).build();
        assert!(result.is_err());
    }
}
