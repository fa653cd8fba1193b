//! 规则加载管理器
//! 负责从内置常量或本地JSON规则文件加载规则库

use std::path::Path;
use tracing::{debug, info};

use super::library::RuleLibrary;
use crate::config::GlobalConfig;
use crate::error::{ThemeMapperError, TmResult};

/// 规则加载管理器
pub struct RuleLoader;

impl RuleLoader {
    /// 加载规则库（配置了规则文件则读取文件，否则使用内置规则）
    pub async fn load(config: &GlobalConfig) -> TmResult<RuleLibrary> {
        match &config.rule_file {
            Some(path) => Self::load_from_file(path).await,
            None => {
                debug!("未配置规则文件，使用内置规则库");
                Ok(RuleLibrary::builtin())
            }
        }
    }

    /// 从JSON规则文件加载
    pub async fn load_from_file(path: &Path) -> TmResult<RuleLibrary> {
        let data = tokio::fs::read(path).await.map_err(|e| {
            ThemeMapperError::RuleLoadError(format!("读取规则文件{}失败：{}", path.display(), e))
        })?;

        let rule_lib = Self::parse(&data)?;
        info!(
            "从{}加载规则库成功，直接映射{}条、关键词正则{}条",
            path.display(),
            rule_lib.direct_subcategory.len(),
            rule_lib.keyword_pattern_count()
        );
        Ok(rule_lib)
    }

    /// 解析并校验JSON规则
    pub fn parse(data: &[u8]) -> TmResult<RuleLibrary> {
        let rule_lib: RuleLibrary = serde_json::from_slice(data)
            .map_err(|e| ThemeMapperError::RuleParseError(format!("规则JSON无效：{}", e)))?;
        rule_lib.validate()?;
        Ok(rule_lib)
    }
}
