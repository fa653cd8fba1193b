//! 全局分类器单例管理
use once_cell::sync::OnceCell;

use super::classifier::ThemeClassifier;
use crate::config::GlobalConfig;
use crate::error::{ThemeMapperError, TmResult};
use crate::rule::{RuleLoader, ThemeSet};

/// 全局分类器实例
static GLOBAL_CLASSIFIER: OnceCell<ThemeClassifier> = OnceCell::new();

/// 按配置初始化全局分类器（重复调用时保留首次实例）
pub async fn init_classifier_with_config(config: &GlobalConfig) -> TmResult<&'static ThemeClassifier> {
    if let Some(classifier) = GLOBAL_CLASSIFIER.get() {
        return Ok(classifier);
    }

    let rule_lib = RuleLoader::load(config).await?;
    let classifier = ThemeClassifier::from_library(&rule_lib)?;
    // 并发初始化时以先写入者为准
    let _ = GLOBAL_CLASSIFIER.set(classifier);
    GLOBAL_CLASSIFIER
        .get()
        .ok_or_else(|| ThemeMapperError::ClassifierInitError("全局分类器写入失败".to_string()))
}

/// 获取全局分类器，未初始化时使用内置规则惰性创建
pub fn default_classifier() -> TmResult<&'static ThemeClassifier> {
    GLOBAL_CLASSIFIER.get_or_try_init(ThemeClassifier::builtin)
}

/// 使用全局分类器计算商品主题
pub fn classify_product_themes(
    name: &str,
    category: Option<&str>,
    subcategory: Option<&str>,
) -> TmResult<ThemeSet> {
    Ok(default_classifier()?.classify(name, category, subcategory))
}
