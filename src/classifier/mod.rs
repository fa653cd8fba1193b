//! 分类模块：主题分类核心逻辑
pub mod global;
pub mod classifier;

// 导出核心接口
pub use self::global::{classify_product_themes, default_classifier, init_classifier_with_config};
pub use self::classifier::{Classification, MatchTier, ThemeClassifier};
