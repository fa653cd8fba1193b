//! 规则模块：负责主题目录、规则表数据模型与规则加载
pub mod model;
pub mod builtin;
pub mod library;
pub mod loader;

// 导出核心接口
pub use self::model::{Theme, ThemeSet};
pub use self::library::{KeywordRule, RuleLibrary};
pub use self::loader::RuleLoader;
