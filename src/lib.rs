//! theme-mapper - 商品内容主题分类与基于游标的批量映射

// 导出全局错误类型
pub use self::error::{ThemeMapperError, TmResult};

// 导出配置模块
pub use self::config::{GlobalConfig, ConfigManager, CustomConfigBuilder};

// 导出规则模块核心接口
pub use self::rule::{Theme, ThemeSet, KeywordRule, RuleLibrary, RuleLoader};

// 导出编译模块核心接口
pub use self::compiler::{CompiledRuleLibrary, CompiledPattern, RuleCompiler};

// 导出分类模块核心接口
pub use self::classifier::{
    Classification,
    MatchTier,
    ThemeClassifier,
    classify_product_themes,
    default_classifier,
    init_classifier_with_config,
};

// 导出存储模块核心接口
pub use self::store::{
    InMemoryProductStore, MappingMode, PostgrestProductStore, ProductFilter, ProductRow,
    ProductStore, StoredProduct, ThemeAssignment,
};

// 导出批处理模块核心接口
pub use self::batch::{
    BatchDriver, BatchPhase, BatchProgress, BatchRequest, BatchRunner, BatchStatus, DriveError,
    DriveSummary,
};

// 导出HTTP接口
pub use self::server::{AppState, build_router, serve};

// 声明所有子模块
pub mod config;
pub mod error;
pub mod rule;
pub mod compiler;
pub mod classifier;
pub mod store;
pub mod batch;
pub mod server;
