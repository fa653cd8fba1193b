//! 编译模块：将原始规则表编译为归一化查找表与忽略大小写的正则
pub mod pattern;
pub mod compiler;

pub use self::pattern::{CompiledKeywordRule, CompiledPattern, CompiledRuleLibrary, normalize_label};
pub use self::compiler::RuleCompiler;
