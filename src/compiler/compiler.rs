//! 规则编译器核心
//! 负责将原始规则表编译为可直接查表/匹配的结构

use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::Instant;
use regex::RegexBuilder;
use tracing::{debug, warn};

use super::pattern::{normalize_label, CompiledKeywordRule, CompiledPattern, CompiledRuleLibrary};
use crate::error::{ThemeMapperError, TmResult};
use crate::rule::{RuleLibrary, Theme, ThemeSet};

/// 单条正则编译后的体积上限（字节）
const REGEX_SIZE_LIMIT: usize = 1 << 20;

/// 规则编译器
pub struct RuleCompiler;

impl RuleCompiler {
    /// 编译规则库
    pub fn compile(rule_lib: &RuleLibrary) -> TmResult<CompiledRuleLibrary> {
        let start = Instant::now();
        rule_lib.validate()?;

        // 1. 各层查找表（键归一化）
        let direct_subcategory = Self::compile_label_map(&rule_lib.direct_subcategory, "direct_subcategory");
        let subcategory_fallback = Self::compile_label_map(&rule_lib.subcategory_fallback, "subcategory_fallback");
        let category_fallback = Self::compile_label_map(&rule_lib.category_fallback, "category_fallback");

        let ambiguous_subcategories: HashSet<String> = rule_lib
            .ambiguous_subcategories
            .iter()
            .map(|label| normalize_label(label))
            .filter(|label| !label.is_empty())
            .collect();

        // 2. 编译关键词正则（保持主题与正则的声明顺序）
        let mut keyword_rules: Vec<CompiledKeywordRule> = Vec::with_capacity(rule_lib.keyword_rules.len());
        let mut pattern_count = 0;
        for rule in &rule_lib.keyword_rules {
            let mut patterns = Vec::with_capacity(rule.patterns.len());
            for raw in &rule.patterns {
                patterns.push(Self::compile_single_pattern(raw)?);
            }
            pattern_count += patterns.len();

            // 同一主题重复声明时合并到首次出现的位置
            match keyword_rules.iter_mut().find(|existing| existing.theme == rule.theme) {
                Some(existing) => {
                    warn!("主题{}的关键词规则重复声明，已合并", rule.theme);
                    existing.patterns.extend(patterns);
                }
                None => keyword_rules.push(CompiledKeywordRule {
                    theme: rule.theme,
                    patterns,
                }),
            }
        }

        // 3. 输出编译统计
        debug!("✅ 规则编译完成，总耗时{:?}", start.elapsed());
        debug!(
            "📊 编译统计：直接映射{}条、模糊子类目{}个、关键词主题{}个/正则{}条、子类目兜底{}条、类目兜底{}条",
            direct_subcategory.len(),
            ambiguous_subcategories.len(),
            keyword_rules.len(),
            pattern_count,
            subcategory_fallback.len(),
            category_fallback.len()
        );

        Ok(CompiledRuleLibrary {
            direct_subcategory,
            ambiguous_subcategories,
            keyword_rules,
            subcategory_fallback,
            category_fallback,
            default_theme: rule_lib.default_theme,
        })
    }

    /// 编译 标签 -> 主题列表 映射
    fn compile_label_map(
        table: &BTreeMap<String, Vec<Theme>>,
        table_name: &str,
    ) -> HashMap<String, ThemeSet> {
        let mut compiled: HashMap<String, ThemeSet> = HashMap::with_capacity(table.len());
        for (label, themes) in table {
            let key = normalize_label(label);
            let entry = compiled.entry(key).or_default();
            if !entry.is_empty() {
                warn!("{}中的标签[{}]归一化后与已有标签冲突，主题已合并", table_name, label);
            }
            entry.extend(themes);
        }
        compiled
    }

    /// 编译单个关键词正则（忽略大小写）
    fn compile_single_pattern(raw_pattern: &str) -> TmResult<CompiledPattern> {
        let regex = RegexBuilder::new(raw_pattern.trim())
            .case_insensitive(true)
            .size_limit(REGEX_SIZE_LIMIT)
            .build()
            .map_err(|e| {
                ThemeMapperError::RuleParseError(format!("关键词正则[{}]无效：{}", raw_pattern, e))
            })?;

        Ok(CompiledPattern { regex })
    }
}
