//! 主题分类器核心：按固定层级顺序为商品计算主题集合

use std::sync::Arc;
use serde::Serialize;
use tracing::trace;

use crate::compiler::{normalize_label, CompiledRuleLibrary, RuleCompiler};
use crate::error::TmResult;
use crate::rule::{RuleLibrary, Theme, ThemeSet};

/// 规则层级（评估顺序固定）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    DirectSubcategory,
    Keyword,
    SubcategoryFallback,
    CategoryFallback,
    Default,
}

/// 带层级来源的分类结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub themes: ThemeSet,
    /// 实际贡献了主题的层级，按评估顺序排列
    pub tiers: Vec<MatchTier>,
}

/// 主题分类器
#[derive(Debug, Clone)]
pub struct ThemeClassifier {
    compiled_lib: Arc<CompiledRuleLibrary>,
}

impl ThemeClassifier {
    pub fn new(compiled_lib: CompiledRuleLibrary) -> Self {
        Self {
            compiled_lib: Arc::new(compiled_lib),
        }
    }

    /// 从原始规则库编译并创建分类器
    pub fn from_library(rule_lib: &RuleLibrary) -> TmResult<Self> {
        Ok(Self::new(RuleCompiler::compile(rule_lib)?))
    }

    /// 使用内置规则创建分类器
    pub fn builtin() -> TmResult<Self> {
        Self::from_library(&RuleLibrary::builtin())
    }

    pub fn rules(&self) -> &CompiledRuleLibrary {
        &self.compiled_lib
    }

    /// 计算主题集合，结果必不为空
    pub fn classify(&self, name: &str, category: Option<&str>, subcategory: Option<&str>) -> ThemeSet {
        self.classify_detailed(name, category, subcategory).themes
    }

    /// 计算主题集合并记录贡献层级
    pub fn classify_detailed(
        &self,
        name: &str,
        category: Option<&str>,
        subcategory: Option<&str>,
    ) -> Classification {
        let lib = &self.compiled_lib;
        let subcategory_key = subcategory.map(normalize_label).filter(|s| !s.is_empty());
        let category_key = category.map(normalize_label).filter(|s| !s.is_empty());

        let mut themes = ThemeSet::new();
        let mut tiers = Vec::new();

        // 1. 子类目直接映射
        if let Some(direct) = subcategory_key.as_ref().and_then(|key| lib.direct_subcategory.get(key)) {
            themes.extend(direct.iter());
            tiers.push(MatchTier::DirectSubcategory);
        }

        // 2. 关键词细化：仅限模糊子类目且名称非空，与第一层结果叠加
        let name = name.trim();
        let is_ambiguous = subcategory_key
            .as_ref()
            .is_some_and(|key| lib.ambiguous_subcategories.contains(key));
        if is_ambiguous && !name.is_empty() {
            let mut keyword_hit = false;
            for rule in &lib.keyword_rules {
                // 同一主题命中首条正则后即停止，继续测试其他主题
                if let Some(pattern) = rule.first_match(name) {
                    trace!("关键词命中：名称={}，主题={}，规则={}", name, rule.theme, pattern.describe());
                    themes.insert(rule.theme);
                    keyword_hit = true;
                }
            }
            if keyword_hit {
                tiers.push(MatchTier::Keyword);
            }
        }

        // 3. 子类目兜底
        if themes.is_empty() {
            if let Some(fallback) = subcategory_key.as_ref().and_then(|key| lib.subcategory_fallback.get(key)) {
                themes.extend(fallback.iter());
                tiers.push(MatchTier::SubcategoryFallback);
            }
        }

        // 4. 类目兜底
        if themes.is_empty() {
            if let Some(fallback) = category_key.as_ref().and_then(|key| lib.category_fallback.get(key)) {
                themes.extend(fallback.iter());
                tiers.push(MatchTier::CategoryFallback);
            }
        }

        // 5. 默认主题
        if themes.is_empty() {
            themes.insert(lib.default_theme);
            tiers.push(MatchTier::Default);
        }

        Classification { themes, tiers }
    }

    /// 默认主题
    pub fn default_theme(&self) -> Theme {
        self.compiled_lib.default_theme
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::KeywordRule;

    fn classifier() -> ThemeClassifier {
        ThemeClassifier::builtin().unwrap()
    }

    fn set(themes: &[Theme]) -> ThemeSet {
        themes.iter().copied().collect()
    }

    #[test]
    fn test_all_null_fields_yield_default_theme() {
        let c = classifier();
        assert_eq!(c.classify("", None, None), set(&[Theme::CasualEveryday]));
    }

    #[test]
    fn test_direct_subcategory_ignores_name() {
        let c = classifier();
        let expected = set(&[Theme::FestiveEthnic, Theme::PartyGlam]);
        assert_eq!(c.classify("Cotton Saree", Some("Apparel"), Some("Saree")), expected);
        assert_eq!(c.classify("office blazer", Some("Apparel"), Some("Saree")), expected);
        assert_eq!(c.classify("", None, Some("Saree")), expected);
    }

    #[test]
    fn test_ambiguous_subcategory_keyword_match() {
        let c = classifier();
        let result = c.classify_detailed("Women Printed Kurta", Some("Apparel"), Some("Topwear"));
        assert!(result.themes.contains(Theme::FestiveEthnic));
        assert_eq!(result.tiers, vec![MatchTier::Keyword]);
    }

    #[test]
    fn test_ambiguous_subcategory_without_keyword_falls_back() {
        let c = classifier();
        let result = c.classify_detailed("blue t-shirt", Some("Apparel"), Some("Topwear"));
        assert_eq!(result.themes, set(&[Theme::CasualEveryday]));
        assert_eq!(result.tiers, vec![MatchTier::SubcategoryFallback]);
    }

    #[test]
    fn test_keyword_tier_accumulates_multiple_themes() {
        let c = classifier();
        let themes = c.classify("Sequin Embellished Ethnic Kurta", None, Some("Topwear"));
        assert!(themes.contains(Theme::FestiveEthnic));
        assert!(themes.contains(Theme::PartyGlam));
    }

    #[test]
    fn test_keyword_tier_skipped_for_non_ambiguous_subcategory() {
        let c = classifier();
        // Socks 不在模糊列表中，名称里的关键词不应生效
        let themes = c.classify("Festive Kurta Socks", Some("Apparel"), Some("Socks"));
        assert_eq!(themes, set(&[Theme::CasualEveryday]));
    }

    #[test]
    fn test_keyword_tier_requires_non_empty_name() {
        let c = classifier();
        let result = c.classify_detailed("   ", None, Some("Dress"));
        assert_eq!(result.tiers, vec![MatchTier::SubcategoryFallback]);
    }

    #[test]
    fn test_keyword_tier_runs_after_direct_hit() {
        let mut lib = RuleLibrary::builtin();
        lib.ambiguous_subcategories.push("Saree".to_string());
        let c = ThemeClassifier::from_library(&lib).unwrap();
        let result = c.classify_detailed("Velvet Winter Saree in Wool", None, Some("Saree"));
        assert!(result.themes.contains(Theme::FestiveEthnic));
        assert!(result.themes.contains(Theme::WinterLayers));
        assert_eq!(result.tiers, vec![MatchTier::DirectSubcategory, MatchTier::Keyword]);
    }

    #[test]
    fn test_first_matching_pattern_only_adds_theme_once() {
        let mut lib = RuleLibrary::builtin();
        lib.keyword_rules = vec![KeywordRule {
            theme: Theme::PartyGlam,
            patterns: vec!["sequin".to_string(), "glitter".to_string()],
        }];
        let c = ThemeClassifier::from_library(&lib).unwrap();
        let themes = c.classify("sequin glitter top", None, Some("Topwear"));
        assert_eq!(themes, set(&[Theme::PartyGlam]));
    }

    #[test]
    fn test_category_fallback_when_subcategory_unknown() {
        let c = classifier();
        let result = c.classify_detailed("Something", Some("Apparel"), Some("Mystery"));
        assert_eq!(result.themes, set(&[Theme::CasualEveryday]));
        assert_eq!(result.tiers, vec![MatchTier::CategoryFallback]);

        let footwear = c.classify("Runner", Some("Footwear"), None);
        assert_eq!(footwear, set(&[Theme::ShoeCloset]));
    }

    #[test]
    fn test_unknown_everything_uses_default() {
        let c = classifier();
        let result = c.classify_detailed("Widget", Some("Gadgets"), Some("Gizmos"));
        assert_eq!(result.themes, set(&[Theme::CasualEveryday]));
        assert_eq!(result.tiers, vec![MatchTier::Default]);
    }

    #[test]
    fn test_lookup_ignores_case_and_whitespace() {
        let c = classifier();
        assert_eq!(c.classify("", None, Some("  saree ")), c.classify("", None, Some("Saree")));
    }

    #[test]
    fn test_result_is_never_empty_for_catalog_sample() {
        let c = classifier();
        let subcategories = [None, Some("Topwear"), Some("Bottomwear"), Some("Dress"), Some("Lips"), Some("")];
        let categories = [None, Some("Apparel"), Some("Beauty"), Some("")];
        let names = ["", "party dress", "linen shorts", "night suit"];
        for sub in subcategories {
            for cat in categories {
                for name in names {
                    let themes = c.classify(name, cat, sub);
                    assert!(!themes.is_empty());
                    assert_eq!(themes, c.classify(name, cat, sub));
                }
            }
        }
    }
}
