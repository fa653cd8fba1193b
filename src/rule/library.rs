//! 规则库数据模型
//! 仅存储原始规则表（未编译），支持JSON序列化/反序列化

use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};

use super::builtin;
use super::model::Theme;
use crate::error::{ThemeMapperError, TmResult};

/// 关键词规则：主题 -> 有序正则列表
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct KeywordRule {
    pub theme: Theme,
    pub patterns: Vec<String>,
}

/// 完整规则库（按层级优先级组织）
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RuleLibrary {
    // 第一层：子类目直接映射
    pub direct_subcategory: BTreeMap<String, Vec<Theme>>,
    // 第二层仅对这些子类目生效
    pub ambiguous_subcategories: Vec<String>,
    // 第二层：关键词细化（顺序有意义）
    pub keyword_rules: Vec<KeywordRule>,
    // 第三层：子类目兜底
    #[serde(default)]
    pub subcategory_fallback: BTreeMap<String, Vec<Theme>>,
    // 第四层：类目兜底
    #[serde(default)]
    pub category_fallback: BTreeMap<String, Vec<Theme>>,
    #[serde(default = "default_theme")]
    pub default_theme: Theme,
}

fn default_theme() -> Theme {
    Theme::DEFAULT
}

impl RuleLibrary {
    /// 内置规则库
    pub fn builtin() -> Self {
        fn to_map(rules: &[(&str, &[Theme])]) -> BTreeMap<String, Vec<Theme>> {
            rules
                .iter()
                .map(|(label, themes)| (label.to_string(), themes.to_vec()))
                .collect()
        }

        Self {
            direct_subcategory: to_map(builtin::DIRECT_SUBCATEGORY_RULES),
            ambiguous_subcategories: builtin::AMBIGUOUS_SUBCATEGORIES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            keyword_rules: builtin::KEYWORD_RULES
                .iter()
                .map(|(theme, patterns)| KeywordRule {
                    theme: *theme,
                    patterns: patterns.iter().map(|p| p.to_string()).collect(),
                })
                .collect(),
            subcategory_fallback: to_map(builtin::SUBCATEGORY_FALLBACK_RULES),
            category_fallback: to_map(builtin::CATEGORY_FALLBACK_RULES),
            default_theme: Theme::DEFAULT,
        }
    }

    /// 结构校验：映射项不得为空，关键词规则不得含空正则
    pub fn validate(&self) -> TmResult<()> {
        let tables = [
            ("direct_subcategory", &self.direct_subcategory),
            ("subcategory_fallback", &self.subcategory_fallback),
            ("category_fallback", &self.category_fallback),
        ];
        for (table_name, table) in tables {
            for (label, themes) in table {
                if label.trim().is_empty() {
                    return Err(ThemeMapperError::RuleParseError(format!(
                        "{}包含空标签",
                        table_name
                    )));
                }
                if themes.is_empty() {
                    return Err(ThemeMapperError::RuleParseError(format!(
                        "{}中的[{}]未映射任何主题",
                        table_name, label
                    )));
                }
            }
        }

        for rule in &self.keyword_rules {
            if rule.patterns.iter().any(|p| p.trim().is_empty()) {
                return Err(ThemeMapperError::RuleParseError(format!(
                    "主题{}的关键词规则包含空正则",
                    rule.theme
                )));
            }
        }

        Ok(())
    }

    /// 关键词正则总数
    pub fn keyword_pattern_count(&self) -> usize {
        self.keyword_rules.iter().map(|rule| rule.patterns.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_library_is_valid() {
        let lib = RuleLibrary::builtin();
        lib.validate().unwrap();
        assert!(lib.direct_subcategory.contains_key("Saree"));
        assert_eq!(lib.default_theme, Theme::CasualEveryday);
        assert!(lib.keyword_pattern_count() > 0);
    }

    #[test]
    fn test_validate_rejects_empty_theme_list() {
        let mut lib = RuleLibrary::builtin();
        lib.category_fallback.insert("Gadgets".to_string(), Vec::new());
        assert!(matches!(lib.validate(), Err(ThemeMapperError::RuleParseError(_))));
    }

    #[test]
    fn test_deserialize_rejects_unknown_theme() {
        let json = r#"{
            "direct_subcategory": {"Saree": ["royal_wedding"]},
            "ambiguous_subcategories": [],
            "keyword_rules": []
        }"#;
        assert!(serde_json::from_str::<RuleLibrary>(json).is_err());
    }

    #[test]
    fn test_deserialize_fills_optional_tables() {
        let json = r#"{
            "direct_subcategory": {"Saree": ["festive_ethnic"]},
            "ambiguous_subcategories": ["Topwear"],
            "keyword_rules": [{"theme": "party_glam", "patterns": ["sequin"]}]
        }"#;
        let lib: RuleLibrary = serde_json::from_str(json).unwrap();
        assert!(lib.subcategory_fallback.is_empty());
        assert_eq!(lib.default_theme, Theme::CasualEveryday);
    }
}
