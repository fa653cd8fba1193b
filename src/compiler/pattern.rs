//! 编译后模式模型
//! 正则编译后的结构

use std::collections::{HashMap, HashSet};
use regex::Regex;

use crate::rule::{Theme, ThemeSet};

/// 编译后的关键词正则
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    pub regex: Regex,
}

impl CompiledPattern {
    /// 简单匹配判断
    pub fn is_match(&self, input: &str) -> bool {
        self.regex.is_match(input)
    }

    /// 规则描述
    pub fn describe(&self) -> &str {
        self.regex.as_str()
    }
}

/// 单个主题的关键词规则（正则保持声明顺序）
#[derive(Debug, Clone)]
pub struct CompiledKeywordRule {
    pub theme: Theme,
    pub patterns: Vec<CompiledPattern>,
}

impl CompiledKeywordRule {
    /// 按声明顺序测试，返回首个命中的正则
    pub fn first_match(&self, name: &str) -> Option<&CompiledPattern> {
        self.patterns.iter().find(|pattern| pattern.is_match(name))
    }
}

/// 编译后的规则库（查找键已归一化）
#[derive(Debug, Clone)]
pub struct CompiledRuleLibrary {
    pub direct_subcategory: HashMap<String, ThemeSet>,
    pub ambiguous_subcategories: HashSet<String>,
    pub keyword_rules: Vec<CompiledKeywordRule>,
    pub subcategory_fallback: HashMap<String, ThemeSet>,
    pub category_fallback: HashMap<String, ThemeSet>,
    pub default_theme: Theme,
}

/// 类目标签归一化：去除首尾空白并忽略大小写
pub fn normalize_label(label: &str) -> String {
    label.trim().to_lowercase()
}
