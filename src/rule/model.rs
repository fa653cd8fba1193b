//! 主题数据模型定义
//! 固定主题目录与分类结果集合，支持序列化/反序列化

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::ThemeMapperError;

/// 内容主题（封闭目录，声明顺序即规范输出顺序）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    FestiveEthnic,
    PartyGlam,
    Workwear,
    CasualEveryday,
    Loungewear,
    SummerVibes,
    WinterLayers,
    MakeupBeauty,
    SkincareRoutine,
    Haircare,
    AccessoryHaul,
    ShoeCloset,
    HomeLiving,
    Fragrance,
}

impl Theme {
    /// 完整主题目录
    pub const ALL: [Theme; 14] = [
        Theme::FestiveEthnic,
        Theme::PartyGlam,
        Theme::Workwear,
        Theme::CasualEveryday,
        Theme::Loungewear,
        Theme::SummerVibes,
        Theme::WinterLayers,
        Theme::MakeupBeauty,
        Theme::SkincareRoutine,
        Theme::Haircare,
        Theme::AccessoryHaul,
        Theme::ShoeCloset,
        Theme::HomeLiving,
        Theme::Fragrance,
    ];

    /// 所有层级都未命中时使用的兜底主题
    pub const DEFAULT: Theme = Theme::CasualEveryday;

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::FestiveEthnic => "festive_ethnic",
            Theme::PartyGlam => "party_glam",
            Theme::Workwear => "workwear",
            Theme::CasualEveryday => "casual_everyday",
            Theme::Loungewear => "loungewear",
            Theme::SummerVibes => "summer_vibes",
            Theme::WinterLayers => "winter_layers",
            Theme::MakeupBeauty => "makeup_beauty",
            Theme::SkincareRoutine => "skincare_routine",
            Theme::Haircare => "haircare",
            Theme::AccessoryHaul => "accessory_haul",
            Theme::ShoeCloset => "shoe_closet",
            Theme::HomeLiving => "home_living",
            Theme::Fragrance => "fragrance",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = ThemeMapperError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = s.trim();
        Theme::ALL
            .iter()
            .copied()
            .find(|theme| theme.as_str() == id)
            .ok_or_else(|| ThemeMapperError::InvalidInput(format!("未知主题：{}", s)))
    }
}

/// 分类结果：去重且按目录顺序排列的主题集合
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThemeSet(BTreeSet<Theme>);

impl ThemeSet {
    pub fn new() -> Self {
        Self(BTreeSet::new())
    }

    /// 插入主题，返回是否为新增
    pub fn insert(&mut self, theme: Theme) -> bool {
        self.0.insert(theme)
    }

    pub fn contains(&self, theme: Theme) -> bool {
        self.0.contains(&theme)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = Theme> + '_ {
        self.0.iter().copied()
    }

    /// 转为主题标识列表（写回存储使用）
    pub fn to_ids(&self) -> Vec<&'static str> {
        self.iter().map(|theme| theme.as_str()).collect()
    }
}

impl Extend<Theme> for ThemeSet {
    fn extend<I: IntoIterator<Item = Theme>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl<'a> Extend<&'a Theme> for ThemeSet {
    fn extend<I: IntoIterator<Item = &'a Theme>>(&mut self, iter: I) {
        self.0.extend(iter.into_iter().copied());
    }
}

impl FromIterator<Theme> for ThemeSet {
    fn from_iter<I: IntoIterator<Item = Theme>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for ThemeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_ids().join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_theme_ids_roundtrip_through_from_str() {
        for theme in Theme::ALL {
            assert_eq!(theme.as_str().parse::<Theme>().unwrap(), theme);
        }
        assert!("gothic".parse::<Theme>().is_err());
    }

    #[test]
    fn test_theme_serde_matches_catalog_ids() {
        let json = serde_json::to_string(&Theme::SkincareRoutine).unwrap();
        assert_eq!(json, "\"skincare_routine\"");
    }

    #[test]
    fn test_theme_set_is_deduplicated_and_ordered() {
        let set: ThemeSet = [Theme::PartyGlam, Theme::FestiveEthnic, Theme::PartyGlam]
            .into_iter()
            .collect();
        assert_eq!(set.len(), 2);
        assert_eq!(serde_json::to_string(&set).unwrap(), r#"["festive_ethnic","party_glam"]"#);
        assert_eq!(set.to_string(), "festive_ethnic,party_glam");
    }
}
