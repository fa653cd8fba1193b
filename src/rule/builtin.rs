//! 内置规则表
//! 四层规则的常量数据，由 RuleLibrary::builtin 组装

use super::model::Theme;
use super::model::Theme::*;

/// 第一层：子类目直接映射（权威映射，每项1~2个主题）
pub const DIRECT_SUBCATEGORY_RULES: &[(&str, &[Theme])] = &[
    // 民族/节庆服饰
    ("Saree", &[FestiveEthnic, PartyGlam]),
    ("Lehenga Choli", &[FestiveEthnic, PartyGlam]),
    ("Kurtas", &[FestiveEthnic]),
    ("Kurta Sets", &[FestiveEthnic]),
    ("Salwar", &[FestiveEthnic]),
    ("Dupatta", &[FestiveEthnic]),
    ("Ethnic Wear", &[FestiveEthnic]),
    // 家居/睡衣
    ("Loungewear and Nightwear", &[Loungewear]),
    ("Nightwear", &[Loungewear]),
    ("Innerwear", &[Loungewear]),
    // 季节
    ("Swimwear", &[SummerVibes]),
    ("Sweaters", &[WinterLayers]),
    ("Sweatshirts", &[WinterLayers, CasualEveryday]),
    ("Jackets", &[WinterLayers]),
    ("Blazers", &[Workwear]),
    ("Suits", &[Workwear]),
    // 美妆个护
    ("Lips", &[MakeupBeauty]),
    ("Eyes", &[MakeupBeauty]),
    ("Makeup", &[MakeupBeauty]),
    ("Nails", &[MakeupBeauty]),
    ("Skin Care", &[SkincareRoutine]),
    ("Skin", &[SkincareRoutine]),
    ("Bath and Body", &[SkincareRoutine]),
    ("Hair", &[Haircare]),
    ("Hair Care", &[Haircare]),
    ("Fragrance", &[Fragrance]),
    ("Perfumes", &[Fragrance]),
    ("Deodorant", &[Fragrance]),
    // 配饰
    ("Jewellery", &[AccessoryHaul, PartyGlam]),
    ("Bags", &[AccessoryHaul]),
    ("Watches", &[AccessoryHaul]),
    ("Belts", &[AccessoryHaul]),
    ("Wallets", &[AccessoryHaul]),
    ("Eyewear", &[AccessoryHaul]),
    ("Headwear", &[AccessoryHaul]),
    ("Scarves", &[AccessoryHaul, WinterLayers]),
    // 鞋履
    ("Shoes", &[ShoeCloset]),
    ("Heels", &[ShoeCloset, PartyGlam]),
    ("Flats", &[ShoeCloset]),
    ("Sandal", &[ShoeCloset, SummerVibes]),
    ("Flip Flops", &[ShoeCloset, SummerVibes]),
    ("Sports Shoes", &[ShoeCloset]),
    ("Formal Shoes", &[ShoeCloset, Workwear]),
    // 家居生活
    ("Home Furnishing", &[HomeLiving]),
    ("Home Decor", &[HomeLiving]),
    ("Bed Linen", &[HomeLiving]),
];

/// 需要关键词细化的宽泛子类目
pub const AMBIGUOUS_SUBCATEGORIES: &[&str] = &["Topwear", "Bottomwear", "Dress", "Apparel Set"];

/// 第二层：主题 -> 有序关键词正则（忽略大小写编译）
pub const KEYWORD_RULES: &[(Theme, &[&str])] = &[
    (
        FestiveEthnic,
        &[
            r"\bkurt(a|i|as|is)\b",
            r"\b(saree|sari|lehenga|anarkali|sherwani|salwar|churidar|dupatta)s?\b",
            r"\bethnic\b",
            r"\bfestive\b",
            r"\b(zari|bandhani|chikankari|ikat)\b",
        ],
    ),
    (
        PartyGlam,
        &[
            r"\bsequin(s|ned)?\b",
            r"\bparty\s*wear\b|\bparty\b",
            r"\b(glitter|shimmer|metallic)\b",
            r"\b(satin|velvet)\b",
            r"\b(bodycon|cocktail|embellished)\b",
        ],
    ),
    (
        Workwear,
        &[
            r"\bformal\b",
            r"\boffice\b",
            r"\bblazer\b",
            r"\b(trousers|pencil skirt|workwear)\b",
        ],
    ),
    (
        Loungewear,
        &[
            r"\blounge(wear)?\b",
            r"\b(pyjamas?|pajamas?|night\s*suit|nightdress)\b",
            r"\bjoggers?\b",
        ],
    ),
    (
        SummerVibes,
        &[
            r"\bsummer\b",
            r"\blinen\b",
            r"\b(beach|tropical|floral)\b",
            r"\b(sleeveless|shorts|sundress)\b",
        ],
    ),
    (
        WinterLayers,
        &[
            r"\b(woollen|wool|woolen)\b",
            r"\b(sweater|cardigan|pullover|hoodie)s?\b",
            r"\b(fleece|thermal|puffer|quilted)\b",
        ],
    ),
];

/// 第三层：子类目兜底（仅前两层均无结果时生效）
pub const SUBCATEGORY_FALLBACK_RULES: &[(&str, &[Theme])] = &[
    ("Topwear", &[CasualEveryday]),
    ("Bottomwear", &[CasualEveryday]),
    ("Dress", &[CasualEveryday, SummerVibes]),
    ("Apparel Set", &[CasualEveryday]),
    ("Socks", &[CasualEveryday]),
    ("Accessories", &[AccessoryHaul]),
    ("Cufflinks", &[AccessoryHaul, Workwear]),
    ("Ties", &[Workwear]),
    ("Lounge Pants", &[Loungewear]),
    ("Beauty Accessories", &[MakeupBeauty]),
];

/// 第四层：类目兜底
pub const CATEGORY_FALLBACK_RULES: &[(&str, &[Theme])] = &[
    ("Apparel", &[CasualEveryday]),
    ("Footwear", &[ShoeCloset]),
    ("Accessories", &[AccessoryHaul]),
    ("Personal Care", &[SkincareRoutine]),
    ("Beauty", &[MakeupBeauty]),
    ("Home", &[HomeLiving]),
];
