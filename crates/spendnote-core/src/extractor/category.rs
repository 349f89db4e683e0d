//! Keyword-based category inference
//!
//! Categories are checked in table order and the first one with any keyword
//! present in the text wins. ASCII keywords match case-insensitively on word
//! boundaries ("bus" does not match "business"); CJK keywords match as
//! substrings since Chinese text has no word separators.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Built-in ordered table (category label, keywords)
const BUILTIN_RULES: &[(&str, &[&str])] = &[
    (
        "餐饮",
        &[
            "餐", "饭", "午餐", "晚餐", "早餐", "早饭", "午饭", "晚饭", "外卖", "咖啡", "奶茶",
            "买菜", "菜", "水果", "零食", "饮料", "火锅", "面条", "拉面", "包子", "吃", "喝",
            "coffee", "lunch", "dinner", "breakfast", "restaurant", "food", "meal", "snack",
            "tea",
        ],
    ),
    (
        "交通",
        &[
            "打车", "出租车", "地铁", "公交", "高铁", "火车", "机票", "飞机", "加油", "停车",
            "滴滴", "taxi", "uber", "bus", "subway", "metro", "train", "flight", "gas", "parking",
        ],
    ),
    (
        "购物",
        &[
            "购物", "超市", "淘宝", "京东", "衣服", "鞋", "包包", "日用品", "网购", "shopping",
            "clothes", "shoes", "amazon", "supermarket",
        ],
    ),
    (
        "娱乐",
        &[
            "电影", "游戏", "唱歌", "ktv", "演唱会", "门票", "旅游", "movie", "game", "concert",
            "ticket", "netflix",
        ],
    ),
    (
        "居住",
        &[
            "房租", "租金", "水费", "电费", "燃气", "物业", "宽带", "rent", "electricity",
            "utilities",
        ],
    ),
    (
        "医疗",
        &["医院", "药", "看病", "挂号", "体检", "hospital", "doctor", "medicine", "pharmacy"],
    ),
    (
        "教育",
        &["书", "课程", "学费", "培训", "教材", "book", "course", "tuition"],
    ),
    ("通讯", &["话费", "流量", "充值", "phone", "mobile"]),
];

/// One category and the keywords that select it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub name: String,
    pub keywords: Vec<String>,
}

/// Ordered category → keywords table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTable {
    rules: Vec<CategoryRule>,
}

impl CategoryTable {
    /// Build a table from custom rules
    ///
    /// Names and keywords are trimmed and ASCII keywords lowercased. Empty
    /// names, rules without keywords, and empty tables are rejected.
    pub fn new(rules: Vec<CategoryRule>) -> Result<Self> {
        if rules.is_empty() {
            return Err(Error::Config("Category table must not be empty".into()));
        }

        let mut normalized = Vec::with_capacity(rules.len());
        for rule in rules {
            let name = rule.name.trim().to_string();
            if name.is_empty() {
                return Err(Error::Config("Category name must not be empty".into()));
            }

            let keywords: Vec<String> = rule
                .keywords
                .iter()
                .map(|k| k.trim().to_ascii_lowercase())
                .filter(|k| !k.is_empty())
                .collect();
            if keywords.is_empty() {
                return Err(Error::Config(format!(
                    "Category '{}' has no keywords",
                    name
                )));
            }

            normalized.push(CategoryRule { name, keywords });
        }

        Ok(Self { rules: normalized })
    }

    /// The built-in table
    pub fn builtin() -> Self {
        let rules = BUILTIN_RULES
            .iter()
            .map(|(name, keywords)| CategoryRule {
                name: name.to_string(),
                keywords: keywords.iter().map(|k| k.to_string()).collect(),
            })
            .collect();
        Self { rules }
    }

    /// Category labels in table order
    pub fn names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name.as_str()).collect()
    }

    pub fn rules(&self) -> &[CategoryRule] {
        &self.rules
    }

    /// First category whose keywords appear in `text`
    pub fn classify(&self, text: &str) -> Option<&str> {
        let lower = text.to_ascii_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.keywords.iter().any(|k| contains_keyword(&lower, k)))
            .map(|rule| rule.name.as_str())
    }
}

impl Default for CategoryTable {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Keyword lookup in already-lowercased text
fn contains_keyword(haystack: &str, keyword: &str) -> bool {
    if !keyword.is_ascii() {
        return haystack.contains(keyword);
    }

    haystack.match_indices(keyword).any(|(start, _)| {
        let end = start + keyword.len();
        let before_ok = haystack[..start]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_ascii_alphanumeric());
        let after_ok = haystack[end..]
            .chars()
            .next()
            .map_or(true, |c| !c.is_ascii_alphanumeric());
        before_ok && after_ok
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_order() {
        let table = CategoryTable::builtin();
        assert_eq!(table.names()[0], "餐饮");
        assert_eq!(table.names().len(), 8);
    }

    #[test]
    fn test_classify_chinese() {
        let table = CategoryTable::builtin();
        assert_eq!(table.classify("今天买菜花了50元"), Some("餐饮"));
        assert_eq!(table.classify("买咖啡花了25元"), Some("餐饮"));
        assert_eq!(table.classify("打车去机场"), Some("交通"));
        assert_eq!(table.classify("交了这个月房租"), Some("居住"));
        assert_eq!(table.classify("今天天气很好"), None);
    }

    #[test]
    fn test_first_match_in_table_order_wins() {
        let table = CategoryTable::builtin();
        // Both 餐饮 (咖啡) and 交通 (地铁) keywords; 餐饮 comes first
        assert_eq!(table.classify("地铁站买了咖啡"), Some("餐饮"));
    }

    #[test]
    fn test_ascii_word_boundaries() {
        let table = CategoryTable::builtin();
        assert_eq!(table.classify("Took the BUS home"), Some("交通"));
        assert_eq!(table.classify("business cards"), None);
        assert_eq!(table.classify("Coffee at Blue Bottle"), Some("餐饮"));
    }

    #[test]
    fn test_custom_table() {
        let table = CategoryTable::new(vec![
            CategoryRule {
                name: " Pets ".into(),
                keywords: vec!["Vet".into(), "猫粮".into()],
            },
            CategoryRule {
                name: "Dining".into(),
                keywords: vec!["lunch".into()],
            },
        ])
        .unwrap();
        assert_eq!(table.classify("vet visit"), Some("Pets"));
        assert_eq!(table.classify("买猫粮"), Some("Pets"));
        assert_eq!(table.classify("lunch with team"), Some("Dining"));
        assert_eq!(table.names(), vec!["Pets", "Dining"]);
    }

    #[test]
    fn test_invalid_tables_rejected() {
        assert!(CategoryTable::new(vec![]).is_err());
        assert!(CategoryTable::new(vec![CategoryRule {
            name: "".into(),
            keywords: vec!["x".into()],
        }])
        .is_err());
        assert!(CategoryTable::new(vec![CategoryRule {
            name: "Empty".into(),
            keywords: vec!["  ".into()],
        }])
        .is_err());
    }
}
