//! Offline rule-based expense extraction
//!
//! Runs four ordered passes over the text:
//!
//! 1. Amount: first currency-adjacent number, or a single unambiguous bare one
//! 2. Category: first matching entry of an ordered keyword table
//! 3. Note: whatever is left once the amount and its currency cues are removed
//! 4. Confidence: +0.4 amount, +0.3 category, +0.1 note of 2+ characters
//!
//! Extraction is synchronous, does no I/O, and never fails; unparseable input
//! yields a low-confidence result with empty fields. The regex engine runs in
//! linear time, so pathological input cannot stall a caller.

mod amount;
mod category;
mod note;

pub use category::{CategoryRule, CategoryTable};

use tracing::debug;

use crate::models::{ParseResult, ParseSource};

const AMOUNT_WEIGHT: f64 = 0.4;
const CATEGORY_WEIGHT: f64 = 0.3;
const NOTE_WEIGHT: f64 = 0.1;

/// Notes shorter than this (in characters) add no confidence
const MIN_NOTE_CHARS: usize = 2;

/// Rule engine producing `ParseSource::Local` results
#[derive(Debug, Clone, Default)]
pub struct LocalExtractor {
    categories: CategoryTable,
}

impl LocalExtractor {
    /// Create an extractor with the built-in category table
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an extractor with a custom category table
    pub fn with_categories(categories: CategoryTable) -> Self {
        Self { categories }
    }

    pub fn categories(&self) -> &CategoryTable {
        &self.categories
    }

    /// Extract amount, category and note from `text`
    pub fn extract(&self, text: &str) -> ParseResult {
        let amount = amount::find_amount(text);
        let category = self.categories.classify(text).map(str::to_string);
        let note = note::residual_note(text, amount.map(|m| (m.start, m.end)));

        let mut confidence = 0.0;
        if amount.is_some() {
            confidence += AMOUNT_WEIGHT;
        }
        if category.is_some() {
            confidence += CATEGORY_WEIGHT;
        }
        if note
            .as_deref()
            .is_some_and(|n| n.chars().count() >= MIN_NOTE_CHARS)
        {
            confidence += NOTE_WEIGHT;
        }

        debug!(
            amount = ?amount.map(|m| m.value),
            category = ?category,
            confidence,
            "Local extraction complete"
        );

        ParseResult::new(
            text,
            amount.map(|m| m.value),
            category,
            note,
            confidence,
            ParseSource::Local,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WEAK_CONFIDENCE;

    fn extract(text: &str) -> ParseResult {
        LocalExtractor::new().extract(text)
    }

    #[test]
    fn test_grocery_purchase() {
        let result = extract("今天买菜花了50元");
        assert_eq!(result.amount(), Some(50.0));
        assert_eq!(result.category(), Some("餐饮"));
        assert_eq!(result.source(), ParseSource::Local);
        assert!(result.confidence().unwrap() > WEAK_CONFIDENCE);
    }

    #[test]
    fn test_lunch_with_review() {
        let result = extract("午餐在餐厅吃了一顿，花费85.5元，味道不错");
        assert_eq!(result.amount(), Some(85.5));
        assert_eq!(result.category(), Some("餐饮"));
        assert!(result.note().unwrap().contains("味道"));
        assert!((result.confidence().unwrap() - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_no_amount_is_weak() {
        let result = extract("今天天气很好");
        assert_eq!(result.amount(), None);
        assert_eq!(result.category(), None);
        assert!(result.confidence().unwrap() < WEAK_CONFIDENCE);
        assert_eq!(result.note(), Some("今天天气很好"));
    }

    #[test]
    fn test_noisy_input() {
        let result = extract("买了@#$%^&*()咖啡☕️花费￥25.50元！！！");
        assert_eq!(result.amount(), Some(25.50));
        assert_eq!(result.category(), Some("餐饮"));
        let note = result.note().unwrap();
        for symbol in ['@', '#', '$', '%', '^', '&', '*', '(', ')', '☕', '￥', '！'] {
            assert!(!note.contains(symbol), "note {:?} contains {:?}", note, symbol);
        }
    }

    #[test]
    fn test_empty_input() {
        let result = extract("");
        assert_eq!(result.original_text(), "");
        assert_eq!(result.amount(), None);
        assert_eq!(result.note(), None);
        assert_eq!(result.confidence(), Some(0.0));
    }

    #[test]
    fn test_noise_only_input() {
        let result = extract("☕️🍰!!!@@@###");
        assert_eq!(result.amount(), None);
        assert!(result.confidence().unwrap() < WEAK_CONFIDENCE);
    }

    #[test]
    fn test_original_text_preserved_verbatim() {
        let text = "  coffee $4.50  ";
        let result = extract(text);
        assert_eq!(result.original_text(), text);
        assert_eq!(result.note(), Some("coffee"));
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let text = "买咖啡花了25元";
        let first = extract(text);
        let second = extract(text);
        assert_eq!(first.amount(), second.amount());
        assert_eq!(first.category(), second.category());
        assert_eq!(first.note(), second.note());
        assert_eq!(first.confidence(), second.confidence());
        assert_eq!(first, second);
    }

    #[test]
    fn test_refund_is_not_an_expense_amount() {
        let result = extract("退款-50元");
        assert_eq!(result.amount(), None);
        assert!(result.confidence().unwrap() < WEAK_CONFIDENCE);
    }

    #[test]
    fn test_kuai_fraction_leaves_clean_note() {
        let result = extract("打车花了50块5");
        assert_eq!(result.amount(), Some(50.5));
        assert_eq!(result.category(), Some("交通"));
        assert_eq!(result.note(), Some("打车花了"));
    }

    #[test]
    fn test_amount_only_scores_below_category_match() {
        let amount_only = extract("50元");
        assert!((amount_only.confidence().unwrap() - 0.4).abs() < 1e-9);
        assert_eq!(amount_only.note(), None);
    }

    #[test]
    fn test_custom_categories() {
        let table = CategoryTable::new(vec![CategoryRule {
            name: "Dining".into(),
            keywords: vec!["coffee".into()],
        }])
        .unwrap();
        let result = LocalExtractor::with_categories(table).extract("coffee $3");
        assert_eq!(result.category(), Some("Dining"));
    }
}
