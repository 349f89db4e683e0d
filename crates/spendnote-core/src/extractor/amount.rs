//! Amount detection
//!
//! A numeric token counts as currency-adjacent when a currency symbol or code
//! precedes it, or a unit word ("元", "块", "yuan", "bucks") follows it. The
//! first such token wins. Without one, a bare number is accepted only when it
//! is the single number in the text that is not obviously a count, time or
//! date ("3杯", "10点", "5月").
//!
//! Negative numbers ("退款-50元") are never amounts. A hyphen between two
//! numbers ("20-30元") is read as a range, not a sign. The colloquial
//! "50块5" form (50.5) is folded into one amount.

use std::sync::OnceLock;

use regex::Regex;

/// Cues allowed directly before the number (lowercase)
const PREFIX_CUES: &[&str] = &["￥", "¥", "$", "€", "£", "rmb", "cny", "usd"];

/// Cues allowed directly after the number (lowercase, longest first)
const UNIT_CUES: &[&str] = &[
    "块钱", "元", "块", "圆", "￥", "¥", "$", "yuan", "rmb", "cny", "usd", "dollars", "dollar",
    "bucks", "buck",
];

/// Suffixes that mark a number as something other than money
const QUANTITY_MARKERS: &[&str] = &[
    "公里", "小时", "分钟", "个", "杯", "瓶", "件", "份", "次", "点", "月", "日", "号", "年",
    "天", "人", "位", "岁", "斤", "%", "％", ":", "：", "kg", "km", "x",
];

/// Amount found in the text
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct AmountMatch {
    pub value: f64,
    /// Byte span covering the number and its currency cues
    pub start: usize,
    pub end: usize,
}

fn number_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[0-9]{1,3}(?:,[0-9]{3})+(?:\.[0-9]+)?|[0-9]+(?:\.[0-9]+)?")
            .expect("valid regex")
    })
}

/// Find the expense amount in `text`
pub(crate) fn find_amount(text: &str) -> Option<AmountMatch> {
    // ASCII-only lowercasing keeps byte offsets aligned with `text`
    let lower = text.to_ascii_lowercase();
    let mut bare: Vec<AmountMatch> = Vec::new();

    for token in number_regex().find_iter(text) {
        let before = &lower[..token.start()];
        let after = &lower[token.end()..];

        if is_negative(before) {
            continue;
        }
        let Some(mut value) = parse_number(token.as_str()) else {
            continue;
        };

        let prefix_start = match_prefix_cue(before);
        let unit_len = match_unit_cue(after);

        if prefix_start.is_some() || unit_len.is_some() {
            let mut end = token.end() + unit_len.unwrap_or(0);
            let unit = &after[..unit_len.unwrap_or(0)];
            if let Some((tenths, len)) = match_kuai_fraction(unit, &lower[end..]) {
                value += tenths;
                end += len;
            }
            return Some(AmountMatch {
                value,
                start: prefix_start.unwrap_or(token.start()),
                end,
            });
        }

        if is_bare_candidate(before, after) {
            bare.push(AmountMatch {
                value,
                start: token.start(),
                end: token.end(),
            });
        }
    }

    if bare.len() == 1 {
        bare.pop()
    } else {
        None
    }
}

/// Parse a matched token, dropping thousands separators
fn parse_number(token: &str) -> Option<f64> {
    let cleaned = token.replace(',', "");
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
}

/// Whether the token is preceded by a minus sign rather than a range hyphen
fn is_negative(before: &str) -> bool {
    let mut head = before.trim_end();
    // "-¥50" carries the sign ahead of the currency cue
    if let Some(start) = match_prefix_cue(head) {
        head = head[..start].trim_end();
    }
    let Some(rest) = head
        .strip_suffix('-')
        .or_else(|| head.strip_suffix('－'))
        .or_else(|| head.strip_suffix('−'))
    else {
        return false;
    };
    !rest
        .trim_end()
        .chars()
        .next_back()
        .is_some_and(|c| c.is_ascii_digit())
}

/// Trailing jiao digit in "50块5" / "50块5毛": value in yuan and byte length
fn match_kuai_fraction(unit: &str, rest: &str) -> Option<(f64, usize)> {
    if unit.trim_start() != "块" {
        return None;
    }
    let mut chars = rest.chars();
    let digit = chars.next()?.to_digit(10)?;
    let tail = chars.as_str();
    if tail.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
        return None;
    }

    let mut len = 1;
    if let Some(jiao) = ["毛", "角"].iter().find(|j| tail.starts_with(*j)) {
        len += jiao.len();
    } else if QUANTITY_MARKERS.iter().any(|m| tail.trim_start().starts_with(m))
        || starts_with_ascii_letter(tail)
    {
        return None;
    }
    Some((f64::from(digit) / 10.0, len))
}

/// Start offset of a currency cue ending right before the number
fn match_prefix_cue(before: &str) -> Option<usize> {
    let trimmed = before.trim_end();
    PREFIX_CUES.iter().find_map(|cue| {
        if !trimmed.ends_with(cue) {
            return None;
        }
        let start = trimmed.len() - cue.len();
        if is_ascii_word(cue) && ends_with_ascii_letter(&trimmed[..start]) {
            return None;
        }
        Some(start)
    })
}

/// Length (including skipped whitespace) of a unit cue right after the number
fn match_unit_cue(after: &str) -> Option<usize> {
    let trimmed = after.trim_start();
    let skipped = after.len() - trimmed.len();
    UNIT_CUES.iter().find_map(|cue| {
        if !trimmed.starts_with(cue) {
            return None;
        }
        if is_ascii_word(cue) && starts_with_ascii_letter(&trimmed[cue.len()..]) {
            return None;
        }
        Some(skipped + cue.len())
    })
}

/// A number with no currency cue that could still be the amount
fn is_bare_candidate(before: &str, after: &str) -> bool {
    // Part of a word or model name ("iphone15", "5g")
    if ends_with_ascii_letter(before) || starts_with_ascii_letter(after) {
        return false;
    }

    let trimmed = after.trim_start();
    !QUANTITY_MARKERS.iter().any(|marker| {
        trimmed.starts_with(marker)
            && !(is_ascii_word(marker) && starts_with_ascii_letter(&trimmed[marker.len()..]))
    })
}

fn is_ascii_word(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_alphabetic())
}

fn ends_with_ascii_letter(s: &str) -> bool {
    s.chars().next_back().is_some_and(|c| c.is_ascii_alphabetic())
}

fn starts_with_ascii_letter(s: &str) -> bool {
    s.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
}
