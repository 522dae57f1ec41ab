// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Retrieval strategy selection.
//!
//! Short keyword lookups ("bàn F42") go to the structured backend as exact
//! filters. Anything descriptive, comparative or multi-clause goes to the
//! semantic backend. A price range is lifted out into a filter before tokens
//! are counted, so "tủ lạnh 5-7 triệu" still counts as a lookup, but it never
//! hides descriptive wording around it.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::Serialize;
use strum::Display;
use tracing::trace;
use triage_config::model::RetrievalConfig;
use triage_core::text::PhraseIndex;

use crate::extractor::{magnitude_alternation, parse_locale_number, unit_factor, NUMBER_PATTERN};

/// Longest structured query, in tokens, when none is configured.
pub const DEFAULT_MAX_STRUCTURED_TOKENS: usize = 4;

/// Words that turn a lookup into a description or a comparison.
const CONNECTORS: &[&str] = &[
    "for", "like", "suitable for", "compare", "similar", "versus", "vs", "better",
    "cheaper", "with", "cho", "dành cho", "như", "phù hợp", "so sánh", "giống",
    "tương tự", "hơn", "kiểu", "với",
];

/// Conjunctions joining clauses.
const CONJUNCTIONS: &[&str] = &["and", "or", "but", "và", "hoặc", "nhưng", "mà"];

/// `lo - hi` with an optional cue, magnitude units and currency. A bare
/// `N-M` match is only a price when [`is_price_like`] accepts it.
static PRICE_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    let units = magnitude_alternation();
    Regex::new(&format!(
        r"(?i)(?:(?P<cue>\b(?:từ|from|between|giá|price|khoảng|tầm)\b)\s+)?\b(?P<lo>{NUMBER_PATTERN})\s*(?:(?P<lo_unit>{units})\b)?\s*(?:-|–|\bđến\b|\btới\b|\bto\b|\band\b)\s*(?P<hi>{NUMBER_PATTERN})\s*(?:(?P<hi_unit>{units})\b)?\s*(?P<currency>(?:vnđ|vnd|đồng|usd|đ)\b)?(?P<watch>\s+hồ\b)?"
    ))
    .unwrap()
});

static PRICE_BOUND: LazyLock<Regex> = LazyLock::new(|| {
    let units = magnitude_alternation();
    Regex::new(&format!(
        r"(?i)\b(?P<dir>dưới|không quá|tối đa|under|below|less than|max|trên|over|above|more than|tối thiểu|at least|min)\s+(?P<n>{NUMBER_PATTERN})\s*(?:(?P<unit>{units})\b)?\s*(?:(?:vnđ|vnd|đồng|usd|đ)\b)?"
    ))
    .unwrap()
});

static MODEL_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b[a-z]{1,4}-?[0-9]{2,6}[a-z]?\b").unwrap());

/// Where the query should be answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RetrievalStrategy {
    /// Exact filters against the structured store.
    Structured,
    /// Nearest-neighbour search over embeddings.
    Semantic,
}

/// Price bounds in canonical units; either side may be open.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// The strategy together with the filter values a backend would use.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievalPlan {
    pub strategy: RetrievalStrategy,
    /// The query text as received, trimmed.
    pub query: String,
    pub price_range: Option<PriceRange>,
    /// Alphanumeric model codes, uppercased.
    pub codes: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct RetrievalStrategySelector {
    max_structured_tokens: usize,
}

impl RetrievalStrategySelector {
    pub fn new(max_structured_tokens: usize) -> Self {
        Self {
            max_structured_tokens,
        }
    }

    pub fn from_config(config: &RetrievalConfig) -> Self {
        Self::new(config.max_structured_tokens)
    }

    pub fn choose(&self, text: &str) -> RetrievalStrategy {
        let (_, remainder) = take_price_range(text);
        self.strategy_for(&remainder)
    }

    pub fn plan(&self, text: &str) -> RetrievalPlan {
        let (price_range, remainder) = take_price_range(text);
        let strategy = self.strategy_for(&remainder);
        let codes: Vec<String> = MODEL_CODE
            .find_iter(text)
            .map(|m| m.as_str().to_uppercase())
            .collect();
        trace!(%strategy, codes = codes.len(), has_price = price_range.is_some(), "retrieval planned");
        RetrievalPlan {
            strategy,
            query: text.trim().to_string(),
            price_range,
            codes,
        }
    }

    fn strategy_for(&self, remainder: &str) -> RetrievalStrategy {
        let index = PhraseIndex::new(remainder);
        let descriptive = index.token_count() > self.max_structured_tokens
            || CONNECTORS.iter().any(|c| index.contains(c))
            || CONJUNCTIONS.iter().any(|c| index.contains(c))
            || has_clause_break(remainder);
        if descriptive {
            RetrievalStrategy::Semantic
        } else {
            RetrievalStrategy::Structured
        }
    }
}

impl Default for RetrievalStrategySelector {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_STRUCTURED_TOKENS)
    }
}

/// Strategy for `text` with the default token limit.
pub fn choose_strategy(text: &str) -> RetrievalStrategy {
    RetrievalStrategySelector::default().choose(text)
}

/// Semicolons, and commas that are not decimal or group separators.
fn has_clause_break(text: &str) -> bool {
    let chars: Vec<char> = text.chars().collect();
    chars.iter().enumerate().any(|(i, &c)| match c {
        ';' => true,
        ',' => {
            let digit_before = i > 0 && chars[i - 1].is_ascii_digit();
            let digit_after = chars.get(i + 1).is_some_and(char::is_ascii_digit);
            !(digit_before && digit_after)
        }
        _ => false,
    })
}

fn amount(caps: &Captures<'_>, number: &str, unit: Option<&str>) -> Option<f64> {
    let value = parse_locale_number(caps.name(number)?.as_str())?;
    let factor = unit.and_then(unit_factor).unwrap_or(1.0);
    Some(value * factor)
}

/// Remove the first price range or bound from `text`, returning it parsed.
fn take_price_range(text: &str) -> (Option<PriceRange>, String) {
    if let Some(caps) = PRICE_RANGE.captures_iter(text).find(is_price_like)
        && let Some(whole) = caps.get(0)
    {
        let hi_unit = caps.name("hi_unit").map(|m| m.as_str());
        // "5-7 triệu": the trailing unit applies to both ends.
        let lo_unit = caps.name("lo_unit").map(|m| m.as_str()).or(hi_unit);
        let lo = amount(&caps, "lo", lo_unit);
        let hi = amount(&caps, "hi", hi_unit);
        let (min, max) = match (lo, hi) {
            (Some(a), Some(b)) if a > b => (Some(b), Some(a)),
            pair => pair,
        };
        return (Some(PriceRange { min, max }), splice_out(text, whole.range()));
    }

    if let Some(caps) = PRICE_BOUND.captures(text)
        && let Some(whole) = caps.get(0)
    {
        let unit = caps.name("unit").map(|m| m.as_str());
        let value = amount(&caps, "n", unit);
        let upper = caps.name("dir").is_some_and(|d| {
            matches!(
                d.as_str().to_lowercase().as_str(),
                "dưới" | "không quá" | "tối đa" | "under" | "below" | "less than" | "max"
            )
        });
        let range = if upper {
            PriceRange { min: None, max: value }
        } else {
            PriceRange { min: value, max: None }
        };
        return (Some(range), splice_out(text, whole.range()));
    }

    (None, text.to_string())
}

/// "2-3 cánh" is a count, "5-7 triệu" and "từ 5 đến 7" are prices.
fn is_price_like(caps: &Captures<'_>) -> bool {
    let currency = caps.name("currency").is_some() && caps.name("watch").is_none();
    currency
        || ["cue", "lo_unit", "hi_unit"]
            .iter()
            .any(|name| caps.name(name).is_some())
}

fn splice_out(text: &str, span: std::ops::Range<usize>) -> String {
    format!("{} {}", &text[..span.start], &text[span.end..])
}
