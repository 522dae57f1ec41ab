// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Numeric parameter extraction for calculation handlers.
//!
//! Patterns are tried in a fixed priority order and the first one that finds
//! anything decides the amount:
//!
//! 1. Magnitude-suffixed numbers (`50 triệu`, `1,5 tỷ`, `20k`), multiplied by
//!    the unit factor. Largest wins, `resolved = true`.
//! 2. Currency-marked numbers (`$1,200`, `300.000đ`, `50 usd`). Largest wins,
//!    `resolved = true`.
//! 3. Bare numbers with locale-aware separators. Largest wins, but
//!    `resolved = false`: a bare number is only a guess at an amount.
//!
//! Count qualifiers (`2 người phụ thuộc`, `3 items`) are extracted on their
//! own and their digits never feed the bare-number scan.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use strum::Display;
use tracing::trace;

/// Number with optional `.`/`,` group or decimal separators.
pub(crate) const NUMBER_PATTERN: &str = r"[0-9]+(?:[.,][0-9]+)*";

/// Magnitude words and their factors. Longer spellings precede their
/// prefixes so alternation prefers them.
const MAGNITUDES: &[(&str, f64)] = &[
    ("tỷ", 1e9),
    ("tỉ", 1e9),
    ("billion", 1e9),
    ("bn", 1e9),
    ("triệu", 1e6),
    ("million", 1e6),
    ("mil", 1e6),
    ("tr", 1e6),
    ("nghìn", 1e3),
    ("ngàn", 1e3),
    ("thousand", 1e3),
    ("k", 1e3),
];

/// Regex alternation over every magnitude word.
pub(crate) fn magnitude_alternation() -> String {
    MAGNITUDES
        .iter()
        .map(|(unit, _)| regex::escape(unit))
        .collect::<Vec<_>>()
        .join("|")
}

static MAGNITUDE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)({NUMBER_PATTERN})\s*({})\b",
        magnitude_alternation()
    ))
    .unwrap()
});

static CURRENCY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\$\s*(?P<pre>{NUMBER_PATTERN})|\b(?:usd|vnd)\s*(?P<code>{NUMBER_PATTERN})|(?P<post>{NUMBER_PATTERN})\s*(?:(?:usd|vnđ|vnd|đồng(?P<watch>\s+hồ)?|đ)\b|\$)"
    ))
    .unwrap()
});

static COUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b([0-9]{1,3})\s*(người phụ thuộc|người|dependents?|children|kids|items?|units?|pcs|sản phẩm|món|cái|chiếc)\b",
    )
    .unwrap()
});

static NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(NUMBER_PATTERN).unwrap());

/// Which pattern produced the amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AmountSource {
    Magnitude,
    Currency,
    Bare,
    None,
}

/// Normalized numeric parameters found in a message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractedParameters {
    /// Canonical amount, `0.0` when nothing was found.
    pub amount: f64,
    /// Small-integer qualifier such as a number of dependents.
    pub count: Option<u32>,
    /// False when the amount is a guess or missing.
    pub resolved: bool,
    pub source: AmountSource,
    /// Text of every match considered by the deciding pattern.
    pub raw_matches: Vec<String>,
}

impl ExtractedParameters {
    fn unresolved(count: Option<u32>) -> Self {
        Self {
            amount: 0.0,
            count,
            resolved: false,
            source: AmountSource::None,
            raw_matches: Vec::new(),
        }
    }
}

/// Factor of a magnitude word (`triệu` -> 1e6), case-insensitive.
pub fn unit_factor(unit: &str) -> Option<f64> {
    let unit = unit.to_lowercase();
    MAGNITUDES
        .iter()
        .find(|(name, _)| *name == unit)
        .map(|(_, factor)| *factor)
}

/// Parse a number written with either Vietnamese (`1.500.000,5`) or English
/// (`1,500,000.5`) separators.
///
/// With both separators present the last one is the decimal point. A single
/// separator kind is a group separator when it repeats or is followed by
/// exactly three digits (`1.500`, `1,500`), otherwise a decimal point (`1,5`).
pub fn parse_locale_number(raw: &str) -> Option<f64> {
    let dots = raw.matches('.').count();
    let commas = raw.matches(',').count();
    let canonical = match (dots, commas) {
        (0, 0) => raw.to_string(),
        (_, 0) => single_separator(raw, '.', dots),
        (0, _) => single_separator(raw, ',', commas),
        _ => {
            if raw.rfind('.') > raw.rfind(',') {
                raw.replace(',', "")
            } else {
                raw.replace('.', "").replace(',', ".")
            }
        }
    };
    canonical.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn single_separator(raw: &str, sep: char, occurrences: usize) -> String {
    let grouped = occurrences > 1 || raw.rsplit(sep).next().is_some_and(|tail| tail.len() == 3);
    if grouped {
        raw.replace(sep, "")
    } else {
        raw.replace(sep, ".")
    }
}

/// Extract the amount and count qualifier from `text`. Never fails.
pub fn extract(text: &str) -> ExtractedParameters {
    let (count, count_spans) = extract_count(text);

    let found = scan_magnitude(text)
        .map(|m| (AmountSource::Magnitude, m))
        .or_else(|| scan_currency(text).map(|m| (AmountSource::Currency, m)))
        .or_else(|| scan_bare(text, &count_spans).map(|m| (AmountSource::Bare, m)));

    let Some((source, (amount, raw_matches))) = found else {
        trace!(count, "no amount found");
        return ExtractedParameters::unresolved(count);
    };

    trace!(%source, amount, count, "amount extracted");
    ExtractedParameters {
        amount,
        count,
        resolved: source != AmountSource::Bare,
        source,
        raw_matches,
    }
}

/// First count qualifier, plus the byte spans of every qualifier.
fn extract_count(text: &str) -> (Option<u32>, Vec<Range<usize>>) {
    let mut count = None;
    let mut spans = Vec::new();
    for caps in COUNT.captures_iter(text) {
        if let Some(whole) = caps.get(0) {
            spans.push(whole.range());
        }
        if count.is_none() {
            count = caps.get(1).and_then(|m| m.as_str().parse::<u32>().ok());
        }
    }
    (count, spans)
}

/// Largest value among `candidates`, with the text of every candidate.
fn largest(candidates: Vec<(f64, String)>) -> Option<(f64, Vec<String>)> {
    let amount = candidates
        .iter()
        .map(|(value, _)| *value)
        .fold(None, |best: Option<f64>, v| Some(best.map_or(v, |b| b.max(v))))?;
    Some((amount, candidates.into_iter().map(|(_, raw)| raw).collect()))
}

fn scan_magnitude(text: &str) -> Option<(f64, Vec<String>)> {
    let candidates = MAGNITUDE
        .captures_iter(text)
        .filter_map(|caps| {
            let number = parse_locale_number(caps.get(1)?.as_str())?;
            let factor = unit_factor(caps.get(2)?.as_str())?;
            Some((number * factor, caps.get(0)?.as_str().to_string()))
        })
        .collect();
    largest(candidates)
}

fn scan_currency(text: &str) -> Option<(f64, Vec<String>)> {
    let candidates = CURRENCY
        .captures_iter(text)
        .filter_map(|caps| {
            // "2 đồng hồ" counts watches, not money.
            if caps.name("watch").is_some() {
                return None;
            }
            let number = caps
                .name("pre")
                .or_else(|| caps.name("code"))
                .or_else(|| caps.name("post"))?;
            let value = parse_locale_number(number.as_str())?;
            Some((value, caps.get(0)?.as_str().trim().to_string()))
        })
        .collect();
    largest(candidates)
}

fn scan_bare(text: &str, excluded: &[Range<usize>]) -> Option<(f64, Vec<String>)> {
    let candidates = NUMBER
        .find_iter(text)
        .filter(|m| {
            !excluded
                .iter()
                .any(|span| span.start < m.end() && m.start() < span.end)
        })
        // Digits glued to letters belong to model codes such as "F42".
        .filter(|m| {
            !text[..m.start()]
                .chars()
                .next_back()
                .is_some_and(char::is_alphabetic)
        })
        .filter_map(|m| Some((parse_locale_number(m.as_str())?, m.as_str().to_string())))
        .collect();
    largest(candidates)
}
