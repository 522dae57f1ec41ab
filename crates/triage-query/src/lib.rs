// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query analysis for Triage: retrieval strategy selection and numeric
//! parameter extraction.
//!
//! Both are pure functions over static pattern tables and are safe to call
//! from any number of tasks at once.

pub mod extractor;
pub mod strategy;

pub use extractor::{extract, parse_locale_number, unit_factor, AmountSource, ExtractedParameters};
pub use strategy::{
    choose_strategy, PriceRange, RetrievalPlan, RetrievalStrategy, RetrievalStrategySelector,
};
