// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Heuristic intent classification.
//!
//! Classifies user messages into a [`RequestCategory`] using per-category
//! marker phrases. No model call, no network, no latency.
//!
//! Score(category) = matched markers / markers in the category. The best
//! score wins, ties go to the category declared first, and a winner below the
//! activation threshold is replaced by the fallback category so sparse
//! matches never produce an overconfident guess.

use triage_config::model::ClassifierConfig;
use triage_core::text::PhraseIndex;
use triage_core::RequestCategory;

/// Result of classifying a message's intent.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationResult {
    pub category: RequestCategory,
    /// Confidence in the classification (0.0-1.0).
    pub confidence: f64,
    /// True when the fallback path produced this result.
    pub ambiguous: bool,
    /// Human-readable reason for the classification.
    pub reason: &'static str,
}

/// Signals from the ongoing conversation.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassifyContext {
    /// Intent of the previous confidently classified turn.
    pub last_intent: Option<RequestCategory>,
}

/// Marker phrases per category, Vietnamese and English.
///
/// Phrases are lowercase and matched as whole tokens.
const MARKERS: &[(RequestCategory, &[&str])] = &[
    (
        RequestCategory::ProductInquiry,
        &[
            "sản phẩm", "giá", "còn hàng", "thông số", "chất liệu",
            "bao nhiêu tiền", "product", "price", "in stock", "specs",
        ],
    ),
    (
        RequestCategory::CustomerService,
        &[
            "tài khoản", "đăng ký", "mật khẩu", "liên hệ", "thành viên",
            "chăm sóc khách hàng", "account", "password", "contact", "membership",
        ],
    ),
    (
        RequestCategory::OrderManagement,
        &[
            "đơn hàng", "giao hàng", "vận chuyển", "hủy đơn", "mã đơn",
            "đổi trả", "order", "shipping", "delivery", "tracking",
        ],
    ),
    (
        RequestCategory::Support,
        &[
            "lỗi", "không hoạt động", "cài đặt", "hướng dẫn", "bảo hành",
            "error", "not working", "install", "warranty", "troubleshoot",
        ],
    ),
    (
        RequestCategory::Sales,
        &[
            "mua", "khuyến mãi", "giảm giá", "báo giá", "trả góp",
            "buy", "discount", "quote", "promotion", "installment",
        ],
    ),
    (
        RequestCategory::Recommendation,
        &[
            "gợi ý", "tư vấn", "nên chọn", "phù hợp", "đề xuất",
            "recommend", "suggest", "suitable", "best", "which one",
        ],
    ),
    (
        RequestCategory::Complaint,
        &[
            "khiếu nại", "phàn nàn", "thất vọng", "tệ", "hoàn tiền",
            "complaint", "refund", "terrible", "disappointed", "angry",
        ],
    ),
    (
        RequestCategory::Report,
        &[
            "báo cáo", "thống kê", "doanh thu", "thuế", "lương",
            "tính toán", "report", "statistics", "revenue", "tax",
        ],
    ),
    (
        RequestCategory::General,
        &["xin chào", "chào", "cảm ơn", "hello", "hi", "thanks"],
    ),
];

/// Marker phrases for one category, in matching order.
pub fn markers_for(category: RequestCategory) -> &'static [&'static str] {
    MARKERS
        .iter()
        .find(|(c, _)| *c == category)
        .map(|(_, m)| *m)
        .unwrap_or(&[])
}

/// Heuristic intent classifier with zero cost and zero latency.
#[derive(Debug, Clone)]
pub struct IntentClassifier {
    /// Winning scores below this are treated as no signal.
    activation_threshold: f64,
    /// Confidence reported with the fallback category.
    fallback_confidence: f64,
    /// Longest message treated as a follow-up of the previous intent.
    follow_up_max_tokens: usize,
}

impl IntentClassifier {
    /// Create a classifier with the default thresholds.
    pub fn new() -> Self {
        Self::from_config(&ClassifierConfig::default())
    }

    pub fn from_config(config: &ClassifierConfig) -> Self {
        Self {
            activation_threshold: config.activation_threshold,
            fallback_confidence: config.fallback_confidence.clamp(0.0, 1.0),
            follow_up_max_tokens: config.follow_up_max_tokens,
        }
    }

    /// Hit ratio of every category, in declaration order.
    pub fn scores(&self, text: &str) -> Vec<(RequestCategory, f64)> {
        let index = PhraseIndex::new(text);
        Self::scores_for(&index)
    }

    fn scores_for(index: &PhraseIndex) -> Vec<(RequestCategory, f64)> {
        RequestCategory::ALL
            .iter()
            .map(|&category| {
                let markers = markers_for(category);
                if markers.is_empty() {
                    return (category, 0.0);
                }
                let hits = markers.iter().filter(|m| index.contains(m)).count();
                (category, hits as f64 / markers.len() as f64)
            })
            .collect()
    }

    /// Classify a message's intent.
    ///
    /// Never fails: empty or unrecognized text yields the fallback category.
    pub fn classify(&self, text: &str, context: &ClassifyContext) -> ClassificationResult {
        let index = PhraseIndex::new(text);
        if index.is_empty() {
            return self.fallback("empty message");
        }

        // Strict `>` keeps the first declared category on ties.
        let (category, score) = Self::scores_for(&index).into_iter().fold(
            (RequestCategory::FALLBACK, 0.0_f64),
            |best, candidate| if candidate.1 > best.1 { candidate } else { best },
        );

        if score + f64::EPSILON >= self.activation_threshold && score > 0.0 {
            return ClassificationResult {
                category,
                confidence: score.clamp(0.0, 1.0),
                ambiguous: false,
                reason: "marker hit ratio",
            };
        }

        // Short follow-ups ("còn màu đỏ?") stay with the previous intent.
        if let Some(last) = context.last_intent
            && last != RequestCategory::FALLBACK
            && index.token_count() <= self.follow_up_max_tokens
        {
            return ClassificationResult {
                category: last,
                confidence: self.fallback_confidence,
                ambiguous: true,
                reason: "follow-up of previous intent",
            };
        }

        self.fallback("below activation threshold")
    }

    fn fallback(&self, reason: &'static str) -> ClassificationResult {
        ClassificationResult {
            category: RequestCategory::FALLBACK,
            confidence: self.fallback_confidence,
            ambiguous: true,
            reason,
        }
    }
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(text: &str) -> ClassificationResult {
        IntentClassifier::new().classify(text, &ClassifyContext::default())
    }

    #[test]
    fn classify_order_tracking() {
        let result = classify("Đơn hàng của tôi đang giao hàng tới đâu rồi?");
        assert_eq!(result.category, RequestCategory::OrderManagement);
        assert!((result.confidence - 0.2).abs() < 1e-9);
        assert!(!result.ambiguous);
    }

    #[test]
    fn classify_complaint_in_english() {
        let result = classify("This is terrible, I want a refund");
        assert_eq!(result.category, RequestCategory::Complaint);
        assert!(!result.ambiguous);
    }

    #[test]
    fn classify_salary_as_report() {
        let result = classify("lương 50 triệu, 2 người phụ thuộc");
        assert_eq!(result.category, RequestCategory::Report);
    }

    #[test]
    fn ties_go_to_first_declared_category() {
        // "price" (ProductInquiry) and "buy" (Sales) score 0.1 each.
        let result = classify("buy price");
        assert_eq!(result.category, RequestCategory::ProductInquiry);
    }

    #[test]
    fn no_markers_falls_back() {
        let result = classify("bàn F42");
        assert_eq!(result.category, RequestCategory::General);
        assert_eq!(result.confidence, 0.5);
        assert!(result.ambiguous);
        assert_eq!(result.reason, "below activation threshold");
    }

    #[test]
    fn empty_message_falls_back_immediately() {
        let result = classify("   ");
        assert_eq!(result.category, RequestCategory::General);
        assert_eq!(result.reason, "empty message");
    }

    #[test]
    fn high_threshold_forces_fallback() {
        let classifier = IntentClassifier::from_config(&ClassifierConfig {
            activation_threshold: 0.5,
            ..ClassifierConfig::default()
        });
        let result = classifier.classify("refund please", &ClassifyContext::default());
        assert_eq!(result.category, RequestCategory::General);
        assert!(result.ambiguous);
    }

    #[test]
    fn partial_words_do_not_match() {
        // "history" contains "hi" but is not the greeting.
        let result = classify("history");
        assert!(result.ambiguous);
    }

    #[test]
    fn short_follow_up_keeps_previous_intent() {
        let context = ClassifyContext {
            last_intent: Some(RequestCategory::ProductInquiry),
        };
        let result = IntentClassifier::new().classify("còn màu đỏ không", &context);
        assert_eq!(result.category, RequestCategory::ProductInquiry);
        assert_eq!(result.confidence, 0.5);
        assert!(result.ambiguous);
    }

    #[test]
    fn long_unmatched_message_ignores_previous_intent() {
        let context = ClassifyContext {
            last_intent: Some(RequestCategory::ProductInquiry),
        };
        let result =
            IntentClassifier::new().classify("hôm nay trời đẹp quá nhỉ bạn ơi", &context);
        assert_eq!(result.category, RequestCategory::General);
    }

    #[test]
    fn every_category_has_markers() {
        for category in RequestCategory::ALL {
            assert!(!markers_for(category).is_empty(), "{category}");
        }
    }

    #[test]
    fn scores_cover_every_category() {
        let scores = IntentClassifier::new().scores("giá sản phẩm");
        assert_eq!(scores.len(), RequestCategory::ALL.len());
        assert_eq!(scores[0], (RequestCategory::ProductInquiry, 0.2));
    }
}
