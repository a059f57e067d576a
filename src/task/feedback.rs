use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub const FALLBACK_FEEDBACK: &str = "Something went wrong! Please try submitting it again.";

/// Candidate rating used when the output holds no number. Clamping lifts it to the floor of 1.
pub const MISSING_RATING: u32 = 0;

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 10;

lazy_static! {
    static ref RATING: Regex = Regex::new(r"\b(\d{1,2})(?:/10)?\b").unwrap();
    static ref FEEDBACK: Regex = Regex::new(r"(?s)Feedback:\s*(.*)").unwrap();
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    MissingRating,
    MissingFeedback,
    MissingBoth,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "kind", content = "reason")]
pub enum ParseStatus {
    Parsed,
    Fallback(FallbackReason),
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ParsedFeedback {
    /// Always within [1, 10]
    pub rating: u8,
    pub feedback: String,
    pub status: ParseStatus,
}

impl ParsedFeedback {
    pub fn is_fallback(&self) -> bool {
        matches!(self.status, ParseStatus::Fallback(_))
    }

    pub fn tier(&self) -> RatingTier {
        RatingTier::from_rating(self.rating)
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum RatingTier {
    Excellent,
    Good,
    Bad,
}

impl RatingTier {
    pub fn from_rating(rating: u8) -> Self {
        if rating > 6 {
            RatingTier::Excellent
        } else if rating > 4 {
            RatingTier::Good
        } else {
            RatingTier::Bad
        }
    }
}

impl std::fmt::Display for RatingTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RatingTier::Excellent => write!(f, "EXCELLENT"),
            RatingTier::Good => write!(f, "GOOD"),
            RatingTier::Bad => write!(f, "BAD"),
        }
    }
}

pub struct ResponseParser;

impl ResponseParser {
    pub fn parse(raw: &str) -> ParsedFeedback {
        let rating = RATING
            .captures(raw)
            .and_then(|caps| caps.get(1))
            .and_then(|m| digits_value(m.as_str()));
        let feedback = FEEDBACK
            .captures(raw)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string());

        let status = match (rating.is_some(), feedback.is_some()) {
            (true, true) => ParseStatus::Parsed,
            (false, true) => ParseStatus::Fallback(FallbackReason::MissingRating),
            (true, false) => ParseStatus::Fallback(FallbackReason::MissingFeedback),
            (false, false) => ParseStatus::Fallback(FallbackReason::MissingBoth),
        };

        ParsedFeedback {
            rating: clamp_rating(rating.unwrap_or(MISSING_RATING)),
            feedback: feedback.unwrap_or_else(|| FALLBACK_FEEDBACK.to_string()),
            status,
        }
    }
}

/// `\d` matches any decimal digit, so full-width digits (U+FF10..U+FF19) are read as well.
fn digits_value(digits: &str) -> Option<u32> {
    digits.chars().try_fold(0u32, |value, c| {
        let digit = match c {
            '０'..='９' => c as u32 - '０' as u32,
            _ => c.to_digit(10)?,
        };
        value.checked_mul(10)?.checked_add(digit)
    })
}

fn clamp_rating(candidate: u32) -> u8 {
    candidate.clamp(MIN_RATING as u32, MAX_RATING as u32) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rating_and_feedback() {
        let parsed = ResponseParser::parse("7/10\nFeedback: Good job.");
        assert_eq!(parsed.rating, 7);
        assert_eq!(parsed.feedback, "Good job.");
        assert_eq!(parsed.status, ParseStatus::Parsed);
        assert!(!parsed.is_fallback());
    }

    #[test]
    fn unstructured_output_falls_back() {
        let parsed = ResponseParser::parse("Great work!");
        assert_eq!(parsed.rating, 1);
        assert_eq!(parsed.feedback, FALLBACK_FEEDBACK);
        assert_eq!(
            parsed.status,
            ParseStatus::Fallback(FallbackReason::MissingBoth)
        );
    }

    #[test]
    fn rating_is_clamped_to_ceiling() {
        let parsed = ResponseParser::parse("15/10 Feedback: too high");
        assert_eq!(parsed.rating, 10);
        assert_eq!(parsed.feedback, "too high");
    }

    #[test]
    fn rating_is_clamped_to_floor() {
        let parsed = ResponseParser::parse("0 Feedback: too low");
        assert_eq!(parsed.rating, 1);
        assert_eq!(parsed.status, ParseStatus::Parsed);
    }

    #[test]
    fn genuine_one_is_distinguishable_from_fallback() {
        let genuine = ResponseParser::parse("1/10\nFeedback: Needs a full rewrite.");
        let missing = ResponseParser::parse("Feedback: Needs a full rewrite.");
        assert_eq!(genuine.rating, missing.rating);
        assert_eq!(genuine.status, ParseStatus::Parsed);
        assert_eq!(
            missing.status,
            ParseStatus::Fallback(FallbackReason::MissingRating)
        );
    }

    #[test]
    fn larger_numbers_are_not_ratings() {
        // 123 is a single token, so the first whole 1-2 digit match is 8
        let parsed = ResponseParser::parse("Sentence 123 has issues. 8/10 Feedback: ok");
        assert_eq!(parsed.rating, 8);
    }

    #[test]
    fn full_width_digits_are_ratings() {
        let parsed = ResponseParser::parse("８/10 Feedback: x");
        assert_eq!(parsed.rating, 8);
        assert_eq!(parsed.feedback, "x");
        assert_eq!(parsed.status, ParseStatus::Parsed);

        assert_eq!(ResponseParser::parse("평가: １２\nFeedback: y").rating, 10);
    }

    #[test]
    fn feedback_spans_multiple_lines() {
        let raw = "Rating: 6/10\nFeedback:\n  - missing article\n  - wrong tense\n";
        let parsed = ResponseParser::parse(raw);
        assert_eq!(parsed.rating, 6);
        assert_eq!(parsed.feedback, "- missing article\n  - wrong tense");
    }

    #[test]
    fn feedback_label_is_case_sensitive() {
        let parsed = ResponseParser::parse("9/10 feedback: lowercase label");
        assert_eq!(parsed.rating, 9);
        assert_eq!(parsed.feedback, FALLBACK_FEEDBACK);
        assert_eq!(
            parsed.status,
            ParseStatus::Fallback(FallbackReason::MissingFeedback)
        );
    }

    #[test]
    fn tiers_follow_thresholds() {
        assert_eq!(RatingTier::from_rating(10), RatingTier::Excellent);
        assert_eq!(RatingTier::from_rating(7), RatingTier::Excellent);
        assert_eq!(RatingTier::from_rating(6), RatingTier::Good);
        assert_eq!(RatingTier::from_rating(5), RatingTier::Good);
        assert_eq!(RatingTier::from_rating(4), RatingTier::Bad);
        assert_eq!(RatingTier::from_rating(1), RatingTier::Bad);
        assert_eq!(RatingTier::Good.to_string(), "GOOD");
    }

    #[test]
    fn status_serializes_tagged() {
        let json = serde_json::to_value(ParseStatus::Fallback(FallbackReason::MissingRating)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"kind": "fallback", "reason": "missing_rating"})
        );
    }
}
