//! Parsers for the free-text replies of the vision model.
//!
//! The model is asked for a fixed grammar but nothing guarantees it answers
//! that way. Every parser here has a fallback that keeps the raw reply, so
//! there is always something to show the user.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MAX_RATING: u8 = 5;

static RATING_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)Rating:\s*([0-9]+)\s*\|\s*Comment:\s*(.*)").expect("rating pattern is valid")
});

static DETECTION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)Detection:\s*(Not Chai|Chai)\s*\|\s*Comment:\s*(.*)")
        .expect("detection pattern is valid")
});

/// A rating in `[0, 5]` with the model's comment. 0 means "that's not chai".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingResult {
    rating: u8,
    comment: String,
}

impl RatingResult {
    /// Ratings above [`MAX_RATING`] are clamped.
    pub fn new(rating: u8, comment: impl Into<String>) -> Self {
        Self {
            rating: rating.min(MAX_RATING),
            comment: comment.into(),
        }
    }

    /// Rating 0 carrying an explanation in place of a comment.
    pub fn degraded(message: impl Into<String>) -> Self {
        Self::new(0, message)
    }

    pub fn rating(&self) -> u8 {
        self.rating
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn is_chai(&self) -> bool {
        self.rating > 0
    }
}

/// The reply did not follow the requested grammar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("model reply did not match the expected format")]
pub struct MalformedReply {
    raw: String,
}

impl MalformedReply {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Rating 0 with the raw reply embedded verbatim.
    pub fn into_rating(self) -> RatingResult {
        RatingResult::degraded(format!("Could not read a rating. Raw reply: {}", self.raw))
    }
}

/// Parses `Rating: <int> | Comment: <text>`. The comment may span lines and
/// is trimmed.
pub fn parse_rating(reply: &str) -> Result<RatingResult, MalformedReply> {
    let caps = RATING_PATTERN
        .captures(reply)
        .ok_or_else(|| MalformedReply::new(reply))?;

    // ASCII digits only, so a failed parse can only mean overflow.
    let rating = caps[1]
        .parse::<u64>()
        .map_or(MAX_RATING, |r| r.min(MAX_RATING as u64) as u8);
    Ok(RatingResult::new(rating, caps[2].trim()))
}

/// [`parse_rating`], degrading malformed replies instead of failing.
pub fn rating_from_reply(reply: &str) -> RatingResult {
    parse_rating(reply).unwrap_or_else(MalformedReply::into_rating)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Chai,
    NotChai,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub verdict: Verdict,
    pub comment: String,
}

/// Parses `Detection: <Chai|Not Chai> | Comment: <text>`.
pub fn parse_detection(reply: &str) -> Result<DetectionResult, MalformedReply> {
    let caps = DETECTION_PATTERN
        .captures(reply)
        .ok_or_else(|| MalformedReply::new(reply))?;

    let verdict = if &caps[1] == "Chai" {
        Verdict::Chai
    } else {
        Verdict::NotChai
    };
    Ok(DetectionResult {
        verdict,
        comment: caps[2].trim().to_string(),
    })
}

/// Comment half of a detection reply, or the whole raw reply when it does
/// not parse.
pub fn detection_comment(reply: &str) -> String {
    match parse_detection(reply) {
        Ok(detection) => detection.comment,
        Err(malformed) => malformed.raw().trim().to_string(),
    }
}

/// Open-ended image description requested as a JSON object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Description {
    pub classification: String,
    pub comment: String,
}

const MISSING_FIELD: &str = "N/A";

/// Extracts the JSON object between the first `{` and the last `}` and reads
/// its `classification` and `comment` keys. Missing keys become `"N/A"`.
pub fn parse_description(reply: &str) -> Result<Description, MalformedReply> {
    let (Some(start), Some(end)) = (reply.find('{'), reply.rfind('}')) else {
        return Err(MalformedReply::new(reply));
    };
    if end <= start {
        return Err(MalformedReply::new(reply));
    }

    let value: serde_json::Value =
        serde_json::from_str(&reply[start..=end]).map_err(|_| MalformedReply::new(reply))?;
    let field = |key: &str| match value.get(key) {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => MISSING_FIELD.to_string(),
    };

    Ok(Description {
        classification: field("classification"),
        comment: field("comment"),
    })
}

/// [`parse_description`], degrading to an `"Error"` classification.
pub fn description_from_reply(reply: &str) -> Description {
    parse_description(reply).unwrap_or_else(|malformed| Description {
        classification: "Error".to_string(),
        comment: format!("Failed to parse JSON from response: {}", malformed.raw()),
    })
}
