use chaya_common::reply::{
    description_from_reply, detection_comment, parse_rating, Description, MalformedReply,
};
use chaya_common::{Frame, RatingResult};
use thiserror::Error;

use crate::prompt::{DESCRIBE_PROMPT, DETECTION_PROMPT, RATING_PROMPT};

#[derive(Debug, Error)]
pub enum RatingError {
    #[error("missing API credential: set the {0} environment variable")]
    MissingCredential(String),

    #[error("error during API call: {0}")]
    ServiceFailure(String),

    #[error(transparent)]
    MalformedReply(#[from] MalformedReply),
}

impl RatingError {
    /// The error as a sentence, e.g. `"Error during API call: timed out"`.
    pub fn message(&self) -> String {
        capitalize(&self.to_string())
    }

    /// Rating 0 with a readable explanation, for display in place of a rating.
    pub fn into_rating(self) -> RatingResult {
        match self {
            RatingError::MalformedReply(malformed) => malformed.into_rating(),
            other => RatingResult::degraded(other.message()),
        }
    }
}

fn capitalize(message: &str) -> String {
    let mut chars = message.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// A vision-capable text generator: one blocking request per call.
pub trait VisionModel {
    fn complete(&self, prompt: &str, image: &Frame) -> Result<String, RatingError>;
}

impl<M: VisionModel + ?Sized> VisionModel for &M {
    fn complete(&self, prompt: &str, image: &Frame) -> Result<String, RatingError> {
        (**self).complete(prompt, image)
    }
}

/// Asks a [`VisionModel`] about a frame and parses its reply.
pub struct Rater<M> {
    model: M,
}

impl<M: VisionModel> Rater<M> {
    pub fn new(model: M) -> Self {
        Self { model }
    }

    /// Rates the chai in `frame`. Transport failures, a missing key and
    /// replies that ignore the grammar all come back as errors.
    pub fn rate(&self, frame: &Frame) -> Result<RatingResult, RatingError> {
        let reply = self.model.complete(RATING_PROMPT, frame)?;
        log::debug!("Rating reply: {reply:?}");
        Ok(parse_rating(&reply)?)
    }

    /// [`Rater::rate`], with every failure turned into a displayable rating 0.
    pub fn rate_or_degrade(&self, frame: &Frame) -> RatingResult {
        self.rate(frame).unwrap_or_else(|err| {
            log::warn!("Rating degraded: {err}");
            err.into_rating()
        })
    }

    /// Chai / not-chai check; returns the comment half of the reply, or the
    /// raw reply when it does not follow the grammar.
    pub fn detect(&self, frame: &Frame) -> Result<String, RatingError> {
        let reply = self.model.complete(DETECTION_PROMPT, frame)?;
        log::debug!("Detection reply: {reply:?}");
        Ok(detection_comment(&reply))
    }

    /// Open-ended description as classification + comment.
    pub fn describe(&self, frame: &Frame) -> Result<Description, RatingError> {
        let reply = self.model.complete(DESCRIBE_PROMPT, frame)?;
        log::debug!("Description reply: {reply:?}");
        Ok(description_from_reply(&reply))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degraded_messages_are_readable() {
        let rating = RatingError::MissingCredential("GEMINI_API_KEY".into()).into_rating();
        assert_eq!(rating.rating(), 0);
        assert_eq!(
            rating.comment(),
            "Missing API credential: set the GEMINI_API_KEY environment variable"
        );

        let rating = RatingError::ServiceFailure("connection refused".into()).into_rating();
        assert_eq!(rating.comment(), "Error during API call: connection refused");
    }

    #[test]
    fn malformed_reply_keeps_raw_text() {
        let rating = RatingError::from(MalformedReply::new("meh")).into_rating();
        assert_eq!(rating.rating(), 0);
        assert!(rating.comment().contains("meh"));
    }
}
