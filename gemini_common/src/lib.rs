//! Gemini vision client and the chai rater built on it.

pub mod client;
pub mod prompt;
pub mod rater;

pub use client::{GeminiClient, GeminiConfig};
pub use rater::{Rater, RatingError, VisionModel};
