//! Image-recognition collaborator for image-mode search.
//!
//! Turns a product photo into candidate search keywords via a vision-capable
//! chat model. OpenRouter is preferred, direct OpenAI is the fallback, and
//! with neither configured a canned simulated result keeps the feature
//! demonstrable offline. Only `keywords[0]` is consumed by the search core;
//! the rest of the result is surfaced to the caller for display.

pub mod error;
pub mod recognizer;
pub mod types;

pub use error::VisionError;
pub use recognizer::{ImageRecognizer, VisionConfig};
pub use types::RecognitionResult;
