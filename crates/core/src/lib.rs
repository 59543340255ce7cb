pub mod completion;
pub mod error;
pub mod models;
pub mod prompt;

pub use completion::{
    CompletionProvider, CompletionRequest, CompletionResult, DEFAULT_MAX_OUTPUT_TOKENS,
    DEFAULT_TEMPERATURE,
};
pub use error::{FieldViolation, ItineraryError};
pub use models::{normalize_text, ItineraryRequest, ItineraryResponse, ValidatedItinerary};
pub use prompt::render_prompt;
