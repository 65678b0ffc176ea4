//! Retrieval-augmented answering.
//!
//! Ties retrieval to an [`AnswerGenerator`](crate::generator::AnswerGenerator)
//! and degrades to returning the retrieved chunks when generation fails.

pub mod ask;
pub mod types;

pub use ask::{answer_question, build_context, AnswerOptions};
pub use types::{
    AnswerOutcome, AnswerResponse, CONFIDENCE_THRESHOLD, NO_RELEVANT_DATA_ANSWER,
};
