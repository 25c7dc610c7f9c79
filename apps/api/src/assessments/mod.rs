//! Per-job assessments: builder storage and candidate submissions.

pub mod handlers;
pub mod validation;

pub use handlers::AssessmentFilter;
pub use validation::{validate_answers, AnswerError};
