//! Prompts sent to the summarization API
//!
//! The prompt is deterministic: the same conversation always produces the
//! same request text.

pub mod summary_prompt;

pub use summary_prompt::{
    format_transcript, generate_summary_prompt, CONNECTION_CHECK_MESSAGE, SYSTEM_INSTRUCTION,
};
