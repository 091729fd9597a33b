mod summarization;

pub use summarization::{draft_prompt, keyword_prompt, refine_prompt};
