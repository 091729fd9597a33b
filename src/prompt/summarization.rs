/// Asks for the five most important keywords, comma separated.
pub fn keyword_prompt(article_text: &str) -> String {
    format!(
        r#"You are an expert analyst who extracts only the 5 most important keywords from articles.

Extract only the 5 most important keywords from the article below and return them separated by commas.
Focus on keywords that capture the main claims, facts, or concepts.

=== Article ===
{article}
=== End ===

Return only the keywords, separated by commas."#,
        article = article_text
    )
}

/// Five-sentence plain-language draft that works every keyword in.
pub fn draft_prompt(keywords: &[String], article_text: &str) -> String {
    format!(
        r#"You are a skilled journalist who writes clear, engaging summaries for general audiences.

Write a 5-sentence draft summary of the article below.
- Use all of the provided keywords naturally in the text
- Write in simple, easy-to-understand language
- Avoid technical jargon
- Target readers with no deep expertise in the subject

Keywords: {keywords}

Article:
{article}

Write a coherent 5-sentence summary."#,
        keywords = keywords.join(", "),
        article = article_text
    )
}

/// Compresses the draft to three sentences with a trailing tone marker.
///
/// The summary specification document is inserted verbatim; an empty one just
/// leaves that section blank.
pub fn refine_prompt(spec: &str, draft: &str) -> String {
    format!(
        r#"You are an editorial desk that strictly follows the summary specification.

Summary Specification:
{spec}

Compress the draft summary below into exactly 3 sentences in 1 continuous paragraph.
Requirements:
- Keep every keyword from the draft
- Write as one paragraph with no line breaks
- Use easy-to-understand language for general audiences
- End with the article's overall tone in exactly this form: (Tone: Positive), (Tone: Neutral), or (Tone: Negative)

Draft Summary:
{draft}

Return only the refined 3-sentence summary followed by the tone marker."#,
        spec = spec,
        draft = draft
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompts_embed_their_inputs() {
        assert!(keyword_prompt("Body text").contains("=== Article ===\nBody text\n=== End ==="));

        let keywords = vec!["sleep".to_string(), "memory".to_string()];
        assert!(draft_prompt(&keywords, "Body").contains("Keywords: sleep, memory"));

        let refine = refine_prompt("  Three sentences.  ", "The draft.");
        assert!(refine.contains("Summary Specification:\n  Three sentences.  \n"));
        assert!(refine.contains("Draft Summary:\nThe draft."));
        assert!(refine.contains("(Tone: Neutral)"));
    }
}
