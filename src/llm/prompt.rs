use crate::corpus::RetrievedDocument;

/// Join retrieved passages, most relevant first, with single spaces.
pub fn build_context(documents: &[RetrievedDocument]) -> String {
    documents
        .iter()
        .map(|doc| doc.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Question, context and an open answer slot for the generator to fill.
pub fn build_prompt(question: &str, context: &str) -> String {
    format!("Question: {}\nContext: {}\nAnswer:", question, context)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: usize, text: &str) -> RetrievedDocument {
        RetrievedDocument {
            id,
            distance: id as f32,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_context_keeps_rank_order() {
        let docs = vec![doc(4, "Second seed."), doc(1, "First seed.")];
        assert_eq!(build_context(&docs), "Second seed. First seed.");
        assert_eq!(build_context(&[]), "");
    }

    #[test]
    fn test_prompt_layout() {
        let prompt = build_prompt("  Can I work from home? ", "Remote work is allowed.");
        assert_eq!(
            prompt,
            "Question:   Can I work from home? \nContext: Remote work is allowed.\nAnswer:"
        );
    }
}
