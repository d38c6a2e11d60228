use bookrag_core::types::RetrievalResult;

/// Separator placed between retrieved chunks in the prompt context.
pub const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

pub const PROMPT_TEMPLATE: &str = "
Answer the question based only on the following context:

{context}

---

Answer the question based on the above context: {question}
";

/// Join the retrieved chunk texts in rank order.
pub fn build_context(hits: &[RetrievalResult]) -> String {
    hits.iter()
        .map(|h| h.chunk.content.as_str())
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR)
}

/// Fill [`PROMPT_TEMPLATE`]. Placeholders are substituted in a single pass,
/// so a `{question}` inside the context is left as literal text.
pub fn build_prompt(context: &str, question: &str) -> String {
    let mut out = String::with_capacity(PROMPT_TEMPLATE.len() + context.len() + question.len());
    let mut rest = PROMPT_TEMPLATE;
    while let Some(pos) = rest.find('{') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        if let Some(after) = tail.strip_prefix("{context}") {
            out.push_str(context);
            rest = after;
        } else if let Some(after) = tail.strip_prefix("{question}") {
            out.push_str(question);
            rest = after;
        } else {
            out.push('{');
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
    out
}
