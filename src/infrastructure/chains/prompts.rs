//! Prompt templates for the language-model collaborators
//!
//! Placeholders use the `${name}` syntax and are filled with [`render`].

/// JSON reply contract shared by every grader
pub const GRADE_FORMAT_INSTRUCTIONS: &str = r#"Respond with a JSON object and nothing else, using exactly this shape:
{"binary_score": "yes"} or {"binary_score": "no"}
The value must be the lowercase string "yes" or "no"."#;

pub const ANSWER_PROMPT: &str = "You are an assistant for question-answering tasks.
Answer the question using only the retrieved context below.
If the context does not contain the answer, say that you don't know.

Question: ${question}

Context:
${context}

Answer:";

pub const RELEVANCE_SYSTEM_PROMPT: &str = "You grade whether a retrieved passage is relevant to a user question.
This is a coarse filter meant to discard erroneous retrievals, not a stringent test.
Grade the passage relevant if it shares keywords or meaning with the question.

${format_instructions}";

pub const RELEVANCE_HUMAN_PROMPT: &str = "Retrieved passage:

${document}

User question: ${question}";

pub const GROUNDEDNESS_SYSTEM_PROMPT: &str = "You grade whether an answer is grounded in, and supported by, a set of retrieved facts.
Answer \"yes\" only if every claim in the answer is supported by the facts.

${format_instructions}";

pub const GROUNDEDNESS_HUMAN_PROMPT: &str = "Set of facts:

${documents}

Answer: ${generation}";

pub const ADEQUACY_SYSTEM_PROMPT: &str = "You grade whether an answer addresses and resolves a question.
Answer \"yes\" if the answer resolves the question.

${format_instructions}";

pub const ADEQUACY_HUMAN_PROMPT: &str = "User question: ${question}

Answer: ${generation}";

pub const REWRITE_SYSTEM_PROMPT: &str = "You rewrite questions into a form better suited to document retrieval.
Consider the intent behind the input question and phrase it so that the passages answering it are easy to find.
Reply with the rewritten question only, without any explanation.";

pub const REWRITE_HUMAN_PROMPT: &str = "Initial question:

${question}

Write an improved question.";

/// Substitute `${name}` placeholders in one pass over the template
///
/// Inserted values are never scanned again, so a value containing `${...}`
/// is copied verbatim. Unknown placeholders are left in place.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut rendered = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("${") {
        rendered.push_str(&rest[..start]);
        let after = &rest[start + 2..];

        let Some(end) = after.find('}') else {
            rendered.push_str(&rest[start..]);
            return rendered;
        };

        let name = &after[..end];
        match vars.iter().find(|(var, _)| *var == name) {
            Some((_, value)) => rendered.push_str(value),
            None => rendered.push_str(&rest[start..start + 2 + end + 1]),
        }
        rest = &after[end + 1..];
    }

    rendered.push_str(rest);
    rendered
}
