//! Prompts for answer generation and judging.

/// Collection of prompts used by the pipeline and the judge.
pub struct Prompts;

impl Prompts {
    /// Template for the grounded answer prompt.
    pub fn rag_answer() -> &'static str {
        "Based on the following context, please answer the question.\n\nContext:\n{context}\n\nQuestion:\n{question}\n\nAnswer:"
    }

    /// Fill the answer template. Context and question are inserted verbatim.
    pub fn build_rag_prompt(context: &str, question: &str) -> String {
        Self::fill(
            Self::rag_answer(),
            &[("context", context), ("question", question)],
        )
    }

    /// Substitute `{name}` placeholders in a single pass.
    ///
    /// Inserted values are never rescanned, and braces that do not name a
    /// known placeholder (such as JSON examples) are copied unchanged.
    pub fn fill(template: &str, values: &[(&str, &str)]) -> String {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(start) = rest.find('{') {
            out.push_str(&rest[..start]);
            let after = &rest[start + 1..];

            let replacement = after.find('}').and_then(|end| {
                let key = &after[..end];
                values
                    .iter()
                    .find(|(name, _)| *name == key)
                    .map(|(_, value)| (*value, end))
            });

            match replacement {
                Some((value, end)) => {
                    out.push_str(value);
                    rest = &after[end + 1..];
                }
                None => {
                    out.push('{');
                    rest = after;
                }
            }
        }

        out.push_str(rest);
        out
    }

    /// Rubric the judge applies to every answer.
    pub fn evaluation_criteria() -> &'static str {
        r#"Evaluate the response for:
1. Factual accuracy based on the provided context
2. Completeness of information
3. Relevance to the query
4. Coherence and clarity"#
    }

    /// Judge prompt. Placeholders: `{criteria}`, `{input}`, `{actual_output}`,
    /// `{expected_output}`, `{context}`.
    pub fn judge_answer() -> &'static str {
        r#"You are an expert evaluator judging the answer produced by a question-answering system.

Evaluation Criteria:
{criteria}

Evaluation Steps:
1. Compare the Actual Output with the Expected Output and the Context, checking every factual claim.
2. Check that all key points of the Input are addressed.
3. Penalize content that is irrelevant to the Input or unsupported by the Context.
4. Judge how clearly and coherently the Actual Output is written.

Input:
{input}

Actual Output:
{actual_output}

Expected Output:
{expected_output}

Context:
{context}

Give a score from 0 to 10, where 10 means the Actual Output fully meets the criteria and 0 means it fails them entirely.

Respond in JSON format:
{
    "score": <0-10>,
    "reason": "<concise explanation referring to the criteria>"
}

Respond with only the JSON, no other text."#
    }
}
