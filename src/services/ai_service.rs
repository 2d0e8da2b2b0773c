//! Prompt assembly and answer generation.
//!
//! The "knowledge" step is deliberately simple: the content of every active
//! source is concatenated into the system instruction, and the model is told
//! to ground its answers there. No retrieval or ranking happens locally.

use crate::error::Result;
use crate::models::{KnowledgeSource, Message, Role};
use crate::services::llm_client::{Answer, Content, GeminiClient};

// ============================================================================
// SYSTEM PROMPT
// ============================================================================

const INSURANCE_SYSTEM_PROMPT: &str = r#"You are an expert insurance analyst assistant. You help users answer questions about insurance policies, coverage terms, and claims by consulting the knowledge sources provided below.

## Guidelines
1. Ground every answer in the knowledge sources. Quote or paraphrase the relevant clause and name the source it came from.
2. If the sources do not cover the question, say so plainly instead of guessing.
3. Answer in the same language as the question.
4. Be precise with policy terms: distinguish the insurer, the policyholder, and the beneficiary.
5. Keep answers focused; prefer short structured explanations over long prose.
6. NEVER use emojis."#;

/// Build the system instruction: the fixed persona plus the concatenated
/// content of every active knowledge source.
pub fn build_system_instruction(sources: &[KnowledgeSource]) -> String {
    let active: Vec<&KnowledgeSource> = sources.iter().filter(|s| s.is_active).collect();

    if active.is_empty() {
        return INSURANCE_SYSTEM_PROMPT.to_string();
    }

    let mut instruction = String::from(INSURANCE_SYSTEM_PROMPT);
    instruction.push_str("\n\n## Knowledge Sources\n");
    for source in active {
        instruction.push_str(&format!("\n### {}\n{}\n", source.title, source.content));
    }

    instruction
}

/// Build the conversation turns: prior non-error history followed by the new
/// question.
pub fn build_contents(history: &[Message], question: &str) -> Vec<Content> {
    let mut contents: Vec<Content> = history
        .iter()
        .filter(|m| !m.is_error)
        .map(|m| match m.role {
            Role::User => GeminiClient::user_content(&m.text),
            Role::Model => GeminiClient::model_content(&m.text),
        })
        .collect();

    contents.push(GeminiClient::user_content(question));
    contents
}

/// Generate an answer to `question` grounded in the active `sources`, with
/// `history` as conversational context.
pub async fn generate_answer(
    history: &[Message],
    question: &str,
    sources: &[KnowledgeSource],
) -> Result<Answer> {
    let client = GeminiClient::from_config()?;

    let system_instruction = build_system_instruction(sources);
    let contents = build_contents(history, question);

    client.generate(&system_instruction, &contents).await
}
