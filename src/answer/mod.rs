//! Grounded question answering over retrieved report excerpts.
//!
//! The answerer renders the answer prompt (policy, created time, context and
//! question), drives a [`Generator`] and hands back the concatenated output.

pub mod context;
mod generator;

pub use context::{format_context_for_prompt, format_hits_for_display};
pub use generator::{Generator, OpenAIGenerator, TextStream};

use crate::chunking::Chunk;
use crate::config::{Prompts, NOT_AVAILABLE};
use crate::error::Result;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// A generated answer with the excerpts it was grounded on.
#[derive(Debug, Clone)]
pub struct Answer {
    /// The question asked.
    pub question: String,
    /// Generated text, exactly as produced.
    pub text: String,
    /// Excerpts supplied as context.
    pub sources: Vec<Chunk>,
    /// Created time supplied to the prompt.
    pub created_time: String,
}

impl Answer {
    /// Whether the model reported that the context does not hold the answer.
    pub fn is_not_available(&self) -> bool {
        self.text.trim() == NOT_AVAILABLE
    }

    /// Format the answer for display.
    pub fn format_for_display(&self) -> String {
        let mut output = self.text.trim().to_string();

        if !self.sources.is_empty() && !self.is_not_available() {
            output.push_str("\n\n--- Sources ---\n");
            for source in &self.sources {
                output.push_str(&format!(
                    "\nReport excerpt #{} (chars {}-{})",
                    source.ordinal + 1,
                    source.start,
                    source.end()
                ));
            }
        }

        output
    }
}

/// Produces answers grounded in retrieved excerpts.
pub struct GroundedAnswerer {
    generator: Arc<dyn Generator>,
    prompts: Prompts,
}

impl GroundedAnswerer {
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self {
            generator,
            prompts: Prompts::default(),
        }
    }

    /// Set custom prompts (with user-defined variables).
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    /// Render the full answer prompt.
    pub fn build_prompt(&self, question: &str, chunks: &[Chunk], created_time: &str) -> String {
        // The policy may itself reference custom variables, so render it first.
        let policy = self
            .prompts
            .render_with_custom(&self.prompts.answer.policy, &HashMap::new());

        let mut vars = HashMap::new();
        vars.insert("policy".to_string(), policy);
        vars.insert("question".to_string(), question.to_string());
        vars.insert("context".to_string(), format_context_for_prompt(chunks));
        vars.insert("created_time".to_string(), created_time.to_string());

        self.prompts.render_with_custom(&self.prompts.answer.template, &vars)
    }

    /// Answer `question` using only `chunks` as context.
    #[instrument(skip(self, chunks), fields(question = %question, chunks = chunks.len()))]
    pub async fn answer(&self, question: &str, chunks: &[Chunk], created_time: &str) -> Result<Answer> {
        info!("Answering question");

        let prompt = self.build_prompt(question, chunks, created_time);
        let text = self.generator.generate(&prompt).await?;

        debug!("Generated {} chars from {} excerpts", text.len(), chunks.len());

        Ok(Answer {
            question: question.to_string(),
            text,
            sources: chunks.to_vec(),
            created_time: created_time.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WatchpostError;
    use async_trait::async_trait;
    use futures::stream::{self, StreamExt};
    use std::sync::Mutex;

    /// Answers from the context when a keyword is present, otherwise falls back.
    /// Output is split into small fragments to exercise concatenation.
    struct KeywordGenerator {
        keyword: &'static str,
        reply: &'static str,
        last_prompt: Mutex<Option<String>>,
    }

    impl KeywordGenerator {
        fn new(keyword: &'static str, reply: &'static str) -> Self {
            Self {
                keyword,
                reply,
                last_prompt: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl Generator for KeywordGenerator {
        async fn stream(&self, prompt: &str) -> Result<TextStream> {
            *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
            let context = prompt
                .split("Context:")
                .nth(1)
                .and_then(|rest| rest.split("Question:").next())
                .unwrap_or_default();
            let text = if context.contains(self.keyword) {
                self.reply
            } else {
                NOT_AVAILABLE
            };
            let fragments: Vec<Result<String>> = text
                .chars()
                .collect::<Vec<_>>()
                .chunks(7)
                .map(|c| Ok(c.iter().collect()))
                .collect();
            Ok(stream::iter(fragments).boxed())
        }
    }

    struct BrokenGenerator;

    #[async_trait]
    impl Generator for BrokenGenerator {
        async fn stream(&self, _prompt: &str) -> Result<TextStream> {
            Err(WatchpostError::Generation("service unavailable".to_string()))
        }
    }

    fn chunks(texts: &[&str]) -> Vec<Chunk> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| Chunk::new(i, t.to_string(), i * 100, 0))
            .collect()
    }

    #[tokio::test]
    async fn test_absent_answer_returns_fallback() {
        let answerer =
            GroundedAnswerer::new(Arc::new(KeywordGenerator::new("extinguisher", "Yes.")));
        let answer = answerer
            .answer(
                "Did anyone touch the fire extinguisher?",
                &chunks(&["A forklift passes by.", "The lights flicker at dusk."]),
                "2024-05-01T10:00:00Z",
            )
            .await
            .unwrap();

        assert_eq!(answer.text, NOT_AVAILABLE);
        assert!(answer.is_not_available());
        assert_eq!(answer.format_for_display(), NOT_AVAILABLE);
    }

    #[tokio::test]
    async fn test_answer_is_returned_verbatim() {
        let reply = "  A person lifted the fire extinguisher at 10:02, which is suspicious.\n";
        let answerer = GroundedAnswerer::new(Arc::new(KeywordGenerator::new("extinguisher", reply)));
        let answer = answerer
            .answer(
                "What happened?",
                &chunks(&["At 10:02 someone lifts the extinguisher."]),
                "No created time found.",
            )
            .await
            .unwrap();

        assert_eq!(answer.text, reply);
        assert!(!answer.is_not_available());
        assert_eq!(answer.sources.len(), 1);
        assert!(answer.format_for_display().contains("Report excerpt #1"));
    }

    #[tokio::test]
    async fn test_prompt_carries_policy_time_context_and_question() {
        let generator = Arc::new(KeywordGenerator::new("cage", "ok"));
        let answerer = GroundedAnswerer::new(generator.clone());
        answerer
            .answer(
                "When was this recorded?",
                &chunks(&["Someone opens the cage."]),
                "2024-05-01 09:30",
            )
            .await
            .unwrap();

        let prompt = generator.last_prompt.lock().unwrap().clone().unwrap();
        assert!(prompt.contains("fire extinguisher"));
        assert!(prompt.contains("provide the created time: 2024-05-01 09:30"));
        assert!(prompt.contains("Someone opens the cage."));
        assert!(prompt.contains("When was this recorded?"));
        assert!(prompt.contains(NOT_AVAILABLE));
        assert!(!prompt.contains("{{"));
    }

    #[tokio::test]
    async fn test_generation_error_propagates() {
        let answerer = GroundedAnswerer::new(Arc::new(BrokenGenerator));
        let result = answerer.answer("Anything?", &chunks(&["text"]), "").await;
        assert!(matches!(result, Err(WatchpostError::Generation(_))));
    }

    #[test]
    fn test_question_and_excerpts_are_inserted_verbatim() {
        let answerer = GroundedAnswerer::new(Arc::new(BrokenGenerator));
        let question = "What is {{created_time}}?";
        let excerpt = chunks(&["Report mentions {{question}} here"]);

        let first = answerer.build_prompt(question, &excerpt, "T0");
        for _ in 0..16 {
            let again = GroundedAnswerer::new(Arc::new(BrokenGenerator))
                .build_prompt(question, &excerpt, "T0");
            assert_eq!(again, first);
        }

        assert!(first.contains("Question:\nWhat is {{created_time}}?\n"));
        assert!(first.contains("Report mentions {{question}} here"));
        assert!(first.contains("provide the created time: T0."));
        assert!(!first.contains("What is T0?"));
    }

    #[test]
    fn test_custom_variables_reach_policy() {
        let mut prompts = Prompts::default();
        prompts.answer.policy = "Site: {{site}}".to_string();
        prompts
            .variables
            .insert("site".to_string(), "Depot 9".to_string());

        let answerer =
            GroundedAnswerer::new(Arc::new(BrokenGenerator)).with_prompts(prompts);
        let prompt = answerer.build_prompt("q", &[], "t");
        assert!(prompt.starts_with("Site: Depot 9"));
    }
}
