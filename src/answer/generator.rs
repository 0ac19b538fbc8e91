//! Generative capability used to produce grounded answers.

use crate::error::{Result, WatchpostError};
use crate::openai::create_client;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use tracing::{debug, instrument};

/// A stream of generated text fragments.
pub type TextStream = BoxStream<'static, Result<String>>;

/// Trait for text generation backends.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Start generating a completion for `prompt`, yielding text fragments.
    async fn stream(&self, prompt: &str) -> Result<TextStream>;

    /// Generate a completion and concatenate every fragment.
    async fn generate(&self, prompt: &str) -> Result<String> {
        let mut stream = self.stream(prompt).await?;
        let mut text = String::new();
        while let Some(fragment) = stream.next().await {
            text.push_str(&fragment?);
        }
        Ok(text)
    }
}

/// OpenAI chat-completions generator with streaming output.
pub struct OpenAIGenerator {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    temperature: f32,
}

impl OpenAIGenerator {
    pub fn new(model: &str, temperature: f32) -> Result<Self> {
        Ok(Self::with_client(create_client()?, model, temperature))
    }

    /// Create a generator that sends requests through `client`.
    pub fn with_client(
        client: async_openai::Client<async_openai::config::OpenAIConfig>,
        model: &str,
        temperature: f32,
    ) -> Self {
        Self {
            client,
            model: model.to_string(),
            temperature,
        }
    }
}

#[async_trait]
impl Generator for OpenAIGenerator {
    #[instrument(skip(self, prompt), fields(model = %self.model, prompt_len = prompt.len()))]
    async fn stream(&self, prompt: &str) -> Result<TextStream> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()
            .map_err(|e| WatchpostError::Generation(e.to_string()))?
            .into()];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(self.temperature)
            .stream(true)
            .build()
            .map_err(|e| WatchpostError::Generation(e.to_string()))?;

        let stream = self
            .client
            .chat()
            .create_stream(request)
            .await
            .map_err(|e| WatchpostError::Generation(format!("Failed to start generation: {}", e)))?;

        debug!("Streaming completion from {}", self.model);

        Ok(stream
            .map(|response| match response {
                Ok(response) => Ok(response
                    .choices
                    .into_iter()
                    .filter_map(|choice| choice.delta.content)
                    .collect::<String>()),
                Err(e) => Err(WatchpostError::Generation(format!("Generation stream failed: {}", e))),
            })
            .boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_openai::config::OpenAIConfig;
    use futures::stream;

    struct Fragments(Vec<Result<String>>);

    #[async_trait]
    impl Generator for Fragments {
        async fn stream(&self, _prompt: &str) -> Result<TextStream> {
            let items: Vec<Result<String>> = self
                .0
                .iter()
                .map(|r| match r {
                    Ok(s) => Ok(s.clone()),
                    Err(e) => Err(WatchpostError::Generation(e.to_string())),
                })
                .collect();
            Ok(stream::iter(items).boxed())
        }
    }

    #[tokio::test]
    async fn test_generate_concatenates_fragments() {
        let generator = Fragments(vec![
            Ok("The answer is not ".to_string()),
            Ok("available in the ".to_string()),
            Ok("context.".to_string()),
        ]);
        assert_eq!(
            generator.generate("prompt").await.unwrap(),
            "The answer is not available in the context."
        );
    }

    #[tokio::test]
    async fn test_mid_stream_error_fails() {
        let generator = Fragments(vec![
            Ok("partial".to_string()),
            Err(WatchpostError::Generation("connection reset".to_string())),
        ]);
        assert!(matches!(
            generator.generate("prompt").await,
            Err(WatchpostError::Generation(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_generation_error() {
        // Nothing listens on the discard port, so the connection is refused.
        let config = OpenAIConfig::new()
            .with_api_key("test-key")
            .with_api_base("http://127.0.0.1:9/v1");
        let generator =
            OpenAIGenerator::with_client(async_openai::Client::with_config(config), "gpt-4o-mini", 0.3);

        assert!(matches!(
            generator.generate("Did anyone enter the cage?").await,
            Err(WatchpostError::Generation(_))
        ));
    }
}
