use crate::provider::InferenceProvider;
use crate::providers::{AnthropicProvider, GeminiProvider, GroqProvider, OpenAiProvider};

/// Per-provider credentials for the fallback chain. A missing key removes
/// that link from the chain entirely — an unconfigured provider is a normal
/// state, never a failure.
#[derive(Debug, Clone, Default)]
pub struct ExtractorConfig {
    pub groq_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub openai_api_key: Option<String>,
}

impl ExtractorConfig {
    pub fn from_env() -> Self {
        Self {
            groq_api_key: env_key("GROQ_API_KEY"),
            anthropic_api_key: env_key("ANTHROPIC_API_KEY"),
            gemini_api_key: env_key("GEMINI_API_KEY"),
            openai_api_key: env_key("OPENAI_API_KEY"),
        }
    }

    /// Build the chain in its fixed priority order:
    /// Groq → Anthropic → Gemini → OpenAI.
    pub fn build_chain(&self) -> Vec<Box<dyn InferenceProvider>> {
        let mut chain: Vec<Box<dyn InferenceProvider>> = Vec::new();
        if let Some(key) = &self.groq_api_key {
            chain.push(Box::new(GroqProvider::new(key.clone())));
        }
        if let Some(key) = &self.anthropic_api_key {
            chain.push(Box::new(AnthropicProvider::new(key.clone())));
        }
        if let Some(key) = &self.gemini_api_key {
            chain.push(Box::new(GeminiProvider::new(key.clone())));
        }
        if let Some(key) = &self.openai_api_key {
            chain.push(Box::new(OpenAiProvider::new(key.clone())));
        }
        chain
    }
}

fn env_key(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.trim().is_empty())
}
