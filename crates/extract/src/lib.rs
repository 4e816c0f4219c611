pub mod config;
pub mod prompt;
pub mod provider;
pub mod providers;
pub mod resolver;

pub use config::ExtractorConfig;
pub use provider::{InferenceProvider, MockProvider, ProviderError};
pub use providers::{AnthropicProvider, GeminiProvider, GroqProvider, OpenAiProvider};
pub use resolver::{
    Classification, ExtractionRequest, ExtractionResolver, ExtractionResult, RawExtraction,
};
