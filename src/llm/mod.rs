// LLM adapter seam and the Azure OpenAI implementation

pub mod azure;
pub mod provider;

pub use azure::AzureOpenAiAdapter;
pub use provider::{ChatMessage, CompletionRequest, CompletionResponse, LlmAdapter, TokenUsage};
