/// External text service: HTTP client and the column advisor built on it.
pub mod advisor;
pub mod anthropic;

pub use advisor::LlmColumnAdvisor;
pub use anthropic::AnthropicClient;
