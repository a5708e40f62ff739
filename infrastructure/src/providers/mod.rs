//! Generation provider adapters
//!
//! Implementations of the [`LlmGateway`](agora_application::LlmGateway) port.

mod openai;

pub use openai::OpenAiCompatibleGateway;
