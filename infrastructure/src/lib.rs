//! Infrastructure layer for agora
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod config;
pub mod logging;
pub mod notifier;
pub mod providers;
pub mod storage;

// Re-export commonly used types
pub use config::{
    ConfigLoader, ConfigValidationError, FileConfig, FileGenerationConfig, FileLoggingConfig,
    FileOrchestratorConfig, FileParticipantConfig, FileReplConfig, FileStorageConfig,
};
pub use logging::JsonlConversationLogger;
pub use notifier::TracingNotifier;
pub use providers::OpenAiCompatibleGateway;
pub use storage::JsonFileSessionStore;
