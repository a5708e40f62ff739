//! Port definitions (interfaces) for the application layer
//!
//! Ports define the boundaries between the application and external systems.
//! Adapters in the infrastructure layer implement these ports.

pub mod conversation_logger;
pub mod generation_client;
pub mod llm_gateway;
pub mod notifier;
pub mod session_event;
pub mod session_store;
pub mod turn_progress;
