//! Application-level configuration.
//!
//! This module provides configuration types that control how use cases behave:
//!
//! - [`OrchestratorParams`]: turn loop pacing, guardrails and retry policy
//! - [`GenerationParams`]: history windows and sampling for generation calls

pub mod generation_params;
pub mod orchestrator_params;

pub use generation_params::GenerationParams;
pub use orchestrator_params::OrchestratorParams;
