//! Model gateway for the Cafetal assistant.
//!
//! Wraps a text-generation provider with the four assistant use cases, fixed
//! sampling temperatures, and tolerant JSON extraction from model output.

pub mod extract;
pub mod gateway;
pub mod prompts;
pub mod providers;

pub use extract::extract_json;
pub use gateway::{ModelGateway, DEFAULT_MAX_TOKENS, DEFAULT_MODEL};
pub use prompts::UseCase;
