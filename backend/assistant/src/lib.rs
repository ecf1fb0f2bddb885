//! Cafetal AI assistant
//!
//! The `/ia` conversation: menu, mode selection, free-text capture, model
//! call, and reply rendering, with per-chat session state.

pub mod controller;
pub mod menu;
pub mod prices;
pub mod render;
pub mod session_state;

pub use controller::{DialogueController, DialogueEvent};
pub use menu::MenuChoice;
pub use prices::parse_price_block;
pub use session_state::{AssistantMode, DialogueState, Session, SessionStore};
