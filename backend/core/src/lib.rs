pub mod error;
pub mod traits;
pub mod types;

pub use error::AssistantError;
pub use traits::{Button, ChatSurface, LlmProvider, LlmRequest, LlmResponse, RecordStore};
pub use types::{
    Amount, AnalysisPayload, Dataset, PricingProduct, PricingRecommendation, Record,
};
