pub mod batch;
pub mod config;
pub mod error;
pub mod filter;
pub mod format;
pub mod llm;
pub mod orchestrator;
pub mod retry;

pub use batch::DocumentBatch;
pub use config::{ConcurrencyConfig, FilterFields, RetrievalConfig, RetryConfig, SearchConfig};
pub use error::RetrievalError;
pub use filter::{FilterBuilder, FilterExpression, FilterSet};
pub use format::ResultFormatter;
pub use llm::{AnswerGenerator, QueryLLM};
pub use orchestrator::{Answer, RetrievalOrchestrator};
pub use retry::RetryPolicy;
