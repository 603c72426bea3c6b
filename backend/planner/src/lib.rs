pub mod documentation;
pub mod planner;
pub mod prompts;
pub mod providers;

pub use documentation::Documentation;
pub use planner::{GenerationPolicy, LlmPlanner};
pub use providers::ProviderRegistry;
