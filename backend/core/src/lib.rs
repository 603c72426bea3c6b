pub mod error;
pub mod session;
pub mod traits;
pub mod types;

pub use error::CodedocError;
pub use session::ChatSession;
pub use traits::{LlmProvider, LlmRequest, LlmResponse, TextStream};
pub use types::{ChatMessage, ChatRole, ChatTurn, SourceFile};
