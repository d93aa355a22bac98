//! Conversation persistence: repository trait, context assembly, and the
//! service orchestrating history retrieval, writes, and retention sweeps.

pub mod context;
pub mod repository;
pub mod service;

pub use context::assemble_context;
pub use repository::ConversationRepository;
pub use service::ConversationService;
