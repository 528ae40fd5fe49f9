pub mod handler;
pub mod types;

pub use handler::MessageManager;
pub use types::{Message, MessageHandler, NodeConfig, PollOutcome};
