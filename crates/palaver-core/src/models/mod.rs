pub mod chat;
pub mod identity;
pub mod message;

pub use chat::ChatSummary;
pub use identity::UserIdentity;
pub use message::{Message, SenderKind};
