pub mod broadcast;
pub mod http;

// Re-export comodi
pub use broadcast::{BroadcastEvent, DataMessage, CHAT_LABEL, EVERYONE};
pub use http::AppendMessageRequest;
