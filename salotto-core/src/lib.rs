//! salotto-core: tipi condivisi tra client e server (modello Message, DTO HTTP,
//! envelope broadcast, errori) più la logica pura di vista e presentazione.
//! Niente I/O o dipendenze non compatibili con WASM: tutto ciò che tocca rete
//! o disco vive nei crate server/client.

pub mod error;
pub mod log;
pub mod models;
pub mod presentation;
pub mod protocol;
pub mod utils;
pub mod view;

// Re-export utili per ridurre i percorsi nei crate client/server
pub use error::{Error, LogError};
pub use log::MessageLog;
pub use models::Message;
pub use presentation::{bubble_for, Alignment, Bubble, IdentityModel};
pub use protocol::broadcast::{BroadcastEvent, DataMessage, CHAT_LABEL, EVERYONE};
pub use protocol::http::AppendMessageRequest;
pub use utils::now_timestamp;
