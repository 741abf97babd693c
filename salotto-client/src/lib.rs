//! salotto-client: il lato partecipante della chat in chiamata. Contiene il
//! client HTTP del Message Log, la capability di broadcast consumata dal
//! Synchronizer (con una stanza in-process al posto dell'SDK di chiamata) e
//! il Synchronizer stesso, che fonde le due sorgenti nella vista canonica.

pub mod http;
pub mod sync;
pub mod transport;

// Re-export utili per ridurre i percorsi
pub use http::HttpMessageLog;
pub use sync::{SyncConfig, Synchronizer};
pub use transport::{BroadcastTransport, LocalRoom, RoomPeer, TransportError};
