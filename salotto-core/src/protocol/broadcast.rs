/* This file defines how chat payloads travel on the call platform's data
   channel. DataMessage is the envelope a peer hands to the transport
   ({ to, payload, label }); BroadcastEvent is what the transport delivers on
   the other side, with the sender identity attached by the layer itself. */
use serde::{Deserialize, Serialize};

/// Label dei payload chat sul data channel; il Synchronizer ignora gli altri.
pub const CHAT_LABEL: &str = "chat";

/// Destinatario broadcast "tutti i peer correnti della stanza".
pub const EVERYONE: &str = "*";

/// Envelope consegnato al transport per l'invio best-effort: nessun ack,
/// nessuna garanzia d'ordine rispetto agli invii degli altri peer, nessun retry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataMessage {
    pub to: String,
    pub payload: String,
    pub label: String,
}

impl DataMessage {
    /// Costruisce l'envelope chat verso tutta la stanza.
    pub fn chat(payload: impl Into<String>) -> Self {
        Self {
            to: EVERYONE.to_string(),
            payload: payload.into(),
            label: CHAT_LABEL.to_string(),
        }
    }
}

/// Evento consegnato dal transport, una volta per broadcast ricevuto.
/// `from_peer` è attaccato dal layer di trasporto, non dal payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastEvent {
    pub payload: String,
    pub from_peer: String,
    pub label: String,
}
