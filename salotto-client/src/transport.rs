use async_trait::async_trait;
use dashmap::DashMap;
use salotto_core::{BroadcastEvent, DataMessage, EVERYONE};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("broadcast send failed: {0}")]
    Send(String),
}

/// Capability consumata dal Synchronizer, non implementata da questo core:
/// invio best-effort a tutti i peer correnti della stanza e sottoscrizione
/// agli eventi consegnati. Nessun ack, nessuna garanzia d'ordine rispetto
/// agli invii degli altri peer, nessun retry.
#[async_trait]
pub trait BroadcastTransport: Send + Sync {
    async fn send(&self, payload: &str, label: &str) -> Result<(), TransportError>;

    /// Gli eventi consegnati a QUESTO peer, nell'ordine in cui il transport
    /// li consegna (mai i propri invii).
    fn subscribe(&self) -> mpsc::UnboundedReceiver<BroadcastEvent>;

    /// Identificatore stabile del peer locale assegnato dalla stanza.
    fn peer_id(&self) -> &str;
}

#[derive(Debug, Clone)]
struct RoomEnvelope {
    from_peer: String,
    message: DataMessage,
}

/// Stanza in-process su canale broadcast tokio: l'implementazione usata nei
/// test e nel bin dimostrativo al posto dell'SDK della piattaforma di
/// chiamata. Tiene anche la membership (peer id -> display name), il lookup
/// esterno che l'adapter di presentazione si aspetta dall'ambiente.
pub struct LocalRoom {
    tx: broadcast::Sender<RoomEnvelope>,
    peers: DashMap<String, String>,
}

impl LocalRoom {
    pub fn new() -> Arc<Self> {
        let (tx, _) = broadcast::channel(64);
        Arc::new(Self {
            tx,
            peers: DashMap::new(),
        })
    }

    /// Entra nella stanza col proprio peer id e display name; il handle
    /// ritornato è il transport del singolo partecipante.
    pub fn join(self: &Arc<Self>, peer_id: impl Into<String>, display_name: impl Into<String>) -> RoomPeer {
        let peer_id = peer_id.into();
        self.peers.insert(peer_id.clone(), display_name.into());
        RoomPeer {
            room: Arc::clone(self),
            peer_id,
        }
    }

    /// Lookup di membership: display name di un peer, se ancora in stanza.
    pub fn display_name(&self, peer_id: &str) -> Option<String> {
        self.peers.get(peer_id).map(|e| e.value().clone())
    }

    pub fn leave(&self, peer_id: &str) {
        self.peers.remove(peer_id);
    }
}

/// Handle di un partecipante dentro una LocalRoom.
pub struct RoomPeer {
    room: Arc<LocalRoom>,
    peer_id: String,
}

#[async_trait]
impl BroadcastTransport for RoomPeer {
    async fn send(&self, payload: &str, label: &str) -> Result<(), TransportError> {
        let envelope = RoomEnvelope {
            from_peer: self.peer_id.clone(),
            message: DataMessage {
                to: EVERYONE.to_string(),
                payload: payload.to_string(),
                label: label.to_string(),
            },
        };
        // un send senza riceventi non è un errore: best-effort verso chi c'è
        let _ = self.room.tx.send(envelope);
        Ok(())
    }

    fn subscribe(&self) -> mpsc::UnboundedReceiver<BroadcastEvent> {
        let mut rx = self.room.tx.subscribe();
        let own = self.peer_id.clone();
        let (tx, out) = mpsc::unbounded_channel();
        /* task di inoltro: filtra i propri invii e riconsegna il resto come
           BroadcastEvent, col mittente attaccato dal layer di trasporto */
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(env) => {
                        if env.from_peer == own {
                            continue;
                        }
                        let ev = BroadcastEvent {
                            payload: env.message.payload,
                            from_peer: env.from_peer,
                            label: env.message.label,
                        };
                        if tx.send(ev).is_err() {
                            break; // il sottoscrittore ha smontato
                        }
                    }
                    // il canale è best-effort: se restiamo indietro perdiamo
                    // eventi, il polling riconcilia
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
        out
    }

    fn peer_id(&self) -> &str {
        &self.peer_id
    }
}

impl Drop for RoomPeer {
    fn drop(&mut self) {
        self.room.leave(&self.peer_id);
    }
}
