//! Il Synchronizer: fonde il canale broadcast a bassa latenza e il log
//! server-side letto in polling in un'unica sequenza canonica, deduplicata e
//! ordinata per timestamp. Ridisegnato a coda a scrittore unico: un solo task
//! possiede la vista e ogni mutazione (sostituzione da poll, inserimento da
//! invio locale o da broadcast) passa dal suo loop, quindi due percorsi non
//! possono mai accavallarsi.

use salotto_core::{
    now_timestamp, view, BroadcastEvent, IdentityModel, LogError, Message, MessageLog, CHAT_LABEL,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::transport::BroadcastTransport;

/// Configurazione del Synchronizer.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Intervallo del polling di riconciliazione (2s nel comportamento di
    /// riferimento). Il polling è anche il meccanismo di retry: nessun backoff.
    pub poll_interval: Duration,
    /// Modello d'identità del mittente, scelto una volta in configurazione.
    pub identity: IdentityModel,
}

impl SyncConfig {
    pub fn new(identity: IdentityModel) -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            identity,
        }
    }
}

enum Command {
    Send(String),
}

/// Handle del Synchronizer montato. I comandi entrano da una coda, la vista
/// canonica esce da un canale watch (notifica solo su cambiamento
/// strutturale). Allo smontaggio il task viene fermato e ogni risultato di
/// rete ancora in volo viene scartato con lui.
pub struct Synchronizer {
    commands: mpsc::UnboundedSender<Command>,
    view: watch::Receiver<Vec<Message>>,
    task: JoinHandle<()>,
}

impl Synchronizer {
    /// Monta il Synchronizer: `list()` immediato, poi polling a intervallo
    /// fisso; broadcast ricevuti e invii locali confluiscono nello stesso loop.
    pub fn spawn(
        log: Arc<dyn MessageLog>,
        transport: Arc<dyn BroadcastTransport>,
        config: SyncConfig,
    ) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (view_tx, view_rx) = watch::channel(Vec::new());
        let task = tokio::spawn(run(log, transport, config, cmd_rx, view_tx));
        Self {
            commands: cmd_tx,
            view: view_rx,
            task,
        }
    }

    /// Vista canonica corrente (deduplicata, ordinata per timestamp).
    pub fn view(&self) -> watch::Receiver<Vec<Message>> {
        self.view.clone()
    }

    /// Invio locale. Gli invii di solo whitespace vengono scartati qui,
    /// prima di toccare log o transport.
    pub fn send(&self, text: impl Into<String>) {
        let text = text.into();
        if text.trim().is_empty() {
            return;
        }
        let _ = self.commands.send(Command::Send(text));
    }

    /// Smonta il Synchronizer: ferma il polling e scarta i risultati in volo.
    pub fn shutdown(&self) {
        self.task.abort();
    }
}

impl Drop for Synchronizer {
    // lo smontaggio vale su ogni percorso d'uscita, anche quelli d'errore
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run(
    log: Arc<dyn MessageLog>,
    transport: Arc<dyn BroadcastTransport>,
    config: SyncConfig,
    mut commands: mpsc::UnboundedReceiver<Command>,
    view_tx: watch::Sender<Vec<Message>>,
) {
    let mut view: Vec<Message> = Vec::new();
    let mut broadcasts = transport.subscribe();

    // list() immediato al mount; un fallimento qui non è fatale, il prossimo
    // tick riprova
    poll_once(log.as_ref(), &mut view, &view_tx).await;

    let mut ticker = tokio::time::interval(config.poll_interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // il primo tick di interval() scatta subito: già coperto dal list() sopra
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                /* ogni giro corre fino in fondo (lettura, confronto, eventuale
                   sostituzione) prima che il select riprenda: i poll non si
                   sovrappongono mai */
                poll_once(log.as_ref(), &mut view, &view_tx).await;
            }
            cmd = commands.recv() => match cmd {
                Some(Command::Send(text)) => {
                    local_send(
                        log.as_ref(),
                        transport.as_ref(),
                        &config.identity,
                        text,
                        &mut view,
                        &view_tx,
                    )
                    .await;
                }
                // tutti gli handle sono caduti: smontaggio
                None => break,
            },
            ev = broadcasts.recv() => match ev {
                Some(ev) => {
                    on_broadcast(log.as_ref(), &config.identity, ev, &mut view, &view_tx).await;
                }
                None => {
                    tracing::debug!("broadcast channel closed, stopping synchronizer");
                    break;
                }
            },
        }
    }
}

/// Un giro di polling: rilegge tutto il log e sostituisce la vista solo se la
/// sequenza normalizzata differisce da quella corrente (uguaglianza
/// strutturale: niente ridisegni ridondanti). Gli errori, di rete o di forma,
/// saltano il giro e basta: il tick successivo è il retry.
async fn poll_once(
    log: &dyn MessageLog,
    view: &mut Vec<Message>,
    view_tx: &watch::Sender<Vec<Message>>,
) {
    match log.list().await {
        Ok(polled) => {
            if let Some(next) = view::merge_poll(view, polled) {
                *view = next;
                let _ = view_tx.send(view.clone());
            }
        }
        Err(e) => tracing::warn!("poll skipped: {}", e),
    }
}

/// Invio locale: prima l'append (il log è l'autorità sul timestamp), poi il
/// broadcast. Il broadcast parte anche se l'append fallisce per I/O
/// (comportamento di riferimento: la finestra di incoerenza è accettata e il
/// poll non la richiuderà da solo); in quel caso la vista locale riceve un
/// messaggio sintetizzato col clock locale, così la bolla appare comunque.
/// Un rifiuto di validazione invece è definitivo: niente broadcast, niente bolla.
async fn local_send(
    log: &dyn MessageLog,
    transport: &dyn BroadcastTransport,
    identity: &IdentityModel,
    text: String,
    view: &mut Vec<Message>,
    view_tx: &watch::Sender<Vec<Message>>,
) {
    let sender = identity.local_sender().to_string();
    let message = match log.append(&text, &sender).await {
        Ok(m) => m,
        Err(LogError::Validation(reason)) => {
            tracing::warn!("send rejected: {}", reason);
            return;
        }
        Err(e) => {
            tracing::warn!("append failed, broadcasting anyway: {}", e);
            Message {
                text: text.clone(),
                sender,
                timestamp: now_timestamp(),
            }
        }
    };

    if let Err(e) = transport.send(&text, CHAT_LABEL).await {
        tracing::warn!("broadcast failed: {}", e);
    }

    // la bolla appare subito, senza aspettare il prossimo poll
    if view::insert_unique(view, message) {
        let _ = view_tx.send(view.clone());
    }
}

/// Broadcast ricevuto: contano solo i label "chat", il resto viene loggato e
/// scartato. Si tenta l'append così che il mittente di registro nel log
/// condiviso coincida con chi ha prodotto il contenuto; la bolla appare
/// subito, con il messaggio memorizzato o, se l'append fallisce, con uno
/// sintetizzato col clock locale.
async fn on_broadcast(
    log: &dyn MessageLog,
    identity: &IdentityModel,
    ev: BroadcastEvent,
    view: &mut Vec<Message>,
    view_tx: &watch::Sender<Vec<Message>>,
) {
    if ev.label != CHAT_LABEL {
        tracing::debug!("ignoring broadcast with label {:?}", ev.label);
        return;
    }

    let sender = identity.remote_sender(&ev.from_peer);
    let message = match log.append(&ev.payload, &sender).await {
        Ok(m) => m,
        Err(e) => {
            tracing::warn!("append of received broadcast failed: {}", e);
            Message {
                text: ev.payload,
                sender,
                timestamp: now_timestamp(),
            }
        }
    };

    if view::insert_unique(view, message) {
        let _ = view_tx.send(view.clone());
    }
}
