//! Adapter di presentazione: mappa (Message, identità locale) nella bolla
//! pronta per il rendering. Funzione pura, deterministica e idempotente:
//! stessa coppia in ingresso, stessa bolla in uscita, nessun side effect.

use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use crate::models::Message;

/// Modello d'identità del mittente, scelto in configurazione una volta per
/// tutte: o gli identificatori peer stabili assegnati dalla stanza, o le due
/// etichette di ruolo fisse per le chiamate a due partecipanti.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityModel {
    PeerId { local: String },
    RoleLabels { local: String, remote: String },
}

impl IdentityModel {
    /// Identità con cui firmare gli append locali.
    pub fn local_sender(&self) -> &str {
        match self {
            Self::PeerId { local } | Self::RoleLabels { local, .. } => local,
        }
    }

    /// Identità da attribuire a un broadcast arrivato dal peer `from_peer`.
    pub fn remote_sender(&self, from_peer: &str) -> String {
        match self {
            Self::PeerId { .. } => from_peer.to_string(),
            Self::RoleLabels { remote, .. } => remote.clone(),
        }
    }

    fn is_local(&self, sender: &str) -> bool {
        sender == self.local_sender()
    }
}

/// Allineamento della bolla: a destra le proprie, a sinistra le altrui.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Mine,
    Theirs,
}

/// Bolla pronta per il rendering. `author` c'è solo per le bolle altrui;
/// la risoluzione in display name passa dalla membership della stanza,
/// che è un lookup esterno a questo crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bubble {
    pub alignment: Alignment,
    pub author: Option<String>,
    pub text: String,
    pub time_label: String,
}

/// Mappa messaggio più identità locale nella bolla corrispondente.
pub fn bubble_for(message: &Message, identity: &IdentityModel) -> Bubble {
    let mine = identity.is_local(&message.sender);
    Bubble {
        alignment: if mine { Alignment::Mine } else { Alignment::Theirs },
        author: if mine {
            None
        } else {
            Some(message.sender.clone())
        },
        text: message.text.clone(),
        time_label: time_label(&message.timestamp),
    }
}

/// Etichetta oraria HH:MM:SS del timestamp. Se il parse fallisce mostra la
/// stringa grezza: il messaggio resta comunque leggibile.
pub fn time_label(timestamp: &str) -> String {
    match OffsetDateTime::parse(timestamp, &Rfc3339) {
        Ok(t) => format!("{:02}:{:02}:{:02}", t.hour(), t.minute(), t.second()),
        Err(_) => timestamp.to_string(),
    }
}
