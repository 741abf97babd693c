use anyhow::Context;
use salotto_client::{HttpMessageLog, LocalRoom, SyncConfig, Synchronizer};
use salotto_core::{bubble_for, Alignment, IdentityModel};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

/* Shell dimostrativa da terminale: entra in una LocalRoom (al posto dell'SDK
   di chiamata), monta un Synchronizer verso SERVER_URL e ristampa la
   conversazione a ogni cambiamento della vista canonica; ogni riga da stdin
   diventa un invio locale. */
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let server_url =
        std::env::var("SERVER_URL").unwrap_or_else(|_| "http://127.0.0.1:3000".to_string());
    let poll_secs: u64 = std::env::var("POLL_INTERVAL_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(2);

    let log = Arc::new(HttpMessageLog::new(&server_url).context("build log client")?);

    let room = LocalRoom::new();
    let peer_id = format!("peer-{}", std::process::id());
    let me = Arc::new(room.join(peer_id.clone(), "me"));

    let identity = IdentityModel::PeerId { local: peer_id };
    let mut config = SyncConfig::new(identity.clone());
    config.poll_interval = Duration::from_secs(poll_secs);

    let sync = Synchronizer::spawn(log, me, config);

    // task di rendering: ristampa la conversazione a ogni cambio di vista
    let mut view = sync.view();
    tokio::spawn(async move {
        while view.changed().await.is_ok() {
            let messages = view.borrow_and_update().clone();
            println!("--- {} messaggi ---", messages.len());
            for m in &messages {
                let b = bubble_for(m, &identity);
                match b.alignment {
                    Alignment::Mine => {
                        println!("{:>72}", format!("{}  [{}]", b.text, b.time_label));
                    }
                    Alignment::Theirs => {
                        let author = b.author.unwrap_or_default();
                        println!("{}: {}  [{}]", author, b.text, b.time_label);
                    }
                }
            }
        }
    });

    // stdin -> invii locali; EOF smonta il Synchronizer
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        sync.send(line);
    }
    sync.shutdown();

    Ok(())
}
