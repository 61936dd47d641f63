//! TCP-Listener – Bindet Socket, akzeptiert Verbindungen
//!
//! Der `RelayServer` bindet einen TCP-Socket und startet fuer jede
//! eingehende Verbindung einen eigenen tokio-Task. Der Task fuehrt den
//! Handshake durch, registriert die Session, kuendigt sie allen anderen an
//! und laeuft dann in der Lese-Schleife der Session bis zur Trennung.
//!
//! ## Concurrency-Modell
//! Ein Task pro Verbindung plus der Accept-Task auf dem multi-threaded
//! Runtime. Alle Tasks teilen sich den `RelayState` ueber einen Arc.

use plauder_protocol::{FrameCodec, Nachricht};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio_util::codec::FramedRead;

use crate::error::{RelayError, RelayResult};
use crate::session::{handshake_durchfuehren, ClientSession};
use crate::state::RelayState;

/// Pause nach einem Accept-Fehler
const ACCEPT_BACKOFF: Duration = Duration::from_millis(10);

/// Text der Beitrittsmeldung an alle anderen Sessions
pub fn beitritts_nachricht(name: &str) -> String {
    format!("{name} has joined the chat.")
}

/// TCP-Relay-Server
///
/// Wird mit `binden` erstellt und mit `starten` betrieben. Die lokale
/// Adresse ist nach dem Binden bekannt (Port 0 wird aufgeloest).
pub struct RelayServer {
    state: Arc<RelayState>,
    listener: TcpListener,
    lokale_addr: SocketAddr,
}

impl RelayServer {
    /// Bindet den TCP-Socket
    ///
    /// Ein Bind-Fehler ist fatal und wird als `Verbindung` zurueckgegeben.
    pub async fn binden(state: Arc<RelayState>, bind_addr: SocketAddr) -> RelayResult<Self> {
        let listener = TcpListener::bind(bind_addr).await?;
        let lokale_addr = listener.local_addr()?;
        Ok(Self {
            state,
            listener,
            lokale_addr,
        })
    }

    /// Gibt die tatsaechlich gebundene Adresse zurueck
    pub fn lokale_addr(&self) -> SocketAddr {
        self.lokale_addr
    }

    /// Akzeptiert Verbindungen bis `shutdown_rx` ein `true`-Signal empfaengt
    pub async fn starten(self, mut shutdown_rx: watch::Receiver<bool>) -> RelayResult<()> {
        tracing::info!(adresse = %self.lokale_addr, "TCP Relay-Server gestartet");

        loop {
            tokio::select! {
                result = self.listener.accept() => {
                    match result {
                        Ok((stream, peer_addr)) => {
                            tracing::debug!(peer = %peer_addr, "Verbindung akzeptiert");
                            let state = Arc::clone(&self.state);
                            let shutdown_rx = shutdown_rx.clone();
                            tokio::spawn(async move {
                                verbindung_verarbeiten(state, stream, peer_addr, shutdown_rx).await;
                            });
                        }
                        Err(e) => {
                            tracing::error!(fehler = %e, "TCP-Accept-Fehler");
                            tokio::time::sleep(ACCEPT_BACKOFF).await;
                        }
                    }
                }

                Ok(()) = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        tracing::info!("Relay-Server: Shutdown-Signal empfangen");
                        break;
                    }
                }
            }
        }

        tracing::info!(
            offene_sessions = self.state.registry.anzahl(),
            "TCP Relay-Server gestoppt"
        );
        Ok(())
    }
}

/// Verarbeitet eine akzeptierte Verbindung vom Handshake bis zur Trennung
async fn verbindung_verarbeiten(
    state: Arc<RelayState>,
    stream: TcpStream,
    peer_addr: SocketAddr,
    shutdown_rx: watch::Receiver<bool>,
) {
    if let Err(e) = stream.set_nodelay(true) {
        tracing::debug!(peer = %peer_addr, fehler = %e, "TCP_NODELAY nicht gesetzt");
    }

    let id = state.ids.naechste();
    let (lese_haelfte, schreib_haelfte) = stream.into_split();
    let mut leser = FramedRead::new(
        lese_haelfte,
        FrameCodec::with_max_size(state.config.max_frame_groesse),
    );

    let name = match handshake_durchfuehren(&mut leser, state.config.handshake_timeout).await {
        Ok(name) => name,
        Err(e) => {
            state.metriken.handshake_failures_total.inc();
            tracing::info!(peer = %peer_addr, session = %id, fehler = %e, "Handshake abgebrochen");
            return;
        }
    };

    let session = Arc::new(ClientSession::neu(
        id,
        peer_addr,
        name,
        Box::new(schreib_haelfte),
        &state.config,
    ));

    let anzahl = state.registry.registrieren(Arc::clone(&session));
    state.metriken.sessions_total.inc();
    state.metriken.connected_sessions.set(anzahl as i64);
    tracing::info!(peer = %peer_addr, session = %id, name = %session.name(), "Client beigetreten");

    if anzahl > state.config.warn_schwelle {
        tracing::warn!(
            verbunden = anzahl,
            schwelle = state.config.warn_schwelle,
            "Mehr Clients verbunden als empfohlen"
        );
    }

    state
        .broadcaster
        .an_alle_ausser_senden(id, Nachricht::text(beitritts_nachricht(session.name())))
        .await;

    match session
        .lese_schleife(leser, &state.broadcaster, shutdown_rx)
        .await
    {
        Ok(()) => {
            tracing::info!(session = %id, name = %session.name(), "Client getrennt");
        }
        Err(RelayError::Framing(e)) if e.ist_abgebrochen() => {
            tracing::info!(session = %id, name = %session.name(), fehler = %e, "Verbindung abgebrochen");
        }
        Err(e) => {
            tracing::warn!(session = %id, name = %session.name(), fehler = %e, "Lese-Schleife mit Fehler beendet");
        }
    }

    state.registry.entfernen(&id);
    state
        .metriken
        .connected_sessions
        .set(state.registry.anzahl() as i64);
    session.schliessen().await;
}
