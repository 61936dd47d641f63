//! Client-Session – Eine registrierte Verbindung
//!
//! Jede akzeptierte TCP-Verbindung wird nach erfolgreichem Handshake zu einer
//! `ClientSession`. Die Lese-Haelfte gehoert exklusiv der Lese-Schleife, die
//! Schreib-Haelfte liegt hinter einem Mutex in der Session.
//!
//! ## Lebenszyklus
//! ```text
//! Akzeptiert -> Handshake -> Registriert (lese_schleife) -> Geschlossen
//!                   |                                         ^
//!                   +---------- Fehler: nie registriert ------+
//! ```
//!
//! ## Schreib-Disziplin
//! Mehrere Broadcasts koennen gleichzeitig an dieselbe Session senden. Jeder
//! Frame wird unter dem Schreib-Mutex vollstaendig geschrieben, Frames
//! verschiedener Absender werden dadurch nie ineinander verschachtelt.

use futures_util::{SinkExt, StreamExt};
use plauder_core::SessionId;
use plauder_protocol::{FrameCodec, Nachricht};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{watch, Mutex};
use tokio_util::codec::{FramedRead, FramedWrite};

use crate::broadcast::Broadcaster;
use crate::error::{RelayError, RelayResult};
use crate::state::RelayConfig;

/// Schreib-Haelfte einer Verbindung (TCP im Betrieb, Duplex in Tests)
pub type SessionWriter = Box<dyn AsyncWrite + Send + Unpin>;

// ---------------------------------------------------------------------------
// Handshake
// ---------------------------------------------------------------------------

/// Liest den Name-Frame einer frisch akzeptierten Verbindung
///
/// Erwartet genau einen Text-Frame. Der getrimmte Inhalt ist der
/// Anzeigename. Leere Namen, Binaer-Frames, Stream-Ende, Framing-Fehler und
/// Zeitueberschreitung ergeben einen `Handshake`-Fehler.
pub async fn handshake_durchfuehren<R>(
    leser: &mut FramedRead<R, FrameCodec>,
    zeitlimit: Duration,
) -> RelayResult<String>
where
    R: AsyncRead + Unpin,
{
    let frame = tokio::time::timeout(zeitlimit, leser.next())
        .await
        .map_err(|_| RelayError::handshake("kein Name-Frame innerhalb des Zeitlimits"))?;

    match frame {
        None => Err(RelayError::handshake(
            "Verbindung vor dem Handshake geschlossen",
        )),
        Some(Err(e)) => Err(RelayError::handshake(format!("Name-Frame unlesbar: {e}"))),
        Some(Ok(Nachricht::Binaer(_))) => Err(RelayError::handshake(
            "erster Frame muss ein Text-Frame mit dem Namen sein",
        )),
        Some(Ok(Nachricht::Text(name))) => {
            let name = name.trim();
            if name.is_empty() {
                return Err(RelayError::handshake("Name ist leer"));
            }
            Ok(name.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// ClientSession
// ---------------------------------------------------------------------------

struct Schreiber {
    framed: FramedWrite<SessionWriter, FrameCodec>,
    geschlossen: bool,
}

/// Eine verbundene, registrierte Client-Session
pub struct ClientSession {
    id: SessionId,
    peer_addr: SocketAddr,
    name: String,
    schreiber: Mutex<Schreiber>,
    /// false nach dem ersten fehlgeschlagenen Schreibversuch
    lebendig: AtomicBool,
    schreib_timeout: Option<Duration>,
}

impl ClientSession {
    /// Erstellt eine Session aus der Schreib-Haelfte einer Verbindung
    pub fn neu(
        id: SessionId,
        peer_addr: SocketAddr,
        name: impl Into<String>,
        writer: SessionWriter,
        config: &RelayConfig,
    ) -> Self {
        Self {
            id,
            peer_addr,
            name: name.into(),
            schreiber: Mutex::new(Schreiber {
                framed: FramedWrite::new(writer, FrameCodec::with_max_size(config.max_frame_groesse)),
                geschlossen: false,
            }),
            lebendig: AtomicBool::new(true),
            schreib_timeout: config.schreib_timeout,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ist_lebendig(&self) -> bool {
        self.lebendig.load(Ordering::Acquire)
    }

    /// Schreibt einen Frame an diese Session
    ///
    /// Schlaegt fehl wenn die Session geschlossen ist oder ein frueherer
    /// Schreibversuch fehlgeschlagen ist. Ein Fehler markiert die Session als
    /// tot, beendet aber nicht ihre Lese-Schleife.
    pub async fn senden(&self, nachricht: Nachricht) -> RelayResult<()> {
        let mut schreiber = self.schreiber.lock().await;

        if schreiber.geschlossen {
            return Err(RelayError::Geschlossen(self.id));
        }
        // Ein abgebrochener Schreibvorgang kann einen halben Frame hinterlassen
        if !self.ist_lebendig() {
            return Err(RelayError::zustellung(self.id, "Session ist als tot markiert"));
        }

        let ergebnis = match self.schreib_timeout {
            Some(dauer) => match tokio::time::timeout(dauer, schreiber.framed.send(nachricht)).await {
                Ok(r) => r.map_err(|e| RelayError::zustellung(self.id, e.to_string())),
                Err(_) => Err(RelayError::zustellung(self.id, "Zeitlimit beim Schreiben")),
            },
            None => schreiber
                .framed
                .send(nachricht)
                .await
                .map_err(|e| RelayError::zustellung(self.id, e.to_string())),
        };

        if ergebnis.is_err() {
            self.lebendig.store(false, Ordering::Release);
            tracing::debug!(
                session = %self.id,
                name = %self.name,
                "Schreiben fehlgeschlagen – Session als tot markiert"
            );
        }
        ergebnis
    }

    /// Schliesst die Schreib-Haelfte
    ///
    /// Danach wird nie wieder auf den Stream geschrieben. Mehrfacher Aufruf
    /// ist wirkungslos.
    pub async fn schliessen(&self) {
        let mut schreiber = self.schreiber.lock().await;
        if schreiber.geschlossen {
            return;
        }
        schreiber.geschlossen = true;
        self.lebendig.store(false, Ordering::Release);

        if let Err(e) = schreiber.framed.close().await {
            tracing::debug!(session = %self.id, fehler = %e, "Schliessen des Streams fehlgeschlagen");
        }
    }

    /// Baut aus einer empfangenen Nachricht die weiterzuleitende
    ///
    /// Text wird mit dem Absendernamen versehen, Binaerdaten bleiben
    /// unveraendert.
    pub fn weiterleitung(&self, nachricht: Nachricht) -> Nachricht {
        match nachricht {
            Nachricht::Text(text) => Nachricht::Text(format!("{}: {}", self.name, text)),
            binaer @ Nachricht::Binaer(_) => binaer,
        }
    }

    /// Liest Frames bis zum Stream-Ende, Framing-Fehler oder Shutdown
    ///
    /// Jede Nachricht wird vollstaendig verteilt bevor der naechste Frame
    /// gelesen wird (Reihenfolge pro Absender bleibt erhalten).
    /// `Ok(())` bei Stream-Ende oder Shutdown, `Err(Framing)` bei ungueltigem
    /// Frame.
    pub async fn lese_schleife<R>(
        &self,
        mut leser: FramedRead<R, FrameCodec>,
        broadcaster: &Broadcaster,
        mut shutdown_rx: watch::Receiver<bool>,
    ) -> RelayResult<()>
    where
        R: AsyncRead + Unpin,
    {
        loop {
            tokio::select! {
                frame = leser.next() => {
                    match frame {
                        Some(Ok(nachricht)) => {
                            broadcaster.metriken().frame_empfangen(nachricht.typ().bezeichnung());
                            tracing::trace!(
                                session = %self.id,
                                typ = nachricht.typ().bezeichnung(),
                                bytes = nachricht.payload_laenge(),
                                "Nachricht empfangen"
                            );
                            let bericht = broadcaster
                                .an_alle_ausser_senden(self.id, self.weiterleitung(nachricht))
                                .await;
                            tracing::trace!(
                                session = %self.id,
                                zugestellt = bericht.zugestellt,
                                fehlgeschlagen = bericht.fehlgeschlagen,
                                "Nachricht verteilt"
                            );
                        }
                        Some(Err(e)) => return Err(RelayError::Framing(e)),
                        None => return Ok(()),
                    }
                }

                Ok(()) = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        tracing::debug!(session = %self.id, "Shutdown-Signal – Lese-Schleife endet");
                        return Ok(());
                    }
                }
            }
        }
    }
}

impl std::fmt::Debug for ClientSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSession")
            .field("id", &self.id)
            .field("peer_addr", &self.peer_addr)
            .field("name", &self.name)
            .field("lebendig", &self.ist_lebendig())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
