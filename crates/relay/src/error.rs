//! Fehlertypen fuer das Relay

use plauder_core::SessionId;
use plauder_protocol::FrameError;
use thiserror::Error;

/// Fehlertyp fuer das Relay
#[derive(Debug, Error)]
pub enum RelayError {
    /// Bind-, Accept- oder Connect-Fehler
    #[error("Verbindungsfehler: {0}")]
    Verbindung(#[from] std::io::Error),

    /// Name-Frame fehlt, ist leer oder kein Text
    #[error("Handshake fehlgeschlagen: {0}")]
    Handshake(String),

    /// Ungueltiger Frame im laufenden Betrieb
    #[error("Framing-Fehler: {0}")]
    Framing(#[from] FrameError),

    /// Schreiben an einen Empfaenger fehlgeschlagen
    #[error("Zustellung an {session} fehlgeschlagen: {grund}")]
    Zustellung { session: SessionId, grund: String },

    /// Session wurde bereits geschlossen
    #[error("Session {0} ist geschlossen")]
    Geschlossen(SessionId),

    /// Zeitlimit ueberschritten
    #[error("Zeitlimit ueberschritten: {0}")]
    Timeout(&'static str),

    /// Fehler des externen Audiogeraets
    #[error("Audiogeraet-Fehler: {0}")]
    Audio(String),
}

impl RelayError {
    /// Erstellt einen Handshake-Fehler
    pub fn handshake(msg: impl Into<String>) -> Self {
        Self::Handshake(msg.into())
    }

    /// Erstellt einen Zustellfehler fuer eine Session
    pub fn zustellung(session: SessionId, grund: impl Into<String>) -> Self {
        Self::Zustellung {
            session,
            grund: grund.into(),
        }
    }
}

/// Result-Typ fuer das Relay
pub type RelayResult<T> = Result<T, RelayError>;
