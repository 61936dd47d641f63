//! Fehlertypen fuer das Wire-Format

use std::io;
use thiserror::Error;

/// Fehler beim Kodieren oder Dekodieren eines Frames
#[derive(Debug, Error)]
pub enum FrameError {
    /// IO-Fehler (auch: Verbindung mitten im Frame getrennt)
    #[error("IO-Fehler: {0}")]
    Io(#[from] io::Error),

    /// Laengenfeld ueberschreitet das konfigurierte Maximum
    #[error("Frame zu gross: {laenge} Bytes (Maximum: {maximum} Bytes)")]
    ZuGross { laenge: usize, maximum: usize },

    /// Unbekanntes Typ-Byte
    #[error("Unbekannter Nachrichtentyp: 0x{0:02x}")]
    UnbekannterTyp(u8),

    /// Text-Frame enthaelt kein gueltiges UTF-8
    #[error("Text-Payload ist kein gueltiges UTF-8")]
    UngueltigesUtf8,
}

impl FrameError {
    /// Gibt true zurueck wenn der Peer die Verbindung mitten im Frame getrennt hat
    pub fn ist_abgebrochen(&self) -> bool {
        matches!(self, Self::Io(e) if e.kind() == io::ErrorKind::UnexpectedEof)
    }
}
