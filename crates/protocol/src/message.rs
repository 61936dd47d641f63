//! Nachrichtenmodell
//!
//! Eine `Nachricht` ist entweder Text (Chat) oder ein opaker Binaer-Payload
//! (Audio-Samples). Das Relay inspiziert Binaer-Payloads nie.

use bytes::Bytes;

use crate::error::FrameError;

/// Typ-Byte einer Nachricht auf dem Draht
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum NachrichtenTyp {
    /// UTF-8 Text
    Text = 0x01,
    /// Opake Bytes (Audio)
    Binaer = 0x02,
}

impl NachrichtenTyp {
    /// Kurzbezeichnung fuer Logs und Metrik-Labels
    pub fn bezeichnung(&self) -> &'static str {
        match self {
            NachrichtenTyp::Text => "text",
            NachrichtenTyp::Binaer => "binary",
        }
    }
}

impl TryFrom<u8> for NachrichtenTyp {
    type Error = FrameError;

    fn try_from(wert: u8) -> Result<Self, Self::Error> {
        match wert {
            0x01 => Ok(NachrichtenTyp::Text),
            0x02 => Ok(NachrichtenTyp::Binaer),
            andere => Err(FrameError::UnbekannterTyp(andere)),
        }
    }
}

/// Eine einzelne Nachricht (unveraenderlich nach der Erstellung)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Nachricht {
    Text(String),
    Binaer(Bytes),
}

impl Nachricht {
    pub fn text(inhalt: impl Into<String>) -> Self {
        Nachricht::Text(inhalt.into())
    }

    pub fn binaer(daten: impl Into<Bytes>) -> Self {
        Nachricht::Binaer(daten.into())
    }

    pub fn typ(&self) -> NachrichtenTyp {
        match self {
            Nachricht::Text(_) => NachrichtenTyp::Text,
            Nachricht::Binaer(_) => NachrichtenTyp::Binaer,
        }
    }

    /// Payload als Bytes-Slice (UTF-8 Bytes bei Text)
    pub fn payload(&self) -> &[u8] {
        match self {
            Nachricht::Text(s) => s.as_bytes(),
            Nachricht::Binaer(b) => b.as_ref(),
        }
    }

    pub fn payload_laenge(&self) -> usize {
        self.payload().len()
    }

    pub fn als_text(&self) -> Option<&str> {
        match self {
            Nachricht::Text(s) => Some(s),
            Nachricht::Binaer(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typ_byte_zuordnung() {
        assert_eq!(NachrichtenTyp::Text as u8, 0x01);
        assert_eq!(NachrichtenTyp::Binaer as u8, 0x02);
        assert_eq!(NachrichtenTyp::try_from(0x01).unwrap(), NachrichtenTyp::Text);
        assert_eq!(NachrichtenTyp::try_from(0x02).unwrap(), NachrichtenTyp::Binaer);
        assert!(matches!(
            NachrichtenTyp::try_from(0x00),
            Err(FrameError::UnbekannterTyp(0x00))
        ));
    }

    #[test]
    fn payload_zugriff() {
        let text = Nachricht::text("hallo");
        assert_eq!(text.typ(), NachrichtenTyp::Text);
        assert_eq!(text.payload(), b"hallo");
        assert_eq!(text.als_text(), Some("hallo"));

        let audio = Nachricht::binaer(vec![1u8, 2, 3]);
        assert_eq!(audio.typ(), NachrichtenTyp::Binaer);
        assert_eq!(audio.payload_laenge(), 3);
        assert_eq!(audio.als_text(), None);
    }

    #[test]
    fn bezeichnungen() {
        assert_eq!(NachrichtenTyp::Text.bezeichnung(), "text");
        assert_eq!(NachrichtenTyp::Binaer.bezeichnung(), "binary");
    }
}
