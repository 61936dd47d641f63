//! Client-Bibliothek fuer das Relay
//!
//! `RelayClient` kapselt eine Verbindung zum Relay: Namens-Handshake beim
//! Verbinden, danach Text- und Audio-Nachrichten senden und empfangen.
//! Frontends (GUI, CLI) koppeln ausschliesslich ueber diese Methoden.
//!
//! Aufnahme und Wiedergabe von Audio liegen ausserhalb des Relays und werden
//! ueber den Trait `AudioGeraet` angebunden.

use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use plauder_protocol::{FrameCodec, Nachricht};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio_util::codec::{FramedRead, FramedWrite};

use crate::error::{RelayError, RelayResult};

/// Standard-Port des Relays
pub const STANDARD_PORT: u16 = 8080;

/// Ersatzname fuer leere Namenseingaben
pub const ANONYMER_NAME: &str = "Anonymous";

/// Externes Audiogeraet (Mikrofon + Lautsprecher)
///
/// Das Relay behandelt Audio als opake Bytes. Implementierungen liefern
/// einen aufgenommenen Block bzw. spielen einen empfangenen Block ab.
pub trait AudioGeraet {
    /// Nimmt einen Block Audio-Samples auf
    fn block_aufnehmen(&mut self) -> RelayResult<Vec<u8>>;

    /// Spielt einen Block Audio-Samples ab
    fn block_abspielen(&mut self, daten: &[u8]) -> RelayResult<()>;
}

/// Ersetzt leere oder nur aus Leerzeichen bestehende Namen durch `Anonymous`
pub fn name_normalisieren(name: &str) -> String {
    let name = name.trim();
    if name.is_empty() {
        ANONYMER_NAME.to_string()
    } else {
        name.to_string()
    }
}

/// Verbindung eines Clients zum Relay
pub struct RelayClient {
    name: String,
    leser: FramedRead<OwnedReadHalf, FrameCodec>,
    schreiber: FramedWrite<OwnedWriteHalf, FrameCodec>,
}

impl RelayClient {
    /// Verbindet sich mit dem Relay und sendet den Name-Frame
    pub async fn verbinden(addr: impl ToSocketAddrs, name: &str) -> RelayResult<Self> {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        let (lese_haelfte, schreib_haelfte) = stream.into_split();

        let mut client = Self {
            name: name_normalisieren(name),
            leser: FramedRead::new(lese_haelfte, FrameCodec::new()),
            schreiber: FramedWrite::new(schreib_haelfte, FrameCodec::new()),
        };

        let name_frame = Nachricht::text(client.name.clone());
        client.schreiber.send(name_frame).await?;
        tracing::debug!(name = %client.name, "Mit Relay verbunden");

        Ok(client)
    }

    /// Name, unter dem dieser Client angemeldet ist
    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn text_senden(&mut self, text: impl Into<String>) -> RelayResult<()> {
        self.schreiber.send(Nachricht::text(text)).await?;
        Ok(())
    }

    pub async fn audio_senden(&mut self, daten: impl Into<Bytes>) -> RelayResult<()> {
        self.schreiber.send(Nachricht::binaer(daten)).await?;
        Ok(())
    }

    /// Nimmt einen Block vom Geraet auf und sendet ihn
    ///
    /// Gibt die Anzahl gesendeter Bytes zurueck.
    pub async fn audio_block_senden<G: AudioGeraet>(&mut self, geraet: &mut G) -> RelayResult<usize> {
        let block = geraet.block_aufnehmen()?;
        let laenge = block.len();
        self.audio_senden(block).await?;
        Ok(laenge)
    }

    /// Wartet auf die naechste Nachricht vom Relay
    ///
    /// `Ok(None)` wenn das Relay die Verbindung geschlossen hat.
    pub async fn empfangen(&mut self) -> RelayResult<Option<Nachricht>> {
        match self.leser.next().await {
            Some(Ok(nachricht)) => Ok(Some(nachricht)),
            Some(Err(e)) => Err(RelayError::Framing(e)),
            None => Ok(None),
        }
    }

    /// Empfaengt die naechste Nachricht und spielt Audio direkt ab
    pub async fn empfangen_und_abspielen<G: AudioGeraet>(
        &mut self,
        geraet: &mut G,
    ) -> RelayResult<Option<Nachricht>> {
        let nachricht = self.empfangen().await?;
        if let Some(Nachricht::Binaer(daten)) = &nachricht {
            geraet.block_abspielen(daten)?;
        }
        Ok(nachricht)
    }

    /// Schliesst die Verbindung sauber
    pub async fn trennen(mut self) -> RelayResult<()> {
        self.schreiber.close().await?;
        tracing::debug!(name = %self.name, "Verbindung zum Relay getrennt");
        Ok(())
    }
}

impl std::fmt::Debug for RelayClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayClient").field("name", &self.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leerer_name_wird_anonymous() {
        assert_eq!(name_normalisieren(""), "Anonymous");
        assert_eq!(name_normalisieren("   \t"), "Anonymous");
        assert_eq!(name_normalisieren(" Bob "), "Bob");
    }
}
