//! Wire-Format fuer TCP-Verbindungen
//!
//! Frame-basiertes Protokoll: Typ(u8) + Laenge(u32 big-endian) + Payload.
//!
//! ## Frame-Format
//!
//! ```text
//! +--------+--------+--------+--------+--------+----...----+
//! | Typ    | Laenge (u32 BE)                   | Payload    |
//! +--------+--------+--------+--------+--------+----...----+
//! ```
//!
//! Typ `0x01` = Text (UTF-8), `0x02` = Binaer. Die Laenge gibt die Anzahl der
//! Payload-Bytes an (ohne Header). Maximale Frame-Groesse ist konfigurierbar
//! (Standard: 16 MiB).

use bytes::{Buf, BufMut, BytesMut};
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::FrameError;
use crate::message::{Nachricht, NachrichtenTyp};

// ---------------------------------------------------------------------------
// Konstanten
// ---------------------------------------------------------------------------

/// Standard-maximale Payload-Groesse (16 MiB)
pub const DEFAULT_MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// Groesse des Typ-Felds in Bytes
pub const TYPE_FIELD_SIZE: usize = 1;

/// Groesse des Laengen-Felds in Bytes
pub const LENGTH_FIELD_SIZE: usize = 4;

/// Gesamtgroesse des Headers
pub const HEADER_SIZE: usize = TYPE_FIELD_SIZE + LENGTH_FIELD_SIZE;

// ---------------------------------------------------------------------------
// FrameCodec
// ---------------------------------------------------------------------------

/// tokio-util Codec fuer Plauder-Frames
///
/// Implementiert `Encoder<Nachricht>` und `Decoder` fuer
/// `FramedRead` / `FramedWrite`.
#[derive(Debug, Clone)]
pub struct FrameCodec {
    /// Maximale erlaubte Payload-Groesse in Bytes
    max_frame_size: usize,
}

impl FrameCodec {
    /// Erstellt einen neuen `FrameCodec` mit Standard-Limits
    pub fn new() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }

    /// Erstellt einen `FrameCodec` mit benutzerdefinierter maximaler Frame-Groesse
    pub fn with_max_size(max_frame_size: usize) -> Self {
        Self { max_frame_size }
    }

    pub fn max_frame_size(&self) -> usize {
        self.max_frame_size
    }

    fn laenge_pruefen(&self, laenge: usize) -> Result<(), FrameError> {
        if laenge > self.max_frame_size {
            return Err(FrameError::ZuGross {
                laenge,
                maximum: self.max_frame_size,
            });
        }
        Ok(())
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new()
    }
}

/// Baut aus Typ und rohen Payload-Bytes eine `Nachricht`
fn payload_dekodieren(typ: NachrichtenTyp, payload: BytesMut) -> Result<Nachricht, FrameError> {
    match typ {
        NachrichtenTyp::Text => String::from_utf8(payload.to_vec())
            .map(Nachricht::Text)
            .map_err(|_| FrameError::UngueltigesUtf8),
        NachrichtenTyp::Binaer => Ok(Nachricht::Binaer(payload.freeze())),
    }
}

// ---------------------------------------------------------------------------
// Decoder-Implementierung
// ---------------------------------------------------------------------------

impl Decoder for FrameCodec {
    type Item = Nachricht;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        // Warte auf den vollstaendigen Header
        if src.len() < HEADER_SIZE {
            return Ok(None);
        }

        // Header lesen ohne den Buffer zu veraendern
        let typ = NachrichtenTyp::try_from(src[0])?;
        let length = u32::from_be_bytes([src[1], src[2], src[3], src[4]]) as usize;
        self.laenge_pruefen(length)?;

        let total_size = HEADER_SIZE + length;
        if src.len() < total_size {
            // Speicher vorbelegen um Reallocations zu vermeiden
            src.reserve(total_size - src.len());
            return Ok(None);
        }

        src.advance(HEADER_SIZE);
        let payload = src.split_to(length);
        payload_dekodieren(typ, payload).map(Some)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(nachricht) => Ok(Some(nachricht)),
            None if src.is_empty() => Ok(None),
            None => Err(FrameError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "Verbindung mitten im Frame getrennt",
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Encoder-Implementierung
// ---------------------------------------------------------------------------

impl Encoder<Nachricht> for FrameCodec {
    type Error = FrameError;

    fn encode(&mut self, item: Nachricht, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let payload = item.payload();
        self.laenge_pruefen(payload.len())?;

        dst.reserve(HEADER_SIZE + payload.len());
        dst.put_u8(item.typ() as u8);
        dst.put_u32(payload.len() as u32);
        dst.put_slice(payload);

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Hilfsfunktionen fuer direktes async Lesen/Schreiben
// ---------------------------------------------------------------------------

/// Kodiert eine Nachricht in einen neuen Buffer
pub fn encode_frame(nachricht: &Nachricht, max_frame_size: usize) -> Result<BytesMut, FrameError> {
    let mut buf = BytesMut::with_capacity(HEADER_SIZE + nachricht.payload_laenge());
    FrameCodec::with_max_size(max_frame_size).encode(nachricht.clone(), &mut buf)?;
    Ok(buf)
}

/// Liest einen einzelnen Frame aus einem `AsyncRead`
///
/// Gibt `Ok(None)` zurueck wenn der Stream sauber an einer Frame-Grenze endet.
///
/// # Fehler
/// - `Io(UnexpectedEof)` wenn die Verbindung mitten im Frame getrennt wird
/// - `ZuGross`, `UnbekannterTyp`, `UngueltigesUtf8` bei ungueltigen Frames
pub async fn read_frame<R>(
    reader: &mut R,
    max_frame_size: usize,
) -> Result<Option<Nachricht>, FrameError>
where
    R: AsyncRead + Unpin,
{
    let mut typ_buf = [0u8; TYPE_FIELD_SIZE];
    if reader.read(&mut typ_buf).await? == 0 {
        return Ok(None);
    }
    let typ = NachrichtenTyp::try_from(typ_buf[0])?;

    let mut len_buf = [0u8; LENGTH_FIELD_SIZE];
    reader.read_exact(&mut len_buf).await?;
    let length = u32::from_be_bytes(len_buf) as usize;
    FrameCodec::with_max_size(max_frame_size).laenge_pruefen(length)?;

    let mut payload = BytesMut::zeroed(length);
    reader.read_exact(&mut payload).await?;

    payload_dekodieren(typ, payload).map(Some)
}

/// Schreibt einen einzelnen Frame in einen `AsyncWrite` und flusht
///
/// Zu grosse Nachrichten werden abgelehnt bevor ein Byte geschrieben wird.
pub async fn write_frame<W>(
    writer: &mut W,
    nachricht: &Nachricht,
    max_frame_size: usize,
) -> Result<(), FrameError>
where
    W: AsyncWrite + Unpin,
{
    let buf = encode_frame(nachricht, max_frame_size)?;
    writer.write_all(&buf).await?;
    writer.flush().await?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::{SinkExt, StreamExt};
    use std::io;
    use tokio_util::codec::{FramedRead, FramedWrite};

    #[test]
    fn text_frame_layout() {
        let buf = encode_frame(&Nachricht::text("hi"), DEFAULT_MAX_FRAME_SIZE).unwrap();
        assert_eq!(&buf[..], &[0x01, 0x00, 0x00, 0x00, 0x02, b'h', b'i']);
    }

    #[test]
    fn binaer_frame_layout() {
        let buf = encode_frame(&Nachricht::binaer(vec![0xAAu8; 3]), DEFAULT_MAX_FRAME_SIZE)
            .unwrap();
        assert_eq!(&buf[..], &[0x02, 0x00, 0x00, 0x00, 0x03, 0xAA, 0xAA, 0xAA]);
    }

    #[test]
    fn frame_codec_round_trip_randfaelle() {
        let mut codec = FrameCodec::new();
        let faelle = vec![
            Nachricht::text(""),
            Nachricht::text("Grüße aus 東京 🎧"),
            Nachricht::binaer(Vec::<u8>::new()),
            Nachricht::binaer((0..=255u8).cycle().take(70_000).collect::<Vec<_>>()),
        ];

        for original in faelle {
            let mut buf = BytesMut::new();
            codec.encode(original.clone(), &mut buf).unwrap();
            let decoded = codec
                .decode(&mut buf)
                .unwrap()
                .expect("Muss eine Nachricht enthalten");
            assert_eq!(decoded, original);
            assert!(buf.is_empty());
        }
    }

    #[test]
    fn frame_codec_unvollstaendiger_frame() {
        let mut codec = FrameCodec::new();
        let mut buf = BytesMut::new();
        codec.encode(Nachricht::text("hallo welt"), &mut buf).unwrap();

        // Nur die Haelfte der Bytes behalten
        let half = buf.len() / 2;
        let mut partial = buf.split_to(half);
        assert!(codec.decode(&mut partial).unwrap().is_none());
    }

    #[test]
    fn frame_codec_zu_wenig_bytes_fuer_header() {
        let mut codec = FrameCodec::new();
        let mut buf = BytesMut::from(&[0x01, 0x00, 0x00][..]);
        assert!(codec.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn frame_codec_ablehnung_zu_grosser_frame() {
        let mut codec = FrameCodec::with_max_size(100);

        // Nur der Header reicht, der Payload muss gar nicht ankommen
        let mut buf = BytesMut::new();
        buf.put_u8(0x02);
        buf.put_u32(200);

        let result = codec.decode(&mut buf);
        assert!(matches!(
            result,
            Err(FrameError::ZuGross {
                laenge: 200,
                maximum: 100
            })
        ));
    }

    #[test]
    fn frame_codec_ablehnung_unbekannter_typ() {
        let mut codec = FrameCodec::new();
        let mut buf = BytesMut::from(&[0x09, 0x00, 0x00, 0x00, 0x00][..]);
        assert!(matches!(
            codec.decode(&mut buf),
            Err(FrameError::UnbekannterTyp(0x09))
        ));
    }

    #[test]
    fn frame_codec_ablehnung_ungueltiges_utf8() {
        let mut codec = FrameCodec::new();
        let mut buf = BytesMut::from(&[0x01, 0x00, 0x00, 0x00, 0x02, 0xC3, 0x28][..]);
        assert!(matches!(
            codec.decode(&mut buf),
            Err(FrameError::UngueltigesUtf8)
        ));
    }

    #[test]
    fn frame_codec_ablehnung_beim_encode_zu_grosse_nachricht() {
        let mut codec = FrameCodec::with_max_size(10);
        let mut buf = BytesMut::new();
        let result = codec.encode(Nachricht::binaer(vec![0u8; 11]), &mut buf);
        assert!(result.is_err());
        assert!(buf.is_empty(), "Bei Ablehnung darf nichts geschrieben werden");
    }

    #[test]
    fn frame_codec_mehrere_nachrichten_im_buffer() {
        let mut codec = FrameCodec::new();
        let mut buf = BytesMut::new();

        for i in 0..3u32 {
            codec
                .encode(Nachricht::text(format!("nachricht {i}")), &mut buf)
                .unwrap();
        }

        for i in 0..3u32 {
            let msg = codec.decode(&mut buf).unwrap().expect("Nachricht erwartet");
            assert_eq!(msg, Nachricht::text(format!("nachricht {i}")));
        }
        assert!(buf.is_empty());
    }

    #[test]
    fn frame_codec_default_max_size() {
        assert_eq!(FrameCodec::new().max_frame_size(), DEFAULT_MAX_FRAME_SIZE);
        assert_eq!(DEFAULT_MAX_FRAME_SIZE, 16 * 1024 * 1024);
    }

    #[tokio::test]
    async fn async_read_write_frame_round_trip() {
        let original = Nachricht::binaer(vec![7u8; 1024]);

        let mut buffer: Vec<u8> = Vec::new();
        write_frame(&mut buffer, &original, DEFAULT_MAX_FRAME_SIZE)
            .await
            .unwrap();
        assert_eq!(buffer.len(), HEADER_SIZE + 1024);

        let mut cursor = io::Cursor::new(buffer);
        let decoded = read_frame(&mut cursor, DEFAULT_MAX_FRAME_SIZE)
            .await
            .unwrap()
            .expect("Nachricht erwartet");
        assert_eq!(decoded, original);

        // Danach sauberes Stream-Ende
        let ende = read_frame(&mut cursor, DEFAULT_MAX_FRAME_SIZE).await.unwrap();
        assert!(ende.is_none());
    }

    #[tokio::test]
    async fn async_read_frame_leerer_stream_ist_ende() {
        let mut cursor = io::Cursor::new(Vec::<u8>::new());
        let result = read_frame(&mut cursor, DEFAULT_MAX_FRAME_SIZE).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn async_read_frame_abbruch_mitten_im_frame() {
        // Header kuendigt 10 Bytes an, es kommen nur 3
        let buffer = vec![0x02, 0x00, 0x00, 0x00, 0x0A, 1, 2, 3];
        let mut cursor = io::Cursor::new(buffer);
        let err = read_frame(&mut cursor, DEFAULT_MAX_FRAME_SIZE)
            .await
            .unwrap_err();
        assert!(err.ist_abgebrochen());
    }

    #[tokio::test]
    async fn async_read_frame_ablehnung_zu_grosser_frame() {
        let mut buffer: Vec<u8> = vec![0x02];
        buffer.extend_from_slice(&(32u32 * 1024 * 1024).to_be_bytes());

        let mut cursor = io::Cursor::new(buffer);
        let result = read_frame(&mut cursor, DEFAULT_MAX_FRAME_SIZE).await;
        assert!(matches!(result, Err(FrameError::ZuGross { .. })));
    }

    #[tokio::test]
    async fn async_write_frame_ablehnung_zu_grosse_nachricht() {
        let mut buffer: Vec<u8> = Vec::new();
        let result = write_frame(&mut buffer, &Nachricht::text("zu lang"), 5).await;
        assert!(result.is_err());
        assert!(buffer.is_empty());
    }

    #[tokio::test]
    async fn framed_ueber_duplex_stream() {
        let (client, server) = tokio::io::duplex(64);
        let mut sender = FramedWrite::new(client, FrameCodec::new());
        let mut empfaenger = FramedRead::new(server, FrameCodec::new());

        let nachrichten = vec![
            Nachricht::text("Alice"),
            Nachricht::binaer(vec![9u8; 500]),
            Nachricht::text("hi"),
        ];

        let erwartet = nachrichten.clone();
        let schreiber = tokio::spawn(async move {
            for n in nachrichten {
                sender.send(n).await.unwrap();
            }
            // Sender droppen -> Stream-Ende
        });

        for e in erwartet {
            let n = empfaenger.next().await.expect("Frame erwartet").unwrap();
            assert_eq!(n, e);
        }
        schreiber.await.unwrap();
        assert!(empfaenger.next().await.is_none());
    }

    #[tokio::test]
    async fn framed_abbruch_mitten_im_frame() {
        let (mut client, server) = tokio::io::duplex(64);
        let mut empfaenger = FramedRead::new(server, FrameCodec::new());

        // Header kuendigt 10 Bytes an, es kommen nur 3
        client.write_all(&[0x01, 0, 0, 0, 10, b'a', b'b', b'c']).await.unwrap();
        drop(client);

        let fehler = empfaenger.next().await.expect("Fehler erwartet").unwrap_err();
        assert!(fehler.ist_abgebrochen());
    }
}
