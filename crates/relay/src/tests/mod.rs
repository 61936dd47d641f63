//! Test-Hilfsfunktionen und End-to-End-Tests fuer das Relay


use std::net::SocketAddr;
use std::sync::Arc;

use plauder_core::SessionId;
use plauder_protocol::FrameCodec;
use tokio::io::DuplexStream;
use tokio_util::codec::FramedRead;

use crate::session::ClientSession;
use crate::state::RelayConfig;

/// Feste Peer-Adresse fuer Sessions ohne echten Socket
pub(crate) fn test_adresse() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 40000))
}

/// Session ueber einen In-Memory-Duplex-Stream
///
/// Gibt die Session und einen Leser zurueck, der alles empfaengt, was an
/// die Session gesendet wird.
pub(crate) fn duplex_session(
    id: u64,
    name: &str,
) -> (Arc<ClientSession>, FramedRead<DuplexStream, FrameCodec>) {
    let (schreib_seite, lese_seite) = tokio::io::duplex(64 * 1024);
    let session = ClientSession::neu(
        SessionId(id),
        test_adresse(),
        name,
        Box::new(schreib_seite),
        &RelayConfig::default(),
    );
    (
        Arc::new(session),
        FramedRead::new(lese_seite, FrameCodec::new()),
    )
}
