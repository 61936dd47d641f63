//! plauder-relay – TCP Broadcast-Relay
//!
//! Dieser Crate implementiert das Relay: Jede TCP-Verbindung wird nach einem
//! Namens-Handshake als Session registriert. Jede Nachricht (Text oder
//! Binaer/Audio), die eine Session sendet, wird an alle *anderen* aktuell
//! verbundenen Sessions weitergeleitet.
//!
//! ## Architektur
//!
//! ```text
//! TCP Listener (RelayServer)
//!     |  pro Verbindung ein Task
//!     v
//! Handshake (ein Text-Frame = Anzeigename)
//!     |
//!     v
//! ClientSession ---- registrieren ----> SessionRegistry
//!     |                                      ^
//!     |  lese_schleife: Frame fuer Frame     | snapshot
//!     v                                      |
//! Broadcaster --------------------------------+
//!     |
//!     +-- senden() an jede andere Session (pro Session serialisiert)
//! ```

pub mod broadcast;
pub mod client;
pub mod error;
pub mod registry;
pub mod session;
pub mod state;
pub mod tcp;

#[cfg(test)]
mod tests;

// Bequeme Re-Exporte
pub use broadcast::{Broadcaster, ZustellBericht};
pub use client::{AudioGeraet, RelayClient};
pub use error::{RelayError, RelayResult};
pub use registry::SessionRegistry;
pub use session::ClientSession;
pub use state::{RelayConfig, RelayState};
pub use tcp::RelayServer;
