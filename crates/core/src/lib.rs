//! plauder-core – Gemeinsame Typen
//!
//! Dieses Crate stellt die Identifikationstypen bereit, die vom
//! Relay-Crate und seinen Nutzern gemeinsam verwendet werden.

pub mod types;

// Re-Exporte fuer bequemen Zugriff
pub use types::{SessionId, SessionIdGenerator};
