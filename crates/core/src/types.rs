//! Identifikationstypen fuer Plauder
//!
//! Session-IDs verwenden das Newtype-Pattern, damit sie nicht mit anderen
//! Zaehlern oder Ports verwechselt werden koennen.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Eindeutige ID einer Client-Session
///
/// Wird beim Akzeptieren der Verbindung vergeben und innerhalb eines
/// Server-Prozesses nie wiederverwendet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SessionId(pub u64);

impl SessionId {
    /// Gibt den inneren Zaehlerwert zurueck
    pub fn inner(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "session:{}", self.0)
    }
}

/// Vergibt monoton steigende Session-IDs (thread-safe)
#[derive(Debug)]
pub struct SessionIdGenerator {
    naechste: AtomicU64,
}

impl SessionIdGenerator {
    /// Erstellt einen Generator, der bei 1 beginnt
    pub fn neu() -> Self {
        Self {
            naechste: AtomicU64::new(1),
        }
    }

    /// Vergibt die naechste freie ID
    pub fn naechste(&self) -> SessionId {
        SessionId(self.naechste.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for SessionIdGenerator {
    fn default() -> Self {
        Self::neu()
    }
}
