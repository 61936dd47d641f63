//! Session-Registry – Menge aller aktiven Sessions
//!
//! Die Registry ist der einzige prozessweit veraenderliche Zustand des
//! Relays. Einfuegen, Entfernen und Snapshot laufen unter einem einzigen
//! Mutex. Der Snapshot ist eine Kopie, Broadcasts halten den Lock also nie
//! waehrend langsamer Netzwerk-Schreibvorgaenge.

use parking_lot::Mutex;
use plauder_core::SessionId;
use std::collections::HashMap;
use std::sync::Arc;

use crate::session::ClientSession;

/// Thread-safe Menge der registrierten Sessions
///
/// Clone teilt den inneren Zustand.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    inner: Arc<Mutex<HashMap<SessionId, Arc<ClientSession>>>>,
}

impl SessionRegistry {
    pub fn neu() -> Self {
        Self::default()
    }

    /// Registriert eine Session und gibt die neue Anzahl zurueck
    pub fn registrieren(&self, session: Arc<ClientSession>) -> usize {
        let mut sessions = self.inner.lock();
        let id = session.id();
        if sessions.insert(id, session).is_some() {
            tracing::warn!(session = %id, "Session war bereits registriert – ersetzt");
        }
        sessions.len()
    }

    /// Entfernt eine Session, gibt sie zurueck falls sie registriert war
    pub fn entfernen(&self, id: &SessionId) -> Option<Arc<ClientSession>> {
        self.inner.lock().remove(id)
    }

    /// Kopie aller aktuell registrierten Sessions (Reihenfolge unbestimmt)
    pub fn snapshot(&self) -> Vec<Arc<ClientSession>> {
        self.inner.lock().values().cloned().collect()
    }

    pub fn anzahl(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn enthaelt(&self, id: &SessionId) -> bool {
        self.inner.lock().contains_key(id)
    }

    /// Alle registrierten IDs, aufsteigend sortiert
    pub fn ids(&self) -> Vec<SessionId> {
        let mut ids: Vec<SessionId> = self.inner.lock().keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("anzahl", &self.anzahl())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
