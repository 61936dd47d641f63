//! Gemeinsamer Relay-Zustand
//!
//! Haelt Konfiguration, Session-Registry, Broadcaster und Metriken als
//! Arc-Referenz, die sicher zwischen tokio-Tasks geteilt werden kann.

use plauder_core::SessionIdGenerator;
use plauder_observability::RelayMetrics;
use plauder_protocol::DEFAULT_MAX_FRAME_SIZE;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::broadcast::Broadcaster;
use crate::registry::SessionRegistry;

/// Konfiguration fuer das Relay
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Ab dieser Anzahl registrierter Sessions wird gewarnt (nicht abgelehnt)
    pub warn_schwelle: usize,
    /// Maximale Payload-Groesse eines Frames in Bytes
    pub max_frame_groesse: usize,
    /// Zeit bis der Name-Frame eingetroffen sein muss
    pub handshake_timeout: Duration,
    /// Zeitlimit pro Schreibvorgang (`None` = unbegrenzt)
    pub schreib_timeout: Option<Duration>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            warn_schwelle: 5,
            max_frame_groesse: DEFAULT_MAX_FRAME_SIZE,
            handshake_timeout: Duration::from_secs(10),
            schreib_timeout: Some(Duration::from_secs(5)),
        }
    }
}

/// Gemeinsamer Relay-Zustand (thread-safe, Arc-geteilt)
pub struct RelayState {
    pub config: Arc<RelayConfig>,
    /// Alle Sessions mit abgeschlossenem Handshake
    pub registry: SessionRegistry,
    pub broadcaster: Broadcaster,
    pub ids: SessionIdGenerator,
    pub metriken: RelayMetrics,
    pub start_time: Instant,
}

impl RelayState {
    /// Erstellt einen neuen RelayState
    pub fn neu(config: RelayConfig, metriken: RelayMetrics) -> Arc<Self> {
        let registry = SessionRegistry::neu();
        let broadcaster = Broadcaster::neu(registry.clone(), metriken.clone());
        Arc::new(Self {
            config: Arc::new(config),
            registry,
            broadcaster,
            ids: SessionIdGenerator::neu(),
            metriken,
            start_time: Instant::now(),
        })
    }

    /// Gibt die Uptime in Sekunden zurueck
    pub fn uptime_sek(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_config() {
        let config = RelayConfig::default();
        assert_eq!(config.warn_schwelle, 5);
        assert_eq!(config.max_frame_groesse, 16 * 1024 * 1024);
        assert_eq!(config.handshake_timeout, Duration::from_secs(10));
        assert_eq!(config.schreib_timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn state_teilt_registry_mit_broadcaster() {
        let state = RelayState::neu(RelayConfig::default(), RelayMetrics::neu().unwrap());
        assert_eq!(state.registry.anzahl(), 0);
        assert_eq!(state.broadcaster.registry().anzahl(), 0);
        assert!(state.uptime_sek() < 5);
    }
}
