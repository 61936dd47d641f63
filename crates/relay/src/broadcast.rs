//! Broadcaster – Verteilt Nachrichten an alle anderen Sessions
//!
//! Der Broadcaster nimmt einen Snapshot der Registry und ruft `senden` auf
//! jeder Session ausser dem Absender auf. Der Fehler eines Empfaengers wird
//! protokolliert und gezaehlt, die Zustellung an die uebrigen laeuft weiter.
//! Der Absender erfaehrt nie von Fehlschlaegen.

use plauder_core::SessionId;
use plauder_observability::RelayMetrics;
use plauder_protocol::Nachricht;

use crate::registry::SessionRegistry;

/// Ergebnis eines Broadcasts (nur fuer Logging und Metriken)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ZustellBericht {
    pub zugestellt: usize,
    pub fehlgeschlagen: usize,
}

/// Verteilt Nachrichten ueber die gemeinsame Session-Registry
///
/// Clone teilt Registry und Metriken.
#[derive(Clone)]
pub struct Broadcaster {
    registry: SessionRegistry,
    metriken: RelayMetrics,
}

impl Broadcaster {
    pub fn neu(registry: SessionRegistry, metriken: RelayMetrics) -> Self {
        Self { registry, metriken }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn metriken(&self) -> &RelayMetrics {
        &self.metriken
    }

    /// Sendet eine Nachricht an alle registrierten Sessions ausser `absender`
    ///
    /// Die Registry wird waehrend der Netzwerk-Schreibvorgaenge nicht
    /// gesperrt. Sessions, die sich nach dem Snapshot abmelden, lehnen das
    /// Schreiben selbst ab.
    pub async fn an_alle_ausser_senden(
        &self,
        absender: SessionId,
        nachricht: Nachricht,
    ) -> ZustellBericht {
        let empfaenger = self.registry.snapshot();
        let mut bericht = ZustellBericht::default();

        for session in empfaenger.iter().filter(|s| s.id() != absender) {
            match session.senden(nachricht.clone()).await {
                Ok(()) => {
                    bericht.zugestellt += 1;
                    self.metriken.deliveries_total.inc();
                }
                Err(e) => {
                    bericht.fehlgeschlagen += 1;
                    self.metriken.delivery_failures_total.inc();
                    tracing::warn!(
                        absender = %absender,
                        empfaenger = %session.id(),
                        name = %session.name(),
                        fehler = %e,
                        "Zustellung fehlgeschlagen"
                    );
                }
            }
        }

        bericht
    }
}

impl std::fmt::Debug for Broadcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Broadcaster")
            .field("registry", &self.registry)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
