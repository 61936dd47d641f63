//! plauder-server – Bibliotheks-Root
//!
//! Deklariert alle Server-Module und stellt den oeffentlichen Einstiegspunkt
//! fuer Integrationstests bereit.

pub mod config;

use anyhow::Result;
use config::ServerConfig;
use plauder_observability::RelayMetrics;
use plauder_relay::{RelayServer, RelayState};
use tokio::sync::watch;

/// Haelt den laufenden Server-Zustand zusammen
pub struct Server {
    pub config: ServerConfig,
}

impl Server {
    /// Erstellt einen neuen Server aus der gegebenen Konfiguration
    pub fn neu(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Startet alle Server-Subsysteme und laeuft bis zum Shutdown-Signal
    ///
    /// Reihenfolge:
    /// 1. Metriken registrieren, Relay-Zustand anlegen
    /// 2. Observability-Server starten (falls aktiviert)
    /// 3. TCP-Listener binden und Accept-Loop starten
    /// 4. Auf Ctrl-C warten, dann Listener und Sessions beenden
    pub async fn starten(self) -> Result<()> {
        let tcp_adresse = self.config.tcp_bind_adresse()?;
        let relay_config = self.config.relay_config();

        tracing::info!(
            tcp = %tcp_adresse,
            warn_schwelle = relay_config.warn_schwelle,
            max_frame_groesse = relay_config.max_frame_groesse,
            "Server startet"
        );

        let metriken = RelayMetrics::neu()?;
        let state = RelayState::neu(relay_config, metriken.clone());

        if self.config.observability.aktiviert {
            let obs_adresse = self.config.observability_bind_adresse()?;
            tokio::spawn(async move {
                if let Err(e) =
                    plauder_observability::observability_server_starten(obs_adresse, metriken).await
                {
                    tracing::error!(fehler = %e, "Observability-Server beendet");
                }
            });
        }

        let relay = RelayServer::binden(state, tcp_adresse).await?;
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let relay_task = tokio::spawn(relay.starten(shutdown_rx));

        tracing::info!("Server laeuft. Warte auf Shutdown-Signal (Ctrl-C)...");
        tokio::signal::ctrl_c().await?;
        tracing::info!("Shutdown-Signal empfangen, Server wird beendet");

        // Empfaenger koennen bereits beendet sein
        let _ = shutdown_tx.send(true);
        relay_task.await??;

        Ok(())
    }
}
