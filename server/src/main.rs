//! Plauder Server – Einstiegspunkt
//!
//! Laedt die Konfiguration, initialisiert das Logging und startet den Server.

use anyhow::Result;
use plauder_observability::logging::{log_format_gueltig, log_level_gueltig};
use plauder_server::{config::ServerConfig, Server};

#[tokio::main]
async fn main() -> Result<()> {
    // Konfigurationsdatei-Pfad aus Umgebungsvariable oder Standard
    let config_pfad = std::env::var("PLAUDER_CONFIG").unwrap_or_else(|_| "config.toml".into());

    // Konfiguration laden (Standardwerte falls Datei fehlt)
    let config = ServerConfig::laden(&config_pfad)?;

    plauder_observability::logging_initialisieren(&config.logging.level, &config.logging.format);

    if !log_level_gueltig(&config.logging.level) {
        tracing::warn!(level = %config.logging.level, "Unbekannter Log-Level, verwende Filter-Direktive unveraendert");
    }
    if !log_format_gueltig(&config.logging.format) {
        tracing::warn!(format = %config.logging.format, "Unbekanntes Log-Format, verwende text");
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %config_pfad,
        "Plauder Server wird initialisiert"
    );

    let server = Server::neu(config);
    server.starten().await?;

    Ok(())
}
