//! Prometheus-kompatible Metriken fuer das Plauder-Relay
//!
//! Registrierte Metriken:
//! - `plauder_connected_sessions` – Gauge: Aktuell registrierte Sessions
//! - `plauder_sessions_total` – Counter: Erfolgreiche Handshakes seit Start
//! - `plauder_handshake_failures_total` – Counter: Abgebrochene Handshakes
//! - `plauder_frames_received_total` – Counter: Empfangene Frames (kind)
//! - `plauder_deliveries_total` – Counter: Erfolgreiche Zustellungen
//! - `plauder_delivery_failures_total` – Counter: Fehlgeschlagene Zustellungen

use anyhow::Result;
use axum::{extract::State, http, response::IntoResponse, routing::get, Router};
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use std::sync::Arc;

/// Alle Relay-Prometheus-Metriken
///
/// Clone teilt die Registry und alle Zaehler.
#[derive(Clone)]
pub struct RelayMetrics {
    pub registry: Arc<Registry>,

    pub connected_sessions: IntGauge,
    pub sessions_total: IntCounter,
    pub handshake_failures_total: IntCounter,
    pub frames_received_total: IntCounterVec,
    pub deliveries_total: IntCounter,
    pub delivery_failures_total: IntCounter,
}

impl RelayMetrics {
    /// Erstellt und registriert alle Metriken in einer neuen Registry
    pub fn neu() -> Result<Self> {
        let registry = Registry::new();

        let connected_sessions = IntGauge::with_opts(Opts::new(
            "plauder_connected_sessions",
            "Anzahl aktuell registrierter Sessions",
        ))?;
        registry.register(Box::new(connected_sessions.clone()))?;

        let sessions_total = IntCounter::with_opts(Opts::new(
            "plauder_sessions_total",
            "Gesamtanzahl erfolgreicher Handshakes",
        ))?;
        registry.register(Box::new(sessions_total.clone()))?;

        let handshake_failures_total = IntCounter::with_opts(Opts::new(
            "plauder_handshake_failures_total",
            "Gesamtanzahl fehlgeschlagener Handshakes",
        ))?;
        registry.register(Box::new(handshake_failures_total.clone()))?;

        let frames_received_total = IntCounterVec::new(
            Opts::new(
                "plauder_frames_received_total",
                "Gesamtanzahl empfangener Frames nach Typ",
            ),
            &["kind"],
        )?;
        registry.register(Box::new(frames_received_total.clone()))?;

        let deliveries_total = IntCounter::with_opts(Opts::new(
            "plauder_deliveries_total",
            "Gesamtanzahl erfolgreicher Zustellungen an Empfaenger",
        ))?;
        registry.register(Box::new(deliveries_total.clone()))?;

        let delivery_failures_total = IntCounter::with_opts(Opts::new(
            "plauder_delivery_failures_total",
            "Gesamtanzahl fehlgeschlagener Zustellungen an Empfaenger",
        ))?;
        registry.register(Box::new(delivery_failures_total.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            connected_sessions,
            sessions_total,
            handshake_failures_total,
            frames_received_total,
            deliveries_total,
            delivery_failures_total,
        })
    }

    /// Zaehlt einen empfangenen Frame (`kind` = "text" oder "binary")
    pub fn frame_empfangen(&self, kind: &str) {
        self.frames_received_total.with_label_values(&[kind]).inc();
    }

    /// Exportiert alle Metriken im Prometheus-Textformat
    pub fn exportieren(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

/// Axum-Router fuer den `/metrics`-Endpunkt
pub fn metrics_router(metriken: RelayMetrics) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metriken)
}

async fn metrics_handler(State(metriken): State<RelayMetrics>) -> impl IntoResponse {
    match metriken.exportieren() {
        Ok(text) => (
            http::StatusCode::OK,
            [(http::header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(err) => {
            tracing::error!("Metriken-Export fehlgeschlagen: {err}");
            http::StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metriken_erstellen_erfolgreich() {
        let metriken = RelayMetrics::neu().unwrap();
        assert!(!metriken.registry.gather().is_empty());
    }

    #[test]
    fn gauge_connected_sessions() {
        let metriken = RelayMetrics::neu().unwrap();
        metriken.connected_sessions.inc();
        metriken.connected_sessions.inc();
        metriken.connected_sessions.dec();
        assert_eq!(metriken.connected_sessions.get(), 1);
    }

    #[test]
    fn frames_nach_typ_zaehlen() {
        let metriken = RelayMetrics::neu().unwrap();
        metriken.frame_empfangen("text");
        metriken.frame_empfangen("text");
        metriken.frame_empfangen("binary");
        assert_eq!(
            metriken
                .frames_received_total
                .with_label_values(&["text"])
                .get(),
            2
        );
        assert_eq!(
            metriken
                .frames_received_total
                .with_label_values(&["binary"])
                .get(),
            1
        );
    }

    #[test]
    fn clone_teilt_zaehler() {
        let metriken = RelayMetrics::neu().unwrap();
        let kopie = metriken.clone();
        kopie.deliveries_total.inc_by(3);
        assert_eq!(metriken.deliveries_total.get(), 3);
    }

    #[test]
    fn metriken_export_prometheus_format() {
        let metriken = RelayMetrics::neu().unwrap();
        metriken.connected_sessions.set(5);
        metriken.delivery_failures_total.inc();
        metriken.frame_empfangen("binary");

        let output = metriken.exportieren().unwrap();
        assert!(output.contains("plauder_connected_sessions 5"));
        assert!(output.contains("plauder_delivery_failures_total 1"));
        assert!(output.contains("plauder_frames_received_total{kind=\"binary\"} 1"));
        assert!(output.contains("# HELP"));
        assert!(output.contains("# TYPE"));
    }
}
