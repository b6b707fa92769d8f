//! Prometheus metrics & middleware helper.

use actix_web_prom::{PrometheusMetrics, PrometheusMetricsBuilder};
use once_cell::sync::Lazy;
use prometheus::{IntCounter, IntGauge};

pub static ACTIVE_MATCHES: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("siege_active_matches", "Matches with a running task").expect("gauge")
});

pub static OPEN_LOBBIES: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("siege_open_lobbies", "Lobbies that have not started yet").expect("gauge")
});

pub static CONNECTED_SESSIONS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("siege_connected_sessions", "Open WebSocket sessions").expect("gauge")
});

pub static TICKS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("siege_ticks_total", "Simulation ticks advanced").expect("counter")
});

pub static INTENTS_REJECTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("siege_intents_rejected_total", "Player intents refused by validation")
        .expect("counter")
});

/// Global Prometheus handle reused in tests; also exports the game gauges.
pub static METRICS: Lazy<PrometheusMetrics> = Lazy::new(|| {
    let prom = PrometheusMetricsBuilder::new("api")
        .endpoint("/metrics") // exposed URL
        .build()
        .expect("metrics builder");

    let collectors: [Box<dyn prometheus::core::Collector>; 5] = [
        Box::new(ACTIVE_MATCHES.clone()),
        Box::new(OPEN_LOBBIES.clone()),
        Box::new(CONNECTED_SESSIONS.clone()),
        Box::new(TICKS.clone()),
        Box::new(INTENTS_REJECTED.clone()),
    ];
    for c in collectors {
        if let Err(e) = prom.registry.register(c) {
            log::warn!("metric registration failed: {e}");
        }
    }
    prom
});
