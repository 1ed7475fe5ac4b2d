use axum::{routing::get, Router};
use metrics::{describe_counter, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::genai::token::TOKEN_TTL;

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Initialize the Prometheus recorder and describe the engine's series.
    pub fn init() -> Self {
        let builder = PrometheusBuilder::new();

        let handle = builder
            .install_recorder()
            .expect("prometheus: install recorder");

        describe_counter!(
            "overview_section_failures_total",
            "Overview sections degraded by a failed warehouse query."
        );
        describe_counter!(
            "genai_model_fallbacks_total",
            "Model candidates skipped after a not-found reply."
        );
        describe_counter!("genai_generate_total", "Successful generative calls.");

        // Static gauge with the configured token TTL.
        gauge!("genai_token_ttl_seconds").set(TOKEN_TTL.as_secs() as f64);

        Self { handle }
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
