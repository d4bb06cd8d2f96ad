use axum::{routing::get, Router};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the global Prometheus recorder. Call once, from the binary.
    pub fn init() -> anyhow::Result<Self> {
        let handle = PrometheusBuilder::new().install_recorder()?;

        metrics::describe_counter!(
            "quiz_decisions_total",
            "Decisions returned, by action and by what produced them"
        );
        metrics::describe_counter!(
            "classifier_failures_total",
            "Classifier calls that fell back to heuristics, by failure kind"
        );
        metrics::describe_counter!(
            "delivery_failures_total",
            "Failed log/lead deliveries, by sink"
        );

        Ok(Self { handle })
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
