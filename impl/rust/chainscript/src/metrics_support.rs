use std::net::SocketAddr;
use std::sync::OnceLock;

static INIT: OnceLock<()> = OnceLock::new();

const DEFAULT_ADDR: ([u8; 4], u16) = ([0, 0, 0, 0], 9464);

/// Install the Prometheus exporter once, if `CHAINSCRIPT_METRICS=1`.
pub fn ensure_exporter() {
    INIT.get_or_init(|| {
        if std::env::var("CHAINSCRIPT_METRICS").ok().as_deref() != Some("1") {
            return;
        }

        let addr = std::env::var("CHAINSCRIPT_METRICS_ADDR")
            .ok()
            .and_then(|s| s.parse::<SocketAddr>().ok())
            .unwrap_or_else(|| SocketAddr::from(DEFAULT_ADDR));

        let builder =
            metrics_exporter_prometheus::PrometheusBuilder::new().with_http_listener(addr);
        if let Err(e) = builder.install() {
            tracing::warn!(%addr, error = %e, "metrics exporter not installed");
        }
    });
}
