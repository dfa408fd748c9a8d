use prometheus::{
    Encoder, GaugeVec, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub position_samples_total: IntCounterVec,
    pub active_trackings: IntGauge,
    pub position_fetch_seconds: HistogramVec,
    pub driver_speed_kmh: GaugeVec,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let position_samples_total = IntCounterVec::new(
            Opts::new("position_samples_total", "Total position samples by outcome"),
            &["outcome"],
        )
        .expect("valid position_samples_total metric");

        let active_trackings =
            IntGauge::new("active_trackings", "Current number of tracked orders")
                .expect("valid active_trackings metric");

        let position_fetch_seconds = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "position_fetch_seconds",
                "Latency of on-demand position fetches in seconds",
            ),
            &["outcome"],
        )
        .expect("valid position_fetch_seconds metric");

        let driver_speed_kmh = GaugeVec::new(
            Opts::new("driver_speed_kmh", "Last reported driver speed in km/h"),
            &["driver_id"],
        )
        .expect("valid driver_speed_kmh metric");

        registry
            .register(Box::new(position_samples_total.clone()))
            .expect("register position_samples_total");
        registry
            .register(Box::new(active_trackings.clone()))
            .expect("register active_trackings");
        registry
            .register(Box::new(position_fetch_seconds.clone()))
            .expect("register position_fetch_seconds");
        registry
            .register(Box::new(driver_speed_kmh.clone()))
            .expect("register driver_speed_kmh");

        Self {
            registry,
            position_samples_total,
            active_trackings,
            position_fetch_seconds,
            driver_speed_kmh,
        }
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}
