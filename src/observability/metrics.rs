use prometheus::{
    Encoder, GaugeVec, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

use crate::models::driver::Driver;
use crate::models::geofence::GeofenceViolation;

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub assignments_total: IntCounterVec,
    pub assignment_latency_seconds: HistogramVec,
    pub geofence_checks_total: IntCounter,
    pub geofence_violations_total: IntCounter,
    pub driver_utilization: GaugeVec,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let assignments_total = IntCounterVec::new(
            Opts::new("assignments_total", "Total trip assignments by outcome"),
            &["outcome"],
        )
        .expect("valid assignments_total metric");

        let assignment_latency_seconds = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "assignment_latency_seconds",
                "Latency of assignment commands in seconds",
            ),
            &["outcome"],
        )
        .expect("valid assignment_latency_seconds metric");

        let geofence_checks_total =
            IntCounter::new("geofence_checks_total", "Coordinates evaluated against geofences")
                .expect("valid geofence_checks_total metric");

        let geofence_violations_total = IntCounter::new(
            "geofence_violations_total",
            "Geofence boundary violations detected",
        )
        .expect("valid geofence_violations_total metric");

        let driver_utilization = GaugeVec::new(
            Opts::new("driver_utilization", "Committed tonnage over vehicle capacity [0..1]"),
            &["driver_id"],
        )
        .expect("valid driver_utilization metric");

        registry
            .register(Box::new(assignments_total.clone()))
            .expect("register assignments_total");
        registry
            .register(Box::new(assignment_latency_seconds.clone()))
            .expect("register assignment_latency_seconds");
        registry
            .register(Box::new(geofence_checks_total.clone()))
            .expect("register geofence_checks_total");
        registry
            .register(Box::new(geofence_violations_total.clone()))
            .expect("register geofence_violations_total");
        registry
            .register(Box::new(driver_utilization.clone()))
            .expect("register driver_utilization");

        Self {
            registry,
            assignments_total,
            assignment_latency_seconds,
            geofence_checks_total,
            geofence_violations_total,
            driver_utilization,
        }
    }

    pub fn observe_assignment(&self, outcome: &str, elapsed_seconds: f64) {
        self.assignment_latency_seconds
            .with_label_values(&[outcome])
            .observe(elapsed_seconds);
        self.assignments_total.with_label_values(&[outcome]).inc();
    }

    pub fn observe_driver(&self, driver: &Driver) {
        self.driver_utilization
            .with_label_values(&[&driver.id.to_string()])
            .set(driver.utilization());
    }

    pub fn observe_geofence_check(&self, results: &[GeofenceViolation]) {
        self.geofence_checks_total.inc();
        let violations = results.iter().filter(|r| r.is_violation).count();
        self.geofence_violations_total.inc_by(violations as u64);
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

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
