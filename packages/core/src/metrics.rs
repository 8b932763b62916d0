//! Prometheus metrics registry for the clinic ledger.
//!
//! [`AppMetrics`] owns all registered metrics and the [`Registry`] they
//! belong to. Construct it once at startup, wrap in `Arc`, and hand it to the
//! API state.
//!
//! Exposed at `GET /metrics` in Prometheus text exposition format
//! (`text/plain; version=0.0.4`).

use prometheus::{CounterVec, HistogramOpts, HistogramVec, Opts, Registry};

/// All application-level Prometheus metrics.
pub struct AppMetrics {
    /// Carry-forward batch runs, labelled by category and outcome.
    pub carry_forward_runs_total: CounterVec,
    /// Ledger rows written by successful batches, labelled by category.
    pub ledger_records_written_total: CounterVec,
    /// Batch wall-clock time in seconds, labelled by category.
    pub carry_forward_duration: HistogramVec,
    /// Payment and advance events recorded, labelled by category and kind.
    pub events_recorded_total: CounterVec,
    /// The registry that owns all of the above metrics.
    pub registry: Registry,
}

impl AppMetrics {
    /// Create and register all metrics.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let carry_forward_runs_total = CounterVec::new(
            Opts::new(
                "clinic_ledger_carry_forward_runs_total",
                "Carry-forward batch runs by category and outcome",
            ),
            &["category", "outcome"],
        )?;

        let ledger_records_written_total = CounterVec::new(
            Opts::new(
                "clinic_ledger_records_written_total",
                "Ledger rows written by carry-forward batches",
            ),
            &["category"],
        )?;

        let carry_forward_duration = HistogramVec::new(
            HistogramOpts::new(
                "clinic_ledger_carry_forward_duration_seconds",
                "Carry-forward batch duration in seconds",
            )
            .buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
            &["category"],
        )?;

        let events_recorded_total = CounterVec::new(
            Opts::new(
                "clinic_ledger_events_recorded_total",
                "Payment and advance events recorded",
            ),
            &["category", "kind"],
        )?;

        registry.register(Box::new(carry_forward_runs_total.clone()))?;
        registry.register(Box::new(ledger_records_written_total.clone()))?;
        registry.register(Box::new(carry_forward_duration.clone()))?;
        registry.register(Box::new(events_recorded_total.clone()))?;

        Ok(Self {
            carry_forward_runs_total,
            ledger_records_written_total,
            carry_forward_duration,
            events_recorded_total,
            registry,
        })
    }

    /// Render all metrics as Prometheus text format.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buf = Vec::new();
        encoder.encode(&metric_families, &mut buf)?;
        Ok(String::from_utf8(buf).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_metrics_register_without_error() {
        let metrics = AppMetrics::new();
        assert!(metrics.is_ok(), "AppMetrics::new() failed: {:?}", metrics.err());
    }

    #[test]
    fn run_counter_labels_work() {
        let metrics = AppMetrics::new().unwrap();
        metrics
            .carry_forward_runs_total
            .with_label_values(&["doctor", "success"])
            .inc();
        let val = metrics
            .carry_forward_runs_total
            .with_label_values(&["doctor", "success"])
            .get();
        assert!((val - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn render_contains_metric_names_after_use() {
        let metrics = AppMetrics::new().unwrap();
        metrics
            .ledger_records_written_total
            .with_label_values(&["staff"])
            .inc_by(4.0);
        metrics
            .carry_forward_duration
            .with_label_values(&["staff"])
            .observe(0.02);
        metrics
            .events_recorded_total
            .with_label_values(&["patient", "payment"])
            .inc();
        metrics
            .carry_forward_runs_total
            .with_label_values(&["staff", "failure"])
            .inc();

        let output = metrics.render().unwrap();
        assert!(output.contains("clinic_ledger_records_written_total{category=\"staff\"} 4"));
        assert!(output.contains("clinic_ledger_carry_forward_duration_seconds"));
        assert!(output.contains("clinic_ledger_events_recorded_total"));
        assert!(output.contains("clinic_ledger_carry_forward_runs_total"));
    }
}
