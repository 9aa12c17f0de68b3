use metrics_exporter_prometheus::PrometheusHandle;
use postwatch::watch::CycleOutcome;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

/// Shared state behind the status endpoints.
#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) last_cycle: Arc<Mutex<Option<CycleOutcome>>>,
}

impl AppState {
    pub(crate) fn new(metrics: PrometheusHandle) -> Self {
        Self {
            readiness: Arc::new(AtomicBool::new(false)),
            metrics: Arc::new(metrics),
            last_cycle: Arc::new(Mutex::new(None)),
        }
    }

    pub(crate) fn record_cycle(&self, outcome: CycleOutcome) {
        *self.last_cycle.lock().expect("cycle mutex poisoned") = Some(outcome);
    }
}
