use growatt_rs::display::{DisplaySink, LogDisplay};
use growatt_rs::model::PowerReading;
use growatt_rs::status::{LogStatus, Status, StatusIndicator};
use num::ToPrimitive;
use prometheus::{Encoder, IntCounter, IntGauge, TextEncoder};
use std::sync::Mutex;

lazy_static! {
    static ref POWER_GAUGE: IntGauge = register_int_gauge!(opts!(
        "current_power",
        "current power reported by the inverter (in W)",
    ))
    .unwrap();
    static ref STATUS_GAUGE: IntGauge = register_int_gauge!(opts!(
        "status",
        "monitor status: 0 ready, 1 processing, 2 request in flight, 3 error",
    ))
    .unwrap();
    static ref ERRORS_COUNTER: IntCounter = register_int_counter!(opts!(
        "errors_total",
        "number of failures, a run of consecutive error signals counts once",
    ))
    .unwrap();
    static ref READINGS_COUNTER: IntCounter = register_int_counter!(opts!(
        "readings_total",
        "number of readings displayed",
    ))
    .unwrap();
}

/// Display that logs the readout and exports the reading.
pub struct MetricsDisplay(pub LogDisplay);

impl DisplaySink for MetricsDisplay {
    fn placeholder(&mut self) {
        self.0.placeholder();
    }

    fn render(&mut self, reading: &PowerReading) {
        self.0.render(reading);
        POWER_GAUGE.set(reading.watts);
        READINGS_COUNTER.inc();
    }
}

/// Status indicator that exports the status and counts failures.
pub struct MetricsStatus {
    inner: LogStatus,
    last: Mutex<Option<Status>>,
}

impl MetricsStatus {
    pub fn new(inner: LogStatus) -> Self {
        MetricsStatus {
            inner,
            last: Mutex::new(None),
        }
    }
}

impl StatusIndicator for MetricsStatus {
    fn show(&self, status: Status) {
        self.inner.show(status);
        /* A failure is signalled more than once on its way up */
        let previous = self.last.lock().unwrap().replace(status);
        if status == Status::Error && previous != Some(Status::Error) {
            ERRORS_COUNTER.inc();
        }
        if let Some(value) = status.to_i64() {
            STATUS_GAUGE.set(value);
        }
    }
}

/// Read metrics from Prometheus exporter registry.
pub fn read() -> Result<String, String> {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| e.to_string())?;
    String::from_utf8(buffer).map_err(|e| e.to_string())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn repeated_error_signals_count_once() {
        let status = MetricsStatus::new(LogStatus);
        let before = ERRORS_COUNTER.get();

        for signal in [
            Status::Processing,
            Status::Error,
            Status::Error,
            Status::Error,
            Status::Processing,
            Status::Error,
            Status::Ready,
        ] {
            status.show(signal);
        }

        assert_eq!(2, ERRORS_COUNTER.get() - before);
        assert_eq!(Status::Ready.to_i64(), Some(STATUS_GAUGE.get()));
    }
}
