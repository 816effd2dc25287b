//! Server metrics definitions
//!
//! OpenTelemetry instruments for the dispatcher and the WebSocket transport.
//! They are recorded through the global meter provider, so nothing is
//! exported until `jreg_core::init_observability` installs one with metrics
//! enabled.
//!
//! # Metrics Collected
//!
//! - **requests_total**: requests dispatched, by method and status (counter)
//! - **request_duration**: handler latency in seconds (histogram)
//! - **errors_total**: error responses, by JSON-RPC code (counter)
//! - **batch_size**: entries per batch body (histogram)
//! - **methods_registered**: size of the registry (gauge)
//! - **connections_active**: open WebSocket connections (gauge)
//!
//! # Examples
//!
//! ```rust,no_run
//! use jreg_server::ServerMetrics;
//!
//! let metrics = ServerMetrics::new("my-service");
//! metrics.record_request("jsonrpc.test", "success", 0.025);
//! metrics.record_error(-32601);
//! ```

use opentelemetry::{
    global,
    metrics::{Counter, Gauge, Histogram, Meter},
    KeyValue,
};

/// Dispatcher and transport metrics
///
/// All instruments are prefixed with `jreg.server.*`.
pub struct ServerMetrics {
    pub requests_total: Counter<u64>,
    pub request_duration: Histogram<f64>,
    pub errors_total: Counter<u64>,
    pub batch_size: Histogram<u64>,
    pub methods_registered: Gauge<u64>,
    pub connections_active: Gauge<i64>,
}

impl ServerMetrics {
    /// Create metrics on the global meter named `service_name`
    pub fn new(service_name: impl Into<String>) -> Self {
        // the global meter wants a 'static name; one leak per process
        let name: &'static str = Box::leak(service_name.into().into_boxed_str());
        let meter = global::meter(name);
        Self::new_with_meter(&meter)
    }

    /// Create metrics on a caller-supplied meter
    pub fn new_with_meter(meter: &Meter) -> Self {
        Self {
            requests_total: meter
                .u64_counter("jreg.server.requests.total")
                .with_description("Total number of requests dispatched")
                .build(),
            request_duration: meter
                .f64_histogram("jreg.server.request.duration")
                .with_description("Method execution duration in seconds")
                .build(),
            errors_total: meter
                .u64_counter("jreg.server.errors.total")
                .with_description("Total number of error responses")
                .build(),
            batch_size: meter
                .u64_histogram("jreg.server.batch.size")
                .with_description("Number of requests in batch bodies")
                .build(),
            methods_registered: meter
                .u64_gauge("jreg.server.methods.registered")
                .with_description("Number of registered methods")
                .build(),
            connections_active: meter
                .i64_gauge("jreg.server.connections.active")
                .with_description("Number of open WebSocket connections")
                .build(),
        }
    }

    /// Record a dispatched request
    pub fn record_request(&self, method: &str, status: &str, duration_secs: f64) {
        let attributes = &[
            KeyValue::new("method", method.to_string()),
            KeyValue::new("status", status.to_string()),
        ];
        self.requests_total.add(1, attributes);
        self.request_duration.record(duration_secs, attributes);
    }

    /// Record an error response by its wire code
    pub fn record_error(&self, code: i32) {
        self.errors_total
            .add(1, &[KeyValue::new("code", i64::from(code))]);
    }

    pub fn record_batch(&self, size: u64) {
        self.batch_size.record(size, &[]);
    }

    pub fn record_registry_size(&self, count: u64) {
        self.methods_registered.record(count, &[]);
    }

    pub fn record_connections(&self, active: i64) {
        self.connections_active.record(active, &[]);
    }
}
