//! Metric and label names.

pub const READY_PODS: &str = "srv_ready_pods";
pub const READY_PODS_HELP: &str = "Number of current pods that are serving traffic to service.";

pub const NOT_READY_PODS: &str = "srv_not_ready_pods";
pub const NOT_READY_PODS_HELP: &str =
    "Number of current pods that are not serving traffic to service.";

pub const CYCLES_TOTAL: &str = "srv_exporter_cycles_total";
pub const CYCLES_TOTAL_HELP: &str = "Number of completed poll cycles.";

pub const QUERY_ERRORS_TOTAL: &str = "srv_exporter_query_errors_total";
pub const QUERY_ERRORS_TOTAL_HELP: &str = "Number of poll cycles skipped after a failed query.";

pub const EVENT_ERRORS_TOTAL: &str = "srv_exporter_event_errors_total";
pub const EVENT_ERRORS_TOTAL_HELP: &str = "Number of events that could not be forwarded.";

pub const LABEL_NAMESPACE: &str = "target_namespace";
pub const LABEL_SERVICE: &str = "target_endpoint";
