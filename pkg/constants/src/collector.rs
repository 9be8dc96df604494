//! Reconciliation loop defaults.

/// Default seconds between two fetch cycles.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;

/// Default dataset events are written to.
pub const DEFAULT_EVENT_DATASET: &str = "srv-exporter";

/// Maximum length of a service or namespace name (DNS-1123 label).
pub const MAX_NAME_LEN: usize = 63;
