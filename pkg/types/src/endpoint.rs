use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;

/// Readiness membership of a Service at one point in time.
///
/// Counts are derived from the address lists and cannot be set on their own.
/// A snapshot is never modified after it is built; the next poll replaces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndpointSnapshot {
    ready_addresses: Vec<String>,
    not_ready_addresses: Vec<String>,
    captured_at: DateTime<FixedOffset>,
}

impl EndpointSnapshot {
    pub fn new(
        ready_addresses: Vec<String>,
        not_ready_addresses: Vec<String>,
        captured_at: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            ready_addresses,
            not_ready_addresses,
            captured_at,
        }
    }

    /// Build a snapshot stamped with the current UTC time.
    pub fn captured_now(ready_addresses: Vec<String>, not_ready_addresses: Vec<String>) -> Self {
        Self::new(
            ready_addresses,
            not_ready_addresses,
            Utc::now().fixed_offset(),
        )
    }

    pub fn ready_addresses(&self) -> &[String] {
        &self.ready_addresses
    }

    pub fn not_ready_addresses(&self) -> &[String] {
        &self.not_ready_addresses
    }

    pub fn ready_count(&self) -> usize {
        self.ready_addresses.len()
    }

    pub fn not_ready_count(&self) -> usize {
        self.not_ready_addresses.len()
    }

    pub fn captured_at(&self) -> DateTime<FixedOffset> {
        self.captured_at
    }
}
