use serde::Serialize;

use crate::endpoint::EndpointSnapshot;

/// Structured event forwarded to the event sink once per published cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndpointEvent {
    /// RFC 3339 capture time, with offset.
    pub timestamp: String,
    pub namespace: String,
    pub service: String,
    pub ready_count: usize,
    pub ready_ips: Vec<String>,
    pub not_ready_count: usize,
    pub not_ready_ips: Vec<String>,
}

impl EndpointEvent {
    pub fn from_snapshot(snapshot: &EndpointSnapshot, namespace: &str, service: &str) -> Self {
        Self {
            timestamp: snapshot.captured_at().to_rfc3339(),
            namespace: namespace.to_string(),
            service: service.to_string(),
            ready_count: snapshot.ready_count(),
            ready_ips: snapshot.ready_addresses().to_vec(),
            not_ready_count: snapshot.not_ready_count(),
            not_ready_ips: snapshot.not_ready_addresses().to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    #[test]
    fn payload_mirrors_snapshot() {
        let at = DateTime::parse_from_rfc3339("2024-05-01T12:00:00+00:00").unwrap();
        let snap = EndpointSnapshot::new(
            vec!["10.0.0.1".into(), "10.0.0.2".into()],
            vec!["10.0.0.3".into()],
            at,
        );
        let event = EndpointEvent::from_snapshot(&snap, "default", "web");

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["timestamp"], "2024-05-01T12:00:00+00:00");
        assert_eq!(json["ready_count"], 2);
        assert_eq!(json["ready_ips"], serde_json::json!(["10.0.0.1", "10.0.0.2"]));
        assert_eq!(json["not_ready_count"], 1);
        assert_eq!(json["not_ready_ips"], serde_json::json!(["10.0.0.3"]));
        assert_eq!(json["namespace"], "default");
        assert_eq!(json["service"], "web");
    }
}
