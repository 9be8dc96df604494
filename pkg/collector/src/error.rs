//! Error taxonomy for the poll-reconcile-publish loop.

use std::fmt;
use thiserror::Error;

/// Boxed upstream cause.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Which client a connection failure concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientTarget {
    Platform,
    EventSink,
}

impl fmt::Display for ClientTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientTarget::Platform => write!(f, "platform"),
            ClientTarget::EventSink => write!(f, "event sink"),
        }
    }
}

#[derive(Debug, Error)]
pub enum CollectorError {
    /// A client could not be established.
    #[error("{target} client connection failed: {source}")]
    Connection {
        target: ClientTarget,
        #[source]
        source: BoxError,
    },

    /// A single endpoints read failed.
    #[error("endpoints query for {namespace}/{service} failed: {source}")]
    Query {
        service: String,
        namespace: String,
        #[source]
        source: BoxError,
    },

    /// An event could not be forwarded.
    #[error("event delivery to dataset {dataset} failed: {reason}")]
    Publish { dataset: String, reason: String },
}

impl CollectorError {
    pub fn connection(target: ClientTarget, source: impl Into<BoxError>) -> Self {
        CollectorError::Connection {
            target,
            source: source.into(),
        }
    }

    pub fn query(service: &str, namespace: &str, source: impl Into<BoxError>) -> Self {
        CollectorError::Query {
            service: service.to_string(),
            namespace: namespace.to_string(),
            source: source.into(),
        }
    }

    /// Only a platform connection failure stops the loop.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            CollectorError::Connection {
                target: ClientTarget::Platform,
                ..
            }
        )
    }
}

pub type CollectorResult<T> = Result<T, CollectorError>;
