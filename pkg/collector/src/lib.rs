//! Poll-reconcile-publish loop for a single Service's endpoint readiness.
//!
//! [`reconcile::ReconciliationLoop`] owns the configuration and both lazily
//! connected clients; [`fetcher::EndpointFetcher`] turns one endpoints read
//! into an [`pkg_types::endpoint::EndpointSnapshot`].

pub mod error;
pub mod fetcher;
pub mod handle;
pub mod platform;
pub mod reconcile;
pub mod sink;

#[cfg(test)]
mod testing;

pub use error::{ClientTarget, CollectorError, CollectorResult};
pub use reconcile::{CycleOutcome, LoopState, ReconciliationLoop};
