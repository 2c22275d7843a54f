//! Dispatch engine: token resolution, multicast delivery, queue processing,
//! token retirement, and verification-webhook orchestration.
//!
//! Every orchestrator works against the [`store::AlertStore`] and
//! [`vigil_push::PushTransport`] seams, so the pipeline logic is unit-tested
//! with in-memory fakes while the binaries wire in PostgreSQL and the real
//! push gateway.

pub mod alerts;
pub mod dispatcher;
pub mod queue;
pub mod reconciler;
pub mod resolver;
pub mod store;
pub mod verification;

#[cfg(test)]
pub mod testing;
