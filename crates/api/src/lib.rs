//! HTTP surface for the Vigil notification service.
//!
//! Endpoints:
//! - GET  /health — liveness probe
//! - POST /api/alerts/sos — synchronous SOS fan-out (JWT protected)
//! - POST /api/alerts/escort — escort request fan-out (JWT protected)
//! - POST /api/webhooks/verification — background-check provider callbacks

pub mod middleware;
pub mod routes;
pub mod state;
