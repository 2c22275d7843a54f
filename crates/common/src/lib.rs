//! Shared foundation for the Vigil dispatch services.
//!
//! Holds the configuration loader, database pool helper, the common error
//! type, and the domain types persisted by the store.

pub mod config;
pub mod db;
pub mod error;
pub mod types;
