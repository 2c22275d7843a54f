//! Background-verification webhook normalization.
//!
//! Each supported provider posts callbacks with a structurally distinct JSON
//! body and no usable sender authentication. Decoders fingerprint payloads by
//! shape alone and normalize them into one internal event model; the registry
//! tries decoders in a fixed order and keeps the first match.

pub mod checkr;
pub mod idfy;
pub mod ongrid;


use serde_json::Value;

use vigil_common::types::{Provider, VerificationOutcome};

/// Who a verification verdict is about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubjectRef {
    /// Volunteer id carried directly in the payload.
    Volunteer(String),
    /// External report reference; resolved against the stored
    /// background-check id by the webhook orchestrator.
    Report(String),
}

/// A provider callback normalized into the internal status model.
#[derive(Debug, Clone, PartialEq)]
pub struct VerificationEvent {
    pub subject: SubjectRef,
    pub outcome: VerificationOutcome,
    pub provider: Provider,
    /// Original payload, persisted verbatim for audit.
    pub raw: Value,
}

/// Trait that all provider-specific decoders must implement.
pub trait ProviderDecoder: Send + Sync {
    /// Attempt to normalize a raw webhook payload.
    /// Returns `None` if the payload doesn't carry this provider's fingerprint.
    fn decode(&self, payload: &Value) -> Option<VerificationEvent>;

    /// Human-readable name for this decoder (e.g., "idfy").
    fn name(&self) -> &'static str;
}

/// Registry of all provider decoders, used by the webhook route.
pub struct ProviderRegistry {
    decoders: Vec<Box<dyn ProviderDecoder>>,
}

impl ProviderRegistry {
    /// Create a new registry with all supported providers.
    ///
    /// Order matters: fingerprints are disjoint in practice, but a payload
    /// carrying several marker fields resolves to the earliest decoder.
    pub fn new() -> Self {
        Self {
            decoders: vec![
                Box::new(idfy::IdfyDecoder::new()),
                Box::new(ongrid::OngridDecoder::new()),
                Box::new(checkr::CheckrDecoder::new()),
            ],
        }
    }

    /// Try to normalize a payload using all registered decoders.
    /// Returns the first successful decode, or `None` for unknown shapes.
    pub fn normalize(&self, payload: &Value) -> Option<VerificationEvent> {
        for decoder in &self.decoders {
            if let Some(event) = decoder.decode(payload) {
                tracing::debug!(
                    provider = decoder.name(),
                    outcome = %event.outcome,
                    "Normalized verification webhook"
                );
                return Some(event);
            }
        }
        None
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}
