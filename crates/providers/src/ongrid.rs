use serde_json::Value;

use vigil_common::types::{Provider, VerificationOutcome};

use crate::{ProviderDecoder, SubjectRef, VerificationEvent};

/// Prefix prepended to the volunteer id when a check is ordered with OnGrid.
const VERIFICATION_PREFIX: &str = "ongrid_";

/// OnGrid webhook decoder.
///
/// Fingerprint: a string `verification_id` at the top level. The verdict
/// clears only when the check completed and `result.overall` came back
/// clear; every other combination needs human review.
pub struct OngridDecoder;

impl OngridDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl Default for OngridDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderDecoder for OngridDecoder {
    fn decode(&self, payload: &Value) -> Option<VerificationEvent> {
        let verification_id = payload.get("verification_id")?.as_str()?;
        let volunteer_id = verification_id
            .strip_prefix(VERIFICATION_PREFIX)
            .unwrap_or(verification_id);

        let completed = payload.get("status").and_then(Value::as_str) == Some("completed");
        let overall = payload
            .get("result")
            .and_then(|result| result.get("overall"))
            .and_then(Value::as_str);
        let outcome = if completed && overall == Some("clear") {
            VerificationOutcome::Cleared
        } else {
            VerificationOutcome::ReviewRequired
        };

        Some(VerificationEvent {
            subject: SubjectRef::Volunteer(volunteer_id.to_string()),
            outcome,
            provider: Provider::Ongrid,
            raw: payload.clone(),
        })
    }

    fn name(&self) -> &'static str {
        "ongrid"
    }
}
