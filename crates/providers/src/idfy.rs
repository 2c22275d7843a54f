use serde_json::Value;

use vigil_common::types::{Provider, VerificationOutcome};

use crate::{ProviderDecoder, SubjectRef, VerificationEvent};

/// Prefix prepended to the volunteer id when a check is ordered with IDfy.
const PROFILE_PREFIX: &str = "bgv_";

/// IDfy webhook decoder.
///
/// Fingerprint: a string `profile_id` at the top level. The verdict clears
/// only when the check both completed and came back clear; every other
/// combination (in progress, failed, consider) needs human review.
pub struct IdfyDecoder;

impl IdfyDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl Default for IdfyDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderDecoder for IdfyDecoder {
    fn decode(&self, payload: &Value) -> Option<VerificationEvent> {
        let profile_id = payload.get("profile_id")?.as_str()?;
        let volunteer_id = profile_id.strip_prefix(PROFILE_PREFIX).unwrap_or(profile_id);

        let completed = payload.get("status").and_then(Value::as_str) == Some("completed");
        let clear = payload.get("result").and_then(Value::as_str) == Some("clear");
        let outcome = if completed && clear {
            VerificationOutcome::Cleared
        } else {
            VerificationOutcome::ReviewRequired
        };

        Some(VerificationEvent {
            subject: SubjectRef::Volunteer(volunteer_id.to_string()),
            outcome,
            provider: Provider::Idfy,
            raw: payload.clone(),
        })
    }

    fn name(&self) -> &'static str {
        "idfy"
    }
}
