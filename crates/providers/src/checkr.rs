use serde_json::Value;

use vigil_common::types::{Provider, VerificationOutcome};

use crate::{ProviderDecoder, SubjectRef, VerificationEvent};

/// Checkr webhook decoder.
///
/// Fingerprint: a string `report_id` nested under `data.object`. Checkr
/// callbacks never embed the volunteer id, so the subject is the external
/// report reference and the caller resolves it against stored check ids.
pub struct CheckrDecoder;

impl CheckrDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CheckrDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderDecoder for CheckrDecoder {
    fn decode(&self, payload: &Value) -> Option<VerificationEvent> {
        let object = payload.get("data")?.get("object")?;
        let report_id = object.get("report_id")?.as_str()?;

        let clear = object.get("status").and_then(Value::as_str) == Some("clear");
        let outcome = if clear {
            VerificationOutcome::Cleared
        } else {
            VerificationOutcome::ReviewRequired
        };

        Some(VerificationEvent {
            subject: SubjectRef::Report(report_id.to_string()),
            outcome,
            provider: Provider::Checkr,
            raw: payload.clone(),
        })
    }

    fn name(&self) -> &'static str {
        "checkr"
    }
}
