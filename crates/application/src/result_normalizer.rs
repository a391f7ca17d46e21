use serde_json::Value;

use crate::capability_router::RawResult;

/// Coerces a payload into an ordered record sequence.
///
/// Arrays are kept in order, `null` and absence become an empty sequence, and
/// any other value becomes a one-element sequence.
#[must_use]
pub fn normalize(raw: Option<Value>) -> Vec<Value> {
    match raw {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(records)) => records,
        Some(record) => vec![record],
    }
}

/// Extracts the records wrapped in an object envelope.
///
/// Payloads that are not objects, or objects without the field, are returned
/// unchanged so the object itself is treated as the record.
#[must_use]
pub fn unwrap_envelope(raw: Value, envelope_field: Option<&str>) -> Value {
    let Some(field) = envelope_field else {
        return raw;
    };

    match raw {
        Value::Object(mut object) if object.contains_key(field) => {
            object.remove(field).unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// Normalizes a routed payload, honouring its binding's envelope field.
#[must_use]
pub fn normalize_result(raw: RawResult) -> Vec<Value> {
    normalize(Some(unwrap_envelope(
        raw.payload,
        raw.envelope_field.as_deref(),
    )))
}
