use muster_models::snapshot::ParsedSnapshot;
use serde_json::Value;

/// Decode one stored snapshot slot.
///
/// Never fails: blank, malformed or non-object payloads all read as absent so
/// that reports can be built over every stored row.
pub fn parse_snapshot(raw: Option<&str>) -> Option<ParsedSnapshot> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty())?;
    let value = match serde_json::from_str::<Value>(raw) {
        Ok(value) => value,
        Err(err) => {
            tracing::debug!("audit snapshot is not valid json: {err}");
            return None;
        }
    };

    match value {
        // Older write paths stored the serialized object as a JSON string.
        Value::String(inner) => serde_json::from_str::<Value>(&inner)
            .ok()
            .and_then(ParsedSnapshot::from_value),
        other => ParsedSnapshot::from_value(other),
    }
}
