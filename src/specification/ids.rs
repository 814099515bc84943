//! Per-dialect extraction of a resource's internal identifier.
use serde_json::Value;

/// `$id` as understood by Drafts 2019-09 and 2020-12.
pub(crate) fn dollar_id(contents: &Value) -> Option<&str> {
    contents
        .as_object()
        .and_then(|schema| schema.get("$id"))
        .and_then(Value::as_str)
}

/// `$id` as understood by Drafts 6 and 7: ignored next to `$ref`, and a
/// leading `#` marks a location-independent anchor rather than an identifier.
pub(crate) fn legacy_dollar_id(contents: &Value) -> Option<&str> {
    let schema = contents.as_object()?;
    if schema.contains_key("$ref") {
        return None;
    }
    schema
        .get("$id")
        .and_then(Value::as_str)
        .filter(|id| !id.starts_with('#'))
}

/// `id` as understood by Draft 4, with the same anchor and `$ref` carve-outs.
pub(crate) fn legacy_id(contents: &Value) -> Option<&str> {
    let schema = contents.as_object()?;
    if schema.contains_key("$ref") {
        return None;
    }
    schema
        .get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.starts_with('#'))
}
