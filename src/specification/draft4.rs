use serde_json::Value;

use crate::{Error, Resolver, ResourceRef, Segments};

use super::subresources::{self, KeywordIter, SubresourceIterator};

pub(crate) fn subresources_of(contents: &Value) -> SubresourceIterator<'_> {
    match contents.as_object() {
        Some(schema) => Box::new(schema.iter().flat_map(|(key, value)| match key.as_str() {
            "not" => KeywordIter::once(value),
            // Draft 4 allows booleans here, which are not schemas
            "additionalItems" | "additionalProperties" if value.is_object() => {
                KeywordIter::once(value)
            }
            "allOf" | "anyOf" | "oneOf" => KeywordIter::in_array(value),
            "definitions" | "patternProperties" | "properties" => KeywordIter::in_subvalues(value),
            "items" => KeywordIter::in_items(value),
            "dependencies" => KeywordIter::in_object_subvalues(value),
            _ => KeywordIter::Empty,
        })),
        None => Box::new(std::iter::empty()),
    }
}

pub(crate) fn maybe_in_subresource<'r>(
    segments: &Segments<'_>,
    resolver: &Resolver<'r>,
    subresource: ResourceRef<'r>,
) -> Result<Resolver<'r>, Error> {
    const IN_VALUE: &[&str] = &["additionalItems", "additionalProperties", "not"];
    const IN_CHILD: &[&str] = &[
        "allOf",
        "anyOf",
        "oneOf",
        "definitions",
        "patternProperties",
        "properties",
    ];
    subresources::maybe_in_subresource_with_items_and_dependencies(
        segments,
        resolver,
        subresource,
        IN_VALUE,
        IN_CHILD,
    )
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::subresources_of;

    #[test]
    fn booleans_under_additional_keywords_are_not_schemas() {
        let schema = json!({
            "additionalProperties": true,
            "additionalItems": false,
            "not": {"type": "string"}
        });
        let found: Vec<_> = subresources_of(&schema).collect();
        assert_eq!(found, vec![&json!({"type": "string"})]);
    }

    #[test]
    fn dependencies_skip_property_lists() {
        let schema = json!({
            "dependencies": {
                "a": {"type": "object"},
                "b": ["a"]
            }
        });
        let found: Vec<_> = subresources_of(&schema).collect();
        assert_eq!(found, vec![&json!({"type": "object"})]);
    }

    #[test]
    fn items_array_form() {
        let schema = json!({"items": [{"type": "number"}, {"type": "boolean"}]});
        assert_eq!(subresources_of(&schema).count(), 2);
    }
}
