//! Subresource enumeration for Draft 2020-12, plus the walk machinery the
//! older dialects reuse.
use serde_json::Value;

use crate::{segments::Segment, Error, Resolver, ResourceRef, Segments};

pub(crate) type SubresourceIterator<'a> = Box<dyn Iterator<Item = &'a Value> + 'a>;

/// Iterator over the schema values found under a single keyword.
pub(crate) enum KeywordIter<'a> {
    Empty,
    Once(std::iter::Once<&'a Value>),
    Array(std::slice::Iter<'a, Value>),
    Object(serde_json::map::Values<'a>),
    FilteredObject(std::iter::Filter<serde_json::map::Values<'a>, fn(&&Value) -> bool>),
}

impl<'a> KeywordIter<'a> {
    pub(crate) fn once(value: &'a Value) -> Self {
        KeywordIter::Once(std::iter::once(value))
    }
    pub(crate) fn in_array(value: &'a Value) -> Self {
        value
            .as_array()
            .map_or(KeywordIter::Empty, |array| KeywordIter::Array(array.iter()))
    }
    pub(crate) fn in_subvalues(value: &'a Value) -> Self {
        value.as_object().map_or(KeywordIter::Empty, |object| {
            KeywordIter::Object(object.values())
        })
    }
    /// `dependencies` mixes schemas with property-name arrays; only the
    /// former are subresources.
    pub(crate) fn in_object_subvalues(value: &'a Value) -> Self {
        fn is_object(value: &&Value) -> bool {
            value.is_object()
        }
        value.as_object().map_or(KeywordIter::Empty, |object| {
            KeywordIter::FilteredObject(object.values().filter(is_object as fn(&&Value) -> bool))
        })
    }
    /// `items` is a single schema or, on older dialects, an array of them.
    pub(crate) fn in_items(value: &'a Value) -> Self {
        match value {
            Value::Array(array) => KeywordIter::Array(array.iter()),
            _ => KeywordIter::once(value),
        }
    }
}

impl<'a> Iterator for KeywordIter<'a> {
    type Item = &'a Value;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            KeywordIter::Empty => None,
            KeywordIter::Once(iter) => iter.next(),
            KeywordIter::Array(iter) => iter.next(),
            KeywordIter::Object(iter) => iter.next(),
            KeywordIter::FilteredObject(iter) => iter.next(),
        }
    }
}

pub(crate) fn subresources_of(contents: &Value) -> SubresourceIterator<'_> {
    match contents.as_object() {
        Some(schema) => Box::new(schema.iter().flat_map(|(key, value)| match key.as_str() {
            "additionalProperties" | "contains" | "contentSchema" | "else" | "if" | "items"
            | "not" | "propertyNames" | "then" | "unevaluatedItems" | "unevaluatedProperties" => {
                KeywordIter::once(value)
            }
            "allOf" | "anyOf" | "oneOf" | "prefixItems" => KeywordIter::in_array(value),
            "$defs" | "definitions" | "dependentSchemas" | "patternProperties" | "properties" => {
                KeywordIter::in_subvalues(value)
            }
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
    const IN_VALUE: &[&str] = &[
        "additionalProperties",
        "contains",
        "contentSchema",
        "else",
        "if",
        "items",
        "not",
        "propertyNames",
        "then",
        "unevaluatedItems",
        "unevaluatedProperties",
    ];
    const IN_CHILD: &[&str] = &[
        "allOf",
        "anyOf",
        "oneOf",
        "prefixItems",
        "$defs",
        "definitions",
        "dependentSchemas",
        "patternProperties",
        "properties",
    ];

    let mut iter = segments.iter();
    while let Some(segment) = iter.next() {
        if let Segment::Key(key) = segment {
            if !IN_VALUE.contains(&key.as_ref())
                && (!IN_CHILD.contains(&key.as_ref()) || iter.next().is_none())
            {
                return Ok(resolver.clone());
            }
        }
    }
    resolver.in_subresource(subresource)
}

/// Shared by Drafts 4–2019-09, where `items` may hold the schema directly
/// and `dependencies` may hold schemas among its values.
pub(crate) fn maybe_in_subresource_with_items_and_dependencies<'r>(
    segments: &Segments<'_>,
    resolver: &Resolver<'r>,
    subresource: ResourceRef<'r>,
    in_value: &[&str],
    in_child: &[&str],
) -> Result<Resolver<'r>, Error> {
    let mut iter = segments.iter();
    while let Some(segment) = iter.next() {
        if let Segment::Key(key) = segment {
            if (*key == "items" || *key == "dependencies") && subresource.contents().is_object() {
                return resolver.in_subresource(subresource);
            }
            if !in_value.contains(&key.as_ref())
                && (!in_child.contains(&key.as_ref()) || iter.next().is_none())
            {
                return Ok(resolver.clone());
            }
        }
    }
    resolver.in_subresource(subresource)
}
