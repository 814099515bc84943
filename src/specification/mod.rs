use core::fmt;
use std::hash::{Hash, Hasher};

use serde_json::Value;

mod draft201909;
mod draft4;
mod draft6;
mod draft7;
mod ids;
mod subresources;

use crate::{
    anchors::{self, Anchor},
    Error, Resolver, Resource, ResourceRef, Segments,
};
pub(crate) use subresources::SubresourceIterator;

type IdFn = for<'a> fn(&'a Value) -> Option<&'a str>;
type SubresourcesFn = for<'a> fn(&'a Value) -> SubresourceIterator<'a>;
type AnchorsFn =
    for<'a> fn(&'static Specification, &'a Value) -> Box<dyn Iterator<Item = Anchor> + 'a>;
type InSubresourceFn = for<'r, 's, 'p> fn(
    &'s Segments<'p>,
    &'s Resolver<'r>,
    ResourceRef<'r>,
) -> Result<Resolver<'r>, Error>;

/// The rules under which a resource is interpreted: how its identifier is
/// found, which anchors it exposes, and where its subresources live.
///
/// The JSON Schema dialects ship as the [`DRAFT4`] … [`DRAFT202012`]
/// constants; a new dialect is added by defining another descriptor, not by
/// touching the engine.
pub struct Specification {
    name: &'static str,
    meta_schema: &'static str,
    id_of: IdFn,
    subresources_of: SubresourcesFn,
    anchors_in: AnchorsFn,
    maybe_in_subresource: InSubresourceFn,
}

/// JSON Schema Draft 4.
pub static DRAFT4: Specification = Specification {
    name: "draft-04",
    meta_schema: "http://json-schema.org/draft-04/schema#",
    id_of: ids::legacy_id,
    subresources_of: draft4::subresources_of,
    anchors_in: anchors::legacy_id_anchor,
    maybe_in_subresource: draft4::maybe_in_subresource,
};

/// JSON Schema Draft 6.
pub static DRAFT6: Specification = Specification {
    name: "draft-06",
    meta_schema: "http://json-schema.org/draft-06/schema#",
    id_of: ids::legacy_dollar_id,
    subresources_of: draft6::subresources_of,
    anchors_in: anchors::legacy_dollar_id_anchor,
    maybe_in_subresource: draft6::maybe_in_subresource,
};

/// JSON Schema Draft 7.
pub static DRAFT7: Specification = Specification {
    name: "draft-07",
    meta_schema: "http://json-schema.org/draft-07/schema#",
    id_of: ids::legacy_dollar_id,
    subresources_of: draft7::subresources_of,
    anchors_in: anchors::legacy_dollar_id_anchor,
    maybe_in_subresource: draft7::maybe_in_subresource,
};

/// JSON Schema Draft 2019-09.
pub static DRAFT201909: Specification = Specification {
    name: "draft2019-09",
    meta_schema: "https://json-schema.org/draft/2019-09/schema",
    id_of: ids::dollar_id,
    subresources_of: draft201909::subresources_of,
    anchors_in: anchors::dollar_anchor,
    maybe_in_subresource: draft201909::maybe_in_subresource,
};

/// JSON Schema Draft 2020-12.
pub static DRAFT202012: Specification = Specification {
    name: "draft2020-12",
    meta_schema: "https://json-schema.org/draft/2020-12/schema",
    id_of: ids::dollar_id,
    subresources_of: subresources::subresources_of,
    anchors_in: anchors::dollar_and_dynamic_anchors,
    maybe_in_subresource: subresources::maybe_in_subresource,
};

fn by_meta_schema(uri: &str) -> Option<&'static Specification> {
    match uri.trim_end_matches('#') {
        "https://json-schema.org/draft/2020-12/schema" => Some(&DRAFT202012),
        "https://json-schema.org/draft/2019-09/schema" => Some(&DRAFT201909),
        "http://json-schema.org/draft-07/schema" => Some(&DRAFT7),
        "http://json-schema.org/draft-06/schema" => Some(&DRAFT6),
        "http://json-schema.org/draft-04/schema" => Some(&DRAFT4),
        _ => None,
    }
}

impl Specification {
    /// Short name of the dialect, e.g. `draft2020-12`.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }
    /// URI of the dialect's meta-schema.
    #[must_use]
    pub fn meta_schema(&self) -> &'static str {
        self.meta_schema
    }
    /// Interpret the contents under this dialect, bypassing detection.
    #[must_use]
    pub fn create_resource(&'static self, contents: Value) -> Resource {
        Resource::new(contents, self)
    }
    #[must_use]
    pub fn create_resource_ref<'a>(&'static self, contents: &'a Value) -> ResourceRef<'a> {
        ResourceRef::new(contents, self)
    }
    /// Find the dialect the contents declare via `$schema`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CannotDetermineSpecification`] when `$schema` is
    /// absent, not a string, or unrecognized.
    pub fn detect(contents: &Value) -> Result<&'static Specification, Error> {
        match contents
            .as_object()
            .and_then(|schema| schema.get("$schema"))
            .and_then(Value::as_str)
        {
            Some(meta_schema) => by_meta_schema(meta_schema)
                .ok_or_else(|| Error::cannot_determine_specification(contents.clone())),
            None => Err(Error::cannot_determine_specification(contents.clone())),
        }
    }
    /// Like [`Specification::detect`], but contents without a `$schema` of
    /// their own fall back to the given dialect. Subresources inherit their
    /// parent's dialect this way.
    pub(crate) fn detect_or(
        contents: &Value,
        default: &'static Specification,
    ) -> Result<&'static Specification, Error> {
        match contents.as_object().and_then(|schema| schema.get("$schema")) {
            Some(meta_schema) => match meta_schema.as_str() {
                Some(meta_schema) => by_meta_schema(meta_schema)
                    .ok_or_else(|| Error::cannot_determine_specification(contents.clone())),
                None => Err(Error::cannot_determine_specification(contents.clone())),
            },
            None => Ok(default),
        }
    }
    /// The resource's internal identifier, as this dialect understands it.
    #[must_use]
    pub fn id_of<'a>(&self, contents: &'a Value) -> Option<&'a str> {
        (self.id_of)(contents)
    }
    /// Child values which are themselves schemas under this dialect.
    pub fn subresources_of<'a>(&self, contents: &'a Value) -> Box<dyn Iterator<Item = &'a Value> + 'a> {
        (self.subresources_of)(contents)
    }
    /// Anchors this resource exposes under this dialect.
    pub fn anchors_in<'a>(
        &'static self,
        contents: &'a Value,
    ) -> Box<dyn Iterator<Item = Anchor> + 'a> {
        (self.anchors_in)(self, contents)
    }
    pub(crate) fn maybe_in_subresource<'r>(
        &self,
        segments: &Segments<'_>,
        resolver: &Resolver<'r>,
        subresource: ResourceRef<'r>,
    ) -> Result<Resolver<'r>, Error> {
        (self.maybe_in_subresource)(segments, resolver, subresource)
    }
}

impl fmt::Debug for Specification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Specification")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl PartialEq for Specification {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}

impl Eq for Specification {}

impl Hash for Specification {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}
