use std::sync::Arc;

use serde_json::Value;

mod keys;

use crate::{Error, Resolved, Resolver, Resource, Specification};
pub(crate) use keys::{AnchorKey, AnchorKeyRef};

/// A named location within a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Anchor {
    /// A plain-name anchor; resolves to the resource that declared it.
    Plain { name: String, resource: Arc<Resource> },
    /// A `$dynamicAnchor`; its target depends on the dynamic scope of the
    /// resolution that reaches it.
    Dynamic { name: String, resource: Arc<Resource> },
}

impl Anchor {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Anchor::Plain { name, .. } | Anchor::Dynamic { name, .. } => name,
        }
    }
    /// The resource which declared this anchor.
    #[must_use]
    pub fn resource(&self) -> &Resource {
        match self {
            Anchor::Plain { resource, .. } | Anchor::Dynamic { resource, .. } => resource,
        }
    }
    #[must_use]
    pub fn is_dynamic(&self) -> bool {
        matches!(self, Anchor::Dynamic { .. })
    }
    /// Resolve the anchor to its target.
    ///
    /// A dynamic anchor re-scans the dynamic scope: the outermost resource
    /// declaring a dynamic anchor of the same name wins. Without one, the
    /// declaring resource itself is the target.
    pub(crate) fn resolve<'r>(&'r self, resolver: Resolver<'r>) -> Result<Resolved<'r>, Error> {
        match self {
            Anchor::Plain { resource, .. } => Ok(Resolved::new(resource.contents(), resolver)),
            Anchor::Dynamic { name, resource } => {
                let mut target = resource;
                // The scope iterates innermost-first; keep overwriting so the
                // outermost dynamic declaration ends up winning.
                for uri in resolver.scope_iter() {
                    match resolver.registry().anchor(uri, name) {
                        Ok(Anchor::Dynamic { resource, .. }) => target = resource,
                        Ok(Anchor::Plain { .. }) => {}
                        Err(Error::NoSuchAnchor { .. }) => {}
                        Err(error) => return Err(error),
                    }
                }
                let resolver = resolver.in_subresource((**target).as_ref())?;
                Ok(Resolved::new(target.contents(), resolver))
            }
        }
    }
}

pub(crate) fn dollar_and_dynamic_anchors<'a>(
    specification: &'static Specification,
    contents: &'a Value,
) -> Box<dyn Iterator<Item = Anchor> + 'a> {
    Box::new(contents.as_object().into_iter().flat_map(move |schema| {
        let plain = schema
            .get("$anchor")
            .and_then(Value::as_str)
            .map(|name| Anchor::Plain {
                name: name.to_string(),
                resource: Arc::new(specification.create_resource(contents.clone())),
            });
        let dynamic = schema
            .get("$dynamicAnchor")
            .and_then(Value::as_str)
            .map(|name| Anchor::Dynamic {
                name: name.to_string(),
                resource: Arc::new(specification.create_resource(contents.clone())),
            });
        plain.into_iter().chain(dynamic)
    }))
}

/// Draft 2019-09 knows `$anchor` but not `$dynamicAnchor`; its
/// `$recursiveAnchor` is a boolean consumed during recursive-ref lookup and
/// has no name to index.
pub(crate) fn dollar_anchor<'a>(
    specification: &'static Specification,
    contents: &'a Value,
) -> Box<dyn Iterator<Item = Anchor> + 'a> {
    Box::new(
        contents
            .as_object()
            .and_then(|schema| schema.get("$anchor"))
            .and_then(Value::as_str)
            .map(move |name| Anchor::Plain {
                name: name.to_string(),
                resource: Arc::new(specification.create_resource(contents.clone())),
            })
            .into_iter(),
    )
}

/// Drafts 6/7 spell anchors as `$id: "#name"`.
pub(crate) fn legacy_dollar_id_anchor<'a>(
    specification: &'static Specification,
    contents: &'a Value,
) -> Box<dyn Iterator<Item = Anchor> + 'a> {
    Box::new(
        contents
            .as_object()
            .and_then(|schema| schema.get("$id"))
            .and_then(Value::as_str)
            .and_then(|id| id.strip_prefix('#'))
            .map(move |name| Anchor::Plain {
                name: name.to_string(),
                resource: Arc::new(specification.create_resource(contents.clone())),
            })
            .into_iter(),
    )
}

/// Draft 4 spells anchors as `id: "#name"`.
pub(crate) fn legacy_id_anchor<'a>(
    specification: &'static Specification,
    contents: &'a Value,
) -> Box<dyn Iterator<Item = Anchor> + 'a> {
    Box::new(
        contents
            .as_object()
            .and_then(|schema| schema.get("id"))
            .and_then(Value::as_str)
            .and_then(|id| id.strip_prefix('#'))
            .map(move |name| Anchor::Plain {
                name: name.to_string(),
                resource: Arc::new(specification.create_resource(contents.clone())),
            })
            .into_iter(),
    )
}
