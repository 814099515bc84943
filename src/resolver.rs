use core::fmt;

use fluent_uri::Uri;
use serde_json::Value;

use crate::{
    list::List,
    uri::{self, FragmentKind},
    Error, Registry, ResourceRef,
};

/// Resolves references against a base URI within a registry, carrying the
/// dynamic scope accumulated along the way.
///
/// Resolvers are values: every hop produces a new one, and the one inside a
/// [`Resolved`] is the right starting point for any further reference found
/// in the resolved contents.
#[derive(Clone)]
pub struct Resolver<'r> {
    registry: &'r Registry,
    base_uri: Option<Uri<String>>,
    scopes: List<Uri<String>>,
}

impl PartialEq for Resolver<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.base_uri == other.base_uri
    }
}
impl Eq for Resolver<'_> {}

impl fmt::Debug for Resolver<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("base_uri", &self.base_str())
            .field(
                "scopes",
                &self.scopes.iter().map(|uri| uri.as_str()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl<'r> Resolver<'r> {
    pub(crate) fn new(registry: &'r Registry, base_uri: Option<Uri<String>>) -> Self {
        Self {
            registry,
            base_uri,
            scopes: List::new(),
        }
    }
    /// The URI relative references are currently resolved against.
    #[must_use]
    pub fn base_uri(&self) -> Option<&Uri<String>> {
        self.base_uri.as_ref()
    }
    pub(crate) fn base_str(&self) -> &str {
        self.base_uri.as_ref().map_or("", |uri| uri.as_str())
    }
    pub(crate) fn registry(&self) -> &'r Registry {
        self.registry
    }
    /// Resolve a reference to the contents it points to.
    ///
    /// # Errors
    ///
    /// Any of the registry's lookup failures, [`Error::PointerToNowhere`]
    /// for dead pointers, and [`Error::InvalidAnchor`] for fragments that
    /// could never name an anchor.
    pub fn lookup(&self, reference: &str) -> Result<Resolved<'r>, Error> {
        let (uri_part, fragment) = uri::fragment_of(reference);
        let uri = if uri_part.is_empty() {
            match &self.base_uri {
                Some(base) => base.clone(),
                None => uri::from_str("")?,
            }
        } else {
            match &self.base_uri {
                Some(base) => uri::resolve_against(&base.borrow(), uri_part)?,
                None => uri::from_str(uri_part)?,
            }
        };

        let retrieved = self.registry.get_or_retrieve(&uri)?;

        match fragment {
            FragmentKind::None | FragmentKind::Empty => {
                let resolver = self.evolve(uri);
                Ok(Resolved::new(retrieved.contents(), resolver))
            }
            FragmentKind::Pointer(pointer) => {
                let resolver = self.evolve(uri);
                retrieved.pointer(pointer, resolver)
            }
            FragmentKind::Anchor(name) => {
                let anchor = self.registry.anchor(&uri, name)?;
                let resolver = self.evolve(uri);
                anchor.resolve(resolver)
            }
            FragmentKind::Invalid(fragment) => Err(Error::invalid_anchor(uri.as_str(), fragment)),
        }
    }
    /// Resolve a Draft 2019-09 `$recursiveRef`.
    ///
    /// Starts at `#` and, as long as the target carries
    /// `$recursiveAnchor: true`, follows the dynamic scope outwards to the
    /// outermost resource that still does.
    ///
    /// # Errors
    ///
    /// Anything [`Resolver::lookup`] can return.
    pub fn lookup_recursive_ref(&self) -> Result<Resolved<'r>, Error> {
        let mut resolved = self.lookup("#")?;

        if let Value::Object(schema) = resolved.contents {
            if schema
                .get("$recursiveAnchor")
                .and_then(Value::as_bool)
                .unwrap_or(false)
            {
                for uri in &self.scopes {
                    let outer = self.lookup(uri.as_str())?;
                    match outer.contents {
                        Value::Object(outer_schema)
                            if outer_schema
                                .get("$recursiveAnchor")
                                .and_then(Value::as_bool)
                                .unwrap_or(false) =>
                        {
                            resolved = outer;
                        }
                        _ => break,
                    }
                }
            }
        }

        Ok(resolved)
    }
    /// A resolver re-based into the given subresource.
    ///
    /// # Errors
    ///
    /// Returns an error if the subresource's identifier cannot be resolved
    /// against the current base.
    pub fn in_subresource(&self, subresource: ResourceRef<'_>) -> Result<Self, Error> {
        match subresource.id() {
            Some(id) => {
                let base_uri = match &self.base_uri {
                    Some(base) => uri::resolve_against(&base.borrow(), id)?,
                    None => uri::from_str(id)?,
                };
                Ok(self.evolve(base_uri))
            }
            None => Ok(self.clone()),
        }
    }
    /// The dynamic scope, outermost first, excluding the current frame.
    pub fn dynamic_scope(&self) -> impl Iterator<Item = &Uri<String>> {
        let mut frames: Vec<_> = self.scopes.iter().collect();
        frames.reverse();
        frames.into_iter()
    }
    /// Innermost-first view used by the dynamic-anchor walk.
    pub(crate) fn scope_iter(&self) -> crate::list::Iter<'_, Uri<String>> {
        self.scopes.iter()
    }
    fn evolve(&self, base_uri: Uri<String>) -> Resolver<'r> {
        match &self.base_uri {
            Some(previous) if self.scopes.is_empty() || *previous != base_uri => Resolver {
                registry: self.registry,
                base_uri: Some(base_uri),
                scopes: self.scopes.push_front(previous.clone()),
            },
            _ => Resolver {
                registry: self.registry,
                base_uri: Some(base_uri),
                scopes: self.scopes.clone(),
            },
        }
    }
}

/// A reference resolved to its contents, along with the resolver positioned
/// at the target.
#[derive(Debug)]
pub struct Resolved<'r> {
    pub(crate) contents: &'r Value,
    resolver: Resolver<'r>,
}

impl<'r> Resolved<'r> {
    pub(crate) fn new(contents: &'r Value, resolver: Resolver<'r>) -> Self {
        Self { contents, resolver }
    }
    /// The resolved contents.
    #[must_use]
    pub fn contents(&self) -> &'r Value {
        self.contents
    }
    /// The resolver to use for further references found in the contents.
    #[must_use]
    pub fn resolver(&self) -> &Resolver<'r> {
        &self.resolver
    }
    #[must_use]
    pub fn into_inner(self) -> (&'r Value, Resolver<'r>) {
        (self.contents, self.resolver)
    }
}
