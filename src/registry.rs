use core::fmt;
use std::{
    collections::{hash_map::Entry, VecDeque},
    sync::Arc,
};

use ahash::{AHashMap, AHashSet};
use fluent_uri::Uri;
use once_cell::sync::OnceCell;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;

use crate::{
    anchors::{AnchorKey, AnchorKeyRef},
    uri, Anchor, Error, Resolver, Resource, Retrieve,
};

type ResourceMap = AHashMap<Uri<String>, Arc<Resource>>;
type AnchorMap = AHashMap<AnchorKey, Anchor>;

/// An immutable collection of JSON resources, indexed by URI.
///
/// Every `try_with_*` builder and [`Registry::crawl`] returns a new registry
/// and leaves the receiver observably unchanged; unchanged internals are
/// shared between the two. Registration itself is cheap: subresources and
/// anchors are discovered during [`Registry::crawl`], or on demand when an
/// anchor or a nested identifier is first looked up.
///
/// Resources supplied by the retriever are interned for the lifetime of the
/// process and shared by every registry derived from this one.
#[derive(Clone)]
pub struct Registry {
    resources: ResourceMap,
    anchors: AnchorMap,
    uncrawled: AHashSet<Uri<String>>,
    retriever: Option<Arc<dyn Retrieve>>,
    retrieved: Arc<RetrievedCache>,
    lazy: Arc<OnceCell<CrawlIndex>>,
}

/// Resources and anchors discovered by crawling.
struct CrawlIndex {
    resources: ResourceMap,
    anchors: AnchorMap,
}

/// Read-through cache for retriever results.
///
/// Entries are leaked on insertion so that lookups can hand out references
/// which outlive any single registry; the cache is append-only, keyed by URI,
/// and shared across derived registries.
#[derive(Default)]
struct RetrievedCache {
    resources: RwLock<AHashMap<Uri<String>, &'static Arc<Resource>>>,
    anchors: RwLock<AHashMap<AnchorKey, &'static Anchor>>,
    indexed: Mutex<AHashSet<Uri<String>>>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("resources", &self.resources.len())
            .field("anchors", &self.anchors.len())
            .field("uncrawled", &self.uncrawled.len())
            .finish_non_exhaustive()
    }
}

impl PartialEq for Registry {
    fn eq(&self, other: &Self) -> bool {
        self.resources == other.resources
            && self.anchors == other.anchors
            && self.uncrawled == other.uncrawled
    }
}

impl Eq for Registry {}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration for building a [`Registry`].
#[derive(Default)]
pub struct RegistryOptions {
    retriever: Option<Arc<dyn Retrieve>>,
}

impl RegistryOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
    /// Use the given retriever for URIs that are not registered.
    #[must_use]
    pub fn retriever(mut self, retriever: Arc<dyn Retrieve>) -> Self {
        self.retriever = Some(retriever);
        self
    }
    /// Build an empty [`Registry`] with these options.
    #[must_use]
    pub fn build(self) -> Registry {
        Registry {
            resources: ResourceMap::new(),
            anchors: AnchorMap::new(),
            uncrawled: AHashSet::new(),
            retriever: self.retriever,
            retrieved: Arc::new(RetrievedCache::default()),
            lazy: Arc::new(OnceCell::new()),
        }
    }
    /// Build a [`Registry`] with a single resource.
    ///
    /// # Errors
    ///
    /// Returns an error if the URI is invalid.
    pub fn try_new(self, uri: impl Into<String>, resource: Resource) -> Result<Registry, Error> {
        self.build().try_with_resource(uri, resource)
    }
}

impl Registry {
    /// An empty registry without a retriever.
    #[must_use]
    pub fn new() -> Self {
        RegistryOptions::new().build()
    }
    /// Get [`RegistryOptions`] for configuring a new [`Registry`].
    #[must_use]
    pub fn options() -> RegistryOptions {
        RegistryOptions::new()
    }
    /// A registry holding a single resource.
    ///
    /// # Errors
    ///
    /// Returns an error if the URI is invalid or already bound to a
    /// different resource.
    pub fn try_new(uri: impl Into<String>, resource: Resource) -> Result<Self, Error> {
        Self::new().try_with_resource(uri, resource)
    }
    /// A registry holding every (URI, resource) pair from the iterator.
    ///
    /// # Errors
    ///
    /// Returns an error if any URI is invalid or bound twice to differing
    /// resources.
    pub fn try_from_resources(
        pairs: impl IntoIterator<Item = (impl Into<String>, Resource)>,
    ) -> Result<Self, Error> {
        Self::new().try_with_resources(pairs)
    }
    /// Derive a registry with one more resource.
    ///
    /// The URI is normalized and a trailing empty fragment is stripped, so
    /// `http://x` and `http://x#` register identically.
    ///
    /// # Errors
    ///
    /// Returns an error if the URI is invalid or already bound to a
    /// different resource.
    pub fn try_with_resource(
        &self,
        uri: impl Into<String>,
        resource: Resource,
    ) -> Result<Registry, Error> {
        self.try_with_resources([(uri, resource)])
    }
    /// Derive a registry with more resources.
    ///
    /// # Errors
    ///
    /// Returns an error if any URI is invalid or bound to a differing
    /// resource, here or previously.
    pub fn try_with_resources(
        &self,
        pairs: impl IntoIterator<Item = (impl Into<String>, Resource)>,
    ) -> Result<Registry, Error> {
        let mut resources = self.resources.clone();
        let mut uncrawled = self.uncrawled.clone();
        for (uri, resource) in pairs {
            let uri = uri::from_str(uri.into().trim_end_matches('#'))?;
            match resources.entry(uri.clone()) {
                Entry::Occupied(entry) => {
                    if **entry.get() != resource {
                        return Err(Error::occupied(uri.as_str()));
                    }
                }
                Entry::Vacant(entry) => {
                    entry.insert(Arc::new(resource));
                    uncrawled.insert(uri);
                }
            }
        }
        Ok(Registry {
            resources,
            anchors: self.anchors.clone(),
            uncrawled,
            retriever: self.retriever.clone(),
            retrieved: Arc::clone(&self.retrieved),
            lazy: Arc::new(OnceCell::new()),
        })
    }
    /// Derive a registry from raw JSON values, detecting each one's
    /// specification from its `$schema`.
    ///
    /// # Errors
    ///
    /// Returns an error on invalid URIs or undetectable specifications.
    pub fn try_with_contents(
        &self,
        pairs: impl IntoIterator<Item = (impl Into<String>, Value)>,
    ) -> Result<Registry, Error> {
        let pairs = pairs
            .into_iter()
            .map(|(uri, contents)| Ok((uri, Resource::from_contents(contents)?)))
            .collect::<Result<Vec<_>, Error>>()?;
        self.try_with_resources(pairs)
    }
    /// Derive a registry with resources registered under their own internal
    /// IDs.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoInternalID`] for any resource without one.
    pub fn try_with_self_identified(
        &self,
        resources: impl IntoIterator<Item = Resource>,
    ) -> Result<Registry, Error> {
        let pairs = resources
            .into_iter()
            .map(|resource| match resource.id() {
                Some(id) => Ok((id.to_string(), resource)),
                None => Err(Error::no_internal_id(resource.contents().clone())),
            })
            .collect::<Result<Vec<_>, Error>>()?;
        self.try_with_resources(pairs)
    }
    /// Derive a registry with an anonymous root resource, registered under
    /// the empty URI. Resolve from it with a resolver based at `""`.
    ///
    /// # Errors
    ///
    /// Returns an error if the empty URI is already bound to a different
    /// resource.
    pub fn try_with_root(&self, resource: Resource) -> Result<Registry, Error> {
        self.try_with_resource("", resource)
    }
    /// Walk every resource registered since the last crawl, registering
    /// subresources that declare an `$id` and indexing all anchors.
    ///
    /// Crawling is idempotent: crawling a crawled registry is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if a nested identifier cannot be resolved against
    /// its parent's URI.
    pub fn crawl(&self) -> Result<Registry, Error> {
        if self.uncrawled.is_empty() {
            return Ok(self.clone());
        }
        let mut resources = self.resources.clone();
        let mut anchors = self.anchors.clone();
        for registration in &self.uncrawled {
            if let Some(resource) = self.resources.get(registration) {
                crawl_resource(
                    registration.clone(),
                    Arc::clone(resource),
                    &mut resources,
                    &mut anchors,
                )?;
            }
        }
        Ok(Registry {
            resources,
            anchors,
            uncrawled: AHashSet::new(),
            retriever: self.retriever.clone(),
            retrieved: Arc::clone(&self.retrieved),
            lazy: Arc::new(OnceCell::new()),
        })
    }
    /// Fetch the resource registered at the URI; any fragment is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoSuchResource`] for an unknown URI without a
    /// retriever, and [`Error::Unretrievable`] when the retriever fails.
    pub fn get(&self, uri: &str) -> Result<&Resource, Error> {
        let absolute = uri.split_once('#').map_or(uri, |(absolute, _)| absolute);
        let key = uri::from_str(absolute)?;
        self.get_or_retrieve(&key)
    }
    /// Shortcut for the contents of the resource at the URI.
    ///
    /// Unlike [`Registry::get`], this never invokes the retriever.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoSuchResource`] for URIs this registry has never
    /// seen.
    pub fn contents(&self, uri: &str) -> Result<&Value, Error> {
        let absolute = uri.split_once('#').map_or(uri, |(absolute, _)| absolute);
        let key = uri::from_str(absolute)?;
        if let Some(resource) = self.resources.get(&key) {
            return Ok(resource.contents());
        }
        if !self.uncrawled.is_empty() {
            if let Some(resource) = self.lazy_index()?.resources.get(&key) {
                return Ok(resource.contents());
            }
        }
        if let Some(resource) = self.retrieved.resources.read().get(&key).copied() {
            return Ok(resource.contents());
        }
        Err(Error::no_such_resource(key.as_str()))
    }
    /// Look up a named anchor within the resource at the URI.
    ///
    /// Resources that have not been crawled yet are crawled on demand, and a
    /// miss is retried under the resource's canonical URI, so anchors stay
    /// reachable through the URI a resource was registered under even when
    /// its `$id` points elsewhere.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAnchor`] for names containing `/` and
    /// [`Error::NoSuchAnchor`] for anchors that do not exist.
    pub fn anchor(&self, uri: &Uri<String>, name: &str) -> Result<&Anchor, Error> {
        if name.contains('/') {
            return Err(Error::invalid_anchor(uri.as_str(), name));
        }
        if let Some(anchor) = self.anchors.get(AnchorKeyRef::new(uri, name).as_dyn()) {
            return Ok(anchor);
        }
        let index = if self.uncrawled.is_empty() {
            None
        } else {
            let index = self.lazy_index()?;
            if let Some(anchor) = index.anchors.get(AnchorKeyRef::new(uri, name).as_dyn()) {
                return Ok(anchor);
            }
            Some(index)
        };
        // The resource may be registered here under a non-canonical URI;
        // its anchors are indexed under the canonical one.
        let resource = self
            .resources
            .get(uri)
            .or_else(|| index.and_then(|index| index.resources.get(uri)));
        if let Some(resource) = resource {
            if let Some(id) = resource.id() {
                let canonical = uri::resolve_against(&uri.borrow(), id)?;
                if canonical != *uri {
                    let key = AnchorKeyRef::new(&canonical, name);
                    if let Some(anchor) = self.anchors.get(key.as_dyn()) {
                        return Ok(anchor);
                    }
                    if let Some(index) = index {
                        if let Some(anchor) = index.anchors.get(key.as_dyn()) {
                            return Ok(anchor);
                        }
                    }
                }
            }
        }
        if let Some(anchor) = self.retrieved_anchor(uri, name)? {
            return Ok(anchor);
        }
        Err(Error::no_such_anchor(uri.as_str(), name))
    }
    /// A resolver based at the given URI; the empty string means "no base",
    /// which resolves references absolutely.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URI is invalid.
    pub fn try_resolver(&self, base_uri: &str) -> Result<Resolver<'_>, Error> {
        if base_uri.is_empty() {
            Ok(Resolver::new(self, None))
        } else {
            Ok(self.resolver(uri::from_str(base_uri)?))
        }
    }
    /// A resolver based at a known-valid URI.
    #[must_use]
    pub fn resolver(&self, base_uri: Uri<String>) -> Resolver<'_> {
        Resolver::new(self, Some(base_uri))
    }
    /// Merge two registries.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OccupiedUri`] when both registries bind the same URI
    /// to differing resources.
    pub fn combine(&self, other: &Registry) -> Result<Registry, Error> {
        let mut resources = self.resources.clone();
        for (uri, resource) in &other.resources {
            match resources.entry(uri.clone()) {
                Entry::Occupied(entry) => {
                    if entry.get() != resource {
                        return Err(Error::occupied(uri.as_str()));
                    }
                }
                Entry::Vacant(entry) => {
                    entry.insert(Arc::clone(resource));
                }
            }
        }
        let mut anchors = self.anchors.clone();
        anchors.extend(
            other
                .anchors
                .iter()
                .map(|(key, anchor)| (key.clone(), anchor.clone())),
        );
        let mut uncrawled = self.uncrawled.clone();
        uncrawled.extend(other.uncrawled.iter().cloned());
        Ok(Registry {
            resources,
            anchors,
            uncrawled,
            retriever: self.retriever.clone().or_else(|| other.retriever.clone()),
            retrieved: Arc::clone(&self.retrieved),
            lazy: Arc::new(OnceCell::new()),
        })
    }
    /// Number of registered resources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.resources.len()
    }
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
    /// Iterate over the registered (URI, resource) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&Uri<String>, &Resource)> {
        self.resources
            .iter()
            .map(|(uri, resource)| (uri, resource.as_ref()))
    }

    pub(crate) fn get_or_retrieve(&self, uri: &Uri<String>) -> Result<&Resource, Error> {
        if let Some(resource) = self.resources.get(uri) {
            return Ok(resource);
        }
        if !self.uncrawled.is_empty() {
            if let Some(resource) = self.lazy_index()?.resources.get(uri) {
                return Ok(resource);
            }
        }
        if let Some(resource) = self.retrieved.resources.read().get(uri).copied() {
            return Ok(resource);
        }
        let Some(retriever) = &self.retriever else {
            return Err(Error::no_such_resource(uri.as_str()));
        };
        let resource = retriever
            .retrieve(&uri.borrow())
            .map_err(|error| Error::unretrievable(uri.as_str(), error))?;
        let mut cache = self.retrieved.resources.write();
        let entry: &'static Arc<Resource> = *cache
            .entry(uri.clone())
            .or_insert_with(|| Box::leak(Box::new(Arc::new(resource))));
        Ok(entry)
    }

    fn lazy_index(&self) -> Result<&CrawlIndex, Error> {
        self.lazy.get_or_try_init(|| {
            let mut resources = ResourceMap::new();
            let mut anchors = AnchorMap::new();
            for registration in &self.uncrawled {
                if let Some(resource) = self.resources.get(registration) {
                    crawl_resource(
                        registration.clone(),
                        Arc::clone(resource),
                        &mut resources,
                        &mut anchors,
                    )?;
                }
            }
            Ok(CrawlIndex { resources, anchors })
        })
    }

    /// Anchor lookup within retriever-supplied resources; their subtrees are
    /// indexed on first use.
    fn retrieved_anchor(
        &self,
        uri: &Uri<String>,
        name: &str,
    ) -> Result<Option<&'static Anchor>, Error> {
        {
            let anchors = self.retrieved.anchors.read();
            if let Some(anchor) = anchors.get(AnchorKeyRef::new(uri, name).as_dyn()).copied() {
                return Ok(Some(anchor));
            }
        }
        let resource = match self.retrieved.resources.read().get(uri).copied() {
            Some(resource) => resource,
            None => return Ok(None),
        };
        let mut indexed = self.retrieved.indexed.lock();
        if !indexed.contains(uri) {
            let mut resources = ResourceMap::new();
            let mut anchors = AnchorMap::new();
            crawl_resource(uri.clone(), Arc::clone(resource), &mut resources, &mut anchors)?;
            indexed.insert(uri.clone());
            let mut cache = self.retrieved.anchors.write();
            for (key, anchor) in anchors {
                cache
                    .entry(key)
                    .or_insert_with(|| Box::leak(Box::new(anchor)));
            }
        }
        drop(indexed);
        let anchors = self.retrieved.anchors.read();
        Ok(anchors.get(AnchorKeyRef::new(uri, name).as_dyn()).copied())
    }
}

/// Walk one resource: register nested identifiers and index every anchor.
///
/// A frame carries all URIs its resource is addressable under. When a
/// resource's `$id` differs from the URI it was registered at, both stay on
/// the frame so nested relative identifiers and anchors remain reachable
/// through either spelling.
fn crawl_resource(
    registration: Uri<String>,
    resource: Arc<Resource>,
    resources: &mut ResourceMap,
    anchors: &mut AnchorMap,
) -> Result<(), Error> {
    let mut bases = vec![registration];
    if let Some(id) = resource.id() {
        let canonical = uri::resolve_against(&bases[0].borrow(), id)?;
        resources.insert(canonical.clone(), Arc::clone(&resource));
        if canonical != bases[0] {
            bases.push(canonical);
        }
    }
    index_anchors(&bases, &resource, anchors);

    let mut queue = VecDeque::with_capacity(32);
    for subresource in resource.subresources() {
        queue.push_back((bases.clone(), Arc::new(subresource?)));
    }
    while let Some((mut bases, resource)) = queue.pop_front() {
        if let Some(id) = resource.id() {
            let mut joined = Vec::with_capacity(bases.len());
            for base in &bases {
                let uri = uri::resolve_against(&base.borrow(), id)?;
                if !joined.contains(&uri) {
                    joined.push(uri);
                }
            }
            for uri in &joined {
                resources.insert(uri.clone(), Arc::clone(&resource));
            }
            bases = joined;
        }
        index_anchors(&bases, &resource, anchors);
        for subresource in resource.subresources() {
            queue.push_back((bases.clone(), Arc::new(subresource?)));
        }
    }
    Ok(())
}

fn index_anchors(bases: &[Uri<String>], resource: &Resource, anchors: &mut AnchorMap) {
    for anchor in resource.anchors() {
        for base in bases {
            anchors.insert(
                AnchorKey::new(base.clone(), anchor.name().to_string()),
                anchor.clone(),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use fluent_uri::Uri;
    use serde_json::{json, Value};

    use crate::{Error, Registry, Resource, Retrieve, DRAFT202012};

    #[test]
    fn invalid_uri_on_registration() {
        let resource = DRAFT202012.create_resource(json!({}));
        let error = Registry::try_new(":/example.com", resource).expect_err("Should fail");
        assert!(matches!(error, Error::InvalidUri(_)));
    }

    #[test]
    fn missing_resource_without_retriever() {
        let resource = DRAFT202012.create_resource(json!({"type": "object"}));
        let registry =
            Registry::try_new("http://example.com/schema1", resource).expect("Valid resource");
        let resolver = registry.try_resolver("").expect("A valid base URI");

        let error = resolver
            .lookup("http://example.com/absent")
            .expect_err("Should fail");
        assert_eq!(
            error.to_string(),
            "Resource 'http://example.com/absent' is not present in the registry"
        );
    }

    #[test]
    fn registration_leaves_the_receiver_unchanged() {
        let registry = Registry::try_new(
            "urn:ex:a",
            DRAFT202012.create_resource(json!({"type": "integer"})),
        )
        .expect("Valid resource");

        let derived = registry
            .try_with_resource(
                "urn:ex:b",
                DRAFT202012.create_resource(json!({"type": "string"})),
            )
            .expect("Valid resource");

        assert_eq!(registry.len(), 1);
        assert_eq!(derived.len(), 2);
        assert!(registry.contents("urn:ex:b").is_err());
        assert_eq!(
            derived.contents("urn:ex:b").expect("Registered"),
            &json!({"type": "string"})
        );
        assert_eq!(
            registry.contents("urn:ex:a").expect("Registered"),
            &json!({"type": "integer"})
        );
    }

    #[test]
    fn registering_identical_contents_twice_is_a_noop() {
        let registry = Registry::try_new(
            "urn:ex:a",
            DRAFT202012.create_resource(json!({"type": "integer"})),
        )
        .expect("Valid resource");
        let same = registry
            .try_with_resource(
                "urn:ex:a",
                DRAFT202012.create_resource(json!({"type": "integer"})),
            )
            .expect("Identical contents are fine");
        assert_eq!(registry, same);
    }

    #[test]
    fn conflicting_registration_is_rejected() {
        let registry = Registry::try_new(
            "urn:ex:a",
            DRAFT202012.create_resource(json!({"type": "integer"})),
        )
        .expect("Valid resource");
        let error = registry
            .try_with_resource(
                "urn:ex:a",
                DRAFT202012.create_resource(json!({"type": "string"})),
            )
            .expect_err("Should fail");
        assert!(matches!(error, Error::OccupiedUri { .. }));
    }

    #[test]
    fn crawl_is_idempotent() {
        let registry = Registry::try_new(
            "urn:ex:a",
            DRAFT202012.create_resource(json!({
                "$defs": {
                    "N": {"$id": "urn:ex:n", "$anchor": "N", "type": "integer"}
                }
            })),
        )
        .expect("Valid resource");

        let crawled = registry.crawl().expect("Crawlable");
        let twice = crawled.crawl().expect("Crawlable");
        assert_eq!(crawled, twice);
        assert!(crawled.contents("urn:ex:n").is_ok());
    }

    #[test]
    fn crawl_registers_nested_identifiers() {
        let registry = Registry::try_new(
            "http://example.com/root",
            DRAFT202012.create_resource(json!({
                "$defs": {
                    "child": {"$id": "child.json", "type": "string"}
                }
            })),
        )
        .expect("Valid resource")
        .crawl()
        .expect("Crawlable");

        assert_eq!(
            registry
                .contents("http://example.com/child.json")
                .expect("Discovered by the crawl"),
            &json!({"$id": "child.json", "type": "string"})
        );
    }

    #[test]
    fn nested_identifiers_resolve_without_an_explicit_crawl() {
        let registry = Registry::try_new(
            "http://example.com/root",
            DRAFT202012.create_resource(json!({
                "$defs": {
                    "child": {"$id": "child.json", "type": "string"}
                }
            })),
        )
        .expect("Valid resource");
        let resolver = registry.try_resolver("").expect("A valid base URI");
        let resolved = resolver
            .lookup("http://example.com/child.json")
            .expect("Lookup failed");
        assert_eq!(
            resolved.contents(),
            &json!({"$id": "child.json", "type": "string"})
        );
    }

    #[test]
    fn empty_fragment_normalization_at_registration() {
        let registry = Registry::try_new(
            "http://example.com/schema#",
            DRAFT202012.create_resource(json!({"type": "integer"})),
        )
        .expect("Valid resource");
        assert_eq!(
            registry
                .contents("http://example.com/schema")
                .expect("Registered"),
            &json!({"type": "integer"})
        );
        assert_eq!(
            registry
                .contents("http://example.com/schema#")
                .expect("Registered"),
            &json!({"type": "integer"})
        );
    }

    #[test]
    fn self_identified_resources() {
        let registry = Registry::new()
            .try_with_self_identified([DRAFT202012.create_resource(json!({
                "$id": "urn:ex:self",
                "type": "integer"
            }))])
            .expect("Has an internal ID");
        assert!(registry.contents("urn:ex:self").is_ok());
    }

    #[test]
    fn self_identification_requires_an_id() {
        let error = Registry::new()
            .try_with_self_identified([DRAFT202012.create_resource(json!({"type": "integer"}))])
            .expect_err("Should fail");
        assert!(matches!(error, Error::NoInternalID { .. }));
    }

    #[test]
    fn contents_from_raw_values() {
        let registry = Registry::new()
            .try_with_contents([(
                "urn:ex:a",
                json!({
                    "$schema": "https://json-schema.org/draft/2020-12/schema",
                    "type": "integer"
                }),
            )])
            .expect("Valid contents");
        assert!(registry.contents("urn:ex:a").is_ok());
    }

    #[test]
    fn contents_require_a_detectable_specification() {
        let error = Registry::new()
            .try_with_contents([("urn:ex:a", json!({"type": "integer"}))])
            .expect_err("Should fail");
        assert!(matches!(error, Error::CannotDetermineSpecification { .. }));
    }

    #[test]
    fn combine_merges_disjoint_registries() {
        let left = Registry::try_new(
            "urn:ex:a",
            DRAFT202012.create_resource(json!({"type": "integer"})),
        )
        .expect("Valid resource");
        let right = Registry::try_new(
            "urn:ex:b",
            DRAFT202012.create_resource(json!({"type": "string"})),
        )
        .expect("Valid resource");

        let combined = left.combine(&right).expect("No conflicts");
        assert_eq!(combined.len(), 2);
        assert!(combined.contents("urn:ex:a").is_ok());
        assert!(combined.contents("urn:ex:b").is_ok());
    }

    #[test]
    fn combine_rejects_conflicts() {
        let left = Registry::try_new(
            "urn:ex:a",
            DRAFT202012.create_resource(json!({"type": "integer"})),
        )
        .expect("Valid resource");
        let right = Registry::try_new(
            "urn:ex:a",
            DRAFT202012.create_resource(json!({"type": "string"})),
        )
        .expect("Valid resource");

        let error = left.combine(&right).expect_err("Should fail");
        assert!(matches!(error, Error::OccupiedUri { .. }));
    }

    #[test]
    fn combine_accepts_identical_duplicates() {
        let make = || {
            Registry::try_new(
                "urn:ex:a",
                DRAFT202012.create_resource(json!({"type": "integer"})),
            )
            .expect("Valid resource")
        };
        let combined = make().combine(&make()).expect("Identical resources");
        assert_eq!(combined.len(), 1);
    }

    struct CountingRetriever {
        calls: AtomicUsize,
        resources: Vec<(String, Value)>,
    }

    impl Retrieve for CountingRetriever {
        fn retrieve(
            &self,
            uri: &Uri<&str>,
        ) -> Result<Resource, Box<dyn std::error::Error + Send + Sync>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            for (known, contents) in &self.resources {
                if known == uri.as_str() {
                    return Ok(DRAFT202012.create_resource(contents.clone()));
                }
            }
            Err(format!("Failed to find {uri}").into())
        }
    }

    #[test]
    fn retriever_fills_misses_and_is_memoized() {
        let retriever = Arc::new(CountingRetriever {
            calls: AtomicUsize::new(0),
            resources: vec![("urn:ex:remote".to_string(), json!({"type": "object"}))],
        });
        let registry = Registry::options()
            .retriever(Arc::clone(&retriever) as Arc<dyn Retrieve>)
            .build();

        let first = registry.get("urn:ex:remote").expect("Retrievable");
        assert_eq!(first.contents(), &json!({"type": "object"}));
        let second = registry.get("urn:ex:remote").expect("Retrievable");
        assert_eq!(second.contents(), &json!({"type": "object"}));
        assert_eq!(retriever.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn derived_registries_share_the_retrieval_cache() {
        let retriever = Arc::new(CountingRetriever {
            calls: AtomicUsize::new(0),
            resources: vec![("urn:ex:remote".to_string(), json!({"type": "object"}))],
        });
        let registry = Registry::options()
            .retriever(Arc::clone(&retriever) as Arc<dyn Retrieve>)
            .build();
        registry.get("urn:ex:remote").expect("Retrievable");

        let derived = registry
            .try_with_resource("urn:ex:a", DRAFT202012.create_resource(json!({})))
            .expect("Valid resource");
        derived.get("urn:ex:remote").expect("Retrievable");
        assert_eq!(retriever.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn retriever_failures_are_chained() {
        let retriever = Arc::new(CountingRetriever {
            calls: AtomicUsize::new(0),
            resources: vec![],
        });
        let registry = Registry::options().retriever(retriever).build();

        let error = registry.get("urn:ex:missing").expect_err("Should fail");
        assert!(matches!(error, Error::Unretrievable { .. }));
        assert!(std::error::Error::source(&error).is_some());
    }

    #[test]
    fn anchors_in_retrieved_resources_resolve() {
        let retriever = Arc::new(CountingRetriever {
            calls: AtomicUsize::new(0),
            resources: vec![(
                "urn:ex:remote".to_string(),
                json!({"$defs": {"N": {"$anchor": "N", "type": "integer"}}}),
            )],
        });
        let registry = Registry::options().retriever(retriever).build();
        let resolver = registry.try_resolver("").expect("A valid base URI");

        let resolved = resolver.lookup("urn:ex:remote#N").expect("Lookup failed");
        assert_eq!(
            resolved.contents(),
            &json!({"$anchor": "N", "type": "integer"})
        );
    }

    #[test]
    fn anonymous_root_resources() {
        let registry = Registry::new()
            .try_with_root(DRAFT202012.create_resource(json!({
                "$defs": {
                    "N": {"$anchor": "N", "type": "integer"}
                }
            })))
            .expect("Nothing is registered yet");
        let resolver = registry.try_resolver("").expect("A valid base URI");

        let root = resolver.lookup("").expect("Lookup failed");
        assert!(root.contents().get("$defs").is_some());
        let nested = resolver.lookup("#/$defs/N").expect("Lookup failed");
        assert_eq!(
            nested.contents(),
            &json!({"$anchor": "N", "type": "integer"})
        );
        let anchored = resolver.lookup("#N").expect("Lookup failed");
        assert_eq!(anchored.contents(), nested.contents());
    }

    #[test]
    fn anchors_expose_their_flavor_and_resource() {
        let registry = Registry::try_new(
            "urn:ex:a",
            DRAFT202012.create_resource(json!({
                "$defs": {
                    "plain": {"$anchor": "P", "type": "integer"},
                    "dynamic": {"$dynamicAnchor": "D", "type": "string"}
                }
            })),
        )
        .expect("Valid resource")
        .crawl()
        .expect("Crawlable");
        let uri = crate::uri::from_str("urn:ex:a").expect("A valid URI");

        let plain = registry.anchor(&uri, "P").expect("Indexed");
        assert!(!plain.is_dynamic());
        assert_eq!(plain.name(), "P");
        assert_eq!(
            plain.resource().contents(),
            &json!({"$anchor": "P", "type": "integer"})
        );

        let dynamic = registry.anchor(&uri, "D").expect("Indexed");
        assert!(dynamic.is_dynamic());
    }

    #[test]
    fn anchor_names_with_slashes_are_invalid() {
        let registry = Registry::try_new(
            "urn:ex:a",
            DRAFT202012.create_resource(json!({})),
        )
        .expect("Valid resource");
        let uri = crate::uri::from_str("urn:ex:a").expect("A valid URI");
        let error = registry.anchor(&uri, "foo/bar").expect_err("Should fail");
        assert!(matches!(error, Error::InvalidAnchor { .. }));
    }

    #[test]
    fn iteration_and_length() {
        let registry = Registry::try_from_resources([
            ("urn:ex:a", DRAFT202012.create_resource(json!({}))),
            ("urn:ex:b", DRAFT202012.create_resource(json!(true))),
        ])
        .expect("Valid resources");
        assert_eq!(registry.len(), 2);
        assert!(!registry.is_empty());
        assert_eq!(registry.iter().count(), 2);
    }
}
