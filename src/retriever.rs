use core::fmt;

use ahash::AHashMap;
use fluent_uri::Uri;
use parking_lot::Mutex;
use serde_json::Value;

use crate::Resource;

/// Supplies resources for URIs that are not present in a
/// [`crate::Registry`].
///
/// The registry invokes the retriever at most once per URI and caches the
/// result; decorate the retriever itself for caching that outlives any one
/// registry family.
pub trait Retrieve: Send + Sync {
    /// Attempt to retrieve the resource identified by the URI.
    ///
    /// # Errors
    ///
    /// Whatever prevented retrieval; the registry surfaces it as
    /// [`crate::Error::Unretrievable`].
    fn retrieve(
        &self,
        uri: &Uri<&str>,
    ) -> Result<Resource, Box<dyn std::error::Error + Send + Sync>>;
}

#[derive(Debug, Clone)]
struct DefaultRetrieverError;

impl fmt::Display for DefaultRetrieverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Default retriever does not fetch resources")
    }
}

impl std::error::Error for DefaultRetrieverError {}

/// A retriever that refuses every URI.
#[derive(Debug, PartialEq, Eq)]
pub struct DefaultRetriever;

impl Retrieve for DefaultRetriever {
    fn retrieve(
        &self,
        _: &Uri<&str>,
    ) -> Result<Resource, Box<dyn std::error::Error + Send + Sync>> {
        Err(Box::new(DefaultRetrieverError))
    }
}

/// Adapts a function producing raw JSON text into a [`Retrieve`]
/// implementation: the text is parsed, its specification detected from
/// `$schema`, and the resulting resource memoized per URI.
pub struct CachingTextRetriever<F> {
    fetch: F,
    cache: Mutex<AHashMap<String, Resource>>,
}

impl<F> CachingTextRetriever<F>
where
    F: Fn(&Uri<&str>) -> Result<String, Box<dyn std::error::Error + Send + Sync>> + Send + Sync,
{
    pub fn new(fetch: F) -> Self {
        Self {
            fetch,
            cache: Mutex::new(AHashMap::new()),
        }
    }
}

impl<F> Retrieve for CachingTextRetriever<F>
where
    F: Fn(&Uri<&str>) -> Result<String, Box<dyn std::error::Error + Send + Sync>> + Send + Sync,
{
    fn retrieve(
        &self,
        uri: &Uri<&str>,
    ) -> Result<Resource, Box<dyn std::error::Error + Send + Sync>> {
        let mut cache = self.cache.lock();
        if let Some(resource) = cache.get(uri.as_str()) {
            return Ok(resource.clone());
        }
        let text = (self.fetch)(uri)?;
        let contents: Value = serde_json::from_str(&text)?;
        let resource = Resource::from_contents(contents)?;
        cache.insert(uri.as_str().to_string(), resource.clone());
        Ok(resource)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use fluent_uri::Uri;

    use crate::{uri, Registry, Retrieve};

    use super::{CachingTextRetriever, DefaultRetriever};

    #[test]
    fn default_retriever_refuses() {
        let parsed = uri::from_str("urn:anything").expect("A valid URI");
        assert!(DefaultRetriever.retrieve(&parsed.borrow()).is_err());
    }

    #[test]
    fn text_retriever_parses_and_memoizes() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let retriever = CachingTextRetriever::new(move |_: &Uri<&str>| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(r#"{
                "$schema": "https://json-schema.org/draft/2020-12/schema",
                "type": "integer"
            }"#
            .to_string())
        });

        let parsed = uri::from_str("urn:ex:remote").expect("A valid URI");
        let first = retriever.retrieve(&parsed.borrow()).expect("Retrievable");
        let second = retriever.retrieve(&parsed.borrow()).expect("Retrievable");
        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn text_retriever_rejects_undetectable_schemas() {
        let retriever =
            CachingTextRetriever::new(|_: &Uri<&str>| Ok(r#"{"type": "integer"}"#.to_string()));
        let parsed = uri::from_str("urn:ex:remote").expect("A valid URI");
        assert!(retriever.retrieve(&parsed.borrow()).is_err());
    }

    #[test]
    fn text_retriever_through_a_registry() {
        let retriever = CachingTextRetriever::new(|uri: &Uri<&str>| {
            if uri.as_str() == "urn:ex:remote" {
                Ok(r#"{
                    "$schema": "https://json-schema.org/draft/2020-12/schema",
                    "type": "integer"
                }"#
                .to_string())
            } else {
                Err("unknown".into())
            }
        });
        let registry = Registry::options().retriever(Arc::new(retriever)).build();
        let resolver = registry.try_resolver("").expect("A valid base URI");
        let resolved = resolver.lookup("urn:ex:remote").expect("Lookup failed");
        assert_eq!(
            resolved.contents().get("type"),
            Some(&serde_json::json!("integer"))
        );
    }
}
