//! # refscope
//!
//! A specification-agnostic JSON reference resolution library.
//!
//! Resources are JSON documents interpreted under a [`Specification`] (the
//! JSON Schema drafts ship built in), collected into an immutable
//! [`Registry`], and resolved through a [`Resolver`] that understands JSON
//! Pointers, plain-name anchors, `$dynamicRef`, and `$recursiveRef`.
//!
//! ```
//! use serde_json::json;
//! use refscope::{Registry, DRAFT202012};
//!
//! let registry = Registry::try_new(
//!     "urn:ex:a",
//!     DRAFT202012.create_resource(json!({
//!         "$defs": {"N": {"$anchor": "N", "type": "integer"}}
//!     })),
//! )?;
//! let resolver = registry.try_resolver("")?;
//! let resolved = resolver.lookup("urn:ex:a#N")?;
//! assert_eq!(resolved.contents(), &json!({"$anchor": "N", "type": "integer"}));
//! # Ok::<(), refscope::Error>(())
//! ```
mod anchors;
mod error;
mod list;
mod registry;
mod resolver;
mod resource;
mod retriever;
mod segments;
mod specification;
pub mod uri;

pub use anchors::Anchor;
pub use error::{Error, UriError};
pub use list::List;
pub use registry::{Registry, RegistryOptions};
pub use resolver::{Resolved, Resolver};
pub use resource::{Resource, ResourceRef};
pub use retriever::{CachingTextRetriever, DefaultRetriever, Retrieve};
pub use specification::{Specification, DRAFT201909, DRAFT202012, DRAFT4, DRAFT6, DRAFT7};

pub(crate) use segments::Segments;

pub type Uri<T> = fluent_uri::Uri<T>;
pub type UriRef<T> = fluent_uri::UriRef<T>;
