use core::fmt;
use std::hash::{Hash, Hasher};

use fluent_uri::error::{ParseError, ResolveError};
use serde_json::Value;

/// Failures surfaced while registering resources or resolving references.
///
/// Equality and hashing consider only the identifying fields (URIs, anchor
/// names, pointers). Message text and chained causes are not part of an
/// error's identity.
#[derive(Debug)]
pub enum Error {
    /// The URI is not present in the registry and no retriever could supply it.
    NoSuchResource { uri: String },
    /// The configured retriever failed to produce a resource for the URI.
    Unretrievable {
        uri: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// The resource exists but declares no anchor with this name.
    NoSuchAnchor { uri: String, anchor: String },
    /// The fragment can never name an anchor (it contains `/`).
    InvalidAnchor {
        uri: String,
        anchor: String,
        suggestion: String,
    },
    /// A JSON Pointer step led to a part of the document that does not exist.
    PointerToNowhere { pointer: String, uri: String },
    /// `$schema` is absent, not a string, or names an unknown dialect.
    CannotDetermineSpecification { contents: Value },
    /// The resource declares no internal ID and cannot be self-registered.
    NoInternalID { contents: Value },
    /// The URI is already bound to a different resource.
    OccupiedUri { uri: String },
    /// An error occurred while parsing or resolving a URI.
    InvalidUri(UriError),
}

impl Error {
    pub(crate) fn no_such_resource(uri: impl Into<String>) -> Error {
        Error::NoSuchResource { uri: uri.into() }
    }
    pub(crate) fn unretrievable(
        uri: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Error {
        Error::Unretrievable {
            uri: uri.into(),
            source,
        }
    }
    pub(crate) fn no_such_anchor(uri: impl Into<String>, anchor: impl Into<String>) -> Error {
        Error::NoSuchAnchor {
            uri: uri.into(),
            anchor: anchor.into(),
        }
    }
    pub(crate) fn invalid_anchor(uri: impl Into<String>, anchor: impl Into<String>) -> Error {
        let anchor = anchor.into();
        let suggestion = format!("#/{anchor}");
        Error::InvalidAnchor {
            uri: uri.into(),
            anchor,
            suggestion,
        }
    }
    pub(crate) fn pointer_to_nowhere(pointer: impl Into<String>, uri: impl Into<String>) -> Error {
        Error::PointerToNowhere {
            pointer: pointer.into(),
            uri: uri.into(),
        }
    }
    pub(crate) fn cannot_determine_specification(contents: Value) -> Error {
        Error::CannotDetermineSpecification { contents }
    }
    pub(crate) fn no_internal_id(contents: Value) -> Error {
        Error::NoInternalID { contents }
    }
    pub(crate) fn occupied(uri: impl Into<String>) -> Error {
        Error::OccupiedUri { uri: uri.into() }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NoSuchResource { uri } => f.write_fmt(format_args!(
                "Resource '{uri}' is not present in the registry"
            )),
            Error::Unretrievable { uri, source } => f.write_fmt(format_args!(
                "Resource '{uri}' could not be retrieved: {source}"
            )),
            Error::NoSuchAnchor { uri, anchor } => f.write_fmt(format_args!(
                "Anchor '{anchor}' does not exist within '{uri}'"
            )),
            Error::InvalidAnchor {
                uri,
                anchor,
                suggestion,
            } => f.write_fmt(format_args!(
                "Anchor '{anchor}' in '{uri}' is invalid; did you mean '{suggestion}'?"
            )),
            Error::PointerToNowhere { pointer, uri } => {
                f.write_fmt(format_args!(
                    "Pointer '{pointer}' does not exist within '{uri}'"
                ))?;
                if pointer == "/" {
                    f.write_str(
                        " (the pointer '/' references an empty-string property; \
                         the root is referenced by '#' or the empty pointer)",
                    )?;
                }
                Ok(())
            }
            Error::CannotDetermineSpecification { contents } => f.write_fmt(format_args!(
                "Cannot determine the specification of: {contents}"
            )),
            Error::NoInternalID { contents } => {
                f.write_fmt(format_args!("Resource has no internal ID: {contents}"))
            }
            Error::OccupiedUri { uri } => f.write_fmt(format_args!(
                "URI '{uri}' is already bound to a different resource"
            )),
            Error::InvalidUri(error) => f.write_fmt(format_args!("Invalid URI: {error}")),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Unretrievable { source, .. } => Some(&**source),
            Error::InvalidUri(error) => Some(error),
            _ => None,
        }
    }
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Error::NoSuchResource { uri }, Error::NoSuchResource { uri: other })
            | (Error::Unretrievable { uri, .. }, Error::Unretrievable { uri: other, .. })
            | (Error::OccupiedUri { uri }, Error::OccupiedUri { uri: other }) => uri == other,
            (
                Error::NoSuchAnchor { uri, anchor },
                Error::NoSuchAnchor {
                    uri: other_uri,
                    anchor: other_anchor,
                },
            )
            | (
                Error::InvalidAnchor { uri, anchor, .. },
                Error::InvalidAnchor {
                    uri: other_uri,
                    anchor: other_anchor,
                    ..
                },
            ) => uri == other_uri && anchor == other_anchor,
            (
                Error::PointerToNowhere { pointer, uri },
                Error::PointerToNowhere {
                    pointer: other_pointer,
                    uri: other_uri,
                },
            ) => pointer == other_pointer && uri == other_uri,
            (
                Error::CannotDetermineSpecification { contents },
                Error::CannotDetermineSpecification { contents: other },
            )
            | (Error::NoInternalID { contents }, Error::NoInternalID { contents: other }) => {
                contents == other
            }
            (Error::InvalidUri(error), Error::InvalidUri(other)) => {
                error.to_string() == other.to_string()
            }
            _ => false,
        }
    }
}

impl Eq for Error {}

impl Hash for Error {
    fn hash<H: Hasher>(&self, state: &mut H) {
        core::mem::discriminant(self).hash(state);
        match self {
            Error::NoSuchResource { uri }
            | Error::Unretrievable { uri, .. }
            | Error::OccupiedUri { uri } => uri.hash(state),
            Error::NoSuchAnchor { uri, anchor } | Error::InvalidAnchor { uri, anchor, .. } => {
                uri.hash(state);
                anchor.hash(state);
            }
            Error::PointerToNowhere { pointer, uri } => {
                pointer.hash(state);
                uri.hash(state);
            }
            // Contents participate in equality but not in hashing
            Error::CannotDetermineSpecification { .. } | Error::NoInternalID { .. } => {}
            Error::InvalidUri(error) => error.to_string().hash(state),
        }
    }
}

/// URI-layer failures wrapped into [`Error::InvalidUri`].
#[derive(Debug)]
pub enum UriError {
    Parse(ParseError),
    Resolve(ResolveError),
}

impl fmt::Display for UriError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UriError::Parse(error) => error.fmt(f),
            UriError::Resolve(error) => error.fmt(f),
        }
    }
}

impl std::error::Error for UriError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            UriError::Parse(error) => Some(error),
            UriError::Resolve(error) => Some(error),
        }
    }
}

impl From<ParseError<String>> for Error {
    fn from(error: ParseError<String>) -> Self {
        Error::InvalidUri(UriError::Parse(error.strip_input()))
    }
}

impl From<ParseError> for Error {
    fn from(error: ParseError) -> Self {
        Error::InvalidUri(UriError::Parse(error))
    }
}

impl From<ResolveError> for Error {
    fn from(error: ResolveError) -> Self {
        Error::InvalidUri(UriError::Resolve(error))
    }
}
