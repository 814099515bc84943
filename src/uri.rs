//! URI parsing, joining, and fragment classification.
use fluent_uri::{Uri, UriRef};
use once_cell::sync::Lazy;

use crate::Error;

/// The base against which scheme-less input is anchored, so that `""` and
/// relative registration keys still normalize to an absolute URI.
pub(crate) static DEFAULT_ROOT: Lazy<Uri<String>> =
    Lazy::new(|| Uri::parse("json-schema:///".to_string()).expect("A valid URI"));

/// Parse a string into an absolute, normalized URI.
///
/// Input without a scheme (including the empty string) is resolved against
/// the default root first.
///
/// # Errors
///
/// Returns an error if the input is not a valid RFC 3986 URI reference.
pub fn from_str(uri: &str) -> Result<Uri<String>, Error> {
    let reference = UriRef::parse(uri)?.normalize();
    if reference.has_scheme() {
        Ok(Uri::parse(reference.as_str().to_string())?)
    } else {
        Ok(reference.resolve_against(&DEFAULT_ROOT.borrow())?)
    }
}

/// Resolve a URI reference against an absolute base, per RFC 3986 §5.
///
/// # Errors
///
/// Returns an error if the reference is unparsable or the base is unsuitable
/// for reference resolution (e.g. it carries a fragment).
pub fn resolve_against(base: &Uri<&str>, uri: &str) -> Result<Uri<String>, Error> {
    Ok(UriRef::parse(uri)?.resolve_against(base)?.normalize())
}

/// The classified fragment of a reference string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentKind<'a> {
    /// The reference carries no `#` at all.
    None,
    /// A bare `#`; refers to the root of the resource.
    Empty,
    /// A JSON Pointer fragment, starting with `/`.
    Pointer(&'a str),
    /// A plain-name anchor: non-empty, without `/`.
    Anchor(&'a str),
    /// Contains `/` without starting with it; can never match an anchor.
    Invalid(&'a str),
}

/// Split a reference at its first `#` and classify what follows.
#[must_use]
pub fn fragment_of(reference: &str) -> (&str, FragmentKind<'_>) {
    match reference.split_once('#') {
        None => (reference, FragmentKind::None),
        Some((uri, "")) => (uri, FragmentKind::Empty),
        Some((uri, fragment)) if fragment.starts_with('/') => (uri, FragmentKind::Pointer(fragment)),
        Some((uri, fragment)) if fragment.contains('/') => (uri, FragmentKind::Invalid(fragment)),
        Some((uri, fragment)) => (uri, FragmentKind::Anchor(fragment)),
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::{fragment_of, from_str, resolve_against, FragmentKind};

    #[test_case("urn:ex:a", "urn:ex:a", FragmentKind::None; "no fragment")]
    #[test_case("urn:ex:a#", "urn:ex:a", FragmentKind::Empty; "empty fragment")]
    #[test_case("#", "", FragmentKind::Empty; "bare hash")]
    #[test_case("urn:ex:a#/$defs/N", "urn:ex:a", FragmentKind::Pointer("/$defs/N"); "pointer")]
    #[test_case("#/", "", FragmentKind::Pointer("/"); "slash pointer")]
    #[test_case("urn:ex:a#N", "urn:ex:a", FragmentKind::Anchor("N"); "anchor")]
    #[test_case("urn:ex:a#foo/bar", "urn:ex:a", FragmentKind::Invalid("foo/bar"); "invalid")]
    fn classification(reference: &str, uri: &str, expected: FragmentKind<'_>) {
        assert_eq!(fragment_of(reference), (uri, expected));
    }

    #[test]
    fn normalizes_scheme_and_host() {
        let uri = from_str("HTTP://EXAMPLE.com/a/../b").expect("A valid URI");
        assert_eq!(uri.as_str(), "http://example.com/b");
    }

    #[test]
    fn empty_input_becomes_default_root() {
        let uri = from_str("").expect("A valid URI");
        assert_eq!(uri.as_str(), "json-schema:///");
    }

    #[test]
    fn relative_input_is_rooted() {
        let uri = from_str("nested/schema.json").expect("A valid URI");
        assert_eq!(uri.as_str(), "json-schema:///nested/schema.json");
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(from_str(":/example.com").is_err());
    }

    #[test_case("http://example.com/a/b", "c", "http://example.com/a/c")]
    #[test_case("http://example.com/a/b", "/c", "http://example.com/c")]
    #[test_case("http://example.com/a/b", "urn:other", "urn:other")]
    #[test_case("http://example.com/a/b", "", "http://example.com/a/b")]
    #[test_case("urn:ex:a", "urn:ex:b", "urn:ex:b")]
    fn joins(base: &str, reference: &str, expected: &str) {
        let base = from_str(base).expect("A valid URI");
        let resolved = resolve_against(&base.borrow(), reference).expect("Resolvable");
        assert_eq!(resolved.as_str(), expected);
    }
}
