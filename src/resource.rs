use std::borrow::Cow;

use serde_json::Value;

use crate::{Anchor, Error, Resolved, Resolver, Segments, Specification};

/// A JSON document paired with the specification under which it is
/// interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    contents: Value,
    specification: &'static Specification,
}

impl Resource {
    pub(crate) fn new(contents: Value, specification: &'static Specification) -> Self {
        Self {
            contents,
            specification,
        }
    }
    /// Resource contents.
    #[must_use]
    pub fn contents(&self) -> &Value {
        &self.contents
    }
    /// The specification this resource is interpreted under.
    #[must_use]
    pub fn specification(&self) -> &'static Specification {
        self.specification
    }
    /// Create a resource, detecting its specification from `$schema`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CannotDetermineSpecification`] when `$schema` is
    /// absent, not a string, or unrecognized.
    pub fn from_contents(contents: Value) -> Result<Resource, Error> {
        let specification = Specification::detect(&contents)?;
        Ok(specification.create_resource(contents))
    }
    /// The resource's internal identifier, if any.
    ///
    /// A trailing empty fragment is stripped, and an identifier that is empty
    /// afterwards counts as absent.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.as_ref().id()
    }
    /// Child resources, each interpreted under its own `$schema` when
    /// declared and under this resource's specification otherwise.
    pub fn subresources(&self) -> impl Iterator<Item = Result<Resource, Error>> + '_ {
        self.specification
            .subresources_of(&self.contents)
            .map(|contents| {
                Specification::detect_or(contents, self.specification)
                    .map(|specification| specification.create_resource(contents.clone()))
            })
    }
    /// Anchors exposed at this resource's root.
    pub fn anchors(&self) -> impl Iterator<Item = Anchor> + '_ {
        self.specification.anchors_in(&self.contents)
    }
    /// Evaluate an RFC 6901 JSON Pointer from this resource's root.
    ///
    /// The empty pointer yields the resource itself. Crossing into a
    /// subresource that declares an `$id` re-bases the resolver carried in
    /// the result.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PointerToNowhere`] when any step of the pointer does
    /// not exist.
    pub fn pointer<'r>(
        &'r self,
        pointer: &str,
        mut resolver: Resolver<'r>,
    ) -> Result<Resolved<'r>, Error> {
        if pointer.is_empty() {
            return Ok(Resolved::new(&self.contents, resolver));
        }
        if !pointer.starts_with('/') {
            return Err(Error::pointer_to_nowhere(pointer, resolver.base_str()));
        }
        let decoded = percent_encoding::percent_decode_str(&pointer[1..])
            .decode_utf8()
            .map_err(|_| Error::pointer_to_nowhere(pointer, resolver.base_str()))?;
        let mut contents = &self.contents;
        let mut segments = Segments::new();
        for segment in decoded.split('/') {
            if let Some(array) = contents.as_array() {
                let index: usize = segment
                    .parse()
                    .map_err(|_| Error::pointer_to_nowhere(pointer, resolver.base_str()))?;
                contents = array
                    .get(index)
                    .ok_or_else(|| Error::pointer_to_nowhere(pointer, resolver.base_str()))?;
                segments.push(index);
            } else {
                let segment = unescape_segment(segment);
                contents = contents
                    .get(segment.as_ref())
                    .ok_or_else(|| Error::pointer_to_nowhere(pointer, resolver.base_str()))?;
                segments.push(segment);
            }
            let moved = self.specification.maybe_in_subresource(
                &segments,
                &resolver,
                self.specification.create_resource_ref(contents),
            )?;
            if moved != resolver {
                segments = Segments::new();
            }
            resolver = moved;
        }
        Ok(Resolved::new(contents, resolver))
    }
    /// Borrow the contents together with the specification.
    #[must_use]
    pub fn as_ref(&self) -> ResourceRef<'_> {
        ResourceRef::new(&self.contents, self.specification)
    }
}

/// A borrowed view of a document under a specification.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ResourceRef<'a> {
    contents: &'a Value,
    specification: &'static Specification,
}

impl<'a> ResourceRef<'a> {
    #[must_use]
    pub fn new(contents: &'a Value, specification: &'static Specification) -> Self {
        ResourceRef {
            contents,
            specification,
        }
    }
    #[must_use]
    pub fn id(&self) -> Option<&'a str> {
        self.specification
            .id_of(self.contents)
            .map(|id| id.trim_end_matches('#'))
            .filter(|id| !id.is_empty())
    }
    #[must_use]
    pub fn contents(&self) -> &'a Value {
        self.contents
    }
    #[must_use]
    pub fn specification(&self) -> &'static Specification {
        self.specification
    }
}

/// Undo RFC 6901 escaping: `~1` is `/` and `~0` is `~`.
fn unescape_segment(segment: &str) -> Cow<'_, str> {
    if !segment.contains('~') {
        return Cow::Borrowed(segment);
    }
    let mut buffer = String::with_capacity(segment.len());
    let mut characters = segment.chars();
    while let Some(current) = characters.next() {
        if current == '~' {
            match characters.next() {
                Some('0') => buffer.push('~'),
                Some('1') => buffer.push('/'),
                Some(other) => {
                    buffer.push('~');
                    buffer.push(other);
                }
                None => buffer.push('~'),
            }
        } else {
            buffer.push(current);
        }
    }
    Cow::Owned(buffer)
}
