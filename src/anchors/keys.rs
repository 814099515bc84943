//! Composite (URI, anchor name) keys for the anchor index.
//!
//! Lookups come in with a borrowed URI and a borrowed name; storing owned
//! keys while hashing borrowed ones would normally force an allocation per
//! query. The trait object below lets both the owned [`AnchorKey`] and the
//! borrowed [`AnchorKeyRef`] stand in for the same map key.
use std::{
    borrow::Borrow,
    hash::{Hash, Hasher},
};

use fluent_uri::Uri;

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub(crate) struct AnchorKey {
    uri: Uri<String>,
    name: String,
}

impl AnchorKey {
    pub(crate) fn new(uri: Uri<String>, name: String) -> Self {
        Self { uri, name }
    }
}

#[derive(Copy, Clone, Hash, PartialEq, Eq)]
pub(crate) struct AnchorKeyRef<'a> {
    uri: &'a Uri<String>,
    name: &'a str,
}

impl<'a> AnchorKeyRef<'a> {
    pub(crate) fn new(uri: &'a Uri<String>, name: &'a str) -> Self {
        AnchorKeyRef { uri, name }
    }

    pub(crate) fn as_dyn(&self) -> &dyn AnchorKeyed {
        self as &dyn AnchorKeyed
    }
}

pub(crate) trait AnchorKeyed {
    fn anchor_key(&self) -> AnchorKeyRef<'_>;
}

impl AnchorKeyed for AnchorKey {
    fn anchor_key(&self) -> AnchorKeyRef<'_> {
        AnchorKeyRef::new(&self.uri, &self.name)
    }
}

impl AnchorKeyed for AnchorKeyRef<'_> {
    fn anchor_key(&self) -> AnchorKeyRef<'_> {
        *self
    }
}

impl<'a> Borrow<dyn AnchorKeyed + 'a> for AnchorKey {
    fn borrow(&self) -> &(dyn AnchorKeyed + 'a) {
        self
    }
}

impl Eq for (dyn AnchorKeyed + '_) {}

impl PartialEq for (dyn AnchorKeyed + '_) {
    fn eq(&self, other: &dyn AnchorKeyed) -> bool {
        self.anchor_key().eq(&other.anchor_key())
    }
}

impl Hash for (dyn AnchorKeyed + '_) {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.anchor_key().hash(state);
    }
}
