//! Entity kinds and versioned collections.

use std::fmt;
use std::slice;

/// Every kind of record that makes up a model description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    Model,
    Machine,
    Application,
    Unit,
    ApplicationOffer,
    Resource,
    Relation,
    Endpoint,
    Space,
    Subnet,
    StorageInstance,
    Volume,
    VolumeAttachment,
    Filesystem,
    FilesystemAttachment,
    CloudCredential,
    Secret,
    SecretRevision,
    Status,
}

impl EntityKind {
    /// All kinds, in declaration order.
    pub const ALL: [EntityKind; 19] = [
        EntityKind::Model,
        EntityKind::Machine,
        EntityKind::Application,
        EntityKind::Unit,
        EntityKind::ApplicationOffer,
        EntityKind::Resource,
        EntityKind::Relation,
        EntityKind::Endpoint,
        EntityKind::Space,
        EntityKind::Subnet,
        EntityKind::StorageInstance,
        EntityKind::Volume,
        EntityKind::VolumeAttachment,
        EntityKind::Filesystem,
        EntityKind::FilesystemAttachment,
        EntityKind::CloudCredential,
        EntityKind::Secret,
        EntityKind::SecretRevision,
        EntityKind::Status,
    ];

    /// Human-readable name used in error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Model => "model",
            EntityKind::Machine => "machine",
            EntityKind::Application => "application",
            EntityKind::Unit => "unit",
            EntityKind::ApplicationOffer => "application offer",
            EntityKind::Resource => "resource",
            EntityKind::Relation => "relation",
            EntityKind::Endpoint => "endpoint",
            EntityKind::Space => "space",
            EntityKind::Subnet => "subnet",
            EntityKind::StorageInstance => "storage instance",
            EntityKind::Volume => "volume",
            EntityKind::VolumeAttachment => "volume attachment",
            EntityKind::Filesystem => "filesystem",
            EntityKind::FilesystemAttachment => "filesystem attachment",
            EntityKind::CloudCredential => "cloud credential",
            EntityKind::Secret => "secret",
            EntityKind::SecretRevision => "secret revision",
            EntityKind::Status => "status",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record type with its own evolving wire shape.
pub trait Entity {
    const KIND: EntityKind;

    /// The newest wire version. Decode always normalizes to it and encode
    /// always emits it.
    const LATEST_VERSION: u32;
}

/// An owned, versioned collection of child entities.
///
/// The version stamp records the wire shape the collection was decoded from
/// or will be encoded to. It is only ever the latest version of `T`, and it is
/// (re)stamped by every append.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection<T> {
    version: u32,
    items: Vec<T>,
}

impl<T: Entity> Collection<T> {
    /// Creates an empty collection stamped at the latest version.
    pub fn new() -> Self {
        Self {
            version: T::LATEST_VERSION,
            items: Vec::new(),
        }
    }

    /// Wraps freshly decoded entities.
    pub(crate) fn from_decoded(items: Vec<T>) -> Self {
        Self {
            version: T::LATEST_VERSION,
            items,
        }
    }

    /// Version stamp of the collection's wire shape.
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Appends an entity, stamping the collection, and returns it.
    pub fn push(&mut self, item: T) -> &mut T {
        self.version = T::LATEST_VERSION;
        let index = self.items.len();
        self.items.push(item);
        &mut self.items[index]
    }
}

impl<T> Collection<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> slice::IterMut<'_, T> {
        self.items.iter_mut()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    /// Finds the first entity matching a predicate.
    pub fn find(&self, mut predicate: impl FnMut(&T) -> bool) -> Option<&T> {
        self.items.iter().find(|item| predicate(item))
    }

    /// Mutable counterpart of [`Collection::find`].
    pub fn find_mut(&mut self, mut predicate: impl FnMut(&T) -> bool) -> Option<&mut T> {
        self.items.iter_mut().find(|item| predicate(item))
    }
}

impl<T: Entity> Default for Collection<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, T> IntoIterator for &'a Collection<T> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Widget(u8);

    impl Entity for Widget {
        const KIND: EntityKind = EntityKind::Space;
        const LATEST_VERSION: u32 = 7;
    }

    #[test]
    fn test_new_collection_is_stamped() {
        let widgets: Collection<Widget> = Collection::new();
        assert_eq!(widgets.version(), 7);
        assert!(widgets.is_empty());
    }

    #[test]
    fn test_push_returns_child() {
        let mut widgets = Collection::new();
        widgets.push(Widget(1)).0 = 5;
        widgets.push(Widget(2));
        assert_eq!(widgets.len(), 2);
        assert_eq!(widgets.get(0), Some(&Widget(5)));
        assert_eq!(widgets.find(|w| w.0 == 2), Some(&Widget(2)));
        assert_eq!(widgets.version(), 7);
    }

    #[test]
    fn test_kind_names_are_distinct() {
        let mut names: Vec<_> = EntityKind::ALL.iter().map(|k| k.as_str()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), EntityKind::ALL.len());
    }
}
