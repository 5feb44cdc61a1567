//! Typed identifiers for cross-entity references.
//!
//! References between entities are held by value as identifier newtypes,
//! never as links into the graph. They are resolved by the validator through
//! an index built once per graph.

use std::borrow::Borrow;
use std::fmt;

macro_rules! identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

identifier! {
    /// Name of an application, unique within a model.
    ApplicationName
}

identifier! {
    /// Name of a unit, `<application>/<ordinal>`.
    UnitName
}

identifier! {
    /// Machine identifier: `"0"` for a top-level machine, `"0/lxd/1"` for a
    /// container.
    MachineId
}

identifier! {
    /// Provider-independent space identifier.
    SpaceId
}

identifier! {
    /// Storage instance identifier, `<storage-name>/<ordinal>`.
    StorageId
}

identifier! {
    /// Volume identifier.
    VolumeId
}

identifier! {
    /// Filesystem identifier.
    FilesystemId
}

identifier! {
    /// Secret identifier.
    SecretId
}

impl UnitName {
    /// Splits a well-formed unit name into application and ordinal.
    pub fn parts(&self) -> Option<(&str, u32)> {
        split_unit_name(&self.0)
    }

    /// The application part of a well-formed unit name.
    pub fn application(&self) -> Option<&str> {
        self.parts().map(|(app, _)| app)
    }
}

impl MachineId {
    /// The enclosing machine of a container, `None` for a top-level machine.
    pub fn parent(&self) -> Option<MachineId> {
        let (parent, _) = self.0.rsplit_once('/')?;
        let (parent, _) = parent.rsplit_once('/')?;
        Some(MachineId::new(parent))
    }

    pub fn is_container(&self) -> bool {
        self.0.contains('/')
    }
}

/// Treats an empty reference as absent.
///
/// Documents write an absent reference as an empty string or leave it out,
/// and decode both as `None`; constructors normalize the same way so a built
/// graph and its decoded copy agree.
pub(crate) fn present<T: AsRef<str>>(reference: Option<T>) -> Option<T> {
    reference.filter(|r| !r.as_ref().is_empty())
}

/// Splits `<name>/<ordinal>` where the name starts with a lowercase letter
/// and holds only `[a-z0-9-]`, and the ordinal is all digits. The ordinal
/// must also fit `u32`.
pub(crate) fn split_unit_name(s: &str) -> Option<(&str, u32)> {
    let (name, ordinal) = split_unit_shape(s)?;
    Some((name, ordinal.parse().ok()?))
}

/// [`split_unit_name`] without the range check on the ordinal digits.
fn split_unit_shape(s: &str) -> Option<(&str, &str)> {
    let (name, ordinal) = s.split_once('/')?;
    let mut chars = name.chars();
    let first = chars.next()?;
    if !first.is_ascii_lowercase() {
        return None;
    }
    if !chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-') {
        return None;
    }
    if ordinal.is_empty() || !ordinal.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((name, ordinal))
}

/// Whether an identifier has the `<name>/<ordinal>` shape of a unit name,
/// however large the ordinal.
pub fn looks_like_unit_name(s: &str) -> bool {
    split_unit_shape(s).is_some()
}

/// Whether a unit-shaped identifier has an ordinal too large for `u32`.
pub fn unit_ordinal_overflows(s: &str) -> bool {
    looks_like_unit_name(s) && split_unit_name(s).is_none()
}

/// The thing a storage attachment is attached to.
///
/// Exactly one host is always present; there is no "no host" state.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AttachmentHost {
    Machine(MachineId),
    Unit(UnitName),
}

impl AttachmentHost {
    /// Classifies a flat host identifier: the `<name>/<ordinal>` shape is a
    /// unit, anything else is a machine.
    pub fn classify(id: &str) -> Self {
        if looks_like_unit_name(id) {
            AttachmentHost::Unit(UnitName::new(id))
        } else {
            AttachmentHost::Machine(MachineId::new(id))
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            AttachmentHost::Machine(id) => id.as_str(),
            AttachmentHost::Unit(name) => name.as_str(),
        }
    }

    pub fn machine(&self) -> Option<&MachineId> {
        match self {
            AttachmentHost::Machine(id) => Some(id),
            AttachmentHost::Unit(_) => None,
        }
    }

    pub fn unit(&self) -> Option<&UnitName> {
        match self {
            AttachmentHost::Unit(name) => Some(name),
            AttachmentHost::Machine(_) => None,
        }
    }
}

impl fmt::Display for AttachmentHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
