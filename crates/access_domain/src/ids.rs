//! Concrete carrier types for the spec's runtime-typed generic parameters
//! (§9 "Runtime-typed generic parameters"): strings for users, groups,
//! entity types and entities; small integers for components and access
//! levels.

use std::fmt;

use access_core::id::{validate_identifier, BlankIdentifier};

macro_rules! string_id {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(String);

        impl $name {
            /// Validates that `value` is non-empty and not whitespace-only.
            pub fn new(value: impl Into<String>) -> Result<Self, BlankIdentifier> {
                let value = value.into();
                validate_identifier(&value)?;
                Ok(Self(value))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl TryFrom<&str> for $name {
            type Error = BlankIdentifier;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl TryFrom<String> for $name {
            type Error = BlankIdentifier;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }
    };
}

string_id!(UserId, "A leaf vertex identifier (a principal that receives grants).");
string_id!(GroupId, "A non-leaf vertex identifier (a grouping of users and/or groups).");
string_id!(EntityType, "An application-defined resource category.");
string_id!(Entity, "An instance of an [`EntityType`].");

/// An opaque application component identifier. Components are small
/// integers rather than strings: the core treats them as an opaque
/// routing key, never a user-facing name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(u32);

impl ComponentId {
    pub fn new(value: u32) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "component#{}", self.0)
    }
}

impl From<u32> for ComponentId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

/// A qualifier on a component grant (e.g. read/write); opaque to the core.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccessLevel(u32);

impl AccessLevel {
    pub fn new(value: u32) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "access#{}", self.0)
    }
}

impl From<u32> for AccessLevel {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

/// A `(component, access level)` pair. Equality and hashing are structural
/// on both fields (§3 "Equality").
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentAccess {
    pub component: ComponentId,
    pub access_level: AccessLevel,
}

impl ComponentAccess {
    pub fn new(component: ComponentId, access_level: AccessLevel) -> Self {
        Self { component, access_level }
    }
}

impl fmt::Display for ComponentAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.component, self.access_level)
    }
}
