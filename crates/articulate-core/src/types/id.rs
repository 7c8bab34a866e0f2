//! Identifiers shared across the build: part ids, parent references, material handles

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Name of the root link every build is anchored to
pub const WORLD_LINK: &str = "world";

/// Sequential part identifier, unique within one build
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartId(pub u64);

impl PartId {
    /// Link name used for this part in the robot description
    pub fn link_name(&self) -> String {
        self.0.to_string()
    }

    /// File name of this part's exported mesh
    pub fn file_name(&self) -> String {
        format!("{}.obj", self.0)
    }
}

impl fmt::Display for PartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for PartId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Declared parent of a part
///
/// `None` at the declaration site (an `Option<ParentRef>`) means the part is
/// unparented and gets a synthesized fixed joint to the world at its own origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParentRef {
    World,
    Part(PartId),
}

impl ParentRef {
    /// Link name the parent resolves to
    pub fn link_name(&self) -> String {
        match self {
            ParentRef::World => WORLD_LINK.to_string(),
            ParentRef::Part(id) => id.link_name(),
        }
    }

    /// The referenced part, if any
    pub fn part(&self) -> Option<PartId> {
        match self {
            ParentRef::World => None,
            ParentRef::Part(id) => Some(*id),
        }
    }
}

impl From<PartId> for ParentRef {
    fn from(id: PartId) -> Self {
        ParentRef::Part(id)
    }
}

impl fmt::Display for ParentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParentRef::World => f.write_str(WORLD_LINK),
            ParentRef::Part(id) => write!(f, "{}", id),
        }
    }
}

/// Error parsing a parent reference from text
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid parent reference '{0}': expected \"world\" or a part id")]
pub struct ParseParentRefError(pub String);

impl FromStr for ParentRef {
    type Err = ParseParentRefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == WORLD_LINK {
            return Ok(ParentRef::World);
        }
        s.parse::<u64>()
            .map(|id| ParentRef::Part(PartId(id)))
            .map_err(|_| ParseParentRefError(s.to_string()))
    }
}

/// Wire form: the string "world" or an integer part id
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum ParentRefWire {
    Id(u64),
    Name(String),
}

impl Serialize for ParentRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ParentRef::World => ParentRefWire::Name(WORLD_LINK.to_string()).serialize(serializer),
            ParentRef::Part(id) => ParentRefWire::Id(id.0).serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for ParentRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match ParentRefWire::deserialize(deserializer)? {
            ParentRefWire::Id(id) => Ok(ParentRef::Part(PartId(id))),
            ParentRefWire::Name(name) => name.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// Opaque material handle carried from the geometry side to the description
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MaterialRef(pub String);

impl MaterialRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}
