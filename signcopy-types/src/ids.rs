//! Identifier types used throughout the SignCopy core.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::Error;

/// Identity of the player (or other actor) that triggers an action and
/// owns a personal library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(Uuid);

impl ActorId {
    /// Creates a new random actor ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an actor ID from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }

    /// Parses an actor ID from a string.
    pub fn parse(s: &str) -> Result<Self, Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for ActorId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ActorId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Block position of a sign. Used as the correlation key between the
/// placement callback and the later text-edit callback.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockLocation {
    pub world: String,
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockLocation {
    #[must_use]
    pub fn new(world: impl Into<String>, x: i32, y: i32, z: i32) -> Self {
        Self {
            world: world.into(),
            x,
            y,
            z,
        }
    }
}

/// Formats as `world:x,y,z`.
impl fmt::Display for BlockLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{},{},{}", self.world, self.x, self.y, self.z)
    }
}

impl FromStr for BlockLocation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidLocation(s.to_string());
        let (world, coords) = s.rsplit_once(':').ok_or_else(invalid)?;
        if world.is_empty() {
            return Err(invalid());
        }
        let parts: Vec<i32> = coords
            .split(',')
            .map(|p| p.trim().parse::<i32>())
            .collect::<Result<_, _>>()
            .map_err(|_| invalid())?;
        match parts.as_slice() {
            [x, y, z] => Ok(Self::new(world, *x, *y, *z)),
            _ => Err(invalid()),
        }
    }
}
