use crate::error::ModelError;
use serde::{Deserialize, Serialize};

/// Rank of a component in the composition scale.
///
/// Persisted as its integer rank. A node may only contain children whose
/// level does not exceed its own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Level {
    #[default]
    Atom = 0,
    Molecule = 1,
    Organism = 2,
    Template = 3,
}

impl Level {
    pub fn rank(self) -> u8 {
        self as u8
    }

    pub fn can_contain(self, child: Level) -> bool {
        child <= self
    }
}

impl TryFrom<u8> for Level {
    type Error = ModelError;

    fn try_from(rank: u8) -> Result<Self, Self::Error> {
        match rank {
            0 => Ok(Level::Atom),
            1 => Ok(Level::Molecule),
            2 => Ok(Level::Organism),
            3 => Ok(Level::Template),
            other => Err(ModelError::InvalidLevel(other)),
        }
    }
}

impl From<Level> for u8 {
    fn from(level: Level) -> Self {
        level.rank()
    }
}
