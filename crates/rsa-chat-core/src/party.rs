use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Party {
    Alice,
    Bob,
}

impl Party {
    pub const ALL: [Party; 2] = [Party::Alice, Party::Bob];

    /// The correspondent on the other phone.
    pub fn peer(self) -> Party {
        match self {
            Party::Alice => Party::Bob,
            Party::Bob => Party::Alice,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Party::Alice => "Alice",
            Party::Bob => "Bob",
        }
    }
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Party {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "alice" => Ok(Party::Alice),
            "bob" => Ok(Party::Bob),
            other => Err(format!("unknown party '{other}' (expected alice or bob)")),
        }
    }
}
