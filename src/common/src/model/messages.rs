use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::game::{encode_history, Move, Side};

/// Opaque session token sent as `id` with every report.
#[derive(Debug, Hash, Eq, PartialEq, Clone, Copy)]
pub struct Id(pub Uuid);

impl Id {
    pub fn new() -> Self {
        Id(Uuid::new_v4())
    }
}

impl Default for Id {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for Id {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Id)
    }
}

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let uuid = Uuid::parse_str(&s).map_err(serde::de::Error::custom)?;
        Ok(Id(uuid))
    }
}
impl Serialize for Id {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

// Opponent service messages

// GET /play
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct PlayQuery {
    #[serde(rename = "pu")]
    pub user_history: String,
    #[serde(rename = "ps")]
    pub server_history: String,
}

impl PlayQuery {
    pub fn from_history(user_history: &[Move], server_history: &[Move]) -> Self {
        PlayQuery {
            user_history: encode_history(user_history),
            server_history: encode_history(server_history),
        }
    }
}

// GET /record, histories are the ones preceding this round
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RecordPlayQuery {
    #[serde(rename = "u")]
    pub user_move: Move,
    #[serde(rename = "s")]
    pub server_move: Move,
    #[serde(rename = "pu")]
    pub user_history: String,
    #[serde(rename = "ps")]
    pub server_history: String,
    pub id: Id,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SessionQuery {
    pub id: Id,
}

// POST /game?id=..
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MatchResultRequest {
    pub winner: Side,
    pub user: String,
    pub server: String,
}
