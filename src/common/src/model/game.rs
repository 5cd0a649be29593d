use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Move {
    Rock,
    Paper,
    Scissor,
}

pub const MOVES: [Move; 3] = [Move::Rock, Move::Paper, Move::Scissor];

impl Move {
    /// `None` when both moves are the same, otherwise whether `self` wins.
    pub fn beats(&self, other: &Move) -> Option<bool> {
        if self == other {
            None
        } else {
            Some(matches!(
                (self, other),
                (Move::Rock, Move::Scissor) | (Move::Scissor, Move::Paper) | (Move::Paper, Move::Rock)
            ))
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Move::Rock => "rock",
            Move::Paper => "paper",
            Move::Scissor => "scissor",
        }
    }

    /// Single letter used in compressed histories.
    pub fn initial(&self) -> char {
        match self {
            Move::Rock => 'r',
            Move::Paper => 'p',
            Move::Scissor => 's',
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unrecognized move {0:?}")]
pub struct ParseMoveError(pub String);

impl FromStr for Move {
    type Err = ParseMoveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rock" | "r" => Ok(Move::Rock),
            "paper" | "p" => Ok(Move::Paper),
            "scissor" | "scissors" | "s" => Ok(Move::Scissor),
            _ => Err(ParseMoveError(s.to_owned())),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RoundOutcome {
    Deuce,
    Server,
    User,
    Invalid,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Server,
    User,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Server => f.write_str("server"),
            Side::User => f.write_str("user"),
        }
    }
}

/// Resolves one round. `Invalid` is only produced if the beats relation is
/// inconsistent, callers treat it as fatal to the round.
pub fn resolve(server: Move, user: Move) -> RoundOutcome {
    match server.beats(&user) {
        None => RoundOutcome::Deuce,
        Some(true) => RoundOutcome::Server,
        Some(false) if user.beats(&server) == Some(true) => RoundOutcome::User,
        Some(false) => RoundOutcome::Invalid,
    }
}

/// Compresses a history to one letter per move, e.g. `[rock, paper]` -> `"rp"`.
pub fn encode_history(history: &[Move]) -> String {
    history.iter().map(Move::initial).collect()
}

pub fn decode_history(encoded: &str) -> Result<Vec<Move>, ParseMoveError> {
    encoded
        .chars()
        .map(|c| c.to_string().parse::<Move>())
        .collect()
}
