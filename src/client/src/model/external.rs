use common::{
    model::game::{Move, ParseMoveError, RoundOutcome, Side},
    reqwest,
};
use serde::Serialize;
use thiserror::Error;

// What the view layer gets to see
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(tag = "type")]
pub enum ClientUpdate {
    PendingMove {
        round: u32,
    },
    OpponentReady,
    RoundResult(RoundResult),
    MatchResult {
        winner: Side,
        server_wins: u32,
        user_wins: u32,
        total: u32,
    },
    MatchReset,
    Error {
        message: String,
    },
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct RoundResult {
    pub outcome: RoundOutcome,
    pub server_move: Move,
    pub user_move: Move,
    pub server_wins: u32,
    pub user_wins: u32,
    pub deuces: u32,
}

#[derive(Error, Debug)]
pub enum GameError {
    #[error("request to opponent service failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("opponent service sent an {0}")]
    UnknownMove(#[from] ParseMoveError),

    #[error("invalid server url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("unknown game status: server played {server}, user played {user}")]
    InvalidOutcome { server: Move, user: Move },
}
