use common::model::game::{Move, RoundOutcome, Side};

use super::external::GameError;
use crate::service::pacing::PacingPolicy;

#[derive(Debug, Clone)]
pub struct MatchConfig {
    // Rounds (deuces included) before a leader can win the match
    pub rounds_to_complete: u32,
    pub pacing: PacingPolicy,
}

impl Default for MatchConfig {
    fn default() -> Self {
        MatchConfig {
            rounds_to_complete: 7,
            pacing: PacingPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    AwaitingOpponent,
    AwaitingUser,
    Resolved,
    ServerWon,
    UserWon,
}

impl Status {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Status::ServerWon | Status::UserWon)
    }

    pub fn accepts_moves(&self) -> bool {
        matches!(self, Status::AwaitingOpponent | Status::AwaitingUser)
    }
}

/// Everything one match remembers. Only the controller mutates it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MatchState {
    pub server_wins: u32,
    pub user_wins: u32,
    pub deuce_count: u32,
    pub user_history: Vec<Move>,
    pub server_history: Vec<Move>,
    // Moves of the round in progress
    pub server_move: Option<Move>,
    pub user_move: Option<Move>,
    pub status: Status,
}

impl MatchState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rounds_played(&self) -> u32 {
        self.server_wins + self.user_wins + self.deuce_count
    }

    pub fn start_round(&mut self) {
        self.server_move = None;
        self.user_move = None;
        self.status = Status::AwaitingOpponent;
    }

    /// Counts a resolved round and appends both moves. `Invalid` rounds are not recorded.
    pub fn record(&mut self, outcome: RoundOutcome, server_move: Move, user_move: Move) {
        match outcome {
            RoundOutcome::Deuce => self.deuce_count += 1,
            RoundOutcome::Server => self.server_wins += 1,
            RoundOutcome::User => self.user_wins += 1,
            RoundOutcome::Invalid => return,
        }
        self.server_history.push(server_move);
        self.user_history.push(user_move);
    }

    pub fn leader(&self) -> Option<Side> {
        match self.server_wins.cmp(&self.user_wins) {
            std::cmp::Ordering::Greater => Some(Side::Server),
            std::cmp::Ordering::Less => Some(Side::User),
            std::cmp::Ordering::Equal => None,
        }
    }

    pub fn winner(&self) -> Option<Side> {
        match self.status {
            Status::ServerWon => Some(Side::Server),
            Status::UserWon => Some(Side::User),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextStep {
    NextRound,
    ResetMatch,
}

// Everything the controller task reacts to
#[derive(Debug)]
pub enum ControllerEvent {
    OpponentMove(Result<Move, GameError>),
    UserMove(Move),
    PacingElapsed(NextStep),
}
