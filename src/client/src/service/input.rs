use std::io::BufRead;

use clap::ValueEnum;
use common::model::game::{Move, RoundOutcome, MOVES};
use rand::seq::SliceRandom;
use tokio::sync::{
    broadcast::{self, error::RecvError},
    mpsc::{self, Receiver, Sender},
};
use tracing::{debug, error, info, warn};

use crate::model::{
    external::ClientUpdate,
    internal::ControllerEvent,
};

#[derive(Debug, Clone, PartialEq)]
pub struct Round {
    pub user_move: Move,
    pub server_move: Move,
    pub outcome: RoundOutcome,
}

/// Picks the user's move from the rounds played so far in this match.
pub trait Strategy: Send {
    fn make_move(&self, history: &[Round]) -> Move;
}

pub struct Only(pub Move);
impl Strategy for Only {
    fn make_move(&self, _: &[Round]) -> Move {
        self.0
    }
}

// rock -> paper -> scissor -> rock
pub struct Cycle {}
impl Strategy for Cycle {
    fn make_move(&self, history: &[Round]) -> Move {
        match history.last().map(|round| round.user_move) {
            None | Some(Move::Scissor) => Move::Rock,
            Some(Move::Rock) => Move::Paper,
            Some(Move::Paper) => Move::Scissor,
        }
    }
}

pub struct RandomMove {}
impl Strategy for RandomMove {
    fn make_move(&self, _: &[Round]) -> Move {
        *MOVES
            .choose(&mut rand::thread_rng())
            .unwrap_or(&Move::Rock)
    }
}

pub struct Scripted {
    moves: Vec<Move>,
}
impl Scripted {
    pub fn new(moves: Vec<Move>) -> Self {
        Scripted { moves }
    }
}
impl Strategy for Scripted {
    fn make_move(&self, history: &[Round]) -> Move {
        if self.moves.is_empty() {
            return Move::Rock;
        }
        self.moves[history.len() % self.moves.len()]
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoplayStrategy {
    Rock,
    Paper,
    Scissor,
    Cycle,
    Random,
}

impl AutoplayStrategy {
    pub fn build(&self) -> Box<dyn Strategy> {
        match self {
            AutoplayStrategy::Rock => Box::new(Only(Move::Rock)),
            AutoplayStrategy::Paper => Box::new(Only(Move::Paper)),
            AutoplayStrategy::Scissor => Box::new(Only(Move::Scissor)),
            AutoplayStrategy::Cycle => Box::new(Cycle {}),
            AutoplayStrategy::Random => Box::new(RandomMove {}),
        }
    }
}

/// Plays the user's side: answers every new round with the strategy's move.
pub struct Autoplayer {
    strategy: Box<dyn Strategy>,
    history: Vec<Round>,
}

impl Autoplayer {
    pub fn new(strategy: Box<dyn Strategy>) -> Self {
        Autoplayer {
            strategy,
            history: Vec::new(),
        }
    }

    pub async fn run(
        mut self,
        mut updates: broadcast::Receiver<ClientUpdate>,
        to_controller: Sender<ControllerEvent>,
        shutdown_receiver: &mut broadcast::Receiver<()>,
    ) {
        loop {
            tokio::select! {
                update = updates.recv() => {
                    let update = match update {
                        Ok(update) => update,
                        Err(RecvError::Lagged(skipped)) => {
                            warn!("Autoplayer skipped {} updates", skipped);
                            continue;
                        }
                        Err(RecvError::Closed) => break,
                    };
                    let Some(next_move) = self.observe(update) else {
                        continue;
                    };
                    debug!("Autoplaying {}", next_move);
                    if to_controller.send(ControllerEvent::UserMove(next_move)).await.is_err() {
                        break;
                    }
                }
                _ = shutdown_receiver.recv() => {
                    break;
                }
            }
        }
        info!("Exited autoplayer");
    }

    fn observe(&mut self, update: ClientUpdate) -> Option<Move> {
        match update {
            ClientUpdate::PendingMove { .. } => Some(self.strategy.make_move(&self.history)),
            ClientUpdate::RoundResult(result) => {
                self.history.push(Round {
                    user_move: result.user_move,
                    server_move: result.server_move,
                    outcome: result.outcome,
                });
                None
            }
            ClientUpdate::MatchReset => {
                self.history.clear();
                None
            }
            _ => None,
        }
    }
}

/// Reads stdin on a dedicated thread, a blocked read must not hold up runtime shutdown.
pub fn spawn_stdin_reader() -> Receiver<String> {
    let (sender, receiver) = mpsc::channel(16);
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if sender.blocking_send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    error!("Failed to read stdin: {}", e);
                    break;
                }
            }
        }
    });
    receiver
}

/// Turns typed lines (`rock`, `r`, ...) into user moves.
pub async fn read_terminal(
    mut lines: Receiver<String>,
    to_controller: Sender<ControllerEvent>,
    shutdown_receiver: &mut broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            line = lines.recv() => {
                let Some(line) = line else {
                    info!("Input closed");
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<Move>() {
                    Ok(user_move) => {
                        if to_controller.send(ControllerEvent::UserMove(user_move)).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("{}", e);
                        println!("Please choose rock, paper or scissor ({})", e);
                    }
                }
            }
            _ = shutdown_receiver.recv() => {
                break;
            }
        }
    }
}
