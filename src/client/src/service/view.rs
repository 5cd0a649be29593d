use common::model::game::{RoundOutcome, Side};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::warn;

use crate::model::external::ClientUpdate;

pub fn render(update: &ClientUpdate) -> String {
    match update {
        ClientUpdate::PendingMove { round } => {
            format!("Round {}: rock, paper or scissor?", round)
        }
        ClientUpdate::OpponentReady => "Opponent has chosen.".to_owned(),
        ClientUpdate::RoundResult(result) => {
            let verdict = match result.outcome {
                RoundOutcome::Deuce => "deuce",
                RoundOutcome::Server => "server wins the round",
                RoundOutcome::User => "you win the round",
                RoundOutcome::Invalid => "unknown result",
            };
            format!(
                "Server played {}, you played {}: {}. Server {} - {} you ({} deuces)",
                result.server_move,
                result.user_move,
                verdict,
                result.server_wins,
                result.user_wins,
                result.deuces
            )
        }
        ClientUpdate::MatchResult {
            winner,
            server_wins,
            user_wins,
            total,
        } => {
            let winner = match winner {
                Side::Server => "Server wins",
                Side::User => "You win",
            };
            format!(
                "Match over. {} {}-{} after {} rounds.",
                winner, server_wins, user_wins, total
            )
        }
        ClientUpdate::MatchReset => "New match.".to_owned(),
        ClientUpdate::Error { message } => format!("Error: {}", message),
    }
}

pub async fn run(
    mut updates: broadcast::Receiver<ClientUpdate>,
    shutdown_receiver: &mut broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            update = updates.recv() => match update {
                Ok(update) => println!("{}", render(&update)),
                Err(RecvError::Lagged(skipped)) => warn!("View skipped {} updates", skipped),
                Err(RecvError::Closed) => break,
            },
            _ = shutdown_receiver.recv() => {
                break;
            }
        }
    }
}
