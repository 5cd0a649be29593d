use std::{sync::Arc, time::Duration};

use common::model::{
    game::{encode_history, resolve, Move, RoundOutcome, Side},
    messages::{Id, MatchResultRequest, PlayQuery, RecordPlayQuery},
};
use tokio::sync::{
    broadcast,
    mpsc::{Receiver, Sender},
};
use tracing::{debug, error, info, warn};

use super::{
    opponent::OpponentMoveProvider,
    pacing::PacingTimer,
    report::{ReportSink, Reporter},
};
use crate::model::{
    external::{ClientUpdate, GameError, RoundResult},
    internal::{ControllerEvent, MatchConfig, MatchState, NextStep, Status},
};

/// Drives one session: a match at a time, round by round.
///
/// All state lives in this struct and is only touched from the task running
/// [`MatchController::run`]. The opponent request and the pacing timer run
/// as their own tasks and report back through `to_controller`.
pub struct MatchController {
    config: MatchConfig,
    session_id: Id,
    state: MatchState,
    opponent: Arc<dyn OpponentMoveProvider>,
    reporter: Reporter,
    timer: PacingTimer,
    to_controller: Sender<ControllerEvent>,
    updates: broadcast::Sender<ClientUpdate>,
}

impl MatchController {
    pub fn new(
        config: MatchConfig,
        session_id: Id,
        opponent: Arc<dyn OpponentMoveProvider>,
        reports: Arc<dyn ReportSink>,
        to_controller: Sender<ControllerEvent>,
        updates: broadcast::Sender<ClientUpdate>,
    ) -> Self {
        MatchController {
            config,
            session_id,
            state: MatchState::new(),
            opponent,
            reporter: Reporter::new(reports),
            timer: PacingTimer::new(to_controller.clone()),
            to_controller,
            updates,
        }
    }

    pub fn state(&self) -> &MatchState {
        &self.state
    }

    pub async fn run(
        mut self,
        mut from_input: Receiver<ControllerEvent>,
        shutdown_receiver: &mut broadcast::Receiver<()>,
    ) {
        info!("Starting session {}", self.session_id);
        self.start_round();
        loop {
            tokio::select! {
                event = from_input.recv() => {
                    let Some(event) = event else {
                        break;
                    };
                    if let Err(e) = self.handle_event(event) {
                        self.surface(e);
                    }
                }
                _ = shutdown_receiver.recv() => {
                    break;
                }
            }
        }
        self.timer.cancel();
        info!("Exited match controller");
    }

    pub fn handle_event(&mut self, event: ControllerEvent) -> Result<(), GameError> {
        match event {
            ControllerEvent::OpponentMove(result) => self.receive_opponent_move(result).map(|_| ()),
            ControllerEvent::UserMove(user_move) => self.submit_user_move(user_move).map(|_| ()),
            ControllerEvent::PacingElapsed(step) => {
                self.on_pacing_elapsed(step);
                Ok(())
            }
        }
    }

    /// Asks the opponent service for this round's move, seeded with the full
    /// history of both sides. The answer arrives as `OpponentMove`.
    pub fn request_opponent_move(&mut self) {
        let query = PlayQuery::from_history(&self.state.user_history, &self.state.server_history);
        debug!("Requesting opponent move with {:?}", query);
        let opponent = self.opponent.clone();
        let sender = self.to_controller.clone();
        tokio::spawn(async move {
            let result = opponent.next_move(&query).await;
            if sender.send(ControllerEvent::OpponentMove(result)).await.is_err() {
                warn!("Controller stopped before the opponent move arrived");
            }
        });
    }

    /// A failed request leaves the round unresolved, there is no retry.
    pub fn receive_opponent_move(
        &mut self,
        result: Result<Move, GameError>,
    ) -> Result<Option<RoundResult>, GameError> {
        let server_move = match result {
            Ok(server_move) => server_move,
            Err(e) => {
                error!("Failed to get opponent move: {}", e);
                return Err(e);
            }
        };
        if self.state.status != Status::AwaitingOpponent || self.state.server_move.is_some() {
            warn!(
                "Ignoring opponent move {} while {:?}",
                server_move, self.state.status
            );
            return Ok(None);
        }
        debug!("Opponent move received");
        self.state.server_move = Some(server_move);
        if self.state.user_move.is_none() {
            self.state.status = Status::AwaitingUser;
        }
        self.publish(ClientUpdate::OpponentReady);
        self.attempt_resolution()
    }

    /// The first move chosen in a round sticks, later ones are ignored.
    pub fn submit_user_move(&mut self, user_move: Move) -> Result<Option<RoundResult>, GameError> {
        if !self.state.status.accepts_moves() {
            warn!("Ignoring user move {} while {:?}", user_move, self.state.status);
            return Ok(None);
        }
        if let Some(chosen) = self.state.user_move {
            warn!("User already chose {}, ignoring {}", chosen, user_move);
            return Ok(None);
        }
        debug!("User chose {}", user_move);
        self.state.user_move = Some(user_move);
        self.attempt_resolution()
    }

    /// Resolves the round once both moves are in; a no-op before that.
    pub fn attempt_resolution(&mut self) -> Result<Option<RoundResult>, GameError> {
        let (Some(server_move), Some(user_move)) = (self.state.server_move, self.state.user_move)
        else {
            debug!("Waiting for the other move");
            return Ok(None);
        };
        if !self.state.status.accepts_moves() {
            return Ok(None);
        }
        self.state.status = Status::Resolved;

        let outcome = resolve(server_move, user_move);
        if outcome == RoundOutcome::Invalid {
            self.schedule_next_round();
            return Err(GameError::InvalidOutcome {
                server: server_move,
                user: user_move,
            });
        }

        // Reports carry the history as it was before this round
        let report = RecordPlayQuery {
            user_move,
            server_move,
            user_history: encode_history(&self.state.user_history),
            server_history: encode_history(&self.state.server_history),
            id: self.session_id,
        };
        self.state.record(outcome, server_move, user_move);
        self.reporter.round(report);

        let result = RoundResult {
            outcome,
            server_move,
            user_move,
            server_wins: self.state.server_wins,
            user_wins: self.state.user_wins,
            deuces: self.state.deuce_count,
        };
        info!(
            "Round {}: server {} vs user {} -> {:?} ({}-{}, {} deuces)",
            self.state.rounds_played(),
            server_move,
            user_move,
            outcome,
            result.server_wins,
            result.user_wins,
            result.deuces
        );
        self.publish(ClientUpdate::RoundResult(result.clone()));

        if self.check_match_complete() {
            self.report_match();
        }
        self.schedule_next_round();
        Ok(Some(result))
    }

    /// Best of `rounds_to_complete`, never on a tie: the match ends once enough
    /// rounds were played (deuces included) and someone leads.
    pub fn check_match_complete(&mut self) -> bool {
        if self.state.rounds_played() < self.config.rounds_to_complete {
            return false;
        }
        let Some(leader) = self.state.leader() else {
            return false;
        };
        self.state.status = match leader {
            Side::Server => Status::ServerWon,
            Side::User => Status::UserWon,
        };
        true
    }

    /// Arms the pacing timer for whatever follows the current status.
    pub fn schedule_next_round(&mut self) -> (NextStep, Duration) {
        let step = if self.state.status.is_terminal() {
            NextStep::ResetMatch
        } else {
            NextStep::NextRound
        };
        let delay = self.config.pacing.delay(step, self.state.rounds_played());
        debug!("Scheduling {:?} in {:?}", step, delay);
        self.timer.schedule(delay, step);
        (step, delay)
    }

    /// Timer expiry. Events that no longer match the status are stale and dropped.
    pub fn on_pacing_elapsed(&mut self, step: NextStep) {
        match (step, self.state.status) {
            (NextStep::NextRound, Status::Resolved) => self.start_round(),
            (NextStep::ResetMatch, status) if status.is_terminal() => {
                info!("Resetting match");
                self.state = MatchState::new();
                self.publish(ClientUpdate::MatchReset);
                self.start_round();
            }
            (step, status) => warn!("Ignoring stale {:?} while {:?}", step, status),
        }
    }

    fn start_round(&mut self) {
        self.state.start_round();
        self.publish(ClientUpdate::PendingMove {
            round: self.state.rounds_played() + 1,
        });
        self.request_opponent_move();
    }

    fn report_match(&mut self) {
        let Some(winner) = self.state.winner() else {
            return;
        };
        info!(
            "Match over, {} wins {}-{} after {} rounds",
            winner,
            self.state.server_wins,
            self.state.user_wins,
            self.state.rounds_played()
        );
        self.reporter.match_result(
            self.session_id,
            MatchResultRequest {
                winner,
                user: encode_history(&self.state.user_history),
                server: encode_history(&self.state.server_history),
            },
        );
        self.publish(ClientUpdate::MatchResult {
            winner,
            server_wins: self.state.server_wins,
            user_wins: self.state.user_wins,
            total: self.state.rounds_played(),
        });
    }

    fn surface(&self, e: GameError) {
        error!("{}", e);
        self.publish(ClientUpdate::Error {
            message: e.to_string(),
        });
    }

    fn publish(&self, update: ClientUpdate) {
        // No subscribers is fine, e.g. a headless run
        if self.updates.send(update).is_err() {
            debug!("No view attached");
        }
    }
}
