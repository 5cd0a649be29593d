use std::time::Duration;

use tokio::{sync::mpsc::Sender, task::JoinHandle, time::sleep};
use tracing::{debug, warn};

use crate::model::internal::{ControllerEvent, NextStep};

/// How long a resolved round stays on screen before the next step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacingPolicy {
    // Slows the first rounds down, speeds up once the user is in the rhythm
    Adaptive {
        early: Duration,
        middle: Duration,
        late: Duration,
        reset: Duration,
    },
    Fixed {
        round: Duration,
        reset: Duration,
    },
}

impl Default for PacingPolicy {
    fn default() -> Self {
        PacingPolicy::Adaptive {
            early: Duration::from_millis(2000),
            middle: Duration::from_millis(1200),
            late: Duration::from_millis(700),
            reset: Duration::from_millis(4000),
        }
    }
}

impl PacingPolicy {
    pub fn with_reset(self, reset: Duration) -> Self {
        match self {
            PacingPolicy::Adaptive {
                early,
                middle,
                late,
                ..
            } => PacingPolicy::Adaptive {
                early,
                middle,
                late,
                reset,
            },
            PacingPolicy::Fixed { round, .. } => PacingPolicy::Fixed { round, reset },
        }
    }

    pub fn delay(&self, step: NextStep, rounds_played: u32) -> Duration {
        match (self, step) {
            (PacingPolicy::Adaptive { reset, .. }, NextStep::ResetMatch)
            | (PacingPolicy::Fixed { reset, .. }, NextStep::ResetMatch) => *reset,
            (PacingPolicy::Fixed { round, .. }, NextStep::NextRound) => *round,
            (
                PacingPolicy::Adaptive {
                    early,
                    middle,
                    late,
                    ..
                },
                NextStep::NextRound,
            ) => match rounds_played {
                0..=2 => *early,
                3..=6 => *middle,
                _ => *late,
            },
        }
    }
}

/// Single-shot timer feeding `PacingElapsed` back to the controller.
/// Scheduling again cancels whatever was still pending.
pub struct PacingTimer {
    to_controller: Sender<ControllerEvent>,
    pending: Option<JoinHandle<()>>,
}

impl PacingTimer {
    pub fn new(to_controller: Sender<ControllerEvent>) -> Self {
        PacingTimer {
            to_controller,
            pending: None,
        }
    }

    pub fn schedule(&mut self, delay: Duration, step: NextStep) {
        self.cancel();
        let sender = self.to_controller.clone();
        self.pending = Some(tokio::spawn(async move {
            sleep(delay).await;
            debug!("{:?} elapsed after {:?}", step, delay);
            if sender.send(ControllerEvent::PacingElapsed(step)).await.is_err() {
                warn!("Controller stopped before {:?} elapsed", step);
            }
        }));
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for PacingTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
