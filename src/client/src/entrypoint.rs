use std::sync::Arc;

use common::model::{game::Move, messages::Id};
use tokio::{
    sync::{broadcast, mpsc, oneshot},
    task::JoinHandle,
};
use tracing::info;

use crate::{
    model::{
        external::{ClientUpdate, GameError},
        internal::{ControllerEvent, MatchConfig},
    },
    service::{
        controller::MatchController,
        input::{self, AutoplayStrategy, Autoplayer, Scripted},
        opponent::HttpOpponent,
        report::HttpReportSink,
        view,
    },
};

#[derive(Debug, Clone)]
pub enum InputMode {
    Terminal,
    Autoplay(AutoplayStrategy),
    Scripted(Vec<Move>),
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub server_url: String,
    pub session_id: Id,
    pub match_config: MatchConfig,
    pub input: InputMode,
    // Print updates to stdout
    pub render: bool,
}

pub async fn serve(
    config: ClientConfig,
    shutdown_receiver: broadcast::Receiver<()>,
    ready_signal: Option<oneshot::Sender<()>>,
) -> Result<(), GameError> {
    let opponent = Arc::new(HttpOpponent::new(&config.server_url)?);
    let reports = Arc::new(HttpReportSink::new(&config.server_url)?);

    // Everything the controller reacts to goes through one channel
    let (to_controller, from_input): (
        mpsc::Sender<ControllerEvent>,
        mpsc::Receiver<ControllerEvent>,
    ) = mpsc::channel(100);
    let (updates_sender, _) = broadcast::channel::<ClientUpdate>(100);

    // Subscribe before the controller publishes its first round
    let mut handles: Vec<JoinHandle<()>> = vec![];
    if config.render {
        let updates = updates_sender.subscribe();
        let mut view_shutdown_receiver = shutdown_receiver.resubscribe();
        handles.push(tokio::spawn(async move {
            view::run(updates, &mut view_shutdown_receiver).await
        }));
    }
    let mut input_shutdown_receiver = shutdown_receiver.resubscribe();
    let input_sender = to_controller.clone();
    handles.push(match config.input {
        InputMode::Terminal => {
            let lines = input::spawn_stdin_reader();
            tokio::spawn(async move {
                input::read_terminal(lines, input_sender, &mut input_shutdown_receiver).await
            })
        }
        InputMode::Autoplay(strategy) => {
            let updates = updates_sender.subscribe();
            tokio::spawn(async move {
                Autoplayer::new(strategy.build())
                    .run(updates, input_sender, &mut input_shutdown_receiver)
                    .await
            })
        }
        InputMode::Scripted(moves) => {
            let updates = updates_sender.subscribe();
            tokio::spawn(async move {
                Autoplayer::new(Box::new(Scripted::new(moves)))
                    .run(updates, input_sender, &mut input_shutdown_receiver)
                    .await
            })
        }
    });

    let controller = MatchController::new(
        config.match_config,
        config.session_id,
        opponent,
        reports,
        to_controller,
        updates_sender,
    );
    let mut controller_shutdown_receiver = shutdown_receiver.resubscribe();
    let controller_handle: JoinHandle<()> = tokio::spawn(async move {
        controller
            .run(from_input, &mut controller_shutdown_receiver)
            .await
    });

    // Signal that the client is running
    if let Some(ready_signal) = ready_signal {
        info!("Sent ready");
        let _ = ready_signal.send(());
    }

    controller_handle
        .await
        .expect("Match controller exited non-gracefully");
    for handle in handles {
        handle.await.expect("Client task exited non-gracefully");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use common::{
        model::messages::{MatchResultRequest, PlayQuery},
        test::{MockOpponentServer, TestCase},
    };
    use tracing::{debug, Level};

    use super::*;
    use crate::service::pacing::PacingPolicy;

    fn config(server_url: String, session_id: Id, moves: Vec<Move>) -> ClientConfig {
        ClientConfig {
            server_url,
            session_id,
            match_config: MatchConfig {
                rounds_to_complete: 7,
                pacing: PacingPolicy::Fixed {
                    round: Duration::from_millis(5),
                    reset: Duration::from_millis(5),
                },
            },
            input: InputMode::Scripted(moves),
            render: false,
        }
    }

    async fn run_scenario(file_name: &str) {
        // Init logging, ignore error if already set
        let _ = tracing_subscriber::fmt()
            .with_line_number(true)
            .with_file(true)
            .with_max_level(Level::DEBUG)
            .try_init();

        let session_id = Id::new();
        let file_path = env!("CARGO_MANIFEST_DIR").to_string() + "/test/data/" + file_name;
        let test_case = TestCase::load(file_path, vec![("session_id", session_id)]);
        debug!("Running {}", test_case.description);

        let server = MockOpponentServer::start(test_case.server_moves()).await;
        let (shutdown_sender, shutdown_receiver) = broadcast::channel(1);
        let (ready_sender, ready_receiver) = oneshot::channel();
        let client = tokio::spawn(serve(
            config(server.url(), session_id, test_case.user_moves()),
            shutdown_receiver,
            Some(ready_sender),
        ));
        ready_receiver.await.expect("Client failed to start");

        let games = server.wait_for_games(1, Duration::from_secs(5)).await;
        let mut records = server
            .wait_for_records(test_case.rounds.len(), Duration::from_secs(5))
            .await;
        shutdown_sender.send(()).expect("Failed to shutdown");
        client
            .await
            .expect("Client panicked")
            .expect("Client failed");
        server.shutdown().await;

        let expected = &test_case.expected;
        assert_eq!(
            games[0],
            (
                expected.session_id,
                MatchResultRequest {
                    winner: expected.winner,
                    user: expected.user_history.clone(),
                    server: expected.server_history.clone(),
                }
            )
        );

        // Reports race each other, the history length gives the round
        assert_eq!(
            records.len() as u32,
            expected.server_wins + expected.user_wins + expected.deuces
        );
        records.sort_by_key(|record| record.user_history.len());
        for (index, (record, round)) in records.iter().zip(test_case.rounds.iter()).enumerate() {
            assert_eq!(record.id, expected.session_id);
            assert_eq!((record.server_move, record.user_move), (round.server, round.user));
            assert_eq!(record.user_history, expected.user_history[..index]);
            assert_eq!(record.server_history, expected.server_history[..index]);
        }

        let plays = server.plays().await;
        assert_eq!(plays[0], PlayQuery::default());
        let last = test_case.rounds.len() - 1;
        assert_eq!(plays[last].user_history, expected.user_history[..last]);
    }

    #[tokio::test]
    async fn deuce_streak() {
        run_scenario("deuce_streak.json").await;
    }

    #[tokio::test]
    async fn four_three() {
        run_scenario("four_three.json").await;
    }

    #[tokio::test]
    async fn tie_extends_match() {
        run_scenario("tie_extends_match.json").await;
    }

    #[tokio::test]
    async fn rejects_bad_server_url() {
        let (_shutdown_sender, shutdown_receiver) = broadcast::channel(1);
        let result = serve(
            config("definitely not a url".to_owned(), Id::new(), vec![]),
            shutdown_receiver,
            None,
        )
        .await;
        assert!(matches!(result, Err(GameError::InvalidUrl { .. })));
    }
}
