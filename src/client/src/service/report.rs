use std::sync::Arc;

use async_trait::async_trait;
use common::{
    model::messages::{Id, MatchResultRequest, RecordPlayQuery, SessionQuery},
    reqwest::{Client, Url},
};
use tokio::task::JoinHandle;
use tracing::{debug, error};

use super::opponent::endpoint;
use crate::model::external::GameError;

#[async_trait]
pub trait ReportSink: Send + Sync {
    async fn record_round(&self, report: &RecordPlayQuery) -> Result<(), GameError>;

    async fn record_match(
        &self,
        session_id: &Id,
        report: &MatchResultRequest,
    ) -> Result<(), GameError>;
}

pub struct HttpReportSink {
    client: Client,
    record_url: Url,
    game_url: Url,
}

impl HttpReportSink {
    pub fn new(base_url: &str) -> Result<Self, GameError> {
        Ok(HttpReportSink {
            client: Client::new(),
            record_url: endpoint(base_url, "record")?,
            game_url: endpoint(base_url, "game")?,
        })
    }
}

#[async_trait]
impl ReportSink for HttpReportSink {
    async fn record_round(&self, report: &RecordPlayQuery) -> Result<(), GameError> {
        debug!("GET {} with {:?}", self.record_url, report);
        self.client
            .get(self.record_url.clone())
            .query(report)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn record_match(
        &self,
        session_id: &Id,
        report: &MatchResultRequest,
    ) -> Result<(), GameError> {
        debug!("POST {} with {:?}", self.game_url, report);
        self.client
            .post(self.game_url.clone())
            .query(&SessionQuery { id: *session_id })
            .json(report)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

/// Fire-and-forget front of a `ReportSink`: failures are logged, never
/// retried, and never reach gameplay.
#[derive(Clone)]
pub struct Reporter {
    sink: Arc<dyn ReportSink>,
}

impl Reporter {
    pub fn new(sink: Arc<dyn ReportSink>) -> Self {
        Reporter { sink }
    }

    pub fn round(&self, report: RecordPlayQuery) -> JoinHandle<()> {
        let sink = self.sink.clone();
        tokio::spawn(async move {
            match sink.record_round(&report).await {
                Ok(()) => debug!("Play recorded"),
                Err(e) => error!("Error recording play: {}", e),
            }
        })
    }

    pub fn match_result(&self, session_id: Id, report: MatchResultRequest) -> JoinHandle<()> {
        let sink = self.sink.clone();
        tokio::spawn(async move {
            match sink.record_match(&session_id, &report).await {
                Ok(()) => debug!("Match recorded"),
                Err(e) => error!("Error recording match: {}", e),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use common::{
        model::game::{Move, Side},
        test::MockOpponentServer,
    };

    use super::*;

    fn play(id: Id) -> RecordPlayQuery {
        RecordPlayQuery {
            user_move: Move::Scissor,
            server_move: Move::Paper,
            user_history: "rr".to_owned(),
            server_history: "ps".to_owned(),
            id,
        }
    }

    #[tokio::test]
    async fn posts_reports_to_service() {
        let server = MockOpponentServer::start(vec![]).await;
        let reporter = Reporter::new(Arc::new(HttpReportSink::new(&server.url()).unwrap()));
        let id = Id::new();
        let result = MatchResultRequest {
            winner: Side::User,
            user: "rrs".to_owned(),
            server: "rps".to_owned(),
        };

        reporter.round(play(id)).await.unwrap();
        reporter.match_result(id, result.clone()).await.unwrap();

        assert_eq!(server.records().await, vec![play(id)]);
        assert_eq!(
            server.wait_for_games(1, Duration::from_secs(1)).await,
            vec![(id, result)]
        );
        server.shutdown().await;
    }

    #[tokio::test]
    async fn unreachable_sink_is_swallowed() {
        // Nothing listens on the discard port
        let sink = HttpReportSink::new("http://127.0.0.1:9/").unwrap();
        assert!(matches!(
            sink.record_round(&play(Id::new())).await,
            Err(GameError::Transport(_))
        ));

        let reporter = Reporter::new(Arc::new(sink));
        reporter
            .round(play(Id::new()))
            .await
            .expect("Report task should not panic");
    }
}
