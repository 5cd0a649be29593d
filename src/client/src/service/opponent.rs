use async_trait::async_trait;
use common::{
    model::{game::Move, messages::PlayQuery},
    reqwest::{Client, Url},
};
use tracing::debug;

use crate::model::external::GameError;

/// Source of the opponent's move for the next round.
#[async_trait]
pub trait OpponentMoveProvider: Send + Sync {
    async fn next_move(&self, query: &PlayQuery) -> Result<Move, GameError>;
}

/// Resolves `path` against the service base url. The base is treated as a
/// directory even without a trailing slash.
pub fn endpoint(base_url: &str, path: &str) -> Result<Url, GameError> {
    let invalid = |reason: String| GameError::InvalidUrl {
        url: base_url.to_owned(),
        reason,
    };
    let mut base = Url::parse(base_url).map_err(|e| invalid(e.to_string()))?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join(path).map_err(|e| invalid(e.to_string()))
}

pub struct HttpOpponent {
    client: Client,
    play_url: Url,
}

impl HttpOpponent {
    pub fn new(base_url: &str) -> Result<Self, GameError> {
        Ok(HttpOpponent {
            client: Client::new(),
            play_url: endpoint(base_url, "play")?,
        })
    }
}

#[async_trait]
impl OpponentMoveProvider for HttpOpponent {
    // No timeout, a hanging service stalls the round
    async fn next_move(&self, query: &PlayQuery) -> Result<Move, GameError> {
        debug!("GET {} with {:?}", self.play_url, query);
        let body = self
            .client
            .get(self.play_url.clone())
            .query(query)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        debug!("Opponent answered {:?}", body);
        Ok(body.parse::<Move>()?)
    }
}

#[cfg(test)]
mod tests {
    use common::test::MockOpponentServer;

    use super::*;

    #[test]
    fn endpoint_keeps_base_path() {
        assert_eq!(
            endpoint("http://localhost:8080", "play").unwrap().as_str(),
            "http://localhost:8080/play"
        );
        assert_eq!(
            endpoint("http://localhost:8080/rps", "record").unwrap().as_str(),
            "http://localhost:8080/rps/record"
        );
        assert_eq!(
            endpoint("http://localhost:8080/rps/", "game").unwrap().as_str(),
            "http://localhost:8080/rps/game"
        );
        assert!(matches!(
            endpoint("not a url", "play"),
            Err(GameError::InvalidUrl { .. })
        ));
    }

    #[tokio::test]
    async fn fetches_moves_with_history() {
        let server = MockOpponentServer::start(vec![Move::Paper, Move::Scissor]).await;
        let opponent = HttpOpponent::new(&server.url()).unwrap();

        let first = opponent.next_move(&PlayQuery::default()).await.unwrap();
        let query = PlayQuery::from_history(&[Move::Rock], &[Move::Paper]);
        let second = opponent.next_move(&query).await.unwrap();

        assert_eq!((first, second), (Move::Paper, Move::Scissor));
        assert_eq!(server.plays().await, vec![PlayQuery::default(), query]);
        server.shutdown().await;
    }

    #[tokio::test]
    async fn service_error_is_transport_failure() {
        let server = MockOpponentServer::start(vec![]).await;
        let opponent = HttpOpponent::new(&server.url()).unwrap();

        let result = opponent.next_move(&PlayQuery::default()).await;
        assert!(matches!(result, Err(GameError::Transport(_))));
        server.shutdown().await;
    }
}
