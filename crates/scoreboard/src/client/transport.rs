//! Request/response boundary between the client cache and the service.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::logging::{debug, warn};
use crate::model::{ScoreEntry, Scoreboard};
use crate::stats::Stats;

use super::ClientError;

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// The three score operations, as seen from a client.
pub trait Transport: Send + Sync {
    /// Fetch the current leaderboard.
    fn fetch(&self) -> impl Future<Output = Result<Scoreboard, ClientError>> + Send;

    /// Submit a validated score.
    fn add(
        &self,
        name: &str,
        count: u64,
    ) -> impl Future<Output = Result<Scoreboard, ClientError>> + Send;

    /// Clear every score.
    fn clear(&self) -> impl Future<Output = Result<Scoreboard, ClientError>> + Send;
}

/// JSON-over-HTTP transport using reqwest.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Serialize)]
struct AddRequest<'a> {
    name: &'a str,
    count: u64,
}

#[derive(Deserialize)]
struct ScoresBody {
    #[serde(default)]
    success: Option<bool>,
    scores: Vec<ScoreEntry>,
    #[serde(default)]
    stats: Option<Stats>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    code: String,
    message: String,
}

impl HttpTransport {
    /// Transport for a service rooted at `base_url`, e.g.
    /// `http://localhost:3000`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Setup(e.into()))?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    /// The service root this transport talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Scoreboard, ClientError> {
        let response = request
            .send()
            .await
            .map_err(|e| ClientError::Network(e.into()))?;
        read_board(response).await
    }
}

async fn read_board(response: reqwest::Response) -> Result<Scoreboard, ClientError> {
    let status = response.status();

    if !status.is_success() {
        let (code, message) = match response.json::<ErrorEnvelope>().await {
            Ok(envelope) => (envelope.error.code, envelope.error.message),
            Err(_) => (String::from("UNKNOWN"), status.to_string()),
        };
        debug!(status = status.as_u16(), code = %code, "request failed");

        return Err(if status.is_client_error() {
            ClientError::Rejected {
                status: status.as_u16(),
                code,
                message,
            }
        } else {
            ClientError::Service {
                status: status.as_u16(),
                message,
            }
        });
    }

    let body: ScoresBody = response
        .json()
        .await
        .map_err(|e| ClientError::Decode(e.into()))?;

    if body.success == Some(false) {
        return Err(ClientError::Service {
            status: status.as_u16(),
            message: String::from("Service reported failure"),
        });
    }

    let board = Scoreboard::from_entries(body.scores);
    if let Some(stats) = body.stats {
        if stats != board.stats() {
            warn!(?stats, recomputed = ?board.stats(), "service stats differ from entries");
        }
    }
    Ok(board)
}

impl Transport for HttpTransport {
    async fn fetch(&self) -> Result<Scoreboard, ClientError> {
        self.send(self.client.get(self.url("/scores"))).await
    }

    async fn add(&self, name: &str, count: u64) -> Result<Scoreboard, ClientError> {
        let request = self
            .client
            .post(self.url("/scores/add"))
            .json(&AddRequest { name, count });
        self.send(request).await
    }

    async fn clear(&self) -> Result<Scoreboard, ClientError> {
        self.send(self.client.delete(self.url("/scores/clear"))).await
    }
}
