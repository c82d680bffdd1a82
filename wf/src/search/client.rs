//! SearchClient trait and its HTTP implementation

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::accumulator::AccumulatedResult;
use super::error::SearchError;
use super::fallback::FallbackInvoker;
use super::stream::{EventStreamClient, StreamHandle};
use crate::config::SearchConfig;
use crate::domain::Query;

/// Connect timeout for the streaming connection. The overall deadline of a
/// stream is owned by the caller's watchdog.
const STREAM_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Access to the search backend, in streaming and blocking form
///
/// Both calls carry identical semantics: the same query produces the same
/// answer whichever path serves it.
#[async_trait]
pub trait SearchClient: Send + Sync {
    /// Open a stream for the query. Cancelling `cancel` closes it.
    async fn open_stream(&self, query: &Query, cancel: CancellationToken) -> Result<StreamHandle, SearchError>;

    /// Run the query as one blocking request
    async fn search(&self, query: &Query) -> Result<AccumulatedResult, SearchError>;
}

/// Search client backed by the HTTP endpoints
pub struct HttpSearchClient {
    stream: EventStreamClient,
    fallback: FallbackInvoker,
}

impl HttpSearchClient {
    /// Build a client from configuration
    ///
    /// Reads the API key from the environment variable named in config, if any.
    pub fn from_config(config: &SearchConfig) -> Result<Self, SearchError> {
        debug!(?config, "from_config: called");
        let endpoint = config.endpoint();
        let api_key = config.get_api_key();

        let http = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(SearchError::Network)?;
        let stream_http = Client::builder()
            .connect_timeout(STREAM_CONNECT_TIMEOUT)
            .build()
            .map_err(SearchError::Network)?;

        Ok(Self {
            stream: EventStreamClient::new(stream_http, endpoint.clone(), api_key.clone()),
            fallback: FallbackInvoker::new(http, endpoint, api_key),
        })
    }
}

#[async_trait]
impl SearchClient for HttpSearchClient {
    async fn open_stream(&self, query: &Query, cancel: CancellationToken) -> Result<StreamHandle, SearchError> {
        debug!(query_id = %query.id(), "HttpSearchClient::open_stream: called");
        self.stream.open(query, cancel)
    }

    async fn search(&self, query: &Query) -> Result<AccumulatedResult, SearchError> {
        debug!(query_id = %query.id(), "HttpSearchClient::search: called");
        self.fallback.invoke(query).await
    }
}
