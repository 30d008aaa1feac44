use async_trait::async_trait;
use reqwest::header::USER_AGENT;
use reqwest::Client;

use crate::tracker::error::{internal_error, network_error, TrackerResult};

/// Transport seam used by the tracker to issue collect requests.
///
/// Implementations resolve once the request has been answered at the HTTP
/// level and fail only on transport-level errors. The response, including
/// its status code, is opaque to this layer.
#[async_trait]
pub trait CollectTransport: Send + Sync {
    async fn send(&self, url: &str, user_agent: &str) -> TrackerResult<()>;
}

/// Default transport over a `reqwest` client.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    http: Client,
}

impl HttpTransport {
    pub fn new() -> TrackerResult<Self> {
        let http = Client::builder()
            .build()
            .map_err(|err| internal_error(format!("Failed to build HTTP client: {err}")))?;
        Ok(Self { http })
    }

    /// Wraps an existing client, keeping its connection pool and TLS setup.
    pub fn with_client(http: Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl CollectTransport for HttpTransport {
    async fn send(&self, url: &str, user_agent: &str) -> TrackerResult<()> {
        self.http
            .get(url)
            .header(USER_AGENT, user_agent)
            .send()
            .await
            .map_err(|err| network_error(format!("collect request failed: {err}")))?;
        Ok(())
    }
}
