use std::error::Error;
use std::fmt;

use async_trait::async_trait;

use crate::platform::environment::{DEVICE_ID_ENV, USER_AGENT_ENV};

/// Error type returned by platform providers when resolution fails.
#[derive(Debug, Clone)]
pub struct ProviderError {
    message: String,
}

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn from_error(err: impl Error) -> Self {
        Self::new(err.to_string())
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for ProviderError {}

/// Supplies the opaque identifier used as the tracker's client id.
///
/// Implementations should return a value that is stable for the device or
/// install, so sessions aggregate under one client.
pub trait DeviceIdProvider: Send + Sync {
    fn device_id(&self) -> String;
}

/// Asynchronously resolves the user-agent string reported with every hit.
#[async_trait]
pub trait UserAgentProvider: Send + Sync {
    async fn user_agent(&self) -> Result<String, ProviderError>;
}

/// Default device-id source: the `UA_ANALYTICS_DEVICE_ID` environment
/// variable, falling back to a random 32-character alphanumeric id.
///
/// The fallback changes per process; hosts that need a stable client id
/// across sessions supply their own provider.
#[derive(Clone, Debug, Default)]
pub struct EnvironmentDeviceId;

impl DeviceIdProvider for EnvironmentDeviceId {
    fn device_id(&self) -> String {
        std::env::var(DEVICE_ID_ENV).unwrap_or_else(|_| random_device_id())
    }
}

fn random_device_id() -> String {
    use rand::distributions::Alphanumeric;
    use rand::Rng;

    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .map(char::from)
        .take(32)
        .collect()
}

/// Default user-agent source: the `UA_ANALYTICS_USER_AGENT` environment
/// variable, falling back to `ua-analytics/{version}`.
#[derive(Clone, Debug, Default)]
pub struct EnvironmentUserAgent;

#[async_trait]
impl UserAgentProvider for EnvironmentUserAgent {
    async fn user_agent(&self) -> Result<String, ProviderError> {
        Ok(std::env::var(USER_AGENT_ENV).unwrap_or_else(default_user_agent))
    }
}

fn default_user_agent(_err: std::env::VarError) -> String {
    format!("ua-analytics/{}", env!("CARGO_PKG_VERSION"))
}
