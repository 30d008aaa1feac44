//! Host-platform collaborators: device identifier, user agent, app identity.

mod environment;
mod provider;

pub use environment::{app_id, app_name, app_version, screen_resolution, AppIdentity};
pub use provider::{
    DeviceIdProvider, EnvironmentDeviceId, EnvironmentUserAgent, ProviderError, UserAgentProvider,
};
