//! Environment-backed defaults for the identity parameters.

use std::env;

pub(crate) const DEVICE_ID_ENV: &str = "UA_ANALYTICS_DEVICE_ID";
pub(crate) const USER_AGENT_ENV: &str = "UA_ANALYTICS_USER_AGENT";
const APP_NAME_ENV: &str = "UA_ANALYTICS_APP_NAME";
const APP_ID_ENV: &str = "UA_ANALYTICS_APP_ID";
const SCREEN_RESOLUTION_ENV: &str = "UA_ANALYTICS_SCREEN_RESOLUTION";

pub fn app_name() -> String {
    env::var(APP_NAME_ENV).unwrap_or_else(|_| env!("CARGO_PKG_NAME").to_string())
}

pub fn app_id() -> String {
    env::var(APP_ID_ENV).unwrap_or_else(|_| env!("CARGO_PKG_NAME").to_string())
}

pub fn app_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Screen resolution as `{width}x{height}`. Headless hosts report `0x0`
/// unless overridden.
pub fn screen_resolution() -> String {
    env::var(SCREEN_RESOLUTION_ENV).unwrap_or_else(|_| "0x0".to_string())
}

/// Identity parameters seeded into every tracker as `an`, `aid`, `av` and
/// `sr`. All of them can also be overridden per key through
/// `additional_parameters`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppIdentity {
    pub app_name: String,
    pub app_id: String,
    pub app_version: String,
    pub screen_resolution: String,
}

impl Default for AppIdentity {
    fn default() -> Self {
        Self {
            app_name: app_name(),
            app_id: app_id(),
            app_version: app_version(),
            screen_resolution: screen_resolution(),
        }
    }
}

impl AppIdentity {
    pub fn with_app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = app_name.into();
        self
    }

    pub fn with_app_id(mut self, app_id: impl Into<String>) -> Self {
        self.app_id = app_id.into();
        self
    }

    pub fn with_app_version(mut self, app_version: impl Into<String>) -> Self {
        self.app_version = app_version.into();
        self
    }

    pub fn with_screen_resolution(mut self, screen_resolution: impl Into<String>) -> Self {
        self.screen_resolution = screen_resolution.into();
        self
    }
}
