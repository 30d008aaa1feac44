//! The tracker: configuration, readiness gate, hit dispatch.

mod api;
mod constants;
pub mod error;
mod params;
mod serializer;
mod transport;

pub use api::{Tracker, TrackerBuilder, TrackerOptions};
pub use constants::{COLLECT_ENDPOINT, PROTOCOL_VERSION};
pub use params::ParamValue;
pub use transport::{CollectTransport, HttpTransport};
