//! Thin asynchronous client for the Universal Analytics collect endpoint.
//!
//! A [`Tracker`] accumulates parameters, custom dimensions and custom
//! metrics, serializes each hit into a query string and dispatches it as a
//! single GET request. Every send waits on a one-time readiness gate: the
//! user-agent string is resolved asynchronously once, at construction, and
//! no request leaves before that resolution settles.
//!
//! # Example
//!
//! ```rust,no_run
//! use ua_analytics::{Event, ScreenHit, Tracker};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ua_analytics::TrackerError> {
//!     let tracker = Tracker::new("UA-XXXXXXX-1", Default::default(), Default::default())?;
//!
//!     tracker.hit(&ScreenHit::new("Home")).await?;
//!     tracker.event(&Event::new("navigation", "open").with_label("menu")).await?;
//!     Ok(())
//! }
//! ```

pub mod hits;
pub mod platform;
pub mod tracker;

pub use hits::{AddItem, Event, Hit, PageHit, ScreenHit, Transaction};
pub use platform::AppIdentity;
pub use tracker::error::{TrackerError, TrackerErrorCode, TrackerResult};
pub use tracker::{ParamValue, Tracker, TrackerBuilder, TrackerOptions};
