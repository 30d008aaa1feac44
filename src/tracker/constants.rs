/// Production collection endpoint for Universal Analytics hits.
pub const COLLECT_ENDPOINT: &str = "https://www.google-analytics.com/collect";

/// Measurement protocol version reported as the `v` parameter.
pub const PROTOCOL_VERSION: &str = "1";

/// Exclusive upper bound for the `z` cache-buster value.
pub(crate) const CACHE_BUSTER_BOUND: u64 = 100_000_000;

/// Environment variable overriding the collect endpoint.
pub(crate) const COLLECT_URL_ENV: &str = "UA_ANALYTICS_COLLECT_URL";
