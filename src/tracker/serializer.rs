//! Query-string construction for collect requests.
//!
//! Keys and values are emitted verbatim: the protocol keys are URL-safe by
//! definition and values are assumed already URL-safe by the caller. An
//! unescaped `&` or `=` in a value produces a malformed URL that the
//! endpoint misreads; this layer does not detect it.

use std::collections::BTreeMap;

use indexmap::IndexMap;

use crate::tracker::constants::PROTOCOL_VERSION;
use crate::tracker::params::ParamValue;

/// Builds the full collect URL for one hit.
///
/// Segments are concatenated even when empty, so a tracker with no custom
/// dimensions or metrics produces consecutive `&` separators; the endpoint
/// ignores empty pairs. The `z` cache buster always comes last.
pub(crate) fn build_collect_url(
    endpoint: &str,
    property_id: &str,
    client_id: &str,
    hit_fragment: &str,
    parameters: &IndexMap<String, ParamValue>,
    custom_dimensions: &BTreeMap<u32, ParamValue>,
    custom_metrics: &BTreeMap<u32, ParamValue>,
    cache_buster: u64,
) -> String {
    let params = render_parameters(parameters);
    let dimensions = render_indexed("cd", custom_dimensions);
    let metrics = render_indexed("cm", custom_metrics);
    format!(
        "{endpoint}?tid={property_id}&v={PROTOCOL_VERSION}&cid={client_id}\
         &{hit_fragment}&{params}&{dimensions}&{metrics}&z={cache_buster}"
    )
}

/// `{key}={value}` pairs in insertion order of the underlying mapping.
fn render_parameters(parameters: &IndexMap<String, ParamValue>) -> String {
    parameters
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// `cd{index}={value}` / `cm{index}={value}` pairs in ascending index
/// order. Absent slots contribute nothing.
fn render_indexed(prefix: &str, slots: &BTreeMap<u32, ParamValue>) -> String {
    slots
        .iter()
        .map(|(index, value)| format!("{prefix}{index}={value}"))
        .collect::<Vec<_>>()
        .join("&")
}
