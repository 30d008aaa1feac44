use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use indexmap::IndexMap;
use rand::Rng;
use url::Url;

use crate::hits::Hit;
use crate::platform::{
    AppIdentity, DeviceIdProvider, EnvironmentDeviceId, EnvironmentUserAgent, UserAgentProvider,
};
use crate::tracker::constants::{CACHE_BUSTER_BOUND, COLLECT_ENDPOINT, COLLECT_URL_ENV};
use crate::tracker::error::{invalid_argument, user_agent_error, TrackerError, TrackerResult};
use crate::tracker::params::ParamValue;
use crate::tracker::serializer::build_collect_url;
use crate::tracker::transport::{CollectTransport, HttpTransport};

/// One-shot readiness gate: every send awaits the same resolution.
type UserAgentGate = Shared<BoxFuture<'static, Result<String, TrackerError>>>;

/// Per-instance tracker configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TrackerOptions {
    /// Logs outgoing request URLs and resolved init state via `log::debug!`.
    pub debug: bool,
}

/// Handle to one analytics property.
///
/// Cheap to clone; all clones share parameters, custom dimensions/metrics
/// and the readiness gate.
#[derive(Clone)]
pub struct Tracker {
    inner: Arc<TrackerInner>,
}

struct TrackerInner {
    property_id: String,
    client_id: String,
    endpoint: String,
    options: TrackerOptions,
    parameters: Mutex<IndexMap<String, ParamValue>>,
    custom_dimensions: Mutex<BTreeMap<u32, ParamValue>>,
    custom_metrics: Mutex<BTreeMap<u32, ParamValue>>,
    user_agent: UserAgentGate,
    transport: Arc<dyn CollectTransport>,
}

impl fmt::Debug for Tracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tracker")
            .field("property_id", &self.inner.property_id)
            .field("client_id", &self.inner.client_id)
            .finish()
    }
}

impl Tracker {
    /// Creates a tracker with the default collaborators: env-backed device
    /// id and user agent, identity defaults for `an`/`aid`/`av`/`sr`, and
    /// the production collect endpoint.
    ///
    /// `additional_parameters` are merged over the identity defaults; later
    /// keys override earlier ones, including reserved protocol keys. No
    /// validation is applied: overriding `tid` or `cid` is the caller's
    /// responsibility.
    pub fn new(
        property_id: impl Into<String>,
        additional_parameters: IndexMap<String, ParamValue>,
        options: TrackerOptions,
    ) -> TrackerResult<Self> {
        let mut builder = Self::builder(property_id).options(options);
        for (key, value) in additional_parameters {
            builder = builder.parameter(key, value);
        }
        builder.build()
    }

    pub fn builder(property_id: impl Into<String>) -> TrackerBuilder {
        TrackerBuilder::new(property_id.into())
    }

    pub fn property_id(&self) -> &str {
        &self.inner.property_id
    }

    /// The anonymous client identifier resolved at construction.
    pub fn client_id(&self) -> &str {
        &self.inner.client_id
    }

    /// Submits one hit, waiting for the readiness gate first.
    pub async fn hit<H: Hit + ?Sized>(&self, hit: &H) -> TrackerResult<()> {
        self.send(hit).await
    }

    /// Submits one event. Identical to [`Tracker::hit`] beyond naming.
    pub async fn event<H: Hit + ?Sized>(&self, event: &H) -> TrackerResult<()> {
        self.send(event).await
    }

    /// Serializes the hit and issues one GET request.
    ///
    /// Waits on the readiness gate (a no-op once resolved). The response is
    /// not inspected: only transport-level failures reject, and they
    /// propagate unchanged. No retries, no timeouts.
    pub async fn send<H: Hit + ?Sized>(&self, hit: &H) -> TrackerResult<()> {
        let user_agent = self.inner.user_agent.clone().await?;
        let url = self.build_url(&hit.to_query_string());
        if self.inner.options.debug {
            log::debug!("sending GET request to {url}");
        }
        self.inner.transport.send(&url, &user_agent).await
    }

    /// Sets or overwrites one global parameter; last write wins as observed
    /// by subsequent sends. The parameter map is built eagerly at
    /// construction, so calls made while the user-agent fetch is still in
    /// flight are never clobbered by it.
    pub fn add_parameter(&self, name: impl Into<String>, value: impl Into<ParamValue>) {
        self.inner
            .parameters
            .lock()
            .unwrap()
            .insert(name.into(), value.into());
    }

    /// Sets the custom-dimension slot `index`. Slot numbers are forwarded
    /// verbatim; no bounds validation.
    pub fn add_custom_dimension(&self, index: u32, value: impl Into<ParamValue>) {
        self.inner
            .custom_dimensions
            .lock()
            .unwrap()
            .insert(index, value.into());
    }

    /// Clears the custom-dimension slot `index`; subsequent sends emit no
    /// fragment for it.
    pub fn remove_custom_dimension(&self, index: u32) {
        self.inner.custom_dimensions.lock().unwrap().remove(&index);
    }

    /// Sets the custom-metric slot `index`.
    pub fn add_custom_metric(&self, index: u32, value: impl Into<ParamValue>) {
        self.inner
            .custom_metrics
            .lock()
            .unwrap()
            .insert(index, value.into());
    }

    /// Clears the custom-metric slot `index`.
    pub fn remove_custom_metric(&self, index: u32) {
        self.inner.custom_metrics.lock().unwrap().remove(&index);
    }

    fn build_url(&self, hit_fragment: &str) -> String {
        let parameters = self.inner.parameters.lock().unwrap();
        let dimensions = self.inner.custom_dimensions.lock().unwrap();
        let metrics = self.inner.custom_metrics.lock().unwrap();
        let cache_buster = rand::thread_rng().gen_range(0..CACHE_BUSTER_BOUND);
        build_collect_url(
            &self.inner.endpoint,
            &self.inner.property_id,
            &self.inner.client_id,
            hit_fragment,
            &parameters,
            &dimensions,
            &metrics,
            cache_buster,
        )
    }
}

/// Builder for injecting collaborators; [`Tracker::new`] covers the common
/// case.
pub struct TrackerBuilder {
    property_id: String,
    parameters: IndexMap<String, ParamValue>,
    identity: AppIdentity,
    options: TrackerOptions,
    endpoint: Option<String>,
    device_id_provider: Arc<dyn DeviceIdProvider>,
    user_agent_provider: Arc<dyn UserAgentProvider>,
    transport: Option<Arc<dyn CollectTransport>>,
}

impl TrackerBuilder {
    fn new(property_id: String) -> Self {
        Self {
            property_id,
            parameters: IndexMap::new(),
            identity: AppIdentity::default(),
            options: TrackerOptions::default(),
            endpoint: None,
            device_id_provider: Arc::new(EnvironmentDeviceId),
            user_agent_provider: Arc::new(EnvironmentUserAgent),
            transport: None,
        }
    }

    /// Adds one parameter merged over the identity defaults.
    pub fn parameter(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    pub fn options(mut self, options: TrackerOptions) -> Self {
        self.options = options;
        self
    }

    /// Overrides the identity defaults seeded as `an`/`aid`/`av`/`sr`.
    pub fn identity(mut self, identity: AppIdentity) -> Self {
        self.identity = identity;
        self
    }

    /// Overrides the collect endpoint, primarily for tests and emulators.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn device_id_provider(mut self, provider: Arc<dyn DeviceIdProvider>) -> Self {
        self.device_id_provider = provider;
        self
    }

    pub fn user_agent_provider(mut self, provider: Arc<dyn UserAgentProvider>) -> Self {
        self.user_agent_provider = provider;
        self
    }

    pub fn transport(mut self, transport: Arc<dyn CollectTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn build(self) -> TrackerResult<Tracker> {
        if self.property_id.trim().is_empty() {
            return Err(invalid_argument("property id must not be empty"));
        }

        let endpoint = match self.endpoint {
            Some(endpoint) => endpoint,
            None => std::env::var(COLLECT_URL_ENV)
                .unwrap_or_else(|_| COLLECT_ENDPOINT.to_string()),
        };
        Url::parse(&endpoint).map_err(|err| {
            invalid_argument(format!("Invalid collect endpoint '{}': {}", endpoint, err))
        })?;

        let transport: Arc<dyn CollectTransport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::new()?),
        };

        let client_id = self.device_id_provider.device_id();

        // Identity defaults first, caller parameters second: later keys
        // override earlier ones.
        let mut parameters: IndexMap<String, ParamValue> = IndexMap::new();
        parameters.insert("an".to_string(), self.identity.app_name.clone().into());
        parameters.insert("aid".to_string(), self.identity.app_id.clone().into());
        parameters.insert("av".to_string(), self.identity.app_version.clone().into());
        parameters.insert(
            "sr".to_string(),
            self.identity.screen_resolution.clone().into(),
        );
        for (key, value) in self.parameters {
            parameters.insert(key, value);
        }

        if self.options.debug {
            match serde_json::to_string(&parameters) {
                Ok(rendered) => log::debug!("seeded parameters={rendered}"),
                Err(err) => log::debug!("parameter map not renderable: {err}"),
            }
        }

        let user_agent = start_user_agent_fetch(self.user_agent_provider, self.options.debug);

        Ok(Tracker {
            inner: Arc::new(TrackerInner {
                property_id: self.property_id,
                client_id,
                endpoint,
                options: self.options,
                parameters: Mutex::new(parameters),
                custom_dimensions: Mutex::new(BTreeMap::new()),
                custom_metrics: Mutex::new(BTreeMap::new()),
                user_agent,
                transport,
            }),
        })
    }
}

/// Wraps the user-agent fetch in a shared one-shot future. A failed fetch
/// resolves the gate to an error that every pending and future send
/// receives; there is no re-initialization.
fn start_user_agent_fetch(provider: Arc<dyn UserAgentProvider>, debug: bool) -> UserAgentGate {
    let gate = async move {
        let user_agent = provider
            .user_agent()
            .await
            .map_err(|err| user_agent_error(format!("user agent detection failed: {err}")))?;
        if debug {
            log::debug!("resolved user agent={user_agent}");
        }
        Ok(user_agent)
    }
    .boxed()
    .shared();

    // Kick the fetch off right away when a runtime is present; without one
    // the first send drives it.
    if let Ok(handle) = tokio::runtime::Handle::try_current() {
        handle.spawn(gate.clone());
    }

    gate
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hits::{Event, ScreenHit};
    use crate::platform::ProviderError;
    use async_trait::async_trait;
    use tokio::sync::oneshot;

    #[derive(Default, Clone)]
    struct RecordingTransport {
        requests: Arc<Mutex<Vec<(String, String)>>>,
    }

    impl RecordingTransport {
        fn urls(&self) -> Vec<String> {
            self.requests
                .lock()
                .unwrap()
                .iter()
                .map(|(url, _)| url.clone())
                .collect()
        }

        fn user_agents(&self) -> Vec<String> {
            self.requests
                .lock()
                .unwrap()
                .iter()
                .map(|(_, agent)| agent.clone())
                .collect()
        }

        fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl CollectTransport for RecordingTransport {
        async fn send(&self, url: &str, user_agent: &str) -> TrackerResult<()> {
            self.requests
                .lock()
                .unwrap()
                .push((url.to_string(), user_agent.to_string()));
            Ok(())
        }
    }

    struct StaticUserAgent(&'static str);

    #[async_trait]
    impl UserAgentProvider for StaticUserAgent {
        async fn user_agent(&self) -> Result<String, ProviderError> {
            Ok(self.0.to_string())
        }
    }

    struct FailingUserAgent;

    #[async_trait]
    impl UserAgentProvider for FailingUserAgent {
        async fn user_agent(&self) -> Result<String, ProviderError> {
            Err(ProviderError::new("webview unavailable"))
        }
    }

    /// Resolves only once the paired sender fires.
    struct GatedUserAgent {
        rx: Mutex<Option<oneshot::Receiver<String>>>,
    }

    #[async_trait]
    impl UserAgentProvider for GatedUserAgent {
        async fn user_agent(&self) -> Result<String, ProviderError> {
            let rx = self.rx.lock().unwrap().take();
            let rx = rx.expect("user agent requested twice");
            rx.await.map_err(|err| ProviderError::new(err.to_string()))
        }
    }

    struct StaticDeviceId(&'static str);

    impl DeviceIdProvider for StaticDeviceId {
        fn device_id(&self) -> String {
            self.0.to_string()
        }
    }

    fn recording_tracker(provider: Arc<dyn UserAgentProvider>) -> (Tracker, RecordingTransport) {
        let transport = RecordingTransport::default();
        let tracker = Tracker::builder("UA-TEST-1")
            .device_id_provider(Arc::new(StaticDeviceId("abc")))
            .user_agent_provider(provider)
            .transport(Arc::new(transport.clone()))
            .build()
            .unwrap();
        (tracker, transport)
    }

    #[tokio::test(flavor = "current_thread")]
    async fn empty_property_id_is_rejected() {
        let err = Tracker::builder("   ").build().unwrap_err();
        assert_eq!(err.code_str(), "tracker/invalid-argument");
    }

    #[tokio::test(flavor = "current_thread")]
    async fn invalid_endpoint_is_rejected() {
        let err = Tracker::builder("UA-TEST-1")
            .endpoint("not a url")
            .build()
            .unwrap_err();
        assert_eq!(err.code_str(), "tracker/invalid-argument");
    }

    #[tokio::test(flavor = "current_thread")]
    async fn hit_sends_exactly_one_request() {
        let (tracker, transport) = recording_tracker(Arc::new(StaticUserAgent("test-agent")));
        tracker.hit(&ScreenHit::new("Home")).await.unwrap();

        assert_eq!(transport.request_count(), 1);
        let url = &transport.urls()[0];
        assert!(url.contains("?tid=UA-TEST-1&v=1&cid=abc&t=screenview&cd=Home&"));
        assert_eq!(transport.user_agents()[0], "test-agent");
    }

    #[tokio::test(flavor = "current_thread")]
    async fn sends_wait_for_the_readiness_gate() {
        let (tx, rx) = oneshot::channel();
        let provider = Arc::new(GatedUserAgent {
            rx: Mutex::new(Some(rx)),
        });
        let (tracker, transport) = recording_tracker(provider);

        let pending = tokio::spawn({
            let tracker = tracker.clone();
            async move { tracker.hit(&ScreenHit::new("Home")).await }
        });

        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_eq!(transport.request_count(), 0);

        tx.send("late-agent".to_string()).unwrap();
        pending.await.unwrap().unwrap();

        assert_eq!(transport.request_count(), 1);
        assert_eq!(transport.user_agents()[0], "late-agent");
    }

    #[tokio::test(flavor = "current_thread")]
    async fn user_agent_failure_rejects_every_send() {
        let (tracker, transport) = recording_tracker(Arc::new(FailingUserAgent));

        let err = tracker.hit(&ScreenHit::new("Home")).await.unwrap_err();
        assert_eq!(err.code_str(), "tracker/user-agent");

        let err = tracker
            .event(&Event::new("category", "action"))
            .await
            .unwrap_err();
        assert_eq!(err.code_str(), "tracker/user-agent");

        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn add_parameter_is_last_write_wins() {
        let (tracker, transport) = recording_tracker(Arc::new(StaticUserAgent("agent")));

        tracker.add_parameter("foo", "bar");
        tracker.hit(&ScreenHit::new("Home")).await.unwrap();
        tracker.add_parameter("foo", "baz");
        tracker.hit(&ScreenHit::new("Home")).await.unwrap();

        let urls = transport.urls();
        assert!(urls[0].contains("&foo=bar&"));
        assert!(urls[1].contains("&foo=baz&"));
        assert!(!urls[1].contains("foo=bar"));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn custom_dimensions_are_sparse_and_ordered() {
        let (tracker, transport) = recording_tracker(Arc::new(StaticUserAgent("agent")));

        tracker.add_custom_dimension(3, "beta");
        tracker.add_custom_dimension(1, "alpha");
        tracker.hit(&ScreenHit::new("Home")).await.unwrap();

        tracker.remove_custom_dimension(1);
        tracker.hit(&ScreenHit::new("Home")).await.unwrap();

        let urls = transport.urls();
        assert!(urls[0].contains("&cd1=alpha&cd3=beta&"));
        assert!(!urls[1].contains("cd1="));
        assert!(urls[1].contains("&cd3=beta&"));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn removed_metric_leaves_other_indices_intact() {
        let (tracker, transport) = recording_tracker(Arc::new(StaticUserAgent("agent")));

        tracker.add_custom_metric(2, 7);
        tracker.add_custom_metric(5, 9);
        tracker.remove_custom_metric(5);
        tracker.event(&Event::new("category", "action")).await.unwrap();

        let url = &transport.urls()[0];
        assert!(url.contains("&cm2=7&"));
        assert!(!url.contains("cm5="));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn cache_buster_is_bounded_and_always_last() {
        let (tracker, transport) = recording_tracker(Arc::new(StaticUserAgent("agent")));

        for _ in 0..3 {
            tracker.hit(&ScreenHit::new("Home")).await.unwrap();
        }

        for url in transport.urls() {
            let tail = url.rsplit("&z=").next().unwrap();
            let buster: u64 = tail.parse().unwrap();
            assert!(buster < 100_000_000);
        }
    }

    #[tokio::test(flavor = "current_thread")]
    async fn identity_defaults_are_seeded_and_overridable() {
        let transport = RecordingTransport::default();
        let tracker = Tracker::builder("UA-TEST-1")
            .device_id_provider(Arc::new(StaticDeviceId("abc")))
            .user_agent_provider(Arc::new(StaticUserAgent("agent")))
            .transport(Arc::new(transport.clone()))
            .identity(
                AppIdentity::default()
                    .with_app_name("demo")
                    .with_screen_resolution("320x568"),
            )
            .parameter("aid", "com.example.demo")
            .build()
            .unwrap();

        tracker.hit(&ScreenHit::new("Home")).await.unwrap();

        let url = &transport.urls()[0];
        assert!(url.contains("&an=demo&"));
        assert!(url.contains("&aid=com.example.demo&"));
        assert!(url.contains("&sr=320x568&"));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn hit_and_event_share_the_send_path() {
        let (tracker, transport) = recording_tracker(Arc::new(StaticUserAgent("agent")));

        tracker.hit(&ScreenHit::new("Home")).await.unwrap();
        tracker
            .event(&Event::new("nav", "open").with_label("menu").with_value(2))
            .await
            .unwrap();

        let urls = transport.urls();
        assert_eq!(urls.len(), 2);
        assert!(urls[0].contains("&t=screenview&"));
        assert!(urls[1].contains("&t=event&ec=nav&ea=open&el=menu&ev=2&"));
    }
}
