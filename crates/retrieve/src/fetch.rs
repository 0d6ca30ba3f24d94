use crate::error::Result;
use async_trait::async_trait;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;
use tracing::instrument;

/// Name of the session cookie forum sites authenticate with.
pub const SESSION_COOKIE: &str = "xf_user";

/// Per-request behaviour passed to the transport.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchOptions {
    /// Bypass any cached response and go to the network.
    pub cache_break: bool,
    /// Only serve from cache; never touch the network.
    pub no_network: bool,
    /// Cap on simultaneous requests, enforced by the transport.
    pub max_concurrency: Option<usize>,
    /// Throttle, enforced by the transport.
    pub requests_per_second: Option<f64>,
    /// A `name=value` cookie attached to every request.
    pub cookie: Option<String>,
}

/// A response from the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Address the content was finally served from, after redirects.
    pub final_url: String,
    pub body: String,
}

/// The transport: HTTP, caching, cookies, throttling and retries all live
/// behind this trait.
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(&self, url: &str, options: &FetchOptions) -> Result<Response>;
}

/// A shared transport together with the options its requests are made with.
///
/// Handles are cheap to clone. [`with_options`](Self::with_options) derives
/// a new handle rather than changing the options of one that's shared.
#[derive(Clone)]
pub struct Fetcher {
    transport: Arc<dyn Fetch>,
    options: FetchOptions,
}

impl Fetcher {
    pub fn new(transport: Arc<dyn Fetch>, options: FetchOptions) -> Self {
        Self { transport, options }
    }

    pub fn options(&self) -> &FetchOptions {
        &self.options
    }

    /// Derive a handle sharing this transport, with adjusted options.
    ///
    /// ```
    /// # use ficsync_retrieve::Fetcher;
    /// # fn example(fetcher: &Fetcher) {
    /// let cached = fetcher.with_options(|options| options.cache_break = false);
    /// # }
    /// ```
    pub fn with_options(&self, adjust: impl FnOnce(&mut FetchOptions)) -> Self {
        let mut options = self.options.clone();
        adjust(&mut options);
        Self { transport: Arc::clone(&self.transport), options }
    }

    /// Derive a handle that authenticates with a forum session token.
    pub fn with_session(&self, xf_user: &str) -> Self {
        self.with_options(|options| options.cookie = Some(format!("{SESSION_COOKIE}={xf_user}")))
    }

    #[instrument(level = "trace", skip(self), fields(cache_break = self.options.cache_break))]
    pub async fn get(&self, url: &str) -> Result<Response> {
        self.transport.fetch(url, &self.options).await
    }
}

impl Debug for Fetcher {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Fetcher").field("options", &self.options).finish_non_exhaustive()
    }
}
