use crate::error::{ErrorKind, Result};
use crate::fetch::Fetcher;
use async_trait::async_trait;
use ficsync_model::Fic;
use std::sync::Arc;

/// Site-specific knowledge of how to read a fic.
///
/// Both metadata operations fill in the fic they're handed (whose `link` has
/// already been normalized) rather than building a new one, so a scrape pass
/// can fill the gaps left by an index pass.
#[async_trait]
pub trait Site: Send + Sync {
    /// Name of the site, for logging and errors.
    fn name(&self) -> &str;

    /// Returns `true` if this site handles `url`.
    fn matches(&self, url: &str) -> bool;

    /// The canonical form of a fic link on this site.
    fn normalize_link(&self, url: &str) -> String {
        url.to_string()
    }

    /// Read the fic from the site's structured chapter index (threadmarks or
    /// equivalent).
    ///
    /// An index that doesn't exist should fail with a 404 status, which
    /// [`from_url`](crate::from_url) treats as a cue to scrape instead.
    async fn get_fic_metadata(&self, fetch: &Fetcher, fic: &mut Fic) -> Result<()>;

    /// Read the fic by scraping its pages.
    async fn scrape_fic_metadata(&self, fetch: &Fetcher, fic: &mut Fic) -> Result<()>;
}

pub type SiteHandle = Arc<dyn Site>;

/// The sites links can be resolved against, in priority order.
#[derive(Clone, Default)]
pub struct SiteRegistry {
    sites: Vec<SiteHandle>,
}

impl SiteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_site(mut self, site: SiteHandle) -> Self {
        self.sites.push(site);
        self
    }

    pub fn register(&mut self, site: SiteHandle) {
        self.sites.push(site);
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    /// The first registered site that handles `url`.
    pub fn resolve(&self, url: &str) -> Result<SiteHandle> {
        match self.sites.iter().find(|site| site.matches(url)) {
            Some(site) => Ok(Arc::clone(site)),
            None => exn::bail!(ErrorKind::UnsupportedSite(url.to_string())),
        }
    }
}

impl std::fmt::Debug for SiteRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.sites.iter().map(|site| site.name())).finish()
    }
}
