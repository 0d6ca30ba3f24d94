use crate::construct::{from_url, from_url_and_scrape, scrape_from_url};
use crate::error::{ErrorKind, Result};
use crate::fetch::Fetcher;
use crate::inflate::{Inflate, NoInflate};
use crate::site::SiteRegistry;
use derive_more::Display;
use exn::{OptionExt, ResultExt};
use ficsync_model::{Fic, FicNode};
use std::sync::Arc;
use tracing::{debug, instrument};

/// How a fic is read from its site.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalMode {
    /// The structured chapter index, scraping if it's missing or empty.
    #[display("index")]
    Index,
    /// Scraping alone.
    #[display("scrape")]
    Scrape,
    /// The structured chapter index, then a scrape to fill the gaps.
    #[display("index and scrape")]
    IndexAndScrape,
}

impl RetrievalMode {
    /// Choose a mode for refreshing `existing`.
    ///
    /// A fic marked as scraped is always scraped, and one marked as read from
    /// a metadata endpoint always reads its index. Otherwise the caller's
    /// flags decide; with neither set the fic is scraped.
    pub fn select(existing: &Fic, from_threadmarks: bool, from_scrape: bool) -> Self {
        let index = (!existing.scrape_meta && from_threadmarks) || existing.fetch_meta;
        let scrape = from_scrape || existing.scrape_meta;
        match (index, scrape) {
            (true, true) => Self::IndexAndScrape,
            (true, false) => Self::Index,
            (false, _) => Self::Scrape,
        }
    }

    pub async fn retrieve(self, sites: &SiteRegistry, fetch: &Fetcher, link: &str) -> Result<Fic> {
        match self {
            Self::Index => from_url(sites, fetch, link).await,
            Self::Scrape => scrape_from_url(sites, fetch, link).await,
            Self::IndexAndScrape => from_url_and_scrape(sites, fetch, link).await,
        }
    }
}

/// Everything needed to read the current remote state of a fic: the
/// transport, the sites links resolve against, and the inflater.
#[derive(Clone)]
pub struct Retriever {
    fetcher: Fetcher,
    sites: SiteRegistry,
    inflater: Arc<dyn Inflate>,
}

impl Retriever {
    pub fn new(fetcher: Fetcher, sites: SiteRegistry) -> Self {
        Self { fetcher, sites, inflater: Arc::new(NoInflate) }
    }

    pub fn with_inflater(mut self, inflater: Arc<dyn Inflate>) -> Self {
        self.inflater = inflater;
        self
    }

    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    pub fn sites(&self) -> &SiteRegistry {
        &self.sites
    }

    /// The fetcher with caching enabled, whatever the caller asked for.
    fn cached(&self) -> Fetcher {
        self.fetcher.with_options(|options| options.cache_break = false)
    }

    /// The fetcher with caching disabled, whatever the caller asked for.
    fn live(&self) -> Fetcher {
        self.fetcher.with_options(|options| options.cache_break = true)
    }

    /// Fetch the current remote version of `existing`.
    ///
    /// The selected mode runs twice. The first pass is served from cache and
    /// its result thrown away: it only exists so that the session cookies a
    /// cached fetch picks up are in place for the second, live pass, which
    /// would otherwise risk a logged-out view. The live pass always bypasses
    /// the cache. Its result is then inflated (from cache) and returned.
    ///
    /// Failures propagate untouched, and nothing is retried.
    #[instrument(skip(self, existing), fields(fic = existing.label()))]
    pub async fn fetch_latest_version(&self, existing: &Fic, from_threadmarks: bool, from_scrape: bool) -> Result<Fic> {
        let link = existing.update_with().ok_or_raise(|| ErrorKind::MissingLink)?;
        let mode = RetrievalMode::select(existing, from_threadmarks, from_scrape);
        debug!(%mode, link, "Selected retrieval mode");

        let cached = self.cached();
        mode.retrieve(&self.sites, &cached, link).await?;
        debug!("Warmed session from cache");
        let mut fic = mode.retrieve(&self.sites, &self.live(), link).await?;
        self.inflater.inflate(&mut fic, &cached).await.or_raise(|| ErrorKind::Inflate)?;
        debug!(chapters = fic.chapters.len(), "Fetched latest version");
        Ok(fic)
    }

    /// Resolve lazily fetched chapter content of `fic` in place, from cache.
    pub async fn inflate(&self, fic: &mut Fic) -> Result<()> {
        self.inflater.inflate(fic, &self.cached()).await.or_raise(|| ErrorKind::Inflate)
    }
}

impl std::fmt::Debug for Retriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Retriever").field("fetcher", &self.fetcher).field("sites", &self.sites).finish_non_exhaustive()
    }
}
