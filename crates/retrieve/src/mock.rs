//! In-memory fetch and site capabilities for testing.

use crate::error::{ErrorKind, Result};
use crate::fetch::{Fetch, FetchOptions, Fetcher, Response};
use crate::inflate::Inflate;
use crate::site::Site;
use async_trait::async_trait;
use ficsync_model::Fic;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A transport serving empty pages, or canned failures for chosen URLs, and
/// recording every request made through it.
#[derive(Default)]
pub struct MockFetch {
    failures: HashMap<String, u16>,
    requests: RwLock<Vec<(String, FetchOptions)>>,
}

impl MockFetch {
    /// Fail requests for `url` with an HTTP `status`.
    pub fn with_failure(mut self, url: impl Into<String>, status: u16) -> Self {
        self.failures.insert(url.into(), status);
        self
    }

    pub fn into_fetcher(self, options: FetchOptions) -> Fetcher {
        Fetcher::new(Arc::new(self), options)
    }

    /// Every request made so far, with the options it was made with.
    pub async fn requests(&self) -> Vec<(String, FetchOptions)> {
        self.requests.read().await.clone()
    }
}

#[async_trait]
impl Fetch for MockFetch {
    async fn fetch(&self, url: &str, options: &FetchOptions) -> Result<Response> {
        self.requests.write().await.push((url.to_string(), options.clone()));
        if let Some(status) = self.failures.get(url) {
            exn::bail!(ErrorKind::Fetch { url: url.to_string(), status: Some(*status) });
        }
        Ok(Response { final_url: url.to_string(), body: String::new() })
    }
}

/// Which metadata operation a [`MockSite`] was asked to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    Index,
    Scrape,
}

/// One metadata operation observed by a [`MockSite`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteCall {
    pub pass: Pass,
    pub link: String,
    pub cache_break: bool,
}

#[derive(Debug, Clone)]
enum Listing {
    Fic(Fic),
    Status(u16),
}

/// A site serving canned fics.
///
/// Every operation first requests the fic's link through the fetcher it's
/// handed, then fills the fic's gaps from the listing configured for that
/// pass: unset fields are copied and unknown chapters admitted. Listings can
/// be swapped between calls to simulate the remote side changing.
pub struct MockSite {
    name: String,
    prefix: String,
    index: RwLock<Listing>,
    scrape: RwLock<Listing>,
    calls: RwLock<Vec<SiteCall>>,
}

impl MockSite {
    /// A site handling every link starting with `prefix`, with no chapter
    /// index (404) and nothing to scrape.
    pub fn new(name: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prefix: prefix.into(),
            index: RwLock::new(Listing::Status(404)),
            scrape: RwLock::new(Listing::Fic(Fic::default())),
            calls: RwLock::default(),
        }
    }

    pub fn with_index(self, fic: Fic) -> Self {
        Self { index: RwLock::new(Listing::Fic(fic)), ..self }
    }

    pub fn with_index_status(self, status: u16) -> Self {
        Self { index: RwLock::new(Listing::Status(status)), ..self }
    }

    pub fn with_scrape(self, fic: Fic) -> Self {
        Self { scrape: RwLock::new(Listing::Fic(fic)), ..self }
    }

    pub fn with_scrape_status(self, status: u16) -> Self {
        Self { scrape: RwLock::new(Listing::Status(status)), ..self }
    }

    pub async fn set_index(&self, fic: Fic) {
        *self.index.write().await = Listing::Fic(fic);
    }

    pub async fn set_scrape(&self, fic: Fic) {
        *self.scrape.write().await = Listing::Fic(fic);
    }

    pub async fn calls(&self) -> Vec<SiteCall> {
        self.calls.read().await.clone()
    }

    pub async fn passes(&self) -> Vec<Pass> {
        self.calls.read().await.iter().map(|call| call.pass).collect()
    }

    async fn serve(&self, pass: Pass, fetch: &Fetcher, fic: &mut Fic) -> Result<()> {
        let link = fic.link.clone().unwrap_or_default();
        self.calls.write().await.push(SiteCall {
            pass,
            link: link.clone(),
            cache_break: fetch.options().cache_break,
        });
        fetch.get(&link).await?;
        let listing = match pass {
            Pass::Index => self.index.read().await.clone(),
            Pass::Scrape => self.scrape.read().await.clone(),
        };
        match listing {
            Listing::Fic(listed) => {
                fill_gaps(fic, listed);
                Ok(())
            },
            Listing::Status(status) => exn::bail!(ErrorKind::Site { site: self.name.clone(), status: Some(status) }),
        }
    }
}

fn fill_gaps(fic: &mut Fic, listed: Fic) {
    let fields = [
        (&mut fic.title, listed.title),
        (&mut fic.author, listed.author),
        (&mut fic.author_url, listed.author_url),
        (&mut fic.publisher, listed.publisher),
        (&mut fic.description, listed.description),
        (&mut fic.update_from, listed.update_from),
    ];
    for (slot, value) in fields {
        if slot.is_none() {
            *slot = value;
        }
    }
    fic.created = fic.created.or(listed.created);
    fic.modified = fic.modified.or(listed.modified);
    fic.tags = fic.tags.take().or(listed.tags);
    fic.scrape_meta |= listed.scrape_meta;
    fic.fetch_meta |= listed.fetch_meta;
    for chapter in listed.chapters.iter() {
        fic.chapters.admit(chapter.clone());
    }
    fic.fics.extend(listed.fics);
}

#[async_trait]
impl Site for MockSite {
    fn name(&self) -> &str {
        &self.name
    }

    fn matches(&self, url: &str) -> bool {
        url.starts_with(&self.prefix)
    }

    fn normalize_link(&self, url: &str) -> String {
        url.trim_end_matches('/').to_string()
    }

    async fn get_fic_metadata(&self, fetch: &Fetcher, fic: &mut Fic) -> Result<()> {
        self.serve(Pass::Index, fetch, fic).await
    }

    async fn scrape_fic_metadata(&self, fetch: &Fetcher, fic: &mut Fic) -> Result<()> {
        self.serve(Pass::Scrape, fetch, fic).await
    }
}

/// An inflater that fills every chapter's missing word count with a fixed
/// value, recording the cache mode of each call.
#[derive(Default)]
pub struct MockInflate {
    words: u64,
    calls: RwLock<Vec<bool>>,
}

impl MockInflate {
    pub fn new(words: u64) -> Self {
        Self { words, calls: RwLock::default() }
    }

    /// `cache_break` of every fetcher this inflater was handed.
    pub async fn calls(&self) -> Vec<bool> {
        self.calls.read().await.clone()
    }
}

#[async_trait]
impl Inflate for MockInflate {
    async fn inflate(&self, fic: &mut Fic, fetch: &Fetcher) -> Result<()> {
        self.calls.write().await.push(fetch.options().cache_break);
        let chapters = fic.chapters.iter_mut().chain(fic.fics.iter_mut().flat_map(|sub| sub.chapters.iter_mut()));
        for chapter in chapters {
            chapter.words.get_or_insert(self.words);
        }
        Ok(())
    }
}
