//! Building a fresh [`Fic`] from a link, one function per retrieval mode.

use crate::error::Result;
use crate::fetch::Fetcher;
use crate::site::{SiteHandle, SiteRegistry};
use ficsync_model::Fic;
use tracing::{debug, instrument};

fn start(sites: &SiteRegistry, link: &str) -> Result<(SiteHandle, Fic)> {
    let site = sites.resolve(link)?;
    let fic = Fic::new(site.normalize_link(link));
    Ok((site, fic))
}

/// Read a fic from its site's chapter index, scraping instead when the index
/// is missing (404) or lists no chapters.
///
/// Any other index failure propagates.
#[instrument(skip(sites, fetch))]
pub async fn from_url(sites: &SiteRegistry, fetch: &Fetcher, link: &str) -> Result<Fic> {
    let (site, mut fic) = start(sites, link)?;
    if let Err(err) = site.get_fic_metadata(fetch, &mut fic).await {
        if err.status() != Some(404) {
            return Err(err);
        }
        debug!(site = site.name(), "No chapter index");
    }
    if fic.chapters.is_empty() {
        debug!(site = site.name(), "Falling back to scraping");
        site.scrape_fic_metadata(fetch, &mut fic).await?;
    }
    Ok(fic)
}

/// Read a fic from its site's chapter index, then scrape to fill the gaps.
#[instrument(skip(sites, fetch))]
pub async fn from_url_and_scrape(sites: &SiteRegistry, fetch: &Fetcher, link: &str) -> Result<Fic> {
    let (site, mut fic) = start(sites, link)?;
    site.get_fic_metadata(fetch, &mut fic).await?;
    site.scrape_fic_metadata(fetch, &mut fic).await?;
    Ok(fic)
}

/// Read a fic by scraping alone.
#[instrument(skip(sites, fetch))]
pub async fn scrape_from_url(sites: &SiteRegistry, fetch: &Fetcher, link: &str) -> Result<Fic> {
    let (site, mut fic) = start(sites, link)?;
    site.scrape_fic_metadata(fetch, &mut fic).await?;
    Ok(fic)
}
