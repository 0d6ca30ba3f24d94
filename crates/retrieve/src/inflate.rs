use crate::error::Result;
use crate::fetch::Fetcher;
use async_trait::async_trait;
use ficsync_model::Fic;

/// Resolves chapter content and metadata that an index only lists lazily
/// (word counts, per-chapter dates, redirected links).
#[async_trait]
pub trait Inflate: Send + Sync {
    async fn inflate(&self, fic: &mut Fic, fetch: &Fetcher) -> Result<()>;
}

/// An [`Inflate`] for sites whose index is already complete.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoInflate;

#[async_trait]
impl Inflate for NoInflate {
    async fn inflate(&self, _fic: &mut Fic, _fetch: &Fetcher) -> Result<()> {
        Ok(())
    }
}
