use crate::Context;
use crate::error::{ErrorKind, Result};
use async_stream::stream;
use exn::ResultExt;
use ficsync_merge::{Changes, merge_fic, refresh_metadata};
use ficsync_model::Fic;
use ficsync_storage::StoreHandle;
use futures::stream::FuturesUnordered;
use futures::{Stream, StreamExt};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

/// The outcome of (successfully) updating a single document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The document changed and was rewritten.
    Updated { path: PathBuf, changes: Changes },
    /// Nothing changed; the document was left untouched.
    Unchanged(PathBuf),
}

impl Outcome {
    pub fn path(&self) -> &Path {
        match self {
            Self::Updated { path, .. } | Self::Unchanged(path) => path,
        }
    }
}

/// Progress events emitted by [`update`] and [`update_all`].
///
/// Events follow a strict ordering:
/// 1. [`Started`](Self::Started), exactly once.
/// 2. [`DiscoveryComplete`](Self::DiscoveryComplete), exactly once, with the
///    number of documents found. Only [`update_all`] discovers documents.
/// 3. One [`Updated`](Self::Updated) or [`Unchanged`](Self::Unchanged) per
///    document, in completion order. A document that failed yields an `Err`
///    item instead, tagged with its path.
/// 4. [`Complete`](Self::Complete), exactly once.
///
/// A failed discovery ends the stream early, without `Complete`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateEvent {
    Started,
    DiscoveryComplete(u64),
    Updated { path: PathBuf, changes: Changes },
    Unchanged(PathBuf),
    Complete,
}

impl From<Outcome> for UpdateEvent {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Updated { path, changes } => Self::Updated { path, changes },
            Outcome::Unchanged(path) => Self::Unchanged(path),
        }
    }
}

/// Brings a single stored fic document up to date with its remote source.
///
/// The document is read and parsed, the latest remote version retrieved and
/// merged in, the merged fic inflated and its derived fields recomputed.
/// Only if any of that produced a change is the document written back.
///
/// Each step completes before the next begins, and nothing is persisted
/// unless every step succeeds.
///
/// # Errors
/// Returns [`Exn<ErrorKind::Document>`](ErrorKind::Document) raised from an
/// inner error naming the failed step.
pub async fn update_fic(store: &StoreHandle, ctx: &Context, path: &Path) -> Result<Outcome> {
    update_fic_inner(store, ctx, path).await.or_raise(|| ErrorKind::Document(path.to_path_buf()))
}

#[instrument(skip(store, ctx), fields(store = store.name(), path = %path.display()))]
async fn update_fic_inner(store: &StoreHandle, ctx: &Context, path: &Path) -> Result<Outcome> {
    let mut existing = read_fic(store, path).await?;
    let options = &ctx.options;
    let latest = ctx
        .retriever
        .fetch_latest_version(&existing, options.from_threadmarks, options.from_scrape)
        .await
        .or_raise(|| ErrorKind::Retrieve)?;

    let changes = merge_fic(&mut existing, &latest, options.add_all);
    ctx.retriever.inflate(&mut existing).await.or_raise(|| ErrorKind::Inflate)?;
    let changes = refresh_metadata(&mut existing, changes);

    if changes.is_empty() {
        debug!("No changes");
        return Ok(Outcome::Unchanged(path.to_path_buf()));
    }
    let document = existing.to_toml().or_raise(|| ErrorKind::Serialize)?;
    store.write(path, document.as_bytes()).await.or_raise(|| ErrorKind::Write)?;
    info!(changes = changes.len(), "Updated fic");
    Ok(Outcome::Updated { path: path.to_path_buf(), changes })
}

async fn read_fic(store: &StoreHandle, path: &Path) -> Result<Fic> {
    let bytes = store.read(path).await.or_raise(|| ErrorKind::Read)?;
    let document = String::from_utf8(bytes).or_raise(|| ErrorKind::Parse)?;
    Fic::from_toml(&document).or_raise(|| ErrorKind::Parse)
}

/// Streams [`UpdateEvent`]s while updating every document in `paths`.
///
/// Up to `ctx.options.concurrency` documents are updated at once; the next
/// is started as each finishes. A failed document is yielded as an `Err` item
/// and never stops the others.
pub fn update<'a>(
    store: &'a StoreHandle,
    ctx: &'a Context,
    paths: impl IntoIterator<Item = PathBuf> + 'a,
) -> impl Stream<Item = Result<UpdateEvent>> + 'a {
    // `rustfmt` does not format macro-specific syntax such as
    // `for await` even using the parentheses trick.
    stream! {
        yield Ok(UpdateEvent::Started);
        for await event in update_documents(store, ctx, paths) {
            yield event;
        }
        yield Ok(UpdateEvent::Complete);
    }
}

/// Streams [`UpdateEvent`]s while updating every document in `store` under
/// an optional directory `prefix`.
///
/// Documents are discovered through [`DocumentStore::list`] before any is
/// updated, then processed like [`update`]. Only a discovery failure is
/// fatal.
///
/// [`DocumentStore::list`]: ficsync_storage::DocumentStore::list
pub fn update_all<'a>(
    store: &'a StoreHandle,
    ctx: &'a Context,
    prefix: Option<&'a Path>,
) -> impl Stream<Item = Result<UpdateEvent>> + 'a {
    stream! {
        yield Ok(UpdateEvent::Started);

        let documents = match store.list(prefix).await.or_raise(|| ErrorKind::Discover) {
            Ok(documents) => documents,
            Err(e) => {
                yield Err(e);
                return;
            },
        };
        debug!(store = store.name(), count = documents.len(), "Discovered documents");
        // Infallible: a usize (either 32- or 64-bit) will always fit in a u64.
        yield Ok(UpdateEvent::DiscoveryComplete(u64::try_from(documents.len()).unwrap_or(0)));

        for await event in update_documents(store, ctx, documents.into_iter().map(|info| info.path)) {
            yield event;
        }
        yield Ok(UpdateEvent::Complete);
    }
}

fn update_documents<'a>(
    store: &'a StoreHandle,
    ctx: &'a Context,
    paths: impl IntoIterator<Item = PathBuf> + 'a,
) -> impl Stream<Item = Result<UpdateEvent>> + 'a {
    let concurrency = ctx.options.concurrency.max(1);
    // `rustfmt` does not format macros that use braces. Wrap in parentheses!
    stream!({
        let mut pending = paths.into_iter().map(|path| async move { update_fic(store, ctx, &path).await });
        let mut processing = FuturesUnordered::new();
        processing.extend(pending.by_ref().take(concurrency));
        while let Some(result) = processing.next().await {
            if let Err(err) = &result {
                warn!(error = ?err, "Failed to update fic");
            }
            yield result.map(UpdateEvent::from);
            if let Some(next) = pending.next() {
                processing.push(next);
            }
        }
    })
}
