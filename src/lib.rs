//! Incremental updates of locally archived fic documents.
//!
//! Each stored document is brought up to date with its remote source in four
//! steps: retrieve the latest version ([`ficsync_retrieve`]), merge it into
//! the stored copy and recompute derived metadata ([`ficsync_merge`]), then
//! persist the result if anything changed ([`ficsync_storage`]).
//!
//! [`update`] works through an explicit list of documents; [`update_all`]
//! discovers every document in a store first.
//!
//! ```no_run
//! use ficsync::{Context, UpdateEvent, update};
//! use ficsync_storage::StoreHandle;
//! use futures::StreamExt;
//! use std::path::PathBuf;
//!
//! async fn run(store: &StoreHandle, ctx: &Context, paths: Vec<PathBuf>) {
//!     let events = update(store, ctx, paths);
//!     futures::pin_mut!(events);
//!     while let Some(event) = events.next().await {
//!         if let Ok(UpdateEvent::Updated { path, changes }) = event {
//!             println!("{}: {} changes", path.display(), changes.len());
//!         }
//!     }
//! }
//! ```

mod context;
pub mod error;
mod update;

pub use crate::context::Context;
pub use crate::update::{Outcome, UpdateEvent, update, update_all, update_fic};
pub use ficsync_config::{Settings, UpdateOptions};
