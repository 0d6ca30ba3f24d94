//! Retrieval of the current remote version of a fic.
//!
//! Transport and site-specific parsing stay behind the [`Fetch`], [`Site`]
//! and [`Inflate`] capabilities; this crate decides which site operations to
//! run, in what order, and with which fetch options.

mod construct;
pub mod error;
mod fetch;
mod inflate;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
mod retriever;
mod site;

pub use crate::construct::{from_url, from_url_and_scrape, scrape_from_url};
pub use crate::fetch::{Fetch, FetchOptions, Fetcher, Response, SESSION_COOKIE};
pub use crate::inflate::{Inflate, NoInflate};
pub use crate::retriever::{RetrievalMode, Retriever};
pub use crate::site::{Site, SiteHandle, SiteRegistry};
