//! Fic document data model.
//!
//! A [`Fic`] owns an ordered [`ChapterList`] and, optionally, a list of
//! [`SubFic`]s. Sub-fics inherit their attribution (`author`, `author_url`,
//! `publisher`) from the parent unless they carry their own override; read
//! them through a [`SubFicView`] (see [`Fic::subfics`]).
//!
//! Documents are persisted as TOML via [`Fic::from_toml`] and [`Fic::to_toml`].

mod chapter;
mod chapters;
pub mod date;
mod document;
pub mod error;
mod fic;

pub use crate::chapter::Chapter;
pub use crate::chapters::ChapterList;
pub use crate::fic::{Fic, FicNode, SubFic, SubFicView};
pub use time::OffsetDateTime;
