//! Fic reconciliation.
//!
//! Updating an archived fic is a strict sequence: the caller retrieves a fresh
//! copy, [`merge_fic`] folds it into the existing document, then
//! [`refresh_metadata`] recomputes the derived fields (`created`, `modified`,
//! `words`) of every node in the tree. Both passes mutate the existing fic in
//! place and report what they did as a list of human-readable changes; an
//! empty list means nothing changed and there is nothing to persist.
//!
//! Neither pass can fail: malformed input, such as a chapter with no usable
//! identity, is simply never matched.

mod changes;
mod merge;
mod refresh;

pub use crate::changes::Changes;
pub use crate::merge::merge_fic;
pub use crate::refresh::refresh_metadata;
