use crate::changes::{Changes, record};
use ficsync_model::date::{DisplayDate, same_instant};
use ficsync_model::{Chapter, ChapterList, Fic, FicNode};
use std::collections::VecDeque;
use tracing::instrument;

/// Folds a freshly fetched fic into the existing one, returning what changed.
///
/// 1. **Chapter admission.** `new`'s chapters are scanned from newest (last)
///    to oldest. Unknown chapters are queued; on the first chapter already
///    present anywhere in the tree the scan stops, on the assumption that
///    everything older is recorded too. That keeps chapters pruned from the
///    middle of the archive from being re-added. With `add_all` the scan
///    instead skips known chapters and carries on to the start. Queued
///    chapters are appended to the root list in their original order.
/// 2. **Scalar backfill.** Root fields that are unset are copied from `new`.
/// 3. **Chapter refinement.** Every chapter in the tree is matched against
///    `new`'s chapters. Refined dates overwrite the recorded ones and unset
///    fields are backfilled. Every match is applied in turn, so with duplicate
///    listings the last one wins.
/// 4. **Root date backfill.** Only when the root has chapters of its own.
///
/// Backfills never overwrite a value that is already present.
#[instrument(skip_all, fields(fic = existing.label(), add_all))]
pub fn merge_fic(existing: &mut Fic, new: &Fic, add_all: bool) -> Changes {
    let mut changes = Changes::new();
    admit_chapters(existing, new, add_all, &mut changes);
    backfill_root(existing, new, &mut changes);
    refine_chapters(existing, new, &mut changes);
    for sub in existing.fics.iter_mut() {
        refine_chapters(sub, new, &mut changes);
    }
    backfill_root_dates(existing, new, &mut changes);
    changes
}

fn admit_chapters(existing: &mut Fic, new: &Fic, add_all: bool, changes: &mut Changes) {
    let mut pending = VecDeque::new();
    for candidate in new.chapters.iter().rev() {
        if existing.knows_chapter(candidate) {
            if add_all {
                continue;
            }
            break;
        }
        pending.push_front(candidate.clone());
    }
    // Duplicate listings within `new` are only admitted once.
    let mut added = 0;
    for chapter in pending {
        if existing.chapters.admit(chapter).is_some() {
            added += 1;
        }
    }
    if added > 0 {
        record(changes, existing.label(), format_args!("Added {added} new chapters"));
    }
}

fn backfill_root(existing: &mut Fic, new: &Fic, changes: &mut Changes) {
    if let Some(description) = fill(&mut existing.description, &new.description) {
        record(changes, existing.label(), format_args!("Set fic description to {description}"));
    }
    if existing.tags.is_none()
        && let Some(tags) = new.tags.as_ref().filter(|tags| !tags.is_empty())
    {
        existing.tags = Some(tags.clone());
        record(changes, existing.label(), format_args!("Set fic tags to {}", tags.join(", ")));
    }
    let filled = [
        ("publisher", fill(&mut existing.publisher, &new.publisher)),
        ("author", fill(&mut existing.author, &new.author)),
        ("authorUrl", fill(&mut existing.author_url, &new.author_url)),
        ("updateFrom", fill(&mut existing.update_from, &new.update_from)),
        ("link", fill(&mut existing.link, &new.link)),
        ("title", fill(&mut existing.title, &new.title)),
    ];
    for (prop, value) in filled {
        if let Some(value) = value {
            record(changes, existing.label(), format_args!("Set fic {prop} to {value}"));
        }
    }
}

fn refine_chapters<N: FicNode>(node: &mut N, new: &Fic, changes: &mut Changes) {
    let label = node.label().to_string();
    let list = node.chapters_mut();
    for index in 0..list.len() {
        let Some(chapter) = list.get(index) else { continue };
        let matches: Vec<&Chapter> = new.chapters.iter().filter(|candidate| candidate.is_same_chapter(chapter)).collect();
        for candidate in matches {
            refine_chapter(list, index, candidate, &label, changes);
        }
    }
}

fn refine_chapter(list: &mut ChapterList, index: usize, candidate: &Chapter, label: &str, changes: &mut Changes) {
    let name = &candidate.name;
    let Some(chapter) = list.get_mut(index) else { return };
    if let Some(created) = candidate.created
        && !same_instant(Some(created), chapter.created)
    {
        record(
            changes,
            label,
            format_args!(
                "Updated creation date for chapter \"{name}\" from {} to {}",
                DisplayDate(chapter.created),
                DisplayDate(Some(created))
            ),
        );
        chapter.created = Some(created);
    }
    if let Some(modified) = candidate.modified
        && !same_instant(Some(modified), chapter.modified)
    {
        record(
            changes,
            label,
            format_args!(
                "Updated modification date for chapter \"{name}\" from {} to {}",
                DisplayDate(chapter.modified),
                DisplayDate(Some(modified))
            ),
        );
        chapter.modified = Some(modified);
    }

    // Names stay unique within the list.
    if let Some(assigned) = list.fill_name(index, name) {
        record(changes, label, format_args!("Set name for chapter \"{name}\" to {assigned}"));
    }
    let Some(chapter) = list.get_mut(index) else { return };
    let filled = [
        ("link", fill(&mut chapter.link, &candidate.link)),
        ("fetchFrom", fill(&mut chapter.fetch_from, &candidate.fetch_from)),
        ("author", fill(&mut chapter.author, &candidate.author)),
        ("authorUrl", fill(&mut chapter.author_url, &candidate.author_url)),
        ("tags", fill(&mut chapter.tags, &candidate.tags).map(|tags| tags.join(", "))),
        ("words", fill(&mut chapter.words, &candidate.words).map(|words| words.to_string())),
    ];
    for (prop, value) in filled {
        if let Some(value) = value {
            record(changes, label, format_args!("Set {prop} for chapter \"{name}\" to {value}"));
        }
    }
}

fn backfill_root_dates(existing: &mut Fic, new: &Fic, changes: &mut Changes) {
    if existing.chapters.is_empty() {
        return;
    }
    if let Some(created) = fill(&mut existing.created, &new.created) {
        record(
            changes,
            existing.label(),
            format_args!("Updated fic publish time from unset to {} (from newFic)", DisplayDate(Some(created))),
        );
    }
    if let Some(modified) = fill(&mut existing.modified, &new.modified) {
        record(
            changes,
            existing.label(),
            format_args!("Updated fic last update time from unset to {} (from newFic)", DisplayDate(Some(modified))),
        );
    }
}

/// Copies `value` into `slot` if the slot is empty, returning what was copied.
fn fill<T: Clone>(slot: &mut Option<T>, value: &Option<T>) -> Option<T> {
    if slot.is_some() {
        return None;
    }
    let value = value.clone()?;
    *slot = Some(value.clone());
    Some(value)
}
