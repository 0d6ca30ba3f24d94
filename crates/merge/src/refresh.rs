use crate::changes::{Changes, or_unset, record};
use ficsync_model::date::{DisplayDate, same_instant};
use ficsync_model::{Fic, FicNode, OffsetDateTime};
use tracing::instrument;

/// Recomputes the derived `created`, `modified` and `words` of every node in
/// the tree from its chapters, appending to (and returning) `changes`.
///
/// A root without chapters of its own takes its dates from its sub-fics
/// instead. Dates are only ever replaced by a computed value: a node with no
/// dated chapters keeps what it has.
#[instrument(skip_all, fields(fic = fic.label()))]
pub fn refresh_metadata(fic: &mut Fic, mut changes: Changes) -> Changes {
    refresh_node(fic, &mut changes);
    for sub in fic.fics.iter_mut() {
        refresh_node(sub, &mut changes);
    }
    if fic.chapters.is_empty() {
        refresh_from_subfics(fic, &mut changes);
    }
    changes
}

fn refresh_node<N: FicNode>(node: &mut N, changes: &mut Changes) {
    let earliest = node.chapters().iter().filter_map(|chapter| chapter.created).min();
    let latest = node.chapters().iter().filter_map(|chapter| chapter.last_activity()).max();
    let words: u64 = node.chapters().iter().map(|chapter| chapter.words.unwrap_or(0)).sum();
    set_created(node, earliest, "earliest chapter", changes);
    set_modified(node, latest, "latest chapter", changes);
    if node.words() != Some(words) {
        let label = node.label().to_string();
        record(changes, &label, format_args!("Updated word count from {} to {words}", or_unset(node.words())));
        node.set_words(Some(words));
    }
}

fn refresh_from_subfics(fic: &mut Fic, changes: &mut Changes) {
    let earliest = fic.fics.iter().filter_map(|sub| sub.created).min();
    let latest = fic.fics.iter().filter_map(|sub| sub.modified.or(sub.created)).max();
    set_created(fic, earliest, "earliest subfic", changes);
    set_modified(fic, latest, "latest subfic", changes);
}

fn set_created<N: FicNode>(node: &mut N, value: Option<OffsetDateTime>, source: &str, changes: &mut Changes) {
    let Some(value) = value else { return };
    if same_instant(node.created(), Some(value)) {
        return;
    }
    let label = node.label().to_string();
    record(
        changes,
        &label,
        format_args!("Updated fic publish time from {} to {} (from {source})", DisplayDate(node.created()), DisplayDate(Some(value))),
    );
    node.set_created(Some(value));
}

fn set_modified<N: FicNode>(node: &mut N, value: Option<OffsetDateTime>, source: &str, changes: &mut Changes) {
    let Some(value) = value else { return };
    if same_instant(node.modified(), Some(value)) {
        return;
    }
    let label = node.label().to_string();
    record(
        changes,
        &label,
        format_args!(
            "Updated fic last update time from {} to {} (from {source})",
            DisplayDate(node.modified()),
            DisplayDate(Some(value))
        ),
    );
    node.set_modified(Some(value));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge_fic;
    use ficsync_model::{Chapter, ChapterList, SubFic};
    use time::macros::datetime;

    fn titled(title: &str) -> Fic {
        Fic {
            title: Some(title.to_string()),
            ..Fic::new("https://example.com/works/1")
        }
    }

    #[test]
    fn test_aggregates_from_chapters() {
        let mut fic = titled("Example");
        fic.chapters = ChapterList::from_ordered([
            Chapter::new("One", "https://example.com/1").with_created(datetime!(2021-01-01 0:00 UTC)).with_words(500),
            Chapter::new("Two", "https://example.com/2").with_created(datetime!(2021-06-01 0:00 UTC)).with_words(700),
        ]);
        let changes = refresh_metadata(&mut fic, vec!["Example: earlier".to_string()]);
        assert_eq!(fic.created, Some(datetime!(2021-01-01 0:00 UTC)));
        assert_eq!(fic.modified, Some(datetime!(2021-06-01 0:00 UTC)));
        assert_eq!(fic.words, Some(1200));
        assert_eq!(
            changes,
            [
                "Example: earlier",
                "Example: Updated fic publish time from unset to 2021-01-01T00:00:00Z (from earliest chapter)",
                "Example: Updated fic last update time from unset to 2021-06-01T00:00:00Z (from latest chapter)",
                "Example: Updated word count from unset to 1200",
            ]
        );
        // A second pass finds nothing to do.
        assert!(refresh_metadata(&mut fic, Changes::new()).is_empty());
    }

    #[test]
    fn test_modified_prefers_chapter_modification() {
        let mut fic = titled("Example");
        fic.chapters = ChapterList::from_ordered([
            Chapter::new("One", "https://example.com/1")
                .with_created(datetime!(2021-01-01 0:00 UTC))
                .with_modified(datetime!(2022-02-02 0:00 UTC)),
            Chapter::new("Two", "https://example.com/2").with_created(datetime!(2021-06-01 0:00 UTC)),
        ]);
        refresh_metadata(&mut fic, Changes::new());
        assert_eq!(fic.modified, Some(datetime!(2022-02-02 0:00 UTC)));
    }

    #[test]
    fn test_undated_chapters_keep_dates() {
        let mut fic = titled("Example");
        fic.created = Some(datetime!(2019-01-01 0:00 UTC));
        fic.words = Some(0);
        fic.chapters.add_chapter("One", "https://example.com/1", None);
        assert!(refresh_metadata(&mut fic, Changes::new()).is_empty());
        assert_eq!(fic.created, Some(datetime!(2019-01-01 0:00 UTC)));
    }

    #[test]
    fn test_stale_dates_are_corrected() {
        let mut fic = titled("Example");
        fic.created = Some(datetime!(2021-03-01 0:00 UTC));
        fic.words = Some(10);
        fic.chapters.admit(Chapter::new("One", "https://example.com/1").with_created(datetime!(2021-01-01 0:00 UTC)));
        let changes = refresh_metadata(&mut fic, Changes::new());
        assert_eq!(fic.words, Some(0));
        assert_eq!(
            changes,
            [
                "Example: Updated fic publish time from 2021-03-01T00:00:00Z to 2021-01-01T00:00:00Z (from earliest chapter)",
                "Example: Updated fic last update time from unset to 2021-01-01T00:00:00Z (from latest chapter)",
                "Example: Updated word count from 10 to 0",
            ]
        );
    }

    #[test]
    fn test_container_root_aggregates_subfics() {
        let mut fic = titled("Series");
        fic.words = Some(0);
        for (title, created, words) in [
            ("Part One", datetime!(2020-01-01 0:00 UTC), 100),
            ("Part Two", datetime!(2020-05-01 0:00 UTC), 200),
        ] {
            let mut sub = SubFic::new(title);
            sub.chapters.admit(Chapter::new(title, format!("https://example.com/{words}")).with_created(created).with_words(words));
            fic.fics.push(sub);
        }
        let changes = refresh_metadata(&mut fic, Changes::new());
        assert_eq!(fic.fics[0].words, Some(100));
        assert_eq!(fic.fics[1].words, Some(200));
        assert_eq!(fic.fics[1].modified, Some(datetime!(2020-05-01 0:00 UTC)));
        assert_eq!(fic.created, Some(datetime!(2020-01-01 0:00 UTC)));
        assert_eq!(fic.modified, Some(datetime!(2020-05-01 0:00 UTC)));
        assert_eq!(
            changes.iter().filter(|change| change.ends_with("subfic)")).collect::<Vec<_>>(),
            [
                "Series: Updated fic publish time from unset to 2020-01-01T00:00:00Z (from earliest subfic)",
                "Series: Updated fic last update time from unset to 2020-05-01T00:00:00Z (from latest subfic)",
            ]
        );
    }

    #[test]
    fn test_merge_then_refresh_is_stable() {
        let mut existing = titled("Example");
        existing.chapters.add_chapter("One", "https://example.com/1", Some(datetime!(2021-01-01 0:00 UTC)));
        let mut new = titled("Example");
        new.chapters = ChapterList::from_ordered([
            Chapter::new("One", "https://example.com/1").with_words(500),
            Chapter::new("Two", "https://example.com/2").with_created(datetime!(2021-06-01 0:00 UTC)).with_words(700),
        ]);
        let changes = merge_fic(&mut existing, &new, false);
        let changes = refresh_metadata(&mut existing, changes);
        assert!(!changes.is_empty());
        assert_eq!(existing.words, Some(1200));

        let changes = merge_fic(&mut existing, &new, false);
        assert!(refresh_metadata(&mut existing, changes).is_empty());
    }
}
