use time::OffsetDateTime;

/// One installment of a fic.
///
/// A chapter's identity is its remote `link`, or its `fetch_from` (the
/// address it was actually fetched from, e.g. before a redirect) when a
/// usable link is missing on either side. See [`is_same_chapter`](Self::is_same_chapter).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Chapter {
    /// Position within the owning [`ChapterList`](crate::ChapterList),
    /// assigned on insertion.
    pub order: usize,
    /// Display name, unique within the owning list. Empty when unknown.
    pub name: String,
    /// Remote identity.
    pub link: Option<String>,
    /// Alternate fetch identity.
    pub fetch_from: Option<String>,
    pub created: Option<OffsetDateTime>,
    pub modified: Option<OffsetDateTime>,
    pub author: Option<String>,
    pub author_url: Option<String>,
    pub tags: Option<Vec<String>>,
    pub words: Option<u64>,
}

impl Chapter {
    pub fn new(name: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            link: Some(link.into()),
            ..Default::default()
        }
    }

    pub fn with_fetch_from(mut self, fetch_from: impl Into<String>) -> Self {
        self.fetch_from = Some(fetch_from.into());
        self
    }

    pub fn with_created(mut self, created: OffsetDateTime) -> Self {
        self.created = Some(created);
        self
    }

    pub fn with_modified(mut self, modified: OffsetDateTime) -> Self {
        self.modified = Some(modified);
        self
    }

    pub fn with_author(mut self, author: impl Into<String>, author_url: Option<String>) -> Self {
        self.author = Some(author.into());
        self.author_url = author_url;
        self
    }

    pub fn with_tags(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_words(mut self, words: u64) -> Self {
        self.words = Some(words);
        self
    }

    /// The link, if it is present and non-empty.
    pub fn usable_link(&self) -> Option<&str> {
        usable(&self.link)
    }

    /// The fetch identity, if it is present and non-empty.
    pub fn usable_fetch_from(&self) -> Option<&str> {
        usable(&self.fetch_from)
    }

    /// Returns `true` if both chapters refer to the same remote installment.
    ///
    /// Chapters match when both carry the same non-empty `link`, or both
    /// carry the same non-empty `fetch_from`. A chapter with neither never
    /// matches anything (including itself).
    pub fn is_same_chapter(&self, other: &Chapter) -> bool {
        let links = matches!((self.usable_link(), other.usable_link()), (Some(a), Some(b)) if a == b);
        let fetches = matches!((self.usable_fetch_from(), other.usable_fetch_from()), (Some(a), Some(b)) if a == b);
        links || fetches
    }

    /// The most recent known activity: `modified`, falling back to `created`.
    pub fn last_activity(&self) -> Option<OffsetDateTime> {
        self.modified.or(self.created)
    }
}

fn usable(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use time::macros::datetime;

    fn chapter(link: Option<&str>, fetch_from: Option<&str>) -> Chapter {
        Chapter {
            link: link.map(String::from),
            fetch_from: fetch_from.map(String::from),
            ..Default::default()
        }
    }

    #[rstest]
    #[case(chapter(Some("a"), None), chapter(Some("a"), None), true)]
    #[case(chapter(Some("a"), None), chapter(Some("b"), None), false)]
    #[case(chapter(None, Some("x")), chapter(Some("b"), Some("x")), true)]
    #[case(chapter(Some("a"), Some("x")), chapter(Some("b"), Some("y")), false)]
    #[case(chapter(Some(""), None), chapter(Some(""), None), false)]
    #[case(chapter(None, None), chapter(None, None), false)]
    // A link is never compared against a fetch identity.
    #[case(chapter(Some("a"), None), chapter(None, Some("a")), false)]
    fn test_is_same_chapter(#[case] a: Chapter, #[case] b: Chapter, #[case] expected: bool) {
        assert_eq!(a.is_same_chapter(&b), expected);
        assert_eq!(b.is_same_chapter(&a), expected);
    }

    #[test]
    fn test_last_activity_falls_back_to_created() {
        let created = datetime!(2021-01-01 0:00 UTC);
        let modified = datetime!(2021-02-01 0:00 UTC);
        let chapter = Chapter::new("One", "https://example.com/1").with_created(created);
        assert_eq!(chapter.last_activity(), Some(created));
        assert_eq!(chapter.with_modified(modified).last_activity(), Some(modified));
        assert_eq!(Chapter::default().last_activity(), None);
    }
}
