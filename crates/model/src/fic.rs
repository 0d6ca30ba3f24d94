use crate::{Chapter, ChapterList};
use std::ops::Deref;
use time::OffsetDateTime;

/// Common view over the nodes of a fic tree (the root [`Fic`] and each of its
/// [`SubFic`]s), exposing the chapter list and the derived fields that the
/// merge and aggregation passes operate on.
pub trait FicNode {
    /// A human-readable label for change logs.
    fn label(&self) -> &str;
    fn chapters(&self) -> &ChapterList;
    fn chapters_mut(&mut self) -> &mut ChapterList;
    fn created(&self) -> Option<OffsetDateTime>;
    fn set_created(&mut self, created: Option<OffsetDateTime>);
    fn modified(&self) -> Option<OffsetDateTime>;
    fn set_modified(&mut self, modified: Option<OffsetDateTime>);
    fn words(&self) -> Option<u64>;
    fn set_words(&mut self, words: Option<u64>);
}

/// A fic document: a story with its metadata, its chapters, and optionally a
/// list of sub-fics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fic {
    pub title: Option<String>,
    pub link: Option<String>,
    pub author: Option<String>,
    pub author_url: Option<String>,
    pub created: Option<OffsetDateTime>,
    pub modified: Option<OffsetDateTime>,
    pub publisher: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
    /// Alternate address to refresh this fic from, instead of `link`.
    pub update_from: Option<String>,
    pub words: Option<u64>,
    /// Marker: this fic was scraped rather than read from a chapter index.
    pub scrape_meta: bool,
    /// Marker: this fic was read from a structured metadata endpoint.
    pub fetch_meta: bool,
    pub chapters: ChapterList,
    pub fics: Vec<SubFic>,
}

impl Fic {
    pub fn new(link: impl Into<String>) -> Self {
        Self {
            link: Some(link.into()),
            ..Default::default()
        }
    }

    /// The address updates should be fetched from. Empty values are skipped.
    pub fn update_with(&self) -> Option<&str> {
        non_empty(&self.update_from).or(non_empty(&self.link))
    }

    /// Returns `true` if a chapter with exactly this `link` exists anywhere in
    /// the tree (root or any sub-fic).
    pub fn chapter_exists(&self, link: &str) -> bool {
        self.chapters.chapter_exists(link) || self.fics.iter().any(|fic| fic.chapters.chapter_exists(link))
    }

    /// Returns `true` if `candidate` is already recorded anywhere in the tree.
    ///
    /// A candidate is known when some chapter is the
    /// [same chapter](Chapter::is_same_chapter), or when some chapter's link
    /// is the candidate's fetch identity.
    pub fn knows_chapter(&self, candidate: &Chapter) -> bool {
        let in_tree = |list: &ChapterList| list.contains(candidate);
        let redirected = candidate.usable_fetch_from().is_some_and(|fetch_from| self.chapter_exists(fetch_from));
        in_tree(&self.chapters) || self.fics.iter().any(|fic| in_tree(&fic.chapters)) || redirected
    }

    /// Adds a chapter to the root list unless its link exists anywhere in the
    /// tree.
    pub fn add_chapter(&mut self, name: &str, link: &str, created: Option<OffsetDateTime>) -> Option<&Chapter> {
        if self.chapter_exists(link) {
            return None;
        }
        self.chapters.add_chapter(name, link, created)
    }

    /// Iterate sub-fics together with their parent, resolving inherited fields.
    pub fn subfics(&self) -> impl Iterator<Item = SubFicView<'_>> {
        self.fics.iter().map(move |fic| SubFicView { parent: self, fic })
    }

    pub fn subfic(&self, index: usize) -> Option<SubFicView<'_>> {
        self.fics.get(index).map(|fic| SubFicView { parent: self, fic })
    }
}

impl FicNode for Fic {
    fn label(&self) -> &str {
        label(&self.title, &self.link)
    }
    fn chapters(&self) -> &ChapterList {
        &self.chapters
    }
    fn chapters_mut(&mut self) -> &mut ChapterList {
        &mut self.chapters
    }
    fn created(&self) -> Option<OffsetDateTime> {
        self.created
    }
    fn set_created(&mut self, created: Option<OffsetDateTime>) {
        self.created = created;
    }
    fn modified(&self) -> Option<OffsetDateTime> {
        self.modified
    }
    fn set_modified(&mut self, modified: Option<OffsetDateTime>) {
        self.modified = modified;
    }
    fn words(&self) -> Option<u64> {
        self.words
    }
    fn set_words(&mut self, words: Option<u64>) {
        self.words = words;
    }
}

/// A sub-story of a [`Fic`]. Sub-fics do not nest further.
///
/// `author`, `author_url` and `publisher` are inherited: a sub-fic only stores
/// its own overrides, and reading them through a [`SubFicView`] falls back to
/// the parent's value when no override is set. Setting a value only ever
/// changes the sub-fic's own override.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubFic {
    pub title: Option<String>,
    pub link: Option<String>,
    author: Option<String>,
    author_url: Option<String>,
    publisher: Option<String>,
    pub created: Option<OffsetDateTime>,
    pub modified: Option<OffsetDateTime>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
    pub words: Option<u64>,
    pub chapters: ChapterList,
}

impl SubFic {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    pub fn own_author(&self) -> Option<&str> {
        non_empty(&self.author)
    }
    pub fn own_author_url(&self) -> Option<&str> {
        non_empty(&self.author_url)
    }
    pub fn own_publisher(&self) -> Option<&str> {
        non_empty(&self.publisher)
    }

    pub fn set_author(&mut self, author: Option<String>) {
        self.author = author;
    }
    pub fn set_author_url(&mut self, author_url: Option<String>) {
        self.author_url = author_url;
    }
    pub fn set_publisher(&mut self, publisher: Option<String>) {
        self.publisher = publisher;
    }

    /// Resolve `author`: the sub-fic's own value if set, else the parent's.
    pub fn author<'a>(&'a self, parent: &'a Fic) -> Option<&'a str> {
        self.own_author().or(non_empty(&parent.author))
    }
    pub fn author_url<'a>(&'a self, parent: &'a Fic) -> Option<&'a str> {
        self.own_author_url().or(non_empty(&parent.author_url))
    }
    pub fn publisher<'a>(&'a self, parent: &'a Fic) -> Option<&'a str> {
        self.own_publisher().or(non_empty(&parent.publisher))
    }
}

impl FicNode for SubFic {
    fn label(&self) -> &str {
        label(&self.title, &self.link)
    }
    fn chapters(&self) -> &ChapterList {
        &self.chapters
    }
    fn chapters_mut(&mut self) -> &mut ChapterList {
        &mut self.chapters
    }
    fn created(&self) -> Option<OffsetDateTime> {
        self.created
    }
    fn set_created(&mut self, created: Option<OffsetDateTime>) {
        self.created = created;
    }
    fn modified(&self) -> Option<OffsetDateTime> {
        self.modified
    }
    fn set_modified(&mut self, modified: Option<OffsetDateTime>) {
        self.modified = modified;
    }
    fn words(&self) -> Option<u64> {
        self.words
    }
    fn set_words(&mut self, words: Option<u64>) {
        self.words = words;
    }
}

/// A [`SubFic`] borrowed together with its parent, so inherited fields can be
/// read without passing the parent around.
#[derive(Debug, Clone, Copy)]
pub struct SubFicView<'a> {
    parent: &'a Fic,
    fic: &'a SubFic,
}

impl<'a> SubFicView<'a> {
    pub fn parent(&self) -> &'a Fic {
        self.parent
    }
    pub fn author(&self) -> Option<&'a str> {
        self.fic.author(self.parent)
    }
    pub fn author_url(&self) -> Option<&'a str> {
        self.fic.author_url(self.parent)
    }
    pub fn publisher(&self) -> Option<&'a str> {
        self.fic.publisher(self.parent)
    }
}

impl Deref for SubFicView<'_> {
    type Target = SubFic;
    fn deref(&self) -> &Self::Target {
        self.fic
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn label<'a>(title: &'a Option<String>, link: &'a Option<String>) -> &'a str {
    non_empty(title).or(non_empty(link)).unwrap_or("(untitled)")
}
