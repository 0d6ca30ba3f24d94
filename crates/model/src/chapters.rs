use crate::Chapter;
use time::OffsetDateTime;

/// The ordered, deduplicated chapters owned by one fic.
///
/// Insertion order is the canonical reading order. The list only grows: the
/// structure can be extended through [`add_chapter`](Self::add_chapter) and
/// [`admit`](Self::admit), while [`iter_mut`](Self::iter_mut) allows existing
/// chapters' fields to be refined in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChapterList {
    chapters: Vec<Chapter>,
}

impl ChapterList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a list from already-ordered chapters (e.g. a loaded document),
    /// reassigning `order` from each chapter's position.
    pub fn from_ordered(chapters: impl IntoIterator<Item = Chapter>) -> Self {
        let chapters = chapters
            .into_iter()
            .enumerate()
            .map(|(order, chapter)| Chapter { order, ..chapter })
            .collect();
        Self { chapters }
    }

    pub fn len(&self) -> usize {
        self.chapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chapters.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Chapter> {
        self.chapters.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Chapter> {
        self.chapters.get_mut(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Chapter> {
        self.chapters.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Chapter> {
        self.chapters.iter_mut()
    }

    /// Returns `true` if a chapter with exactly this `link` is present.
    pub fn chapter_exists(&self, link: &str) -> bool {
        self.chapters.iter().any(|chapter| chapter.link.as_deref() == Some(link))
    }

    /// Returns `true` if the same chapter (by link or fetch identity) is present.
    pub fn contains(&self, chapter: &Chapter) -> bool {
        self.chapters.iter().any(|existing| existing.is_same_chapter(chapter))
    }

    /// Adds a new chapter unless one with the same `link` already exists.
    ///
    /// The chapter is assigned the next `order`, and a name already used in
    /// this list gets a ` (n)` suffix.
    pub fn add_chapter(
        &mut self,
        name: &str,
        link: &str,
        created: Option<OffsetDateTime>,
    ) -> Option<&Chapter> {
        if self.chapter_exists(link) {
            return None;
        }
        let chapter = Chapter {
            created,
            ..Chapter::new(name, link)
        };
        Some(self.push(chapter))
    }

    /// Adds a fully populated chapter unless the same chapter is already
    /// present, assigning `order` and deconflicting `name` like
    /// [`add_chapter`](Self::add_chapter).
    pub fn admit(&mut self, chapter: Chapter) -> Option<&Chapter> {
        if self.contains(&chapter) || chapter.usable_link().is_some_and(|link| self.chapter_exists(link)) {
            return None;
        }
        Some(self.push(chapter))
    }

    /// Names the chapter at `index` after `base` if it has no name yet,
    /// deconflicting like [`add_chapter`](Self::add_chapter). Returns the
    /// assigned name.
    pub fn fill_name(&mut self, index: usize, base: &str) -> Option<String> {
        if base.is_empty() || self.chapters.get(index).is_none_or(|chapter| !chapter.name.is_empty()) {
            return None;
        }
        let name = self.unique_name(base);
        self.chapters[index].name = name.clone();
        Some(name)
    }

    fn push(&mut self, mut chapter: Chapter) -> &Chapter {
        chapter.order = self.chapters.len();
        if !chapter.name.is_empty() {
            chapter.name = self.unique_name(&chapter.name);
        }
        self.chapters.push(chapter);
        // Infallible: we've just pushed.
        &self.chapters[self.chapters.len() - 1]
    }

    fn unique_name(&self, base: &str) -> String {
        let taken = |name: &str| self.chapters.iter().any(|chapter| chapter.name == name);
        let mut name = base.to_string();
        let mut counter = 0;
        while taken(&name) {
            counter += 1;
            name = format!("{base} ({counter})");
        }
        name
    }
}

impl<'a> IntoIterator for &'a ChapterList {
    type Item = &'a Chapter;
    type IntoIter = std::slice::Iter<'a, Chapter>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a> IntoIterator for &'a mut ChapterList {
    type Item = &'a mut Chapter;
    type IntoIter = std::slice::IterMut<'a, Chapter>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}
