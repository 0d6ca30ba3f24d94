//! Persisted document codec.
//!
//! Fics are stored as TOML. The in-memory model is converted through proxy
//! structs that own the on-disk key names and omission rules: any field that
//! is absent, empty, or `false` is left out when writing.

use crate::error::{ErrorKind, Result};
use crate::{Chapter, ChapterList, Fic, SubFic};
use exn::ResultExt;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::instrument;

#[derive(Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(test, derive(Debug, PartialEq))]
pub(crate) struct FicProxy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    author_url: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option", skip_serializing_if = "Option::is_none")]
    created: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option", skip_serializing_if = "Option::is_none")]
    modified: Option<OffsetDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    publisher: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    update_from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    words: Option<u64>,
    #[serde(default, skip_serializing_if = "is_false")]
    scrape_meta: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    fetch_meta: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    fics: Vec<SubFicProxy>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    chapters: Vec<ChapterProxy>,
}

/// Only a sub-fic's own overrides are stored, never inherited values.
#[derive(Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(test, derive(Debug, PartialEq))]
pub(crate) struct SubFicProxy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    author_url: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option", skip_serializing_if = "Option::is_none")]
    created: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option", skip_serializing_if = "Option::is_none")]
    modified: Option<OffsetDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    publisher: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    words: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    chapters: Vec<ChapterProxy>,
}

#[derive(Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(test, derive(Debug, PartialEq))]
pub(crate) struct ChapterProxy {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    fetch_from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    author_url: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option", skip_serializing_if = "Option::is_none")]
    created: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option", skip_serializing_if = "Option::is_none")]
    modified: Option<OffsetDateTime>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    words: Option<u64>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn tags_in(tags: Vec<String>) -> Option<Vec<String>> {
    Some(tags).filter(|tags| !tags.is_empty())
}

fn tags_out(tags: &Option<Vec<String>>) -> Vec<String> {
    tags.clone().unwrap_or_default()
}

impl From<ChapterProxy> for Chapter {
    fn from(chapter: ChapterProxy) -> Self {
        Self {
            // Renumbered by ChapterList::from_ordered.
            order: 0,
            name: chapter.name,
            link: chapter.link,
            fetch_from: chapter.fetch_from,
            created: chapter.created,
            modified: chapter.modified,
            author: chapter.author,
            author_url: chapter.author_url,
            tags: tags_in(chapter.tags),
            words: chapter.words,
        }
    }
}
impl From<&Chapter> for ChapterProxy {
    fn from(chapter: &Chapter) -> Self {
        Self {
            name: chapter.name.clone(),
            link: chapter.link.clone(),
            fetch_from: chapter.fetch_from.clone(),
            author: chapter.author.clone(),
            author_url: chapter.author_url.clone(),
            created: chapter.created,
            modified: chapter.modified,
            tags: tags_out(&chapter.tags),
            words: chapter.words,
        }
    }
}

fn chapters_in(chapters: Vec<ChapterProxy>) -> ChapterList {
    ChapterList::from_ordered(chapters.into_iter().map(Chapter::from))
}

fn chapters_out(chapters: &ChapterList) -> Vec<ChapterProxy> {
    chapters.iter().map(ChapterProxy::from).collect()
}

impl From<SubFicProxy> for SubFic {
    fn from(fic: SubFicProxy) -> Self {
        let mut sub = SubFic::default();
        sub.title = fic.title;
        sub.link = fic.link;
        sub.created = fic.created;
        sub.modified = fic.modified;
        sub.description = fic.description;
        sub.tags = tags_in(fic.tags);
        sub.words = fic.words;
        sub.chapters = chapters_in(fic.chapters);
        sub.set_author(fic.author);
        sub.set_author_url(fic.author_url);
        sub.set_publisher(fic.publisher);
        sub
    }
}
impl From<&SubFic> for SubFicProxy {
    fn from(fic: &SubFic) -> Self {
        Self {
            title: fic.title.clone(),
            link: fic.link.clone(),
            author: fic.own_author().map(String::from),
            author_url: fic.own_author_url().map(String::from),
            created: fic.created,
            modified: fic.modified,
            publisher: fic.own_publisher().map(String::from),
            description: fic.description.clone(),
            tags: tags_out(&fic.tags),
            words: fic.words,
            chapters: chapters_out(&fic.chapters),
        }
    }
}

impl From<FicProxy> for Fic {
    fn from(fic: FicProxy) -> Self {
        Self {
            title: fic.title,
            link: fic.link,
            author: fic.author,
            author_url: fic.author_url,
            created: fic.created,
            modified: fic.modified,
            publisher: fic.publisher,
            description: fic.description,
            tags: tags_in(fic.tags),
            update_from: fic.update_from,
            words: fic.words,
            scrape_meta: fic.scrape_meta,
            fetch_meta: fic.fetch_meta,
            chapters: chapters_in(fic.chapters),
            fics: fic.fics.into_iter().map(SubFic::from).collect(),
        }
    }
}
impl From<&Fic> for FicProxy {
    fn from(fic: &Fic) -> Self {
        Self {
            title: fic.title.clone(),
            link: fic.link.clone(),
            author: fic.author.clone(),
            author_url: fic.author_url.clone(),
            created: fic.created,
            modified: fic.modified,
            publisher: fic.publisher.clone(),
            description: fic.description.clone(),
            tags: tags_out(&fic.tags),
            update_from: fic.update_from.clone(),
            words: fic.words,
            scrape_meta: fic.scrape_meta,
            fetch_meta: fic.fetch_meta,
            fics: fic.fics.iter().map(SubFicProxy::from).collect(),
            chapters: chapters_out(&fic.chapters),
        }
    }
}

impl Fic {
    /// Parse a persisted TOML document.
    #[instrument(skip(document), fields(document_size = document.len()))]
    pub fn from_toml(document: &str) -> Result<Self> {
        let proxy: FicProxy = toml::from_str(document).or_raise(|| ErrorKind::Deserialize)?;
        Ok(proxy.into())
    }

    /// Render the fic as a TOML document.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string(&FicProxy::from(self)).or_raise(|| ErrorKind::Serialize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    const DOCUMENT: &str = r#"
title = "The Long Road"
link = "https://example.com/works/1"
author = "Someone"
authorUrl = "https://example.com/users/someone"
created = "2021-01-01T00:00:00Z"
modified = "2021-06-01T00:00:00Z"
publisher = "Example Archive"
tags = ["fandom:Example", "status:complete"]

[[fics]]
title = "Side Story"
author = "Guest"

[[fics.chapters]]
name = "Interlude"
link = "https://example.com/works/1/interlude"

[[chapters]]
name = "Chapter 1"
link = "https://example.com/works/1/chapters/1"
created = "2021-01-01T00:00:00Z"

[[chapters]]
name = "Chapter 2"
link = "https://example.com/works/1/chapters/2"
created = "2021-06-01T00:00:00Z"
tags = ["pov:someone"]
"#;

    #[test]
    fn test_from_toml() {
        let fic = Fic::from_toml(DOCUMENT).unwrap();
        assert_eq!(fic.title.as_deref(), Some("The Long Road"));
        assert_eq!(fic.author_url.as_deref(), Some("https://example.com/users/someone"));
        assert_eq!(fic.created, Some(datetime!(2021-01-01 0:00 UTC)));
        assert_eq!(fic.tags, Some(vec!["fandom:Example".to_string(), "status:complete".to_string()]));
        assert_eq!(fic.chapters.len(), 2);
        let second = fic.chapters.get(1).unwrap();
        assert_eq!(second.order, 1);
        assert_eq!(second.tags, Some(vec!["pov:someone".to_string()]));
        assert_eq!(fic.fics.len(), 1);
        let sub = fic.subfic(0).unwrap();
        assert_eq!(sub.author(), Some("Guest"));
        assert_eq!(sub.publisher(), Some("Example Archive"));
        assert_eq!(sub.chapters.len(), 1);
        assert!(!fic.scrape_meta);
    }

    #[test]
    fn test_to_toml_omits_empty_fields() {
        let mut fic = Fic::new("https://example.com/works/2");
        fic.tags = Some(vec![]);
        fic.chapters.add_chapter("Only", "https://example.com/works/2/chapters/1", None);
        let rendered = fic.to_toml().unwrap();
        assert!(rendered.contains("link = \"https://example.com/works/2\""));
        for key in ["title", "author", "created", "tags", "scrapeMeta", "fetchMeta", "fics"] {
            assert!(!rendered.contains(&format!("{key} =")), "unexpected key {key} in:\n{rendered}");
        }
    }

    #[test]
    fn test_subfic_writes_only_overrides() {
        let mut fic = Fic::from_toml(DOCUMENT).unwrap();
        fic.fics[0].set_author(None);
        let rendered = fic.to_toml().unwrap();
        let reloaded = Fic::from_toml(&rendered).unwrap();
        assert_eq!(reloaded.fics[0].own_author(), None);
        assert_eq!(reloaded.fics[0].own_publisher(), None);
        assert_eq!(reloaded.subfic(0).unwrap().author(), Some("Someone"));
    }

    #[test]
    fn test_subfic_overrides_load() {
        let document = r#"
title = "Anthology"
author = "Editor"
publisher = "Example Archive"

[[fics]]
title = "Guest Story"
author = "Guest"
authorUrl = "https://example.com/users/guest"
publisher = "Elsewhere"
words = 300
"#;
        let fic = Fic::from_toml(document).unwrap();
        let sub = &fic.fics[0];
        assert_eq!(sub.own_author(), Some("Guest"));
        assert_eq!(sub.own_author_url(), Some("https://example.com/users/guest"));
        assert_eq!(sub.own_publisher(), Some("Elsewhere"));
        assert_eq!(sub.title.as_deref(), Some("Guest Story"));
        assert_eq!(sub.words, Some(300));
    }

    #[test]
    fn test_document_is_stable() {
        let fic = Fic::from_toml(DOCUMENT).unwrap();
        let rendered = fic.to_toml().unwrap();
        let reloaded = Fic::from_toml(&rendered).unwrap();
        assert_eq!(reloaded, fic);
        assert_eq!(reloaded.to_toml().unwrap(), rendered);
    }

    #[test]
    fn test_markers_persist() {
        let fic = Fic {
            scrape_meta: true,
            update_from: Some("https://example.com/threads/1".to_string()),
            words: Some(1200),
            ..Fic::new("https://example.com/works/3")
        };
        let reloaded = Fic::from_toml(&fic.to_toml().unwrap()).unwrap();
        assert!(reloaded.scrape_meta);
        assert!(!reloaded.fetch_meta);
        assert_eq!(reloaded.update_from.as_deref(), Some("https://example.com/threads/1"));
        assert_eq!(reloaded.words, Some(1200));
    }

    #[test]
    fn test_malformed_document() {
        let err = Fic::from_toml("chapters = 12").unwrap_err();
        assert_eq!(*err, ErrorKind::Deserialize);
    }
}
