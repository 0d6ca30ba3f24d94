use ficsync_config::{Settings, UpdateOptions};
use ficsync_retrieve::{Fetch, Fetcher, Retriever, SiteRegistry};
use std::sync::Arc;

/// Shared, read-only state for a batch of updates.
#[derive(Debug, Clone)]
pub struct Context {
    pub retriever: Retriever,
    pub options: UpdateOptions,
}

impl Context {
    pub fn new(retriever: Retriever, options: UpdateOptions) -> Self {
        Self { retriever, options }
    }

    /// Build a context from loaded settings, fetching through `transport`.
    pub fn from_settings(settings: &Settings, transport: Arc<dyn Fetch>, sites: SiteRegistry) -> Self {
        let fetcher = Fetcher::new(transport, settings.fetch_options());
        Self::new(Retriever::new(fetcher, sites), settings.update_options())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ficsync_model::{Chapter, Fic};
    use ficsync_retrieve::mock::{MockFetch, MockSite};

    #[test]
    fn test_from_settings() {
        let mut settings = Settings::default();
        settings.fetch.network = false;
        settings.fetch.xf_user = Some("1234,abcdef".to_string());
        settings.update.scrape = true;
        settings.update.concurrency = 2;

        let ctx = Context::from_settings(&settings, Arc::new(MockFetch::default()), SiteRegistry::new());
        let fetch = ctx.retriever.fetcher().options();
        assert!(fetch.no_network);
        assert_eq!(fetch.cookie.as_deref(), Some("xf_user=1234,abcdef"));
        assert_eq!(ctx.options.concurrency, 2);
        assert!(!ctx.options.from_threadmarks);
        assert!(ctx.options.from_scrape);
    }

    #[tokio::test]
    async fn test_default_settings_fetch_live_after_warm_up() {
        let mut listed = Fic::default();
        listed.chapters.admit(Chapter::new("One", "https://forums.example.com/posts/1"));
        let site = Arc::new(MockSite::new("forum", "https://forums.example.com").with_index(listed));
        let sites = SiteRegistry::new().with_site(site.clone());
        let ctx = Context::from_settings(&Settings::default(), Arc::new(MockFetch::default()), sites);

        let existing = Fic::new("https://forums.example.com/threads/worm.1");
        ctx.retriever.fetch_latest_version(&existing, true, false).await.unwrap();
        let cache_breaks: Vec<_> = site.calls().await.into_iter().map(|call| call.cache_break).collect();
        assert_eq!(cache_breaks, [false, true]);
    }
}
