//! Layered configuration.
//!
//! Sources, lowest priority first:
//!
//! 1. built-in defaults,
//! 2. a config file (TOML, YAML or JSON, chosen by extension),
//! 3. environment variables prefixed `FICSYNC_`, with `__` separating
//!    nested keys (`FICSYNC_UPDATE__CONCURRENCY=8`).
//!
//! ```toml
//! [fetch]
//! network = true
//! concurrency = 4
//! requests_per_second = 1.0
//! xf_user = "1234,abcdef"
//!
//! [update]
//! concurrency = 4
//! add_all = false
//! scrape = false
//! and_scrape = false
//! ```

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use ficsync_retrieve::{FetchOptions, SESSION_COOKIE};
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ENV_PREFIX: &str = "FICSYNC_";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub fetch: FetchSettings,
    pub update: UpdateSettings,
}

/// How requests are made.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchSettings {
    /// Allow network access at all.
    pub network: bool,
    /// Simultaneous requests.
    pub concurrency: usize,
    pub requests_per_second: Option<f64>,
    /// Forum session token, sent as the `xf_user` cookie.
    pub xf_user: Option<String>,
}
impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            network: true,
            concurrency: 4,
            requests_per_second: None,
            xf_user: None,
        }
    }
}

/// How documents are updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateSettings {
    /// Documents updated at once.
    pub concurrency: usize,
    /// Reconcile every remote chapter instead of stopping at the first known one.
    pub add_all: bool,
    /// Scrape instead of reading chapter indexes.
    pub scrape: bool,
    /// Scrape after reading chapter indexes.
    pub and_scrape: bool,
}
impl Default for UpdateSettings {
    fn default() -> Self {
        Self { concurrency: 4, add_all: false, scrape: false, and_scrape: false }
    }
}

/// Runtime options for a batch of document updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateOptions {
    pub concurrency: usize,
    pub add_all: bool,
    pub from_threadmarks: bool,
    pub from_scrape: bool,
}
impl Default for UpdateOptions {
    fn default() -> Self {
        UpdateSettings::default().into()
    }
}
impl From<UpdateSettings> for UpdateOptions {
    fn from(settings: UpdateSettings) -> Self {
        Self {
            concurrency: settings.concurrency,
            add_all: settings.add_all,
            from_threadmarks: !settings.scrape,
            from_scrape: settings.scrape || settings.and_scrape,
        }
    }
}

impl Settings {
    /// `config.toml` in the platform's config directory for ficsync.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "ficsync").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Assemble the configuration sources without extracting them.
    ///
    /// An explicit `path` must exist; the default path is only used if it does.
    pub fn figment(path: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Settings::default()));
        let file = match path {
            Some(path) if !path.is_file() => {
                exn::bail!(ErrorKind::Validation(format!("config file not found: {}", path.display())))
            },
            Some(path) => Some(path.to_path_buf()),
            None => Self::default_path().filter(|path| path.is_file()),
        };
        if let Some(file) = file {
            tracing::debug!(path = %file.display(), "Loading config file");
            figment = match file.extension().and_then(|ext| ext.to_str()) {
                Some("toml") => figment.merge(Toml::file(&file)),
                Some("yaml" | "yml") => figment.merge(Yaml::file(&file)),
                Some("json") => figment.merge(Json::file(&file)),
                _ => exn::bail!(ErrorKind::Validation(format!("unsupported config format: {}", file.display()))),
            };
        }
        Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Load and validate the configuration.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let settings: Settings = Self::figment(path)?.extract().or_raise(|| ErrorKind::Extract)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.update.concurrency == 0 {
            exn::bail!(ErrorKind::Validation("update.concurrency must be at least 1".to_string()));
        }
        if self.fetch.concurrency == 0 {
            exn::bail!(ErrorKind::Validation("fetch.concurrency must be at least 1".to_string()));
        }
        if let Some(rps) = self.fetch.requests_per_second
            && (rps.is_nan() || rps <= 0.0)
        {
            exn::bail!(ErrorKind::Validation(format!("fetch.requests_per_second must be positive, got {rps}")));
        }
        Ok(())
    }

    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            cache_break: false,
            no_network: !self.fetch.network,
            max_concurrency: Some(self.fetch.concurrency),
            requests_per_second: self.fetch.requests_per_second,
            cookie: self.fetch.xf_user.as_ref().map(|token| format!("{SESSION_COOKIE}={token}")),
        }
    }

    pub fn update_options(&self) -> UpdateOptions {
        self.update.clone().into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use rstest::rstest;

    #[test]
    fn test_defaults() {
        Jail::expect_with(|jail| {
            let path = jail.directory().join("missing.toml");
            assert!(Settings::load(Some(&path)).is_err());
            let settings: Settings = Settings::figment(None).unwrap().extract()?;
            assert_eq!(settings, Settings::default());
            Ok(())
        });
    }

    #[rstest]
    #[case("config.toml", "[fetch]\nnetwork = false\nxf_user = \"token\"\n[update]\nconcurrency = 2\n")]
    #[case("config.yaml", "fetch:\n  network: false\n  xf_user: token\nupdate:\n  concurrency: 2\n")]
    #[case("config.json", r#"{"fetch": {"network": false, "xf_user": "token"}, "update": {"concurrency": 2}}"#)]
    fn test_file_formats(#[case] name: &str, #[case] contents: &str) {
        Jail::expect_with(|jail| {
            jail.create_file(name, contents)?;
            let settings = Settings::load(Some(&jail.directory().join(name))).unwrap();
            assert!(!settings.fetch.network);
            assert_eq!(settings.fetch.concurrency, 4);
            assert_eq!(settings.fetch.xf_user.as_deref(), Some("token"));
            assert_eq!(settings.update.concurrency, 2);
            Ok(())
        });
    }

    #[test]
    fn test_unsupported_format() {
        Jail::expect_with(|jail| {
            jail.create_file("config.ini", "cache = false")?;
            let err = Settings::load(Some(&jail.directory().join("config.ini"))).unwrap_err();
            assert!(matches!(&*err, ErrorKind::Validation(_)));
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", "[update]\nconcurrency = 2\nadd_all = true\n")?;
            jail.set_env("FICSYNC_UPDATE__CONCURRENCY", "8");
            jail.set_env("FICSYNC_FETCH__REQUESTS_PER_SECOND", "0.5");
            let settings = Settings::load(Some(&jail.directory().join("config.toml"))).unwrap();
            assert_eq!(settings.update.concurrency, 8);
            assert!(settings.update.add_all);
            assert_eq!(settings.fetch.requests_per_second, Some(0.5));
            Ok(())
        });
    }

    #[rstest]
    #[case("[update]\nconcurrency = 0\n")]
    #[case("[fetch]\nconcurrency = 0\n")]
    #[case("[fetch]\nrequests_per_second = 0.0\n")]
    #[case("[fetch]\nrequests_per_second = -1.0\n")]
    fn test_validation(#[case] contents: &str) {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", contents)?;
            let err = Settings::load(Some(&jail.directory().join("config.toml"))).unwrap_err();
            assert!(matches!(&*err, ErrorKind::Validation(_)));
            Ok(())
        });
    }

    #[test]
    fn test_malformed_file() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", "[update]\nconcurrency = \"many\"\n")?;
            let err = Settings::load(Some(&jail.directory().join("config.toml"))).unwrap_err();
            assert_eq!(*err, ErrorKind::Extract);
            Ok(())
        });
    }

    #[test]
    fn test_fetch_options() {
        let mut settings = Settings::default();
        assert_eq!(
            settings.fetch_options(),
            FetchOptions { max_concurrency: Some(4), ..Default::default() }
        );
        settings.fetch.network = false;
        settings.fetch.xf_user = Some("1234,abcdef".to_string());
        let options = settings.fetch_options();
        assert!(!options.cache_break);
        assert!(options.no_network);
        assert_eq!(options.cookie.as_deref(), Some("xf_user=1234,abcdef"));
    }

    #[rstest]
    #[case(false, false, true, false)]
    #[case(true, false, false, true)]
    #[case(false, true, true, true)]
    #[case(true, true, false, true)]
    fn test_update_options(
        #[case] scrape: bool,
        #[case] and_scrape: bool,
        #[case] from_threadmarks: bool,
        #[case] from_scrape: bool,
    ) {
        let settings = Settings {
            update: UpdateSettings { scrape, and_scrape, ..Default::default() },
            ..Default::default()
        };
        let options = settings.update_options();
        assert_eq!((options.from_threadmarks, options.from_scrape), (from_threadmarks, from_scrape));
    }
}
