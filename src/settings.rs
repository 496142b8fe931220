use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use serde::{Deserialize, Serialize};

use crate::query::{CatalogQuery, CATALOG_FORM_URL};

pub const DEFAULT_OUTPUT: &str = "earthquake_data.xlsx";
pub const MORE_SOLUTIONS: &str = "More solutions";

/// Runtime settings: defaults, then `gcmt.toml` if present, then `GCMT_*`
/// environment variables (`__` separates nested keys).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub base_url: String,
    pub query: CatalogQuery,
    pub output: PathBuf,
    pub nav_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub more_link_text: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: CATALOG_FORM_URL.to_string(),
            query: CatalogQuery::default(),
            output: PathBuf::from(DEFAULT_OUTPUT),
            nav_timeout_secs: 10,
            connect_timeout_secs: 10,
            more_link_text: MORE_SOLUTIONS.to_string(),
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self> {
        let builder = Self::defaults()?
            .add_source(File::with_name("gcmt").required(false))
            .add_source(
                Environment::with_prefix("GCMT")
                    .prefix_separator("_")
                    .separator("__"),
            );
        Self::finish(builder)
    }

    // Every key starts out populated, so a source may override a single
    // leaf such as `query.mw.min`.
    fn defaults() -> Result<ConfigBuilder<DefaultState>> {
        let defaults = Config::try_from(&Settings::default()).context("encoding default settings")?;
        Ok(Config::builder().add_source(defaults))
    }

    fn finish(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
        builder
            .build()
            .context("reading configuration")?
            .try_deserialize()
            .context("invalid configuration")
    }

    pub fn nav_timeout(&self) -> Duration {
        Duration::from_secs(self.nav_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use config::FileFormat;

    use super::*;

    // Serialises tests that touch process environment variables.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn from_toml(toml: &str) -> Settings {
        let builder = Settings::defaults()
            .unwrap()
            .add_source(File::from_str(toml, FileFormat::Toml));
        Settings::finish(builder).unwrap()
    }

    #[test]
    fn defaults() {
        let s = Settings::default();
        assert_eq!(s.output, PathBuf::from("earthquake_data.xlsx"));
        assert_eq!(s.nav_timeout(), Duration::from_secs(10));
        assert_eq!(s.more_link_text, "More solutions");
        assert_eq!(s.query, CatalogQuery::default());
    }

    #[test]
    fn partial_toml_overrides() {
        let s = from_toml(
            "nav_timeout_secs = 25\n\
             [query]\n\
             start = \"1990-06-01\"\n\
             mw = { min = 6.0, max = 10.0 }\n",
        );
        assert_eq!(s.nav_timeout_secs, 25);
        assert_eq!(s.query.start.to_string(), "1990-06-01");
        assert_eq!(s.query.mw.min, 6.0);
        assert_eq!(s.query.end, CatalogQuery::default().end);
        assert_eq!(s.base_url, CATALOG_FORM_URL);
    }

    #[test]
    fn single_bound_override_keeps_other_end() {
        let s = from_toml("[query.mw]\nmin = 6.0\n");
        assert_eq!(s.query.mw.min, 6.0);
        assert_eq!(s.query.mw.max, 10.0);
        assert_eq!(s.query.depth, CatalogQuery::default().depth);
    }

    #[test]
    fn load_reads_prefixed_env() {
        let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let vars = [
            ("GCMT_QUERY__START", "1990-01-01"),
            ("GCMT_QUERY__MW__MIN", "6"),
            ("GCMT_NAV_TIMEOUT_SECS", "20"),
            ("GCMT_OUTPUT", "quakes.json"),
        ];
        for (k, v) in vars {
            std::env::set_var(k, v);
        }
        let loaded = Settings::load();
        for (k, _) in vars {
            std::env::remove_var(k);
        }

        let s = loaded.unwrap();
        assert_eq!(s.query.start.to_string(), "1990-01-01");
        assert_eq!(s.query.mw.min, 6.0);
        assert_eq!(s.query.mw.max, 10.0);
        assert_eq!(s.nav_timeout(), Duration::from_secs(20));
        assert_eq!(s.output, PathBuf::from("quakes.json"));
        assert_eq!(s.query.end, CatalogQuery::default().end);
    }
}
