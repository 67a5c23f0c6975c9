//! Daemon settings
//!
//! Layered with the `config` crate: built-in defaults, then an optional TOML
//! file, then `VALET_*` environment variables.
//!
//! ```text
//! # ~/.config/valet/valet.toml
//! services = ["Nginx", "Redis"]
//! fast_interval_ms = 250
//! event_output = "stdout"
//!
//! [[catalog]]
//! display_name = "PHP-FPM"
//! linux = "php8.3-fpm"
//! darwin = "php"
//! windows = "php-cgi"
//! ```

use anyhow::{Context, Result};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use valet_core::application::MonitorConfig;
use valet_core::domain::{CatalogEntry, Platform, ServiceCatalog, ServiceId};

const ENV_PREFIX: &str = "VALET";
const CONFIG_PATH_VAR: &str = "VALET_CONFIG";
const CONFIG_FILE_NAME: &str = "valet.toml";

/// Where UI events go
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventOutput {
    /// Tracing log only
    Log,
    /// JSON lines on stdout (plus the tracing log)
    Stdout,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Display names to watch; every catalog entry when absent
    #[serde(default)]
    pub services: Option<Vec<String>>,
    /// Entries added to (or replacing) the built-in catalog
    #[serde(default)]
    pub catalog: Vec<CatalogEntry>,
    pub slow_interval_ms: u64,
    pub fast_interval_ms: u64,
    pub debounce_window_ms: u64,
    pub throttle_window_ms: u64,
    pub command_timeout_ms: u64,
    pub event_output: EventOutput,
    /// Emit every service's status once at startup
    pub announce_initial_status: bool,
}

impl Settings {
    /// Load from the config file (if any) and the environment
    pub fn load() -> Result<Self> {
        let mut builder = defaults()?;
        if let Some(path) = config_path() {
            tracing::debug!(path = %path.display(), "Reading settings file");
            builder = builder.add_source(File::from(path).required(false));
        }
        builder = builder.add_source(environment());
        Self::finish(builder)
    }

    fn finish(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
        let settings: Settings = builder
            .build()
            .context("Failed to read settings")?
            .try_deserialize()
            .context("Invalid settings")?;
        settings
            .monitor_config()
            .validate()
            .context("Invalid monitor timing")?;
        Ok(settings)
    }

    pub fn monitor_config(&self) -> MonitorConfig {
        MonitorConfig {
            slow_interval: Duration::from_millis(self.slow_interval_ms),
            fast_interval: Duration::from_millis(self.fast_interval_ms),
            debounce_window: Duration::from_millis(self.debounce_window_ms),
            throttle_window: Duration::from_millis(self.throttle_window_ms),
        }
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }

    /// Built-in catalog with the configured entries merged in by display name
    pub fn catalog(&self) -> Result<ServiceCatalog> {
        let mut entries = ServiceCatalog::default().entries().to_vec();
        for custom in &self.catalog {
            match entries
                .iter_mut()
                .find(|e| e.display_name == custom.display_name)
            {
                Some(existing) => *existing = custom.clone(),
                None => entries.push(custom.clone()),
            }
        }
        ServiceCatalog::new(entries).context("Invalid service catalog")
    }

    /// Resolve the configured display names into platform service ids
    pub fn watch_list(&self, catalog: &ServiceCatalog, platform: Platform) -> Result<Vec<ServiceId>> {
        let ids = match &self.services {
            Some(names) => catalog.resolve(names.iter().map(String::as_str), platform),
            None => catalog.resolve(catalog.display_names(), platform),
        };
        ids.context("Invalid watch list")
    }
}

fn defaults() -> std::result::Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("slow_interval_ms", 5_000_i64)?
        .set_default("fast_interval_ms", 300_i64)?
        .set_default("debounce_window_ms", 400_i64)?
        .set_default("throttle_window_ms", 2_000_i64)?
        .set_default("command_timeout_ms", 10_000_i64)?
        .set_default("event_output", "log")?
        .set_default("announce_initial_status", true)
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("services")
}

/// `$VALET_CONFIG` (with `~` expanded), else the per-user config dir
fn config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_PATH_VAR) {
        return Some(PathBuf::from(shellexpand::tilde(&path).into_owned()));
    }
    directories::ProjectDirs::from("dev", "valet", "valet")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}
