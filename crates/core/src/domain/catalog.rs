// Service Catalog
//
// Maps a human display name to the platform-specific service identifier.
// Resolved once before the monitor is constructed.

use serde::{Deserialize, Serialize};

use super::error::{DomainError, Result};
use super::service::{watch_list, ServiceId};

/// Operating system family a service identifier belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Linux,
    Darwin,
    Windows,
    Other,
}

impl Platform {
    /// Platform this binary was compiled for
    pub fn current() -> Self {
        if cfg!(target_os = "linux") {
            Platform::Linux
        } else if cfg!(target_os = "macos") {
            Platform::Darwin
        } else if cfg!(target_os = "windows") {
            Platform::Windows
        } else {
            Platform::Other
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Platform::Linux => write!(f, "linux"),
            Platform::Darwin => write!(f, "darwin"),
            Platform::Windows => write!(f, "windows"),
            Platform::Other => write!(f, "other"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub display_name: String,
    /// systemd unit name
    pub linux: String,
    /// Homebrew formula name
    pub darwin: String,
    /// Windows service name
    pub windows: String,
}

impl CatalogEntry {
    fn new(display_name: &str, linux: &str, darwin: &str, windows: &str) -> Self {
        Self {
            display_name: display_name.to_string(),
            linux: linux.to_string(),
            darwin: darwin.to_string(),
            windows: windows.to_string(),
        }
    }

    pub fn for_platform(&self, platform: Platform) -> &str {
        match platform {
            Platform::Linux => &self.linux,
            Platform::Darwin => &self.darwin,
            Platform::Windows => &self.windows,
            Platform::Other => &self.display_name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceCatalog {
    entries: Vec<CatalogEntry>,
}

impl ServiceCatalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Result<Self> {
        for (i, entry) in entries.iter().enumerate() {
            if entry.display_name.trim().is_empty() {
                return Err(DomainError::ValidationError(format!(
                    "catalog entry #{} has an empty display name",
                    i
                )));
            }
            if entries[..i]
                .iter()
                .any(|e| e.display_name == entry.display_name)
            {
                return Err(DomainError::DuplicateService(entry.display_name.clone()));
            }
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn display_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.display_name.as_str())
    }

    /// Platform service name for `display_name`
    ///
    /// Unknown display names are passed through unchanged.
    pub fn service_name<'a>(&'a self, display_name: &'a str, platform: Platform) -> &'a str {
        self.entries
            .iter()
            .find(|e| e.display_name == display_name)
            .map(|e| e.for_platform(platform))
            .unwrap_or(display_name)
    }

    /// Resolve display names into the monitor's fixed watch list
    pub fn resolve<'a, I>(&self, display_names: I, platform: Platform) -> Result<Vec<ServiceId>>
    where
        I: IntoIterator<Item = &'a str>,
    {
        watch_list(
            display_names
                .into_iter()
                .map(|name| self.service_name(name, platform).to_string()),
        )
    }
}

impl Default for ServiceCatalog {
    fn default() -> Self {
        Self {
            entries: vec![
                CatalogEntry::new("Apache", "apache2", "httpd", "Apache2.4"),
                CatalogEntry::new("MySQL", "mysql", "mysql", "MySQL80"),
                CatalogEntry::new("PostgreSQL", "postgresql", "postgresql", "PostgreSQL"),
                CatalogEntry::new("Redis", "redis-server", "redis", "Redis"),
                CatalogEntry::new("Nginx", "nginx", "nginx", "nginx"),
                CatalogEntry::new("PHP-FPM", "php8.1-fpm", "php", "php-cgi"),
            ],
        }
    }
}
