// Service Domain Model

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::error::{DomainError, Result};

/// Service identifier in the vocabulary of the platform probe
/// (e.g. `nginx`, `redis-server`, `MySQL80`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ServiceId(String);

impl ServiceId {
    /// Create a service id, rejecting empty or whitespace-only names
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(DomainError::InvalidServiceId(id));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ServiceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ServiceId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<ServiceId> for String {
    fn from(id: ServiceId) -> Self {
        id.0
    }
}

/// Snapshot of one service, produced fresh on every poll
///
/// Serialized as the `service:status-changed` event payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStatus {
    pub name: ServiceId,
    pub is_running: bool,
    pub message: String,
}

impl ServiceStatus {
    pub fn running(name: ServiceId, message: impl Into<String>) -> Self {
        Self {
            name,
            is_running: true,
            message: message.into(),
        }
    }

    pub fn stopped(name: ServiceId, message: impl Into<String>) -> Self {
        Self {
            name,
            is_running: false,
            message: message.into(),
        }
    }
}

/// Build the fixed watch list for a monitor
///
/// The list must be non-empty and free of duplicates; order is preserved.
pub fn watch_list<I, S>(ids: I) -> Result<Vec<ServiceId>>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut seen = HashSet::new();
    let mut services = Vec::new();
    for raw in ids {
        let id = ServiceId::new(raw)?;
        if !seen.insert(id.clone()) {
            return Err(DomainError::DuplicateService(id.0));
        }
        services.push(id);
    }
    if services.is_empty() {
        return Err(DomainError::EmptyWatchList);
    }
    Ok(services)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_id_rejects_blank() {
        assert!(ServiceId::new("").is_err());
        assert!(ServiceId::new("   ").is_err());
        assert_eq!(ServiceId::new("nginx").unwrap().as_str(), "nginx");
    }

    #[test]
    fn test_status_serializes_camel_case() {
        let status = ServiceStatus::running(ServiceId::new("web").unwrap(), "web is running");
        let value = serde_json::to_value(&status).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"name": "web", "isRunning": true, "message": "web is running"})
        );
    }

    #[test]
    fn test_watch_list_rejects_duplicates() {
        let err = watch_list(["web", "db", "web"]).unwrap_err();
        assert_eq!(err, DomainError::DuplicateService("web".to_string()));
    }

    #[test]
    fn test_watch_list_rejects_empty() {
        let ids: Vec<String> = Vec::new();
        assert_eq!(watch_list(ids).unwrap_err(), DomainError::EmptyWatchList);
    }

    #[test]
    fn test_watch_list_keeps_order() {
        let ids = watch_list(["web", "db", "cache"]).unwrap();
        let names: Vec<&str> = ids.iter().map(ServiceId::as_str).collect();
        assert_eq!(names, vec!["web", "db", "cache"]);
    }
}
