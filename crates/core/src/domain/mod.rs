// Domain Layer - Pure business logic and entities

pub mod catalog;
pub mod error;
pub mod log;
pub mod service;

// Re-exports
pub use catalog::{CatalogEntry, Platform, ServiceCatalog};
pub use error::DomainError;
pub use log::{clock_time, LogEntry, LogLevel};
pub use service::{watch_list, ServiceId, ServiceStatus};
