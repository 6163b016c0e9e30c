pub mod client;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod models;
pub mod normalize;
pub mod recency;
pub mod render;
pub mod resolver;
pub mod search;
pub mod sensor;

pub use client::{Auth, JiraClient, JiraConfig};
pub use error::Error;
pub use models::*;

// Config re-exports
pub use config::Settings;

// Coordinator re-exports
pub use coordinator::{AggregationCoordinator, FilterResult, RefreshConfig, RefreshCycle};

// Engine component re-exports
pub use normalize::normalize_issue;
pub use recency::{format_human_time, most_recent};
pub use resolver::FilterResolver;
pub use search::{PaginatedSearchExecutor, SearchEndpoint, SEARCH_FIELDS, SERVER_PAGE_CAP};

// Read model re-export
pub use sensor::FilterSensor;
