pub mod config;
pub mod database;
pub mod error;
pub mod metrics;

pub use config::Config;
pub use database::DatabasePool;
pub use error::{Error, ErrorCode, ErrorContext, ErrorMetrics, RequestContext, Result};
pub use metrics::{MetricsRegistry, MetricsService, PipelineMetrics};

// Re-export commonly used types from dependencies
pub use chrono::{DateTime, Utc};
pub use uuid::Uuid;
